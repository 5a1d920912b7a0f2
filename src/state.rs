//! Manager-state projection: code-to-label mapping and the status/config
//! join.
//!
//! The status list reports raw numeric state and start-mode codes; the
//! config list reports string start-mode tokens. The functions here map
//! codes to display labels and join the two lists for an overview. The
//! join key is the ordinal `index` both parsers assign by response-line
//! position; the two lists come from independent round-trips, so a manager
//! added or removed between them makes the lists disagree. That is
//! expected: the join is bounds checked, never assumes equal lengths, and
//! stays out of [`crate::client::PmonClient`], which only ever performs
//! single round-trips.

use crate::types::{ManagerListEntry, ManagerStatusEntry, PmonGlobalStatus};

/// Start-mode tokens accepted by the add/update operations, as the config
/// list vocabulary spells them.
pub const START_MODES: [&str; 3] = ["manual", "once", "always"];

/// Human label for a raw manager state code from the status list.
pub fn state_label(code: i32) -> &'static str {
    match code {
        0 => "stopped",
        1 => "initializing",
        2 => "running",
        3 => "blocked",
        _ => "unknown",
    }
}

/// Human label for a raw start-mode code from the status list.
pub fn start_mode_label(code: i32) -> &'static str {
    match code {
        0 => "manual",
        1 => "once",
        2 => "always",
        _ => "unknown",
    }
}

/// True when `token` is a valid configuration start-mode token.
pub fn is_start_mode_token(token: &str) -> bool {
    START_MODES.contains(&token)
}

/// One manager with configuration and runtime state side by side.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ManagerOverview {
    /// Shared ordinal index from both lists.
    pub index: u32,
    /// Program name from the config list.
    pub manager: String,
    /// Configured start-mode token.
    pub start_mode: String,
    /// Seconds before force-kill on stop.
    pub sec_kill: u32,
    /// Crash-restart budget.
    pub restart_count: u32,
    /// Minutes until the restart counter resets.
    pub reset_min: u32,
    /// Configured command-line options.
    pub commandline_options: String,
    /// Raw state code, absent when the status list had no row at this
    /// index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<i32>,
    /// Display label for `state`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_label: Option<&'static str>,
    /// OS pid, absent without a status row; 0 means configured but not
    /// running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Pmon manager-number tag, absent without a status row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub man_num: Option<i32>,
}

/// Join config rows with status rows by shared `index`.
///
/// The config list drives the result; each row picks up runtime fields
/// from the status row with the same index when one exists. A config row
/// without a matching status row keeps its runtime fields empty rather
/// than borrowing a neighbor's, so transient inconsistency between the two
/// fetches never misattributes state.
pub fn merge_overview(
    list: &[ManagerListEntry],
    status: &PmonGlobalStatus,
) -> Vec<ManagerOverview> {
    list.iter()
        .map(|entry| {
            let runtime: Option<&ManagerStatusEntry> =
                status.managers.iter().find(|m| m.index == entry.index);
            ManagerOverview {
                index: entry.index,
                manager: entry.manager.clone(),
                start_mode: entry.start_mode.clone(),
                sec_kill: entry.sec_kill,
                restart_count: entry.restart_count,
                reset_min: entry.reset_min,
                commandline_options: entry.commandline_options.clone(),
                state: runtime.map(|m| m.state),
                state_label: runtime.map(|m| state_label(m.state)),
                pid: runtime.map(|m| m.pid),
                man_num: runtime.map(|m| m.man_num),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_entry(index: u32, state: i32, pid: u32, man_num: i32) -> ManagerStatusEntry {
        ManagerStatusEntry {
            index,
            state,
            pid,
            start_mode: 2,
            start_time: "12:00:00".to_string(),
            man_num,
        }
    }

    fn list_entry(index: u32, manager: &str) -> ManagerListEntry {
        ManagerListEntry {
            index,
            manager: manager.to_string(),
            start_mode: "always".to_string(),
            sec_kill: 30,
            restart_count: 3,
            reset_min: 5,
            commandline_options: String::new(),
        }
    }

    #[test]
    fn state_labels_cover_all_wire_codes() {
        assert_eq!(state_label(0), "stopped");
        assert_eq!(state_label(1), "initializing");
        assert_eq!(state_label(2), "running");
        assert_eq!(state_label(3), "blocked");
        assert_eq!(state_label(4), "unknown");
        assert_eq!(state_label(-1), "unknown");
    }

    #[test]
    fn start_mode_labels_cover_all_wire_codes() {
        assert_eq!(start_mode_label(0), "manual");
        assert_eq!(start_mode_label(1), "once");
        assert_eq!(start_mode_label(2), "always");
        assert_eq!(start_mode_label(7), "unknown");
    }

    #[test]
    fn start_mode_tokens() {
        assert!(is_start_mode_token("manual"));
        assert!(is_start_mode_token("once"));
        assert!(is_start_mode_token("always"));
        assert!(!is_start_mode_token("Always"));
        assert!(!is_start_mode_token(""));
    }

    #[test]
    fn merge_pairs_rows_by_index() {
        let list = vec![list_entry(1, "WCCOAvalarch"), list_entry(2, "WCCOActrl")];
        let status = PmonGlobalStatus {
            managers: vec![status_entry(1, 2, 1234, 5), status_entry(2, 0, 0, 0)],
            mode_numeric: 0,
            mode_string: "RUNNING".to_string(),
            emergency_active: false,
            demo_mode_active: false,
        };

        let merged = merge_overview(&list, &status);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].manager, "WCCOAvalarch");
        assert_eq!(merged[0].state_label, Some("running"));
        assert_eq!(merged[0].pid, Some(1234));
        assert_eq!(merged[1].state_label, Some("stopped"));
        assert_eq!(merged[1].pid, Some(0));
    }

    #[test]
    fn merge_tolerates_diverged_lists() {
        // Config has three rows, status only one: a manager was added
        // between the two fetches.
        let list = vec![
            list_entry(1, "WCCOAvalarch"),
            list_entry(2, "WCCOActrl"),
            list_entry(3, "WCCOAui"),
        ];
        let status = PmonGlobalStatus {
            managers: vec![status_entry(2, 3, 77, 9)],
            mode_numeric: 0,
            mode_string: "RUNNING".to_string(),
            emergency_active: false,
            demo_mode_active: false,
        };

        let merged = merge_overview(&list, &status);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].state, None);
        assert_eq!(merged[0].state_label, None);
        assert_eq!(merged[1].state_label, Some("blocked"));
        assert_eq!(merged[1].man_num, Some(9));
        assert_eq!(merged[2].pid, None);
    }

    #[test]
    fn merge_of_empty_lists_is_empty() {
        let status = PmonGlobalStatus {
            managers: Vec::new(),
            mode_numeric: -1,
            mode_string: String::new(),
            emergency_active: false,
            demo_mode_active: false,
        };
        assert!(merge_overview(&[], &status).is_empty());
    }
}
