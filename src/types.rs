//! Wire-facing record types parsed from Pmon replies.
//!
//! Two commands describe the same set of configured managers from different
//! angles: `MGRLIST:STATI` reports runtime state (numeric codes, pids),
//! `MGRLIST:LIST` reports configuration (name, start mode token, restart
//! tuning). Their rows correlate by ordinal `index`, nothing else. Pmon
//! assigns indices by response-line order, so an index is only meaningful
//! within the response it came from; if the configuration changes between
//! two calls, the same index may name a different manager.
//!
//! Note the two start-mode vocabularies: the status list carries numeric
//! codes, the config list carries string tokens (`manual`/`once`/`always`).
//! They come from different commands and are never converted into each
//! other here; see [`crate::state`] for code-to-label projection.

/// One row of the `MGRLIST:STATI` reply.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ManagerStatusEntry {
    /// Ordinal position in the status list. Line 0 is the `LIST:` header,
    /// so the first manager row gets index 1. Response-local, not a
    /// persistent identifier.
    pub index: u32,
    /// Raw wire state code (0 stopped, 1 initializing, 2 running,
    /// 3 blocked). Kept verbatim, never renumbered.
    pub state: i32,
    /// OS process id, 0 when the manager is not running.
    pub pid: u32,
    /// Raw wire start-mode code (0 manual, 1 once, 2 always).
    pub start_mode: i32,
    /// Start time exactly as Pmon printed it. Opaque, never reparsed.
    pub start_time: String,
    /// Pmon's manager-number tag for the running process.
    pub man_num: i32,
}

/// Full `MGRLIST:STATI` result: all manager rows plus the trailing
/// daemon-level summary line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PmonGlobalStatus {
    /// Manager rows in response order.
    pub managers: Vec<ManagerStatusEntry>,
    /// Numeric daemon mode from the summary line, `-1` if no summary line
    /// was present.
    pub mode_numeric: i32,
    /// Daemon mode name from the summary line (e.g. `RUNNING`), empty if
    /// no summary line was present.
    pub mode_string: String,
    /// Emergency mode flag from the summary line.
    pub emergency_active: bool,
    /// Demo mode flag from the summary line.
    pub demo_mode_active: bool,
}

/// One row of the `MGRLIST:LIST` reply: a manager's configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ManagerListEntry {
    /// Ordinal position, same numbering scheme as
    /// [`ManagerStatusEntry::index`].
    pub index: u32,
    /// Program name of the managed process (e.g. `WCCOActrl`).
    pub manager: String,
    /// Start-mode token as given by the protocol (`manual`, `once`,
    /// `always`). A string vocabulary, distinct from the numeric codes in
    /// the status list.
    pub start_mode: String,
    /// Seconds Pmon waits after a stop request before force-killing.
    pub sec_kill: u32,
    /// How many times Pmon restarts the manager after a crash.
    pub restart_count: u32,
    /// Minutes after which the restart counter resets.
    pub reset_min: u32,
    /// Command-line options passed to the manager. May itself contain `;`,
    /// which the parser reassembles losslessly from the trailing fields.
    pub commandline_options: String,
}

/// Single-manager configuration as returned by `SINGLE_MGR:PROP_GET`, and
/// the input shape for `SINGLE_MGR:INS` / `SINGLE_MGR:PROP_PUT`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ManagerProperties {
    /// Start-mode token (`manual`, `once`, `always`).
    pub start_mode: String,
    /// Seconds before force-kill on stop.
    pub sec_kill: u32,
    /// Crash-restart budget.
    pub restart_count: u32,
    /// Minutes until the restart counter resets.
    pub reset_min: u32,
    /// Command-line options, space-separated as Pmon prints them. Empty
    /// when the manager takes none.
    pub commandline_options: String,
}
