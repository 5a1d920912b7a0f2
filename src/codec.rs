//! Pmon wire codec: command framing and reply parsing.
//!
//! Pmon speaks a line-oriented text protocol. An outbound frame is an
//! authentication prefix (`user#password#`, or `##` when anonymous) followed
//! by a verb and space-joined arguments; the newline terminator is appended
//! by the transport, not here. Replies come in two shapes: a short ack
//! ending in `;`, or a `LIST:<count>` header followed by `;`-delimited rows
//! and a `;` terminator line (status replies fold the terminator into a
//! trailing space-delimited summary line instead).
//!
//! ## Leniency rules
//!
//! The parsers reproduce the daemon's loose framing rather than a strict
//! grammar: blank lines are skipped everywhere, a row with fewer than 5
//! `;`-fields is dropped (keepalive filtering), and numeric fields that
//! fail to parse become 0 instead of failing the whole reply. Only a
//! missing `LIST:` header or a properties reply with fewer than 4 tokens
//! is a hard [`PmonError::Protocol`].
//!
//! Everything here is pure text transformation; sockets and timing live in
//! [`crate::session`].

use tracing::warn;

use crate::error::PmonError;
use crate::types::{ManagerListEntry, ManagerProperties, ManagerStatusEntry, PmonGlobalStatus};

/// Build the authenticated command text for one request.
///
/// The prefix is `user#password#`; with both credentials empty this
/// degenerates to the anonymous `##`. Arguments are space-joined after the
/// verb. The trailing newline is the transport's job.
pub fn build_command(user: &str, password: &str, verb: &str, args: &[&str]) -> String {
    let mut cmd = format!("{user}#{password}#{verb}");
    if !args.is_empty() {
        cmd.push(' ');
        cmd.push_str(&args.join(" "));
    }
    cmd
}

/// Heuristic completion test for an accumulating reply buffer.
///
/// True once the buffer contains a `;` on its own line (list trailer) or
/// ends in `;` (short ack or summary line). Not a strict grammar: some
/// replies never match and complete only when the peer closes the
/// connection.
pub fn is_response_complete(buffer: &str) -> bool {
    buffer.contains("\n;") || buffer.ends_with(';')
}

/// Parse a `MGRLIST:STATI` reply into manager rows plus the daemon summary.
///
/// Rows are `state;pid;startMode;startTime;manNum`. The first line ending
/// in `;` is the summary line (`<mode> <modeName> <emergency> <demo>;`);
/// it terminates parsing and anything after it is not inspected. Entry
/// indices follow physical line numbers with the `LIST:` header at 0, so a
/// skipped row leaves a gap rather than renumbering its successors.
pub fn parse_status_list(text: &str) -> Result<PmonGlobalStatus, PmonError> {
    check_list_header(text, "status")?;

    let mut status = PmonGlobalStatus {
        managers: Vec::new(),
        mode_numeric: -1,
        mode_string: String::new(),
        emergency_active: false,
        demo_mode_active: false,
    };

    for (i, raw) in text.lines().enumerate().skip(1) {
        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }
        // Summary detection runs before the row split: a summary line also
        // contains no ';' separators, but a row never ends with ';'.
        if line.ends_with(';') {
            let tokens: Vec<&str> = line.trim_end_matches(';').split_whitespace().collect();
            status.mode_numeric = tokens.first().map_or(-1, |t| parse_i32_or(t, -1));
            status.mode_string = tokens.get(1).unwrap_or(&"").to_string();
            status.emergency_active = tokens.get(2).is_some_and(|t| parse_i32_or(t, 0) != 0);
            status.demo_mode_active = tokens.get(3).is_some_and(|t| parse_i32_or(t, 0) != 0);
            return Ok(status);
        }
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() < 5 {
            warn!("Skipping short status line {i}: {raw:?}");
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        status.managers.push(ManagerStatusEntry {
            index: i as u32,
            state: parse_i32_or(fields[0], 0),
            pid: parse_u32_or(fields[1], 0),
            start_mode: parse_i32_or(fields[2], 0),
            start_time: fields[3].to_string(),
            man_num: parse_i32_or(fields[4], 0),
        });
    }

    Ok(status)
}

/// Parse a `MGRLIST:LIST` reply into configuration rows.
///
/// Rows are `manager;startMode;secKill;restartCount;resetMin[;options...]`.
/// The options field may itself contain `;`, so every field from the 6th
/// onward is rejoined with `;` to reconstitute it losslessly. Terminator
/// and summary lines (ending in `;`) are skipped, as are blank lines.
pub fn parse_manager_list(text: &str) -> Result<Vec<ManagerListEntry>, PmonError> {
    check_list_header(text, "manager list")?;

    let mut entries = Vec::new();
    for (i, raw) in text.lines().enumerate().skip(1) {
        let line = raw.trim_end();
        if line.is_empty() || line == ";" {
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() < 5 {
            // Trailing summary lines end in ';' and are expected; anything
            // else short is worth a note in the log.
            if !line.ends_with(';') {
                warn!("Skipping short manager list line {i}: {raw:?}");
            }
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        entries.push(ManagerListEntry {
            index: i as u32,
            manager: fields[0].to_string(),
            start_mode: fields[1].to_string(),
            sec_kill: parse_u32_or(fields[2], 0),
            restart_count: parse_u32_or(fields[3], 0),
            reset_min: parse_u32_or(fields[4], 0),
            commandline_options: fields[5..].join(";"),
        });
    }

    Ok(entries)
}

/// Parse a `SINGLE_MGR:PROP_GET` reply.
///
/// The reply is whitespace-separated: `startMode secKill restartCount
/// resetMin [options...]`. Tokens after the fourth rejoin with single
/// spaces into the options string. The frame terminator (`;` at the end or
/// on its own line) is stripped before tokenizing so it never leaks into
/// the options.
pub fn parse_properties(text: &str) -> Result<ManagerProperties, PmonError> {
    let body = text.trim().trim_end_matches(';').trim_end();
    let tokens: Vec<&str> = body.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(PmonError::Protocol(format!(
            "Manager properties reply has {} fields, expected at least 4: {:?}",
            tokens.len(),
            text.trim()
        )));
    }
    Ok(ManagerProperties {
        start_mode: tokens[0].to_string(),
        sec_kill: parse_u32_or(tokens[1], 0),
        restart_count: parse_u32_or(tokens[2], 0),
        reset_min: parse_u32_or(tokens[3], 0),
        commandline_options: tokens[4..].join(" "),
    })
}

/// Reject replies whose first line is not a `LIST:` header.
fn check_list_header(text: &str, what: &str) -> Result<(), PmonError> {
    let first = text.lines().next().unwrap_or("").trim_end();
    if first.starts_with("LIST:") {
        Ok(())
    } else {
        Err(PmonError::Protocol(format!(
            "Pmon {what} reply does not start with a LIST header: {first:?}"
        )))
    }
}

fn parse_i32_or(field: &str, fallback: i32) -> i32 {
    field.trim().parse().unwrap_or(fallback)
}

fn parse_u32_or(field: &str, fallback: u32) -> u32 {
    field.trim().parse().unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_anonymous_command() {
        assert_eq!(build_command("", "", "MGRLIST:STATI", &[]), "##MGRLIST:STATI");
    }

    #[test]
    fn builds_authenticated_command_with_args() {
        assert_eq!(
            build_command("admin", "secret", "SINGLE_MGR:START", &["5"]),
            "admin#secret#SINGLE_MGR:START 5"
        );
    }

    #[test]
    fn password_only_prefix_keeps_both_separators() {
        assert_eq!(
            build_command("", "topsecret", "MGRLIST:LIST", &[]),
            "#topsecret#MGRLIST:LIST"
        );
    }

    #[test]
    fn joins_multiple_args_with_spaces() {
        assert_eq!(
            build_command("", "", "SINGLE_MGR:INS", &["3", "WCCOActrl", "always", "30", "3", "5"]),
            "##SINGLE_MGR:INS 3 WCCOActrl always 30 3 5"
        );
    }

    #[test]
    fn completion_detects_short_ack() {
        assert!(is_response_complete("OK;"));
    }

    #[test]
    fn completion_detects_list_trailer_line() {
        assert!(is_response_complete("LIST:1\nWCCOActrl;always;30;3;5\n;\n"));
    }

    #[test]
    fn completion_rejects_partial_buffer() {
        assert!(!is_response_complete("LIST:1\nWCCOActrl;always;30;3"));
        assert!(!is_response_complete(""));
    }

    #[test]
    fn parses_status_list_with_summary() {
        let status =
            parse_status_list("LIST:2\n1;1234;2;12:00:00;5\n0;0;1;00:00:00;0\n0 RUNNING 0 0;\n")
                .unwrap();

        assert_eq!(status.managers.len(), 2);
        assert_eq!(status.managers[0].index, 1);
        assert_eq!(status.managers[0].state, 1);
        assert_eq!(status.managers[0].pid, 1234);
        assert_eq!(status.managers[0].start_mode, 2);
        assert_eq!(status.managers[0].start_time, "12:00:00");
        assert_eq!(status.managers[0].man_num, 5);
        assert_eq!(status.managers[1].index, 2);
        assert_eq!(status.managers[1].pid, 0);
        assert_eq!(status.mode_numeric, 0);
        assert_eq!(status.mode_string, "RUNNING");
        assert!(!status.emergency_active);
        assert!(!status.demo_mode_active);
    }

    #[test]
    fn status_list_requires_list_header() {
        let err = parse_status_list("ERROR: not authorized;\n").unwrap_err();
        assert_eq!(err.kind(), "protocol");
        assert!(err.to_string().contains("LIST header"));
    }

    #[test]
    fn short_status_line_is_skipped_and_leaves_an_index_gap() {
        let status = parse_status_list(
            "LIST:3\n1;1234;2;12:00:00;5\n0;0\n2;999;0;09:30:00;7\n0 RUNNING 0 0;\n",
        )
        .unwrap();

        let indices: Vec<u32> = status.managers.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(status.managers[1].pid, 999);
    }

    #[test]
    fn status_parsing_stops_at_summary_line() {
        let status =
            parse_status_list("LIST:1\n2 EMERGENCY 1 0;\n1;1234;2;12:00:00;5\n").unwrap();

        assert!(status.managers.is_empty());
        assert_eq!(status.mode_numeric, 2);
        assert_eq!(status.mode_string, "EMERGENCY");
        assert!(status.emergency_active);
        assert!(!status.demo_mode_active);
    }

    #[test]
    fn status_without_summary_keeps_defaults() {
        let status = parse_status_list("LIST:1\n2;4321;2;08:00:00;1\n").unwrap();
        assert_eq!(status.managers.len(), 1);
        assert_eq!(status.mode_numeric, -1);
        assert_eq!(status.mode_string, "");
    }

    #[test]
    fn status_parse_is_deterministic() {
        let text = "LIST:2\n1;1234;2;12:00:00;5\n0;0;1;00:00:00;0\n0 RUNNING 0 0;\n";
        assert_eq!(parse_status_list(text).unwrap(), parse_status_list(text).unwrap());
    }

    #[test]
    fn parses_manager_list_rejoining_options() {
        let entries = parse_manager_list(
            "LIST:2\nWCCOAvalarch;always;30;2;2\nWCCOActrl;always;30;3;5;-f;script.ctl\n;\n",
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].manager, "WCCOAvalarch");
        assert_eq!(entries[0].commandline_options, "");
        assert_eq!(entries[1].index, 2);
        assert_eq!(entries[1].manager, "WCCOActrl");
        assert_eq!(entries[1].start_mode, "always");
        assert_eq!(entries[1].sec_kill, 30);
        assert_eq!(entries[1].restart_count, 3);
        assert_eq!(entries[1].reset_min, 5);
        assert_eq!(entries[1].commandline_options, "-f;script.ctl");
    }

    #[test]
    fn manager_list_skips_blank_terminator_and_summary_lines() {
        let entries =
            parse_manager_list("LIST:1\n\nWCCOAui;manual;30;1;1\n;\n0 RUNNING 0 0;\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, 2);
        assert_eq!(entries[0].manager, "WCCOAui");
    }

    #[test]
    fn manager_list_requires_list_header() {
        assert!(parse_manager_list("WCCOAui;manual;30;1;1\n").is_err());
    }

    #[test]
    fn parses_properties_with_spaced_options() {
        let props = parse_properties("always 30 3 5 -f script.ctl;").unwrap();
        assert_eq!(props.start_mode, "always");
        assert_eq!(props.sec_kill, 30);
        assert_eq!(props.restart_count, 3);
        assert_eq!(props.reset_min, 5);
        assert_eq!(props.commandline_options, "-f script.ctl");
    }

    #[test]
    fn parses_properties_without_options() {
        let props = parse_properties("once 10 2 1\n;").unwrap();
        assert_eq!(props.start_mode, "once");
        assert_eq!(props.commandline_options, "");
    }

    #[test]
    fn properties_requires_four_tokens() {
        let err = parse_properties("always 30;").unwrap_err();
        assert_eq!(err.kind(), "protocol");
        assert!(err.to_string().contains("expected at least 4"));
    }
}
