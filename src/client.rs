//! Typed client for the Pmon control protocol.
//!
//! [`PmonClient`] holds one daemon address plus credentials and provides a
//! method per Pmon operation. Each method validates its input first, builds
//! the frame via [`crate::codec`], and performs exactly one round-trip via
//! [`crate::session`]. The client never retries and never caches.
//!
//! ## Two error shapes
//!
//! The three queries (`manager_status`, `manager_list`,
//! `manager_properties`) return `Result` and propagate every failure,
//! prefixed with the failing operation. The five mutations (add, remove,
//! start, stop, kill, plus the property update) never propagate: they
//! return a [`CommandOutcome`] whose `error` field carries the failure as
//! display text, so a tool layer always has a response object to hand
//! back. Callers depend on this split; unifying the shapes would be a
//! breaking change. If that cleanup ever happens it has to be deliberate,
//! not incidental.

use tracing::debug;

use crate::codec;
use crate::config::PmonConfig;
use crate::error::PmonError;
use crate::session;
use crate::state::{is_start_mode_token, START_MODES};
use crate::types::{ManagerListEntry, ManagerProperties, PmonGlobalStatus};

/// Highest manager index accepted by `add_manager`.
const MAX_MANAGER_INDEX: u32 = 100;

/// Result value of the mutating operations.
///
/// Exactly one of `data` and `error` is set. `data` is the daemon's raw
/// acknowledgement text; `error` is a display string from any failure
/// kind, validation included.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CommandOutcome {
    /// Whether the daemon accepted the command.
    pub success: bool,
    /// Raw acknowledgement text on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Failure message otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutcome {
    fn accepted(data: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Client for a single Pmon daemon.
#[derive(Clone)]
pub struct PmonClient {
    config: PmonConfig,
}

impl PmonClient {
    /// Create a client from resolved connection settings.
    pub fn new(config: PmonConfig) -> Self {
        Self { config }
    }

    /// The daemon address this client talks to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// `MGRLIST:STATI` — runtime state of every manager plus the daemon
    /// summary.
    pub async fn manager_status(&self) -> Result<PmonGlobalStatus, PmonError> {
        self.dispatch("MGRLIST:STATI", &[])
            .await
            .and_then(|reply| codec::parse_status_list(&reply))
            .map_err(|e| e.context("Failed to get manager status"))
    }

    /// `MGRLIST:LIST` — configuration of every manager.
    pub async fn manager_list(&self) -> Result<Vec<ManagerListEntry>, PmonError> {
        self.dispatch("MGRLIST:LIST", &[])
            .await
            .and_then(|reply| codec::parse_manager_list(&reply))
            .map_err(|e| e.context("Failed to get manager list"))
    }

    /// `SINGLE_MGR:PROP_GET` — configuration of one manager.
    pub async fn manager_properties(&self, index: u32) -> Result<ManagerProperties, PmonError> {
        if let Err(msg) = validate_index(index) {
            return Err(PmonError::Validation(msg).context("Failed to get manager properties"));
        }
        let idx = index.to_string();
        self.dispatch("SINGLE_MGR:PROP_GET", &[&idx])
            .await
            .and_then(|reply| codec::parse_properties(&reply))
            .map_err(|e| e.context("Failed to get manager properties"))
    }

    /// `SINGLE_MGR:INS` — add a manager entry to the daemon configuration.
    ///
    /// `index` is the slot the entry is inserted at (1 to 100); `props`
    /// carries start mode, restart tuning, and command-line options.
    pub async fn add_manager(
        &self,
        index: u32,
        manager: &str,
        props: &ManagerProperties,
    ) -> CommandOutcome {
        if let Err(msg) = validate_add(index, manager, props) {
            return CommandOutcome::failed(msg);
        }

        let idx = index.to_string();
        let sec_kill = props.sec_kill.to_string();
        let restart_count = props.restart_count.to_string();
        let reset_min = props.reset_min.to_string();
        let mut args: Vec<&str> = vec![
            &idx,
            manager,
            &props.start_mode,
            &sec_kill,
            &restart_count,
            &reset_min,
        ];
        // Pmon tokenizes on whitespace, so an empty options argument is
        // omitted rather than sent as a dangling separator.
        if !props.commandline_options.is_empty() {
            args.push(&props.commandline_options);
        }
        self.mutate("SINGLE_MGR:INS", &args).await
    }

    /// `SINGLE_MGR:DEL` — remove a manager entry from the configuration.
    pub async fn remove_manager(&self, index: u32) -> CommandOutcome {
        self.single_manager_command("SINGLE_MGR:DEL", index).await
    }

    /// `SINGLE_MGR:START` — start the manager at `index`.
    pub async fn start_manager(&self, index: u32) -> CommandOutcome {
        self.single_manager_command("SINGLE_MGR:START", index).await
    }

    /// `SINGLE_MGR:STOP` — stop the manager at `index` gracefully (Pmon
    /// escalates to a kill after the manager's `sec_kill` window).
    pub async fn stop_manager(&self, index: u32) -> CommandOutcome {
        self.single_manager_command("SINGLE_MGR:STOP", index).await
    }

    /// `SINGLE_MGR:KILL` — kill the manager at `index` immediately.
    pub async fn kill_manager(&self, index: u32) -> CommandOutcome {
        self.single_manager_command("SINGLE_MGR:KILL", index).await
    }

    /// `SINGLE_MGR:PROP_PUT` — replace one manager's configuration.
    ///
    /// Unlike [`add_manager`](Self::add_manager), the numeric fields only
    /// have to be present, not positive; Pmon itself decides what tuning
    /// values it accepts on update.
    pub async fn update_manager_properties(
        &self,
        index: u32,
        props: &ManagerProperties,
    ) -> CommandOutcome {
        if let Err(msg) = validate_index(index) {
            return CommandOutcome::failed(msg);
        }
        if let Err(msg) = validate_start_mode(&props.start_mode) {
            return CommandOutcome::failed(msg);
        }

        let idx = index.to_string();
        let sec_kill = props.sec_kill.to_string();
        let restart_count = props.restart_count.to_string();
        let reset_min = props.reset_min.to_string();
        let mut args: Vec<&str> = vec![
            &idx,
            &props.start_mode,
            &sec_kill,
            &restart_count,
            &reset_min,
        ];
        if !props.commandline_options.is_empty() {
            args.push(&props.commandline_options);
        }
        self.mutate("SINGLE_MGR:PROP_PUT", &args).await
    }

    /// Shared path for the index-only mutations.
    async fn single_manager_command(&self, verb: &str, index: u32) -> CommandOutcome {
        if let Err(msg) = validate_index(index) {
            return CommandOutcome::failed(msg);
        }
        let idx = index.to_string();
        self.mutate(verb, &[&idx]).await
    }

    /// Send a mutation and fold any failure into the outcome value.
    async fn mutate(&self, verb: &str, args: &[&str]) -> CommandOutcome {
        match self.dispatch(verb, args).await {
            Ok(reply) => CommandOutcome::accepted(reply.trim().to_string()),
            Err(e) => CommandOutcome::failed(e.to_string()),
        }
    }

    /// Build, frame, and send one command; returns the raw reply text.
    async fn dispatch(&self, verb: &str, args: &[&str]) -> Result<String, PmonError> {
        let command = codec::build_command(&self.config.user, &self.config.password, verb, args);
        debug!("Dispatching {verb} to Pmon at {}", self.address());
        session::send_command(
            &self.config.host,
            self.config.port,
            &command,
            self.config.timeout_ms,
        )
        .await
    }
}

fn validate_index(index: u32) -> Result<(), String> {
    if index < 1 {
        return Err(format!("Manager index must be at least 1, got {index}"));
    }
    Ok(())
}

fn validate_start_mode(mode: &str) -> Result<(), String> {
    if !is_start_mode_token(mode) {
        return Err(format!(
            "Start mode must be one of {}, got {mode:?}",
            START_MODES.join(", ")
        ));
    }
    Ok(())
}

fn validate_add(index: u32, manager: &str, props: &ManagerProperties) -> Result<(), String> {
    if !(1..=MAX_MANAGER_INDEX).contains(&index) {
        return Err(format!(
            "Manager index must be between 1 and {MAX_MANAGER_INDEX}, got {index}"
        ));
    }
    if manager.trim().is_empty() {
        return Err("Manager name must not be empty".to_string());
    }
    validate_start_mode(&props.start_mode)?;
    validate_positive("sec_kill", props.sec_kill)?;
    validate_positive("restart_count", props.restart_count)?;
    validate_positive("reset_min", props.reset_min)?;
    Ok(())
}

fn validate_positive(name: &str, value: u32) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{name} must be positive, got 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PmonConfig;

    fn client() -> PmonClient {
        // Validation failures return before any socket is opened, so these
        // tests never touch the network even with a live default config.
        PmonClient::new(PmonConfig::default())
    }

    fn props(start_mode: &str, sec_kill: u32) -> ManagerProperties {
        ManagerProperties {
            start_mode: start_mode.to_string(),
            sec_kill,
            restart_count: 3,
            reset_min: 5,
            commandline_options: String::new(),
        }
    }

    #[tokio::test]
    async fn add_rejects_index_zero_and_out_of_range() {
        let outcome = client().add_manager(0, "WCCOActrl", &props("always", 30)).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("between 1 and 100"));

        let outcome = client().add_manager(101, "WCCOActrl", &props("always", 30)).await;
        assert!(!outcome.success);
        assert_eq!(outcome.data, None);
    }

    #[tokio::test]
    async fn add_rejects_empty_manager_name() {
        let outcome = client().add_manager(3, "   ", &props("always", 30)).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("must not be empty"));
    }

    #[tokio::test]
    async fn add_rejects_unknown_start_mode() {
        let outcome = client().add_manager(3, "WCCOActrl", &props("sometimes", 30)).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("manual, once, always"));
    }

    #[tokio::test]
    async fn add_rejects_zero_tuning_values() {
        let outcome = client().add_manager(3, "WCCOActrl", &props("always", 0)).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("sec_kill must be positive"));
    }

    #[tokio::test]
    async fn lifecycle_mutations_reject_index_zero() {
        for outcome in [
            client().start_manager(0).await,
            client().stop_manager(0).await,
            client().kill_manager(0).await,
            client().remove_manager(0).await,
        ] {
            assert!(!outcome.success);
            assert!(outcome.error.unwrap().contains("at least 1"));
        }
    }

    #[tokio::test]
    async fn update_rejects_unknown_start_mode() {
        let outcome = client().update_manager_properties(2, &props("never", 30)).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("Start mode"));
    }

    #[tokio::test]
    async fn properties_query_propagates_validation_with_prefix() {
        let err = client().manager_properties(0).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Failed to get manager properties: Manager index must be at least 1, got 0"
        );
    }
}
