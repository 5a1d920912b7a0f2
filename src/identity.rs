//! Identification of this process in the Pmon manager table.
//!
//! An API manager runs under Pmon supervision like any other manager, so
//! the process serving tool calls can itself appear in the lists it
//! reports. An agent asking to stop or kill that row would take the tool
//! server down mid-conversation. The resolver maps our own PID to the
//! daemon's manager numbering so the tool layer can flag that row before
//! the agent acts on it.

use std::process;

use tokio::sync::OnceCell;

use crate::client::PmonClient;
use crate::error::PmonError;
use crate::types::PmonGlobalStatus;

/// Find the manager number of the status row whose PID matches `pid`.
pub fn find_manager_number(status: &PmonGlobalStatus, pid: u32) -> Option<i32> {
    status
        .managers
        .iter()
        .find(|m| m.pid == pid)
        .map(|m| m.man_num)
}

/// Fetch the status list and look up the calling process's own PID.
///
/// `Ok(None)` is a definitive answer: the status list was fetched and no
/// row carries our PID, so this process is not running under the daemon
/// it queries. `Err` means the fetch itself failed and a later attempt
/// may still succeed.
pub async fn resolve_own_manager_number(client: &PmonClient) -> Result<Option<i32>, PmonError> {
    let status = client.manager_status().await?;
    Ok(find_manager_number(&status, process::id()))
}

/// Memoized view of [`resolve_own_manager_number`].
///
/// The first successful resolution is kept for the lifetime of the
/// resolver, `Some` and `None` alike; a manager number never changes
/// while the process lives. Failed fetches are not cached, so a daemon
/// that was briefly unreachable is retried on the next call. Concurrent
/// callers share one in-flight fetch instead of racing duplicate status
/// queries.
pub struct OwnManagerResolver {
    cell: OnceCell<Option<i32>>,
}

impl OwnManagerResolver {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Resolve once, then serve the cached answer.
    pub async fn resolve_cached(&self, client: &PmonClient) -> Result<Option<i32>, PmonError> {
        self.cell
            .get_or_try_init(|| resolve_own_manager_number(client))
            .await
            .copied()
    }
}

impl Default for OwnManagerResolver {
    fn default() -> Self {
        Self::new()
    }
}
