#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

//! mcp-pmon library — Pmon control-protocol client and MCP manager tools.
//!
//! Pmon is the process monitor of a WinCC OA SCADA project: it supervises
//! the project's managers and speaks a line-oriented text protocol on a
//! TCP control port. This library implements that protocol and packages
//! it two ways: a typed client for direct use and an MCP tool surface an
//! agent host can mount.
//!
//! The key building blocks:
//! - `codec` — command framing and reply parsing (pure text, no I/O)
//! - `session` — one-shot TCP round-trip with the accumulate/salvage rules
//! - `client` — `PmonClient`, one method per Pmon operation
//! - `state` — numeric-code labels and the config/status join
//! - `identity` — which manager row is this process itself
//! - `tools` — MCP tool definitions and dispatch
//! - `config` — TOML file, environment overrides, compiled defaults
//! - `error` — the `PmonError` taxonomy
//! - `types` — wire-facing records

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod identity;
pub mod session;
pub mod state;
pub mod tools;
pub mod types;

// Re-export key types at crate root for convenience.
pub use client::{CommandOutcome, PmonClient};
pub use config::{Config, PmonConfig};
pub use error::PmonError;
pub use tools::{ToolContext, ToolResult};
pub use types::{ManagerListEntry, ManagerProperties, ManagerStatusEntry, PmonGlobalStatus};
