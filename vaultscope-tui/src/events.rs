//! Event types for the TUI event loop.

use crate::orchestrator::{LoadOutcome, LoadToken};
use crossterm::event::KeyEvent;
use vaultscope_cache::ProgressEvent;
use vaultscope_core::FetchResult;

/// The action a completed mutation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Set,
    Delete,
}

#[derive(Debug)]
pub enum TuiEvent {
    Input(KeyEvent),
    Tick,
    Resize { width: u16, height: u16 },
    /// An async fetch finished; carries the staleness token captured at
    /// dispatch time.
    Loaded {
        token: LoadToken,
        outcome: LoadOutcome,
    },
    /// Bulk loader progress tick.
    Progress(ProgressEvent),
    /// A secret mutation finished.
    Mutated {
        kind: MutationKind,
        vault_name: String,
        secret_name: String,
        result: FetchResult<()>,
    },
}
