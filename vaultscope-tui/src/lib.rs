//! Vaultscope TUI library.

pub mod arm;
pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod notifications;
pub mod orchestrator;
pub mod persistence;
pub mod state;
pub mod theme;
pub mod views;
pub mod widgets;
