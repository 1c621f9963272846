//! Core engine for focus-gate.
//!
//! Runs one focus/break session at a time: the phase scheduler mutes a voice
//! group during WORK, unmutes it during BREAK, sounds an alert at each
//! boundary, and mutes anyone who joins mid-focus. Everything the engine
//! touches on the chat service goes through `focus_gate_platform`.

pub mod alert;
pub mod commands;
pub mod config;
pub mod countdown;
pub mod dispatch;
pub mod enforcement;
pub mod error;
pub mod gate;
pub mod scheduler;
pub mod session;
pub mod setup;
pub mod state;

pub use config::Config;
pub use dispatch::{Dispatcher, MessageContext};
pub use enforcement::{JoinIgnored, JoinOutcome};
pub use error::{ConnectFailure, FocusError};
pub use scheduler::LoopExit;
pub use session::{SessionManager, SessionStatus, StartRequest, StopOutcome};
