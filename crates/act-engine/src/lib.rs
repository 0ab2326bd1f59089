//! `act-engine`: the activity execution engine.
//!
//! Turns long-running goals into a stream of one-tick [`Action`]s that
//! survive interruption, resumption and nesting.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                          |
//! |---------------|-------------------------------------------------------------------|
//! | [`action`]    | `Action`, `ActionKind`, `ActionOutcome`, `Rejection`, `Priority`  |
//! | [`context`]   | `ActivityContext<'a>`: what a poll may read and write            |
//! | [`activity`]  | `Activity` trait, `ActivityCore`, `Lifecycle`, contention types   |
//! | [`runner`]    | `run_sub_activity`, `SubActivityResult`                           |
//! | [`machine`]   | `StateMachine`, `MachineBuilder`                                  |
//! | [`stateful`]  | `StatefulActivity`: machine + core + sub-activity slot           |
//! | [`host`]      | `ActivityHost`: per-agent owner enforcing the lifecycle          |
//! | [`error`]     | `EngineError`, `EngineResult<T>`                                  |
//!
//! # Design notes
//!
//! Each tick splits in two:
//!
//! 1. **Decision phase** (parallel): for every agent, its host processes
//!    perception events and polls the activity once.  Everything is read
//!    through `&World`; only the agent's own activity, memory and RNG are
//!    mutated.
//!
//! 2. **Apply phase** (sequential): the coordinator calls
//!    [`Action::execute`] on each proposal.  This is the only place world
//!    state changes.
//!
//! An activity is owned by exactly one host for its whole life, so nothing
//! in here needs a lock.

pub mod action;
pub mod activity;
pub mod context;
pub mod error;
pub mod host;
pub mod machine;
pub mod runner;
pub mod stateful;

#[cfg(test)]
mod tests;

pub use action::{Action, ActionKind, ActionOutcome, Priority, Rejection};
pub use activity::{Activity, ActivityCore, Lifecycle, MoveRequest, MoveResponse, default_move_response};
pub use context::ActivityContext;
pub use error::{EngineError, EngineResult};
pub use host::{ActivityHost, FinishedActivity, PollOutcome};
pub use machine::{MachineBuilder, MachineLabel, StateMachine};
pub use runner::{SubActivityResult, run_sub_activity};
pub use stateful::StatefulActivity;
