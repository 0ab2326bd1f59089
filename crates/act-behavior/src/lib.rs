//! `act-behavior`: concrete activities built on the act engine.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                    |
//! |------------------|-------------------------------------------------------------|
//! | [`navigate`]     | `Navigate`, `NavigateConfig` (walk with a stuck bound)      |
//! | [`wait`]         | `Wait` (idle for N ticks)                                   |
//! | [`consume`]      | `Consume`, `ConsumeConfig` (find food, eat it)              |
//! | [`work_shift`]   | `WorkShift`, `WorkShiftConfig`, `WorkPhase`                 |
//! | [`distribution`] | `DistributionRound`, `DistributionConfig`, `RoundPhase`     |
//! | [`craft`]        | `Craft`, `CraftConfig`, `CraftPhase`                        |
//! | [`error`]        | `BehaviorError`, `BehaviorResult<T>`                        |
//!
//! `Navigate`, `Wait` and `Consume` are plain activities.  The other three
//! are state machines over [`act_engine::StatefulActivity`]; their
//! constructors validate the machine definition and return `Err` if it
//! is malformed.
//!
//! Every phase handler follows the same shape: look at the world, then
//! either emit an action for this tick, fire a trigger and re-evaluate the
//! new phase within the same poll, or terminate.  Re-evaluation is bounded
//! per poll, after which the activity idles and continues next tick.

pub mod consume;
pub mod craft;
pub mod distribution;
pub mod error;
pub mod navigate;
pub mod wait;
pub mod work_shift;


pub use consume::{Consume, ConsumeConfig};
pub use craft::{Craft, CraftConfig, CraftPhase, CraftTrigger};
pub use distribution::{DistributionConfig, DistributionRound, RoundPhase, RoundTrigger};
pub use error::{BehaviorError, BehaviorResult};
pub use navigate::{Navigate, NavigateConfig};
pub use wait::Wait;
pub use work_shift::{WorkPhase, WorkShift, WorkShiftConfig, WorkTrigger};
