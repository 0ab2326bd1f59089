//! Tick loop for the act activity engine.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Claims    : each host's target facility / room goes into world.claims.
//!   ② Decide    : per agent (parallel with the `parallel` feature):
//!                   perceive (with events queued last tick)
//!                   idle? → DecisionLayer::choose → host.start
//!                   host.poll → Proposal { action, finished }  ──► mpsc
//!   ③ Apply     : drain channel, sort by AgentId, Action::execute each.
//!                 Blocked Move → occupant's handle_move_request:
//!                   Queue      → mover waits
//!                   StepAside  → occupant moves, mover moves
//!                   Defer      → the two swap places
//!                 a moved occupant hears PushedBy + Interrupted(Pushed)
//!                 next tick and Resumed the tick after.
//!   ④ Needs     : decay every need, scaled by the active activity.
//! ```
//!
//! Commands, cancellations and raw interrupts from outside the loop
//! ([`Sim::command`], [`Sim::complete_command`], [`Sim::cancel`],
//! [`Sim::interrupt`], [`Sim::resume`]) reach activities as perception
//! events on the next tick.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the decision phase on Rayon's thread pool.        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use act_core::SimConfig;
//! use act_sim::{NoopObserver, SimBuilder, StayIdle};
//! use act_world::AStar;
//!
//! let mut sim = SimBuilder::new(config, world, StayIdle, AStar).build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod decision;
pub mod error;
pub mod mind;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use decision::{DecisionLayer, StayIdle};
pub use error::{SimError, SimResult};
pub use mind::Mind;
pub use observer::{NoopObserver, SimObserver, TickStats};
pub use sim::Sim;
