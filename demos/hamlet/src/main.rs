//! hamlet: a small village driven by the act activity engine.
//!
//! Farmers work the fields, a carrier moves grain from the granary to the
//! households, crafters mill and bake.  Everyone eats when hungry and rests
//! at night.
//!
//! ```text
//! cargo run -p hamlet -- [path/to/hamlet.toml]
//! RUST_LOG=act_engine=debug cargo run -p hamlet
//! ```

mod layout;
mod life;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use act_core::Tick;
use act_engine::{FinishedActivity, Lifecycle};
use act_sim::{SimBuilder, SimObserver, TickStats};
use act_world::{AStar, World};

use life::HamletLife;

// ── Observer ──────────────────────────────────────────────────────────────────

/// Tallies finished activities and logs one line per simulated day.
#[derive(Default)]
struct Chronicle {
    ticks_per_day: u64,
    /// `(issuer, completed, failed)` keyed by issuer.
    outcomes:      BTreeMap<&'static str, (u32, u32)>,
    day:           TickStats,
}

impl SimObserver for Chronicle {
    fn on_activity_finished(&mut self, _tick: Tick, finished: &FinishedActivity) {
        let entry = self.outcomes.entry(finished.issuer).or_default();
        match finished.state {
            Lifecycle::Completed => entry.0 += 1,
            Lifecycle::Failed    => entry.1 += 1,
            Lifecycle::Running   => {}
        }
    }

    fn on_tick_end(&mut self, tick: Tick, stats: &TickStats) {
        self.day.started  += stats.started;
        self.day.done     += stats.done;
        self.day.rejected += stats.rejected;
        self.day.finished += stats.finished;
        self.day.pushed   += stats.pushed;
        self.day.queued   += stats.queued;
        if (tick.0 + 1).is_multiple_of(self.ticks_per_day) {
            let d = std::mem::take(&mut self.day);
            info!(
                day      = tick.0 / self.ticks_per_day,
                started  = d.started,
                actions  = d.done,
                rejected = d.rejected,
                finished = d.finished,
                pushed   = d.pushed,
                queued   = d.queued,
                "day over",
            );
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick, world: &World) {
        println!();
        println!("Finished at {final_tick}");
        println!("{:<14} {:>10} {:>8}", "Activity", "Completed", "Failed");
        println!("{}", "-".repeat(34));
        for (issuer, (completed, failed)) in &self.outcomes {
            println!("{issuer:<14} {completed:>10} {failed:>8}");
        }
        println!();
        println!("{:<14} {:>10}", "Storage", "Contents");
        println!("{}", "-".repeat(34));
        for (_, storage) in world.storages.iter() {
            println!("{:<14} {:>10}", storage.name, storage.contents.total());
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/hamlet.toml")));

    let hamlet = layout::load(&path)?;
    println!("=== hamlet ===");
    println!(
        "Agents: {}  |  Ticks: {}  |  Seed: {}",
        hamlet.jobs.len(),
        hamlet.config.total_ticks,
        hamlet.config.seed,
    );

    let mut chronicle = Chronicle { ticks_per_day: hamlet.config.ticks_per_day, ..Chronicle::default() };
    let life = HamletLife::new(hamlet.jobs, hamlet.behavior);
    let mut sim = SimBuilder::new(hamlet.config, hamlet.world, life, AStar).build()?;

    let t0 = Instant::now();
    sim.run(&mut chronicle)?;
    println!("Simulation complete in {:.3} s", t0.elapsed().as_secs_f64());

    Ok(())
}
