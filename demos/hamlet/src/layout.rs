//! Village description loaded from TOML, and the world built from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use act_behavior::{ConsumeConfig, CraftConfig, DistributionConfig, WorkShiftConfig};
use act_core::{GridPos, ItemId, ReactionId, SimClock, SimConfig};
use act_world::{
    Facility, FacilityId, FacilityKind, GridMap, Skill, Storage, StorageId, World, load_reactions_csv,
};

// ── File format ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HamletFile {
    #[serde(default)]
    pub sim:        SimConfig,
    pub map:        MapSpec,
    /// Reactions CSV, relative to the TOML file.
    pub reactions:  PathBuf,
    #[serde(default)]
    pub behavior:   BehaviorSpec,
    #[serde(default)]
    pub storages:   Vec<StorageSpec>,
    #[serde(default)]
    pub facilities: Vec<FacilitySpec>,
    #[serde(default)]
    pub agents:     Vec<AgentSpec>,
}

#[derive(Debug, Deserialize)]
pub struct MapSpec {
    pub width:   u32,
    pub height:  u32,
    #[serde(default)]
    pub blocked: Vec<[i32; 2]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BehaviorSpec {
    pub eat:          ConsumeConfig,
    pub work_shift:   WorkShiftConfig,
    pub distribution: DistributionConfig,
    pub craft:        CraftConfig,
    /// Hours of the day (inclusive start, exclusive end) agents work.
    pub day_hours:    Option<[u32; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct StorageSpec {
    pub name:     String,
    pub at:       [i32; 2],
    pub capacity: u32,
    /// `(item, qty)` pairs.
    #[serde(default)]
    pub contents: Vec<(ItemId, u32)>,
}

#[derive(Debug, Deserialize)]
pub struct FacilitySpec {
    pub kind:            String,
    pub at:              [i32; 2],
    #[serde(default)]
    pub spare:           Vec<[i32; 2]>,
    pub output_capacity: u32,
}

#[derive(Debug, Deserialize)]
pub struct AgentSpec {
    pub at:    [i32; 2],
    #[serde(default = "default_carry")]
    pub carry: u32,
    #[serde(flatten)]
    pub role:  RoleSpec,
}

fn default_carry() -> u32 {
    20
}

/// Indices refer to the `storages` / `facilities` lists of the file.
#[derive(Debug, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleSpec {
    Farmer { facility: usize, item: ItemId, skill: Skill },
    Carrier { granary: usize, households: Vec<usize> },
    Crafter { reaction: ReactionId },
    Idler,
}

// ── Resolved village ──────────────────────────────────────────────────────────

/// What an agent does with its working hours, with file indices resolved
/// to world handles.
#[derive(Clone, Debug)]
pub enum Job {
    Farm { facility: FacilityId, item: ItemId, skill: Skill },
    Carry { granary: StorageId, households: Vec<StorageId> },
    Craft(ReactionId),
    Loaf,
}

pub struct Hamlet {
    pub config:   SimConfig,
    pub world:    World,
    /// Indexed by `AgentId`.
    pub jobs:     Vec<Job>,
    pub behavior: BehaviorSpec,
}

fn pos([x, y]: [i32; 2]) -> GridPos {
    GridPos::new(x, y)
}

/// Read `path` and build the world it describes.
pub fn load(path: &Path) -> Result<Hamlet> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let file: HamletFile = toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    let csv = path.parent().unwrap_or(Path::new(".")).join(&file.reactions);
    let reactions = load_reactions_csv(&csv).with_context(|| format!("loading {}", csv.display()))?;

    let mut world = World::new(
        GridMap::open(file.map.width, file.map.height),
        SimClock::new(file.sim.ticks_per_day),
    );
    world.reactions = reactions;
    for &at in &file.map.blocked {
        world.map.set_blocked(pos(at), true)?;
    }

    let mut storages = Vec::with_capacity(file.storages.len());
    for spec in &file.storages {
        let mut storage = Storage::new(spec.name.as_str(), pos(spec.at), spec.capacity);
        for &(item, qty) in &spec.contents {
            storage.contents.add(item, qty).with_context(|| format!("stocking {}", spec.name))?;
        }
        storages.push(world.add_storage(storage)?);
    }

    let mut facilities = Vec::with_capacity(file.facilities.len());
    for spec in &file.facilities {
        let mut facility = Facility::new(FacilityKind::new(spec.kind.as_str()), pos(spec.at), spec.output_capacity);
        facility.spare_spots = spec.spare.iter().copied().map(pos).collect();
        facilities.push(world.add_facility(facility)?);
    }

    let mut jobs = Vec::with_capacity(file.agents.len());
    for (i, spec) in file.agents.iter().enumerate() {
        world.agents.spawn(pos(spec.at), spec.carry)?;
        let storage = |n: usize| {
            storages.get(n).copied().with_context(|| format!("agent {i}: no storage #{n}"))
        };
        let job = match &spec.role {
            RoleSpec::Farmer { facility, item, skill } => Job::Farm {
                facility: facilities
                    .get(*facility)
                    .copied()
                    .with_context(|| format!("agent {i}: no facility #{facility}"))?,
                item:     *item,
                skill:    *skill,
            },
            RoleSpec::Carrier { granary, households } => Job::Carry {
                granary:    storage(*granary)?,
                households: households.iter().map(|&n| storage(n)).collect::<Result<_>>()?,
            },
            RoleSpec::Crafter { reaction } => {
                if world.reactions.get(*reaction).is_none() {
                    bail!("agent {i}: unknown reaction {}", reaction.0);
                }
                Job::Craft(*reaction)
            }
            RoleSpec::Idler => Job::Loaf,
        };
        jobs.push(job);
    }

    Ok(Hamlet { config: file.sim, world, jobs, behavior: file.behavior })
}
