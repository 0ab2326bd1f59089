//! Reaction (crafting recipe) definitions and the CSV loader.
//!
//! # CSV format
//!
//! One row per reaction.  `inputs` and `outputs` are `item:qty` pairs
//! separated by `;`.
//!
//! ```csv
//! reaction_id,name,facility,inputs,outputs,duration_ticks,energy_multiplier
//! 0,mill flour,mill,1:2,2:1,20,1.2
//! 1,bake bread,oven,2:1;3:1,4:2,40,1.5
//! ```
//!
//! `reaction_id` must equal the row's position (0, 1, 2, …) so lookups are
//! a plain index.

use std::io::Read;
use std::path::Path;

use act_core::{ItemId, ReactionId};
use serde::Deserialize;

use crate::{FacilityKind, WorldError, WorldResult};

// ── ReactionDef ───────────────────────────────────────────────────────────────

/// Declarative description of one crafting reaction.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionDef {
    pub id:                ReactionId,
    pub name:              String,
    pub facility:          FacilityKind,
    pub inputs:            Vec<(ItemId, u32)>,
    pub outputs:           Vec<(ItemId, u32)>,
    pub duration_ticks:    u32,
    /// Need-decay multiplier applied to energy while processing.
    pub energy_multiplier: f32,
}

impl ReactionDef {
    /// Total units of output, used to check space before producing.
    pub fn output_units(&self) -> u32 {
        self.outputs.iter().map(|&(_, q)| q).sum()
    }
}

/// All reactions known to a run, indexed by `ReactionId`.
#[derive(Clone, Debug, Default)]
pub struct ReactionBook {
    defs: Vec<ReactionDef>,
}

impl ReactionBook {
    pub fn new(defs: Vec<ReactionDef>) -> WorldResult<Self> {
        for (i, def) in defs.iter().enumerate() {
            if def.id.index() != i {
                return Err(WorldError::Parse(format!(
                    "reaction {} is at position {i}; ids must be dense and ordered",
                    def.id.0
                )));
            }
        }
        Ok(Self { defs })
    }

    pub fn get(&self, id: ReactionId) -> Option<&ReactionDef> {
        self.defs.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReactionDef> {
        self.defs.iter()
    }
}

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ReactionRecord {
    reaction_id:       u16,
    name:              String,
    facility:          String,
    inputs:            String,
    outputs:           String,
    duration_ticks:    u32,
    energy_multiplier: f32,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`ReactionBook`] from a CSV file.
pub fn load_reactions_csv(path: &Path) -> WorldResult<ReactionBook> {
    let file = std::fs::File::open(path)?;
    load_reactions_reader(file)
}

/// Like [`load_reactions_csv`] but accepts any `Read` source.
pub fn load_reactions_reader<R: Read>(reader: R) -> WorldResult<ReactionBook> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut defs = Vec::new();

    for result in csv_reader.deserialize::<ReactionRecord>() {
        let row = result.map_err(|e| WorldError::Parse(e.to_string()))?;
        if row.duration_ticks == 0 {
            return Err(WorldError::Parse(format!(
                "reaction {:?}: duration_ticks must be > 0",
                row.name
            )));
        }
        defs.push(ReactionDef {
            id:                ReactionId(row.reaction_id),
            facility:          FacilityKind::new(row.facility.trim()),
            inputs:            parse_stacks(&row.inputs)?,
            outputs:           parse_stacks(&row.outputs)?,
            duration_ticks:    row.duration_ticks,
            energy_multiplier: row.energy_multiplier,
            name:              row.name,
        });
    }

    ReactionBook::new(defs)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_stacks(s: &str) -> WorldResult<Vec<(ItemId, u32)>> {
    s.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (item, qty) = part.split_once(':').ok_or_else(|| {
                WorldError::Parse(format!("invalid stack {part:?}: expected \"item:qty\""))
            })?;
            let item = item
                .trim()
                .parse::<u16>()
                .map_err(|_| WorldError::Parse(format!("invalid item id in {part:?}")))?;
            let qty = qty
                .trim()
                .parse::<u32>()
                .map_err(|_| WorldError::Parse(format!("invalid quantity in {part:?}")))?;
            Ok((ItemId(item), qty))
        })
        .collect()
}
