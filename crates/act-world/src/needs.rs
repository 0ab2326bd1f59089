//! Agent needs and skills.
//!
//! Needs drain every tick at `base_decay × multiplier`, where the
//! multiplier comes from the agent's active activity (hard labour drains
//! energy faster).  Values live in `[0, 100]`; 100 is fully satisfied.

use std::fmt;

// ── NeedKind ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NeedKind {
    Hunger,
    Energy,
    Social,
}

impl NeedKind {
    pub const ALL: [NeedKind; 3] = [NeedKind::Hunger, NeedKind::Energy, NeedKind::Social];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for NeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NeedKind::Hunger => "hunger",
            NeedKind::Energy => "energy",
            NeedKind::Social => "social",
        })
    }
}

// ── Need ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Need {
    pub value:      f32,
    pub low:        f32,
    pub critical:   f32,
    /// Drain per tick at multiplier 1.0.
    pub base_decay: f32,
}

impl Need {
    pub const MAX: f32 = 100.0;

    pub fn new(base_decay: f32) -> Self {
        Self { value: Self::MAX, low: 30.0, critical: 10.0, base_decay }
    }

    pub fn restore(&mut self, amount: f32) {
        self.value = (self.value + amount).clamp(0.0, Self::MAX);
    }

    pub fn decay(&mut self, multiplier: f32) {
        self.value = (self.value - self.base_decay * multiplier).clamp(0.0, Self::MAX);
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self.value <= self.low
    }

    #[inline]
    pub fn is_critical(&self) -> bool {
        self.value <= self.critical
    }
}

// ── Needs ─────────────────────────────────────────────────────────────────────

/// One [`Need`] per [`NeedKind`].
#[derive(Clone, Debug, PartialEq)]
pub struct Needs {
    values: [Need; 3],
}

impl Default for Needs {
    fn default() -> Self {
        Self { values: [Need::new(0.05), Need::new(0.03), Need::new(0.01)] }
    }
}

impl Needs {
    #[inline]
    pub fn get(&self, kind: NeedKind) -> &Need {
        &self.values[kind.slot()]
    }

    #[inline]
    pub fn get_mut(&mut self, kind: NeedKind) -> &mut Need {
        &mut self.values[kind.slot()]
    }

    /// The critical need with the lowest value, if any.
    pub fn most_critical(&self) -> Option<NeedKind> {
        NeedKind::ALL
            .into_iter()
            .filter(|&k| self.get(k).is_critical())
            .min_by(|&a, &b| self.get(a).value.total_cmp(&self.get(b).value))
    }
}

// ── Skill ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Skill {
    Farming,
    Crafting,
    Hauling,
}

impl Skill {
    pub const COUNT: usize = 3;

    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }
}
