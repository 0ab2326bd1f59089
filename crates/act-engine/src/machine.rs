//! Hand-rolled phase × trigger state machine with zone regression.
//!
//! # Zones
//!
//! Phases are grouped into zones.  Interrupting any phase of a zone lands
//! on that zone's single re-entry phase.  Navigation phases are their own
//! entry: they re-enter themselves on both the interrupted and the resumed
//! trigger, which (through the slot-clearing hook in
//! [`StatefulActivity`][crate::StatefulActivity]) throws away the cached
//! route and plans a fresh one from wherever the agent now stands.
//!
//! # Validation
//!
//! [`MachineBuilder::build`] rejects definitions that would stall silently:
//! a phase reachable from the initial phase with no interrupted transition,
//! a phase listed in two zones, or a navigation phase whose self-transitions
//! were overwritten.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{EngineError, EngineResult};

/// Bounds for phase and trigger enums.
pub trait MachineLabel: Copy + Eq + Hash + Debug + Send + 'static {}
impl<X: Copy + Eq + Hash + Debug + Send + 'static> MachineLabel for X {}

// ── StateMachine ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct StateMachine<P, T> {
    phase:       P,
    table:       FxHashMap<(P, T), P>,
    interrupted: T,
    resumed:     T,
}

impl<P: MachineLabel, T: MachineLabel> StateMachine<P, T> {
    #[inline]
    pub fn phase(&self) -> P {
        self.phase
    }

    #[inline]
    pub fn interrupted_trigger(&self) -> T {
        self.interrupted
    }

    #[inline]
    pub fn resumed_trigger(&self) -> T {
        self.resumed
    }

    /// `true` if the current phase has a transition for `trigger`.
    #[inline]
    pub fn can_fire(&self, trigger: T) -> bool {
        self.table.contains_key(&(self.phase, trigger))
    }

    /// Where `trigger` would lead from the current phase.
    pub fn target(&self, trigger: T) -> Option<P> {
        self.table.get(&(self.phase, trigger)).copied()
    }

    /// Take the transition for `trigger` and return the new phase.
    pub fn fire(&mut self, trigger: T) -> EngineResult<P> {
        let to = self.target(trigger).ok_or_else(|| EngineError::NoTransition {
            phase:   format!("{:?}", self.phase),
            trigger: format!("{trigger:?}"),
        })?;
        self.phase = to;
        Ok(to)
    }
}

// ── MachineBuilder ────────────────────────────────────────────────────────────

/// Declarative definition of one behavior type's state machine.
///
/// ```rust,ignore
/// let machine = MachineBuilder::new(Phase::Walk, Trigger::Interrupted, Trigger::Resumed)
///     .navigation(Phase::Walk)
///     .permit(Phase::Walk, Trigger::Arrived, Phase::Work)
///     .zone(&[Phase::Work], Phase::Walk)
///     .build()?;
/// ```
pub struct MachineBuilder<P, T> {
    initial:     P,
    interrupted: T,
    resumed:     T,
    table:       FxHashMap<(P, T), P>,
    zones:       Vec<(Vec<P>, P)>,
    navigation:  Vec<P>,
}

impl<P: MachineLabel, T: MachineLabel> MachineBuilder<P, T> {
    pub fn new(initial: P, interrupted: T, resumed: T) -> Self {
        Self {
            initial,
            interrupted,
            resumed,
            table: FxHashMap::default(),
            zones: Vec::new(),
            navigation: Vec::new(),
        }
    }

    pub fn permit(mut self, from: P, trigger: T, to: P) -> Self {
        self.table.insert((from, trigger), to);
        self
    }

    /// Interrupting any of `phases` regresses to `entry`.
    pub fn zone(mut self, phases: &[P], entry: P) -> Self {
        for &p in phases {
            self.table.insert((p, self.interrupted), entry);
        }
        self.zones.push((phases.to_vec(), entry));
        self
    }

    /// `phase` re-enters itself on both interrupted and resumed.
    pub fn navigation(mut self, phase: P) -> Self {
        self.table.insert((phase, self.interrupted), phase);
        self.table.insert((phase, self.resumed), phase);
        self.navigation.push(phase);
        self
    }

    pub fn build(self) -> EngineResult<StateMachine<P, T>> {
        let mut zoned: FxHashSet<P> = FxHashSet::default();
        for &p in self.zones.iter().flat_map(|(phases, _)| phases).chain(&self.navigation) {
            if !zoned.insert(p) {
                return Err(EngineError::OverlappingZones { phase: format!("{p:?}") });
            }
        }

        for &p in &self.navigation {
            let reenters = |t: T| self.table.get(&(p, t)) == Some(&p);
            if !reenters(self.interrupted) || !reenters(self.resumed) {
                return Err(EngineError::NavigationReentry { phase: format!("{p:?}") });
            }
        }

        for p in self.reachable() {
            if !self.table.contains_key(&(p, self.interrupted)) {
                return Err(EngineError::MissingInterruptTransition { phase: format!("{p:?}") });
            }
        }

        Ok(StateMachine {
            phase:       self.initial,
            table:       self.table,
            interrupted: self.interrupted,
            resumed:     self.resumed,
        })
    }

    /// Breadth-first over the transition table from the initial phase.
    fn reachable(&self) -> Vec<P> {
        let mut seen: FxHashSet<P> = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([self.initial]);
        seen.insert(self.initial);
        while let Some(p) = queue.pop_front() {
            order.push(p);
            for (&(from, _), &to) in &self.table {
                if from == p && seen.insert(to) {
                    queue.push_back(to);
                }
            }
        }
        order
    }
}
