use thiserror::Error;

/// Programming and definition errors.
///
/// Activity failure is *not* an error: it is [`Lifecycle::Failed`][crate::Lifecycle].
/// These variants mean a behavior was specified or driven incorrectly.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no transition from phase {phase} on trigger {trigger}")]
    NoTransition { phase: String, trigger: String },

    /// A phase reachable from the initial phase has no Interrupted
    /// transition and would stall silently.
    #[error("reachable phase {phase} has no Interrupted transition")]
    MissingInterruptTransition { phase: String },

    #[error("phase {phase} belongs to more than one zone")]
    OverlappingZones { phase: String },

    #[error("navigation phase {phase} must re-enter itself on Interrupted and Resumed")]
    NavigationReentry { phase: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
