//! Error types for circuit construction, wiring and persistence

use thiserror::Error;

use crate::component::ComponentId;

/// Result alias used across the crate
pub type CircuitResult<T> = Result<T, CircuitError>;

/// Everything that can go wrong while building, checking or loading a circuit
///
/// `tick()` itself is infallible: a malformed topology degrades to `HiZ`
/// reads instead of erroring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    /// An active component's transitive input graph still contains a
    /// floating slot at `check()` time. Recoverable: rewire and re-check.
    #[error("wiring incomplete: component {id} input {slot} is floating")]
    Wiring { id: ComponentId, slot: usize },

    /// Malformed persisted circuit text; aborts the whole load
    #[error("format error at line {line}: {msg}")]
    Format { line: usize, msg: String },

    /// `ctype` string not present in the catalog
    #[error("unknown component type: {0}")]
    UnknownType(String),

    /// Id does not name a live component in this circuit
    #[error("unknown component: {0}")]
    UnknownComponent(ComponentId),

    /// Input slot index past the component's declared arity
    #[error("component {id} has no input slot {slot}")]
    SlotOutOfRange { id: ComponentId, slot: usize },

    /// Output channel index past the driver's channel count
    #[error("component {id} has no output channel {output}")]
    OutputOutOfRange { id: ComponentId, output: usize },

    /// Malformed `param_string` for the component kind
    #[error("invalid parameters: {0}")]
    BadParams(String),
}

impl CircuitError {
    /// Helper used by the loaders to qualify any error with a line number
    pub(crate) fn at_line(self, line: usize) -> CircuitError {
        match self {
            CircuitError::Format { .. } => self,
            other => CircuitError::Format {
                line,
                msg: other.to_string(),
            },
        }
    }
}
