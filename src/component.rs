//! Component core: identity, input slots and the delay pipeline
//!
//! A component is a flat struct dispatching on a [`Kind`] enum instead of a
//! trait-object hierarchy. The circuit owns every component in an arena and
//! hands out [`ComponentId`] handles; rewiring a slot is immediately visible
//! to every reader because nothing ever caches a slot's resolution.

use std::collections::VecDeque;
use std::fmt;

use crate::catalog;
use crate::error::{CircuitError, CircuitResult};
use crate::gates::GateOp;
use crate::memory::MemoryCell;
use crate::signal::Signal;
use crate::time::Oscillator;

/// Stable handle to a component inside a circuit
///
/// Assigned monotonically by the owning circuit; never reused, so a stale
/// handle fails lookup instead of aliasing a newer component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One input slot: either wired to a driver's output channel, or floating
///
/// A floating slot always reads `HiZ`. This sum type replaces a shared
/// null-sentinel component; wiring completeness is enforced separately by
/// `Circuit::check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Connected { driver: ComponentId, output: usize },
    Floating,
}

/// Concrete component behavior, selected at construction from the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Stateless combinational gate (AND family, NOT, BUFFER, CONNECTOR)
    Gate(GateOp),
    /// Constant source; the value is its `param_string`
    Const { value: Signal },
    /// Free-running clock generator
    Oscillator(Oscillator),
    /// Multiplexer: enable + 2^width data + width select lines
    Mux { width: u32 },
    /// Decoder: enable + width select lines, 2^width output channels
    Decoder { width: u32 },
    /// Observable single-line sink
    Output,
    /// Seven-segment display decoder over `data_bits` binary inputs
    SevenSeg { data_bits: usize },
    /// Latch / flip-flop storage cell
    Memory(MemoryCell),
}

/// A simulated component: behavior, wiring and the delay pipeline
#[derive(Debug, Clone)]
pub struct Component {
    id: ComponentId,
    kind: Kind,
    /// Ordered input slots, length fixed to the kind's arity
    inputs: Vec<Input>,
    /// Delay pipeline: front = most recently computed vector, back = the
    /// externally visible vector (computed `delay` ticks ago)
    history: VecDeque<Vec<Signal>>,
    /// Set once the logic function has run this tick; cleared by the
    /// scheduler's first pass
    fresh: bool,
}

impl Component {
    pub(crate) fn new(id: ComponentId, kind: Kind) -> Component {
        let arity = kind.arity();
        let delay = kind.delay();
        let n_evals = kind.n_evals();
        let mut history = VecDeque::with_capacity(delay + 1);
        for _ in 0..delay + 1 {
            history.push_back(vec![Signal::HiZ; n_evals]);
        }
        Component {
            id,
            kind,
            inputs: vec![Input::Floating; arity],
            history,
            fresh: false,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Stable string key naming the concrete kind (persistence, factory)
    pub fn ctype(&self) -> String {
        catalog::ctype_of(&self.kind)
    }

    /// Number of input slots
    pub fn arity(&self) -> usize {
        self.kind.arity()
    }

    /// Number of independently readable output channels
    pub fn n_evals(&self) -> usize {
        self.kind.n_evals()
    }

    /// Ticks between an internal state change and its external visibility
    pub fn delay(&self) -> usize {
        self.kind.delay()
    }

    /// Whether the scheduler drives this component directly each tick
    pub fn is_active(&self) -> bool {
        self.kind.is_active()
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub(crate) fn set_input(&mut self, slot: usize, input: Input) -> CircuitResult<()> {
        match self.inputs.get_mut(slot) {
            Some(s) => {
                *s = input;
                Ok(())
            }
            None => Err(CircuitError::SlotOutOfRange { id: self.id, slot }),
        }
    }

    /// Drop every wire fed by `driver` (used when `driver` is removed)
    pub(crate) fn disconnect_driver(&mut self, driver: ComponentId) {
        for slot in &mut self.inputs {
            if matches!(slot, Input::Connected { driver: d, .. } if *d == driver) {
                *slot = Input::Floating;
            }
        }
    }

    /// Non-topological configuration as a string (persistence field 3)
    pub fn param_string(&self) -> String {
        match &self.kind {
            Kind::Const { value } => value.to_string(),
            Kind::Oscillator(osc) => osc.param_string(),
            _ => String::new(),
        }
    }

    /// Apply a `param_string`; errors on malformed input or on a non-empty
    /// string for a kind that takes no parameters
    pub fn set_params(&mut self, params: &str) -> CircuitResult<()> {
        match &mut self.kind {
            Kind::Const { value } => {
                *value = Signal::parse(params).ok_or_else(|| {
                    CircuitError::BadParams(format!("constant value must be Z, 0 or 1, got {params:?}"))
                })?;
                Ok(())
            }
            Kind::Oscillator(osc) => osc.set_params(params),
            _ if params.is_empty() => Ok(()),
            kind => Err(CircuitError::BadParams(format!(
                "component type {} takes no parameters",
                catalog::ctype_of(kind)
            ))),
        }
    }

    /// Currently visible value of output channel `out`; never recomputes
    pub fn evaluate(&self, out: usize) -> CircuitResult<Signal> {
        if out >= self.n_evals() {
            return Err(CircuitError::OutputOutOfRange { id: self.id, output: out });
        }
        Ok(self.visible(out))
    }

    /// Visible value without range checking (floating -> `HiZ` fallback)
    ///
    /// An empty pipeline means this component is mid-recompute with delay 0,
    /// i.e. a combinational loop; it reads as `HiZ` rather than erroring.
    pub(crate) fn visible(&self, out: usize) -> Signal {
        self.history
            .back()
            .and_then(|v| v.get(out).copied())
            .unwrap_or(Signal::HiZ)
    }

    pub(crate) fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub(crate) fn clear_fresh(&mut self) {
        self.fresh = false;
    }

    /// Begin this tick's recompute: mark fresh and drop the oldest pipeline
    /// slot so re-entrant reads observe the previous tick's value
    pub(crate) fn begin_recompute(&mut self) {
        self.fresh = true;
        self.history.pop_back();
    }

    /// Finish the recompute by pushing the newly computed vector
    pub(crate) fn finish_recompute(&mut self, outputs: Vec<Signal>) {
        debug_assert_eq!(outputs.len(), self.n_evals());
        self.history.push_front(outputs);
    }

    /// Run the kind's logic function over the resolved input values
    ///
    /// Called at most once per tick per component (freshness guard in the
    /// circuit); this is the only place component state mutates.
    pub(crate) fn compute(&mut self, vals: &[Signal]) -> Vec<Signal> {
        match &mut self.kind {
            Kind::Gate(op) => vec![op.apply(vals)],
            Kind::Const { value } => vec![*value],
            Kind::Oscillator(osc) => vec![osc.step()],
            Kind::Mux { width } => vec![crate::gates::mux(*width, vals)],
            Kind::Decoder { width } => crate::gates::decode(*width, vals),
            Kind::Output => vec![vals[0]],
            Kind::SevenSeg { .. } => crate::gates::seven_segment(vals),
            Kind::Memory(cell) => cell.step(vals).to_vec(),
        }
    }

    /// Restore the quiescent state: pipeline all `HiZ`, elapsed ticks zero,
    /// stored bit undefined. Wiring is untouched.
    pub(crate) fn reset(&mut self) {
        let n_evals = self.n_evals();
        for vec in &mut self.history {
            vec.iter_mut().for_each(|s| *s = Signal::HiZ);
        }
        while self.history.len() < self.delay() + 1 {
            self.history.push_back(vec![Signal::HiZ; n_evals]);
        }
        self.fresh = false;
        match &mut self.kind {
            Kind::Oscillator(osc) => osc.reset(),
            Kind::Memory(cell) => cell.reset(),
            _ => {}
        }
    }
}
