//! Discrete-time tri-state digital-logic interpreter
//!
//! Evaluates a directed graph of logic components (gates, latches,
//! flip-flops, multiplexers, decoders, displays, clock sources) one tick at
//! a time:
//! - Tri-state signal algebra (`HiZ` / `Zero` / `One`) on every pin
//! - Per-component delay pipeline deferring visibility of computed values
//! - Level- and edge-triggered clock policies for stateful elements,
//!   with asynchronous preset/clear override
//! - Two-phase tick scheduling (invalidate, then evaluate) making per-tick
//!   results independent of component iteration order
//! - Line-based text persistence plus a JSON netlist form
//!
//! Construction goes through the `ctype` catalog:
//!
//! ```
//! use circuit_interpreter::{Circuit, Signal};
//!
//! let mut circuit = Circuit::new();
//! let clock = circuit.add("OSC").unwrap();
//! circuit.set_params(clock, "1,2").unwrap();
//! let probe = circuit.add("OUTPUT").unwrap();
//! circuit.set_input(probe, 0, clock, 0).unwrap();
//!
//! circuit.check().unwrap();
//! circuit.tick();
//! assert_eq!(circuit.evaluate(probe, 0), Ok(Signal::Zero));
//! circuit.tick();
//! assert_eq!(circuit.evaluate(probe, 0), Ok(Signal::One));
//! ```

pub mod catalog;
pub mod circuit;
pub mod component;
pub mod error;
pub mod format;
pub mod gates;
pub mod memory;
pub mod signal;
pub mod time;

pub use circuit::{Circuit, CircuitStats};
pub use component::{Component, ComponentId, Input, Kind};
pub use error::{CircuitError, CircuitResult};
pub use format::{CircuitDef, ComponentDef, PinDef};
pub use gates::GateOp;
pub use memory::{ClockPolicy, MemoryCell, StorageRule};
pub use signal::Signal;
pub use time::Oscillator;
