//! Catalog mapping `ctype` strings to component construction data
//!
//! The persistence format and the host both name component kinds by a
//! stable string key. Fixed-arity kinds live in a declarative table;
//! `MUX-b` / `DEC-b` encode their bit width in the key itself.

use crate::component::Kind;
use crate::error::{CircuitError, CircuitResult};
use crate::gates::GateOp;
use crate::memory::{ClockPolicy, MemoryCell, StorageRule};
use crate::signal::Signal;
use crate::time::Oscillator;

/// Widest supported mux/decoder (2^6 data lines / channels)
pub const MAX_SELECT_WIDTH: u32 = 6;

/// Fixed-arity catalog entries: key plus a kind constructor
const FIXED: &[(&str, fn() -> Kind)] = &[
    ("AND", || Kind::Gate(GateOp::And)),
    ("OR", || Kind::Gate(GateOp::Or)),
    ("XOR", || Kind::Gate(GateOp::Xor)),
    ("NAND", || Kind::Gate(GateOp::Nand)),
    ("NOR", || Kind::Gate(GateOp::Nor)),
    ("XNOR", || Kind::Gate(GateOp::Xnor)),
    ("NOT", || Kind::Gate(GateOp::Not)),
    ("BUFFER", || Kind::Gate(GateOp::Buffer)),
    ("CONNECTOR", || Kind::Gate(GateOp::Connector)),
    ("CONST", || Kind::Const { value: Signal::HiZ }),
    ("OSC", || Kind::Oscillator(Oscillator::new())),
    ("OUTPUT", || Kind::Output),
    ("SEVENSEG-5", || Kind::SevenSeg { data_bits: 4 }),
    ("SEVENSEG-8", || Kind::SevenSeg { data_bits: 8 }),
    ("SRLATCH", || Kind::Memory(MemoryCell::new(StorageRule::Sr, ClockPolicy::Level))),
    ("JKLATCH", || Kind::Memory(MemoryCell::new(StorageRule::Jk, ClockPolicy::Level))),
    ("DLATCH", || Kind::Memory(MemoryCell::new(StorageRule::D, ClockPolicy::Level))),
    ("TLATCH", || Kind::Memory(MemoryCell::new(StorageRule::T, ClockPolicy::Level))),
    ("SRFLIPFLOP", || Kind::Memory(MemoryCell::new(StorageRule::Sr, ClockPolicy::Edge))),
    ("JKFLIPFLOP", || Kind::Memory(MemoryCell::new(StorageRule::Jk, ClockPolicy::Edge))),
    ("DFLIPFLOP", || Kind::Memory(MemoryCell::new(StorageRule::D, ClockPolicy::Edge))),
    ("TFLIPFLOP", || Kind::Memory(MemoryCell::new(StorageRule::T, ClockPolicy::Edge))),
];

/// Build the kind for a `ctype` key
pub fn from_ctype(ctype: &str) -> CircuitResult<Kind> {
    if let Some((_, build)) = FIXED.iter().find(|(key, _)| *key == ctype) {
        return Ok(build());
    }
    if let Some(width) = parse_width(ctype, "MUX-") {
        return Ok(Kind::Mux { width });
    }
    if let Some(width) = parse_width(ctype, "DEC-") {
        return Ok(Kind::Decoder { width });
    }
    Err(CircuitError::UnknownType(ctype.to_string()))
}

fn parse_width(ctype: &str, prefix: &str) -> Option<u32> {
    let width: u32 = ctype.strip_prefix(prefix)?.parse().ok()?;
    (1..=MAX_SELECT_WIDTH).contains(&width).then_some(width)
}

/// Inverse of [`from_ctype`]
pub fn ctype_of(kind: &Kind) -> String {
    match kind {
        Kind::Gate(op) => match op {
            GateOp::And => "AND",
            GateOp::Or => "OR",
            GateOp::Xor => "XOR",
            GateOp::Nand => "NAND",
            GateOp::Nor => "NOR",
            GateOp::Xnor => "XNOR",
            GateOp::Not => "NOT",
            GateOp::Buffer => "BUFFER",
            GateOp::Connector => "CONNECTOR",
        }
        .to_string(),
        Kind::Const { .. } => "CONST".to_string(),
        Kind::Oscillator(_) => "OSC".to_string(),
        Kind::Mux { width } => format!("MUX-{width}"),
        Kind::Decoder { width } => format!("DEC-{width}"),
        Kind::Output => "OUTPUT".to_string(),
        Kind::SevenSeg { data_bits: 4 } => "SEVENSEG-5".to_string(),
        Kind::SevenSeg { .. } => "SEVENSEG-8".to_string(),
        Kind::Memory(cell) => {
            let rule = match cell.rule() {
                StorageRule::Sr => "SR",
                StorageRule::Jk => "JK",
                StorageRule::D => "D",
                StorageRule::T => "T",
            };
            let policy = match cell.policy() {
                ClockPolicy::Level => "LATCH",
                ClockPolicy::Edge => "FLIPFLOP",
            };
            format!("{rule}{policy}")
        }
    }
}

impl Kind {
    /// Number of input slots
    pub fn arity(&self) -> usize {
        match self {
            Kind::Gate(op) => op.arity(),
            Kind::Const { .. } | Kind::Oscillator(_) => 0,
            Kind::Mux { width } => 1 + (1 << width) + *width as usize,
            Kind::Decoder { width } => 1 + *width as usize,
            Kind::Output => 1,
            Kind::SevenSeg { data_bits: 4 } => 5,
            Kind::SevenSeg { data_bits } => *data_bits,
            Kind::Memory(cell) => cell.arity(),
        }
    }

    /// Number of output channels
    pub fn n_evals(&self) -> usize {
        match self {
            Kind::Decoder { width } => 1 << width,
            Kind::SevenSeg { .. } => 8,
            Kind::Memory(_) => 2,
            _ => 1,
        }
    }

    /// Propagation delay in ticks; memory cells carry one tick so feedback
    /// cycles resolve across tick boundaries
    pub fn delay(&self) -> usize {
        match self {
            Kind::Memory(_) => 1,
            _ => 0,
        }
    }

    /// Active components are scheduled directly by the circuit each tick:
    /// anything with internal state or an externally observed result
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Kind::Oscillator(_) | Kind::Memory(_) | Kind::Output | Kind::SevenSeg { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_fixed_key_round_trips() {
        for (key, _) in FIXED {
            let kind = from_ctype(key).unwrap();
            assert_eq!(ctype_of(&kind), *key);
        }
    }

    #[test]
    fn test_parameterized_keys() {
        let mux = from_ctype("MUX-2").unwrap();
        assert_eq!(mux.arity(), 1 + 4 + 2);
        assert_eq!(mux.n_evals(), 1);
        assert_eq!(ctype_of(&mux), "MUX-2");

        let dec = from_ctype("DEC-3").unwrap();
        assert_eq!(dec.arity(), 4);
        assert_eq!(dec.n_evals(), 8);
        assert_eq!(ctype_of(&dec), "DEC-3");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        for key in ["", "FOO", "MUX-0", "MUX-7", "DEC-", "DEC-x", "and"] {
            assert!(matches!(from_ctype(key), Err(CircuitError::UnknownType(_))), "{key}");
        }
    }

    #[test]
    fn test_memory_arity_and_channels() {
        let sr = from_ctype("SRLATCH").unwrap();
        assert_eq!(sr.arity(), 5); // S, R, clock, preset, clear
        assert_eq!(sr.n_evals(), 2);
        assert_eq!(sr.delay(), 1);
        assert!(sr.is_active());

        let d = from_ctype("DFLIPFLOP").unwrap();
        assert_eq!(d.arity(), 4); // D, clock, preset, clear
    }

    #[test]
    fn test_active_classification() {
        assert!(from_ctype("OSC").unwrap().is_active());
        assert!(from_ctype("OUTPUT").unwrap().is_active());
        assert!(from_ctype("SEVENSEG-5").unwrap().is_active());
        assert!(!from_ctype("AND").unwrap().is_active());
        assert!(!from_ctype("CONST").unwrap().is_active());
        assert!(!from_ctype("MUX-1").unwrap().is_active());
    }
}
