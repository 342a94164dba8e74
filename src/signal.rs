//! Tri-state signal domain
//!
//! Every pin in the simulator carries one of three values: driven low,
//! driven high, or floating (`HiZ`). Gate bodies coerce `HiZ` to `Zero`
//! so they always produce a defined result; components that need to
//! propagate undefinedness (mux/decoder select lines, memory `Q`, the
//! CONNECTOR wire) check for `HiZ` explicitly before combining.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// Tri-state logic value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    /// Floating / undriven line
    #[default]
    HiZ,
    /// Driven low
    Zero,
    /// Driven high
    One,
}

impl Signal {
    /// True only for a driven-high line
    #[inline]
    pub fn is_one(self) -> bool {
        self == Signal::One
    }

    /// True for a floating line
    #[inline]
    pub fn is_hi_z(self) -> bool {
        self == Signal::HiZ
    }

    /// Boolean view with `HiZ` coerced to false (the gate-body rule)
    #[inline]
    pub fn as_bool(self) -> bool {
        self == Signal::One
    }

    #[inline]
    pub fn from_bool(b: bool) -> Signal {
        if b {
            Signal::One
        } else {
            Signal::Zero
        }
    }

    /// `HiZ` coerced to a driven `Zero`; driven values pass through
    #[inline]
    pub fn defined(self) -> Signal {
        match self {
            Signal::HiZ => Signal::Zero,
            s => s,
        }
    }

    /// Logical complement that preserves `HiZ`
    ///
    /// Used for the `¬Q` channel of memory elements: an undefined stored
    /// bit must read undefined on both channels.
    #[inline]
    pub fn complement(self) -> Signal {
        match self {
            Signal::HiZ => Signal::HiZ,
            Signal::Zero => Signal::One,
            Signal::One => Signal::Zero,
        }
    }

    /// Parse the persistence-format letter (`Z`, `0`, `1`)
    pub fn parse(s: &str) -> Option<Signal> {
        match s {
            "Z" | "z" => Some(Signal::HiZ),
            "0" => Some(Signal::Zero),
            "1" => Some(Signal::One),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::HiZ => write!(f, "Z"),
            Signal::Zero => write!(f, "0"),
            Signal::One => write!(f, "1"),
        }
    }
}

// Gate-style operators: both operands are coerced through the HiZ -> Zero
// rule, so the result is always a driven value.

impl BitAnd for Signal {
    type Output = Signal;

    #[inline]
    fn bitand(self, rhs: Signal) -> Signal {
        Signal::from_bool(self.as_bool() && rhs.as_bool())
    }
}

impl BitOr for Signal {
    type Output = Signal;

    #[inline]
    fn bitor(self, rhs: Signal) -> Signal {
        Signal::from_bool(self.as_bool() || rhs.as_bool())
    }
}

impl BitXor for Signal {
    type Output = Signal;

    #[inline]
    fn bitxor(self, rhs: Signal) -> Signal {
        Signal::from_bool(self.as_bool() ^ rhs.as_bool())
    }
}

impl Not for Signal {
    type Output = Signal;

    #[inline]
    fn not(self) -> Signal {
        Signal::from_bool(!self.as_bool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_operators_on_driven_values() {
        assert_eq!(Signal::One & Signal::One, Signal::One);
        assert_eq!(Signal::One & Signal::Zero, Signal::Zero);
        assert_eq!(Signal::Zero | Signal::One, Signal::One);
        assert_eq!(Signal::Zero | Signal::Zero, Signal::Zero);
        assert_eq!(Signal::One ^ Signal::One, Signal::Zero);
        assert_eq!(Signal::One ^ Signal::Zero, Signal::One);
        assert_eq!(!Signal::One, Signal::Zero);
        assert_eq!(!Signal::Zero, Signal::One);
    }

    #[test]
    fn test_hi_z_coerces_to_zero_in_gates() {
        assert_eq!(Signal::HiZ & Signal::One, Signal::Zero);
        assert_eq!(Signal::HiZ | Signal::One, Signal::One);
        assert_eq!(Signal::HiZ ^ Signal::One, Signal::One);
        assert_eq!(!Signal::HiZ, Signal::One);
    }

    #[test]
    fn test_complement_preserves_hi_z() {
        assert_eq!(Signal::One.complement(), Signal::Zero);
        assert_eq!(Signal::Zero.complement(), Signal::One);
        assert_eq!(Signal::HiZ.complement(), Signal::HiZ);
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        for s in [Signal::HiZ, Signal::Zero, Signal::One] {
            assert_eq!(Signal::parse(&s.to_string()), Some(s));
        }
        assert_eq!(Signal::parse("x"), None);
    }
}
