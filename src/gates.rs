//! Combinational gate & control library
//!
//! Pure functions of their input snapshot with no internal state. Ordinary
//! gate bodies apply the `HiZ -> Zero` coercion from [`crate::signal`];
//! the multiplexer and decoder instead short-circuit to `HiZ` whenever
//! their enable or any select line is undefined.

use crate::signal::Signal;

/// Stateless gate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOp {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    Not,
    Buffer,
    /// Topology-only routing point: passes `HiZ` through unchanged
    Connector,
}

impl GateOp {
    /// Number of input slots the gate consumes
    pub fn arity(self) -> usize {
        match self {
            GateOp::Not | GateOp::Buffer | GateOp::Connector => 1,
            _ => 2,
        }
    }

    /// Apply the boolean function to the input snapshot
    pub fn apply(self, vals: &[Signal]) -> Signal {
        match self {
            GateOp::And => vals[0] & vals[1],
            GateOp::Or => vals[0] | vals[1],
            GateOp::Xor => vals[0] ^ vals[1],
            GateOp::Nand => !(vals[0] & vals[1]),
            GateOp::Nor => !(vals[0] | vals[1]),
            GateOp::Xnor => !(vals[0] ^ vals[1]),
            GateOp::Not => !vals[0],
            GateOp::Buffer => vals[0].defined(),
            GateOp::Connector => vals[0],
        }
    }
}

/// Binary index formed by MSB-first select lines, or `None` if any is `HiZ`
fn select_index(sels: &[Signal]) -> Option<usize> {
    let mut idx = 0usize;
    for s in sels {
        if s.is_hi_z() {
            return None;
        }
        idx = (idx << 1) | s.as_bool() as usize;
    }
    Some(idx)
}

/// Multiplexer body
///
/// Slot layout: `[enable, data_0 .. data_{2^w - 1}, sel_{w-1} .. sel_0]`
/// with selects MSB first. Enable low reads `Zero`; an undefined enable or
/// select propagates `HiZ` outward instead of guessing a data line.
pub fn mux(width: u32, vals: &[Signal]) -> Signal {
    let lines = 1usize << width;
    let enable = vals[0];
    if enable.is_hi_z() {
        return Signal::HiZ;
    }
    if !enable.is_one() {
        return Signal::Zero;
    }
    match select_index(&vals[1 + lines..1 + lines + width as usize]) {
        Some(idx) => vals[1 + idx],
        None => Signal::HiZ,
    }
}

/// Decoder body: one channel per select combination
///
/// Slot layout: `[enable, sel_{w-1} .. sel_0]`. Same enable/`HiZ`
/// short-circuit rules as the multiplexer, applied to every channel.
pub fn decode(width: u32, vals: &[Signal]) -> Vec<Signal> {
    let lines = 1usize << width;
    let enable = vals[0];
    if enable.is_hi_z() {
        return vec![Signal::HiZ; lines];
    }
    if !enable.is_one() {
        return vec![Signal::Zero; lines];
    }
    match select_index(&vals[1..1 + width as usize]) {
        Some(idx) => {
            let mut out = vec![Signal::Zero; lines];
            out[idx] = Signal::One;
            out
        }
        None => vec![Signal::HiZ; lines],
    }
}

// Segment patterns for hex digits 0..F, bit 0 = segment a .. bit 6 = segment g
const SEGMENT_TABLE: [u8; 16] = [
    0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07,
    0x7f, 0x6f, 0x77, 0x7c, 0x39, 0x5e, 0x79, 0x71,
];

/// Seven-segment decoder body
///
/// The 5-input form carries 4 data bits (MSB first) plus a decimal point;
/// the 8-input form carries 8 data bits of which the low nibble selects the
/// digit. Channels 0..=6 are segments a..g; channel 7 mirrors the last
/// (least-significant) input slot unmodified.
pub fn seven_segment(vals: &[Signal]) -> Vec<Signal> {
    let bits = if vals.len() == 5 { &vals[..4] } else { vals };
    let nibble = &bits[bits.len() - 4..];
    let digit = nibble
        .iter()
        .fold(0usize, |acc, s| (acc << 1) | s.as_bool() as usize);
    let pattern = SEGMENT_TABLE[digit];
    let mut out: Vec<Signal> = (0..7)
        .map(|seg| Signal::from_bool(pattern & (1 << seg) != 0))
        .collect();
    out.push(vals[vals.len() - 1]);
    out
}
