//! Stateful memory elements (latches and flip-flops)
//!
//! Every element is the composition of a storage rule (SR/JK/D/T) with a
//! clock policy (level- or edge-triggered), held as plain fields instead of
//! an inheritance lattice. Slot layout is uniform: data inputs first, then
//! clock, preset, clear. Preset/clear asynchronously override the clocked
//! path; both asserted at once drive the stored bit to `HiZ`.

use crate::signal::Signal;

/// Synchronous update rule applied on the clock condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageRule {
    /// `Q' = S | (Q & !R)`
    Sr,
    /// `Q' = (!K & Q) | (J & !Q)`
    Jk,
    /// `Q' = D`
    D,
    /// `Q' = Q ^ T`
    T,
}

impl StorageRule {
    /// Number of data input slots ahead of the clock slot
    pub fn data_inputs(self) -> usize {
        match self {
            StorageRule::Sr | StorageRule::Jk => 2,
            StorageRule::D | StorageRule::T => 1,
        }
    }

    /// Next stored bit given the current bit and the data snapshot
    ///
    /// Data lines and the current bit go through the `HiZ -> Zero` rule:
    /// a floating data line behaves as a driven low.
    fn next(self, q: Signal, data: &[Signal]) -> Signal {
        let q = q.as_bool();
        let out = match self {
            StorageRule::Sr => {
                let (s, r) = (data[0].as_bool(), data[1].as_bool());
                s || (q && !r)
            }
            StorageRule::Jk => {
                let (j, k) = (data[0].as_bool(), data[1].as_bool());
                (!k && q) || (j && !q)
            }
            StorageRule::D => data[0].as_bool(),
            StorageRule::T => q ^ data[0].as_bool(),
        };
        Signal::from_bool(out)
    }
}

/// When the clock condition fires for a memory element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPolicy {
    /// Fires every tick the clock line reads `One` (transparent latch)
    Level,
    /// Fires only on a not-`One` to `One` transition (flip-flop)
    Edge,
}

/// One stored bit plus its update machinery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCell {
    rule: StorageRule,
    policy: ClockPolicy,
    stored: Signal,
    /// Clock line as seen on the previous tick (edge detection)
    last_clock: Signal,
}

impl MemoryCell {
    pub fn new(rule: StorageRule, policy: ClockPolicy) -> MemoryCell {
        MemoryCell {
            rule,
            policy,
            stored: Signal::HiZ,
            last_clock: Signal::HiZ,
        }
    }

    pub fn rule(&self) -> StorageRule {
        self.rule
    }

    pub fn policy(&self) -> ClockPolicy {
        self.policy
    }

    /// Total input slots: data, clock, preset, clear
    pub fn arity(&self) -> usize {
        self.rule.data_inputs() + 3
    }

    /// Advance the cell by one tick and return `[Q, !Q]`
    ///
    /// Runs at most once per tick (the circuit's freshness guard), so the
    /// stored bit cannot double-update under re-entrant reads.
    pub(crate) fn step(&mut self, vals: &[Signal]) -> [Signal; 2] {
        let n = self.rule.data_inputs();
        let clock = vals[n];
        // Floating preset/clear lines behave as not asserted
        let preset = vals[n + 1].defined().is_one();
        let clear = vals[n + 2].defined().is_one();

        if preset && clear {
            self.stored = Signal::HiZ;
        } else if preset {
            self.stored = Signal::One;
        } else if clear {
            self.stored = Signal::Zero;
        } else {
            let fire = match self.policy {
                ClockPolicy::Level => clock.is_one(),
                ClockPolicy::Edge => clock.is_one() && !self.last_clock.is_one(),
            };
            if fire {
                self.stored = self.rule.next(self.stored, &vals[..n]);
            }
        }
        self.last_clock = clock;

        [self.stored, self.stored.complement()]
    }

    pub(crate) fn reset(&mut self) {
        self.stored = Signal::HiZ;
        self.last_clock = Signal::HiZ;
    }
}
