//! Tick-counting clock source
//!
//! The oscillator is the only time-based component: it advances its elapsed
//! counter exactly once per tick (the circuit's freshness guard ensures
//! `step` runs once no matter how many reads happen within the tick) and
//! derives its output from the counter, so repeated queries are idempotent.

use crate::error::{CircuitError, CircuitResult};
use crate::signal::Signal;

/// Free-running square-wave generator
///
/// Parameterized as `low_ticks,period[,phase]`: within each period the
/// output is `Zero` for the first `low_ticks` ticks and `One` for the rest.
/// `phase` offsets the waveform without changing its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oscillator {
    low_ticks: u64,
    period: u64,
    phase: u64,
    elapsed: u64,
}

impl Oscillator {
    /// Default waveform: symmetric, period 2
    pub fn new() -> Oscillator {
        Oscillator { low_ticks: 1, period: 2, phase: 0, elapsed: 0 }
    }

    /// Output for the current tick, then advance the counter
    pub(crate) fn step(&mut self) -> Signal {
        let pos = (self.elapsed + self.phase) % self.period;
        self.elapsed += 1;
        Signal::from_bool(pos >= self.low_ticks)
    }

    pub(crate) fn reset(&mut self) {
        self.elapsed = 0;
    }

    pub fn param_string(&self) -> String {
        if self.phase == 0 {
            format!("{},{}", self.low_ticks, self.period)
        } else {
            format!("{},{},{}", self.low_ticks, self.period, self.phase)
        }
    }

    /// Parse `low_ticks,period[,phase]`
    pub fn set_params(&mut self, params: &str) -> CircuitResult<()> {
        let bad = || CircuitError::BadParams(format!("oscillator expects low_ticks,period[,phase], got {params:?}"));
        let fields: Vec<&str> = params.split(',').collect();
        if fields.len() < 2 || fields.len() > 3 {
            return Err(bad());
        }
        let low_ticks: u64 = fields[0].trim().parse().map_err(|_| bad())?;
        let period: u64 = fields[1].trim().parse().map_err(|_| bad())?;
        let phase: u64 = match fields.get(2) {
            Some(f) => f.trim().parse().map_err(|_| bad())?,
            None => 0,
        };
        if period == 0 || low_ticks == 0 || low_ticks > period {
            return Err(CircuitError::BadParams(format!(
                "oscillator requires 0 < low_ticks <= period, got {low_ticks},{period}"
            )));
        }
        self.low_ticks = low_ticks;
        self.period = period;
        self.phase = phase;
        self.elapsed = 0;
        Ok(())
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}
