//! Low-frequency oscillator for control-rate parameter modulation.

use std::f64::consts::TAU;

use crate::error::DroneError;

/// A sine LFO mapped onto a [min, max] output range, evaluated lazily
/// against the session clock (no per-sample state).
#[derive(Debug, Clone)]
pub struct Lfo {
    /// One full cycle takes this many seconds.
    pub period: f64,
    pub min: f64,
    pub max: f64,
    started: bool,
    disposed: bool,
}

impl Lfo {
    pub fn new(period: f64, min: f64, max: f64) -> Self {
        Lfo { period, min, max, started: false, disposed: false }
    }

    pub fn start(&mut self) {
        if !self.disposed {
            self.started = true;
        }
    }

    /// The LFO output at clock time `now`. Holds the midpoint when not
    /// started, so connected parameters never jump on start.
    pub fn value_at(&self, now: f64) -> f64 {
        let mid = (self.min + self.max) / 2.0;
        if !self.started || self.disposed || self.period <= 0.0 {
            return mid;
        }
        let span = (self.max - self.min) / 2.0;
        mid + span * (TAU * now / self.period).sin()
    }

    /// Phase-normalised sweep in [0, 1] for cutoff-style targets.
    pub fn sweep_at(&self, now: f64) -> f64 {
        if !self.started || self.disposed || self.period <= 0.0 {
            return 0.5;
        }
        0.5 + 0.5 * (TAU * now / self.period).sin()
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "lfo" });
        }
        self.started = false;
        self.disposed = true;
        Ok(())
    }
}
