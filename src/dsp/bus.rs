//! The master bus: the single gain stage every source feeds, with a
//! rampable level in dB.

use crate::error::DroneError;

use super::db_to_gain;
use super::param::{Param, RampCurve};

/// Default fully-attenuated level; the bus starts here and fades in.
pub const SILENCE_DB: f64 = -100.0;

#[derive(Debug, Clone)]
pub struct Bus {
    pub volume: Param,
    disposed: bool,
}

impl Bus {
    pub fn new() -> Self {
        Bus { volume: Param::new(SILENCE_DB), disposed: false }
    }

    pub fn fade_to(&mut self, target_db: f64, duration: f64, now: f64) {
        if self.disposed {
            return;
        }
        self.volume.ramp_to(target_db, duration, now, RampCurve::Exponential);
    }

    /// Linear gain at clock time `now`.
    pub fn gain_at(&self, now: f64) -> f64 {
        if self.disposed {
            return 0.0;
        }
        db_to_gain(self.volume.value_at(now))
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "bus" });
        }
        self.disposed = true;
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for Bus {
    fn default() -> Self {
        Bus::new()
    }
}
