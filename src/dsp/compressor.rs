//! Dynamics compressor for the bass channel.

use crate::error::DroneError;

use super::{db_to_gain, gain_to_db};

/// A hard-knee feed-forward compressor with an exponential envelope
/// follower.
#[derive(Debug, Clone)]
pub struct Compressor {
    /// Level in dB above which gain reduction applies.
    pub threshold: f64,
    /// Input dB per output dB above the threshold.
    pub ratio: f64,

    attack_coeff: f64,
    release_coeff: f64,
    envelope: f64,
    disposed: bool,
}

impl Compressor {
    pub fn new(threshold: f64, ratio: f64, sample_rate: f64) -> Self {
        let attack = 0.003;
        let release = 0.25;
        Compressor {
            threshold,
            ratio,
            attack_coeff: (-1.0 / (attack * sample_rate)).exp(),
            release_coeff: (-1.0 / (release * sample_rate)).exp(),
            envelope: 0.0,
            disposed: false,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.disposed {
            return 0.0;
        }
        let rectified = input.abs();
        let coeff = if rectified > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = rectified + coeff * (self.envelope - rectified);

        let level_db = gain_to_db(self.envelope);
        let over = level_db - self.threshold;
        if over <= 0.0 {
            return input;
        }
        let reduction_db = over - over / self.ratio;
        input * db_to_gain(-reduction_db)
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "compressor" });
        }
        self.disposed = true;
        self.envelope = 0.0;
        Ok(())
    }
}
