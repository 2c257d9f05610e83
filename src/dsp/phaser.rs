//! Phaser effect: a chain of swept first-order allpass stages, wet-only.

use std::f64::consts::{PI, TAU};

use crate::error::DroneError;

const STAGES: usize = 4;

/// A slow phaser. An LFO sweeps the allpass corner between
/// `base_frequency` and a few octaves above it; `process` returns the
/// phase-shifted signal for the send bus to blend.
#[derive(Debug, Clone)]
pub struct Phaser {
    /// Sweep rate in Hz.
    pub frequency: f64,
    pub base_frequency: f64,
    pub octaves: f64,

    state: [f64; STAGES],
    phase: f64,
    sample_rate: f64,
    started: bool,
    disposed: bool,
}

impl Phaser {
    pub fn new(frequency: f64, sample_rate: f64) -> Self {
        Phaser {
            frequency,
            base_frequency: 350.0,
            octaves: 3.0,
            state: [0.0; STAGES],
            phase: 0.0,
            sample_rate,
            started: false,
            disposed: false,
        }
    }

    pub fn start(&mut self) {
        if !self.disposed {
            self.started = true;
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.disposed {
            return 0.0;
        }
        let corner = if self.started {
            self.phase += self.frequency / self.sample_rate;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            let sweep = 0.5 + 0.5 * (TAU * self.phase).sin();
            self.base_frequency * (2.0_f64).powf(self.octaves * sweep)
        } else {
            self.base_frequency
        };

        // First-order allpass coefficient for the swept corner.
        let tan_half = (PI * corner / self.sample_rate).min(1.5).tan();
        let a = (tan_half - 1.0) / (tan_half + 1.0);

        let mut x = input;
        for z in self.state.iter_mut() {
            let y = a * x + *z;
            *z = x - a * y;
            x = y;
        }
        x
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "phaser" });
        }
        self.started = false;
        self.disposed = true;
        self.state = [0.0; STAGES];
        Ok(())
    }
}
