//! Pink noise source for the background bed.

use rand::Rng;
use rand_pcg::Pcg32;

use crate::error::DroneError;
use crate::random;

/// A pink noise source (Paul Kellet's economy filter over white noise).
/// Seeded independently of the musical RNG so audio-rate draws never
/// perturb the session's note choices.
#[derive(Debug, Clone)]
pub struct PinkNoise {
    rng: Pcg32,
    b0: f64,
    b1: f64,
    b2: f64,
    started: bool,
    disposed: bool,
}

impl PinkNoise {
    pub fn new(seed: u64) -> Self {
        PinkNoise {
            rng: random::create_rng(random::derive_seed(seed, "noise")),
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
            started: false,
            disposed: false,
        }
    }

    pub fn start(&mut self) {
        if !self.disposed {
            self.started = true;
        }
    }

    pub fn next_sample(&mut self) -> f64 {
        if !self.started || self.disposed {
            return 0.0;
        }
        let white: f64 = self.rng.gen_range(-1.0..1.0);
        self.b0 = 0.99765 * self.b0 + white * 0.0990460;
        self.b1 = 0.96300 * self.b1 + white * 0.2965164;
        self.b2 = 0.57000 * self.b2 + white * 1.0526913;
        // The filter sum can peak past unity on long runs; scale down
        // and clamp to keep the output strictly in [-1, 1].
        let pink = (self.b0 + self.b1 + self.b2 + white * 0.1848) * 0.2;
        pink.clamp(-1.0, 1.0)
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "noise" });
        }
        self.started = false;
        self.disposed = true;
        Ok(())
    }
}
