//! Reverb — a mono Freeverb (parallel combs into serial allpasses) with
//! a control-rate wet level.

use crate::error::DroneError;

/// Comb delay lengths in samples at 44.1 kHz, scaled to the actual rate.
const COMB_TUNINGS: [usize; 8] = [1557, 1617, 1491, 1422, 1277, 1356, 1188, 1116];
const ALLPASS_TUNINGS: [usize; 4] = [225, 556, 441, 341];

#[derive(Debug, Clone)]
struct Comb {
    buffer: Vec<f64>,
    index: usize,
    feedback: f64,
    damp: f64,
    filter_state: f64,
}

impl Comb {
    fn new(len: usize, feedback: f64, damp: f64) -> Self {
        Comb { buffer: vec![0.0; len.max(1)], index: 0, feedback, damp, filter_state: 0.0 }
    }

    fn process(&mut self, input: f64) -> f64 {
        let out = self.buffer[self.index];
        self.filter_state = out * (1.0 - self.damp) + self.filter_state * self.damp;
        self.buffer[self.index] = input + self.filter_state * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        out
    }
}

#[derive(Debug, Clone)]
struct Allpass {
    buffer: Vec<f64>,
    index: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Allpass { buffer: vec![0.0; len.max(1)], index: 0 }
    }

    fn process(&mut self, input: f64) -> f64 {
        let delayed = self.buffer[self.index];
        self.buffer[self.index] = input + delayed * 0.5;
        self.index = (self.index + 1) % self.buffer.len();
        delayed - input
    }
}

/// The shared reverb tail. `wet` is retargeted each block by the session
/// so an external LFO can breathe the room in and out.
#[derive(Debug, Clone)]
pub struct Reverb {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
    pub wet: f64,
    disposed: bool,
}

impl Reverb {
    pub fn new(decay: f64, sample_rate: f64) -> Self {
        let scale = sample_rate / 44100.0;
        // Map the decay time onto comb feedback; 0.85..0.98 covers the
        // useful range without ringing forever.
        let feedback = (0.7 + 0.28 * (decay / 10.0).min(1.0)).min(0.98);
        let combs = COMB_TUNINGS
            .iter()
            .map(|&len| Comb::new((len as f64 * scale) as usize, feedback, 0.3))
            .collect();
        let allpasses = ALLPASS_TUNINGS
            .iter()
            .map(|&len| Allpass::new((len as f64 * scale) as usize))
            .collect();
        Reverb { combs, allpasses, wet: 0.8, disposed: false }
    }

    pub fn set_wet(&mut self, wet: f64) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    /// Returns the wet tail only, already scaled by the wet level.
    pub fn process(&mut self, input: f64) -> f64 {
        if self.disposed {
            return 0.0;
        }
        let mut sum = 0.0;
        for comb in self.combs.iter_mut() {
            sum += comb.process(input);
        }
        let mut out = sum / self.combs.len() as f64;
        for ap in self.allpasses.iter_mut() {
            out = ap.process(out);
        }
        out * self.wet
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "reverb" });
        }
        self.disposed = true;
        for comb in self.combs.iter_mut() {
            comb.buffer.fill(0.0);
            comb.filter_state = 0.0;
        }
        for ap in self.allpasses.iter_mut() {
            ap.buffer.fill(0.0);
        }
        Ok(())
    }
}
