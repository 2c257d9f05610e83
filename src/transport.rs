//! The shared musical-time clock.
//!
//! Converts measures/beats to seconds at a fixed tempo (4/4 time). The
//! drone scheduler runs entirely off these conversions; there is no
//! per-tick state here beyond the started flag.

/// A musical-time transport with fixed tempo and swing.
#[derive(Debug, Clone)]
pub struct Transport {
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Swing amount (unused by the drone — always zero).
    pub swing: f64,
    started: bool,
}

const BEATS_PER_MEASURE: f64 = 4.0;

impl Transport {
    pub fn new(bpm: f64) -> Self {
        Transport { bpm, swing: 0.0, started: false }
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn stop(&mut self) {
        self.started = false;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Duration of `n` beats in seconds.
    pub fn beats(&self, n: f64) -> f64 {
        n * 60.0 / self.bpm
    }

    /// Duration of `n` measures in seconds (4/4 time).
    pub fn measures(&self, n: f64) -> f64 {
        self.beats(n * BEATS_PER_MEASURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_and_measure_durations_at_70_bpm() {
        let t = Transport::new(70.0);
        assert!((t.beats(1.0) - 60.0 / 70.0).abs() < 1e-12);
        assert!((t.measures(1.0) - 4.0 * 60.0 / 70.0).abs() < 1e-12);
        // "+2:2:0" style offset: 2 measures + 2 beats
        let offset = t.measures(2.0) + t.beats(2.0);
        assert!((offset - 10.0 * 60.0 / 70.0).abs() < 1e-12);
    }

    #[test]
    fn start_stop_flag() {
        let mut t = Transport::new(70.0);
        assert!(!t.is_started());
        t.start();
        assert!(t.is_started());
        t.stop();
        assert!(!t.is_started());
    }
}
