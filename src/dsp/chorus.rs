//! Chorus effect — an LFO-modulated delay line used as a wet-only send.

use std::f64::consts::TAU;

use crate::error::DroneError;

/// Maximum modulated delay the line must hold, in seconds.
const MAX_DELAY: f64 = 0.02;

/// A single-voice chorus. The dry path is mixed elsewhere; `process`
/// returns only the wet (delayed) signal.
#[derive(Debug, Clone)]
pub struct Chorus {
    /// Modulation rate in Hz.
    pub frequency: f64,
    /// Centre delay in seconds.
    pub delay_time: f64,
    /// Modulation depth, 0..1 of the centre delay.
    pub depth: f64,

    buffer: Vec<f64>,
    write_index: usize,
    phase: f64,
    sample_rate: f64,
    started: bool,
    disposed: bool,
}

impl Chorus {
    pub fn new(frequency: f64, delay_time: f64, depth: f64, sample_rate: f64) -> Self {
        let capacity = (MAX_DELAY * sample_rate).ceil() as usize + 2;
        Chorus {
            frequency,
            delay_time,
            depth,
            buffer: vec![0.0; capacity],
            write_index: 0,
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
        self.buffer[self.write_index] = input;

        let delay = if self.started {
            self.phase += self.frequency / self.sample_rate;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            self.delay_time * (1.0 + self.depth * (TAU * self.phase).sin())
        } else {
            self.delay_time
        };

        let delay_samples = (delay * self.sample_rate).min(self.buffer.len() as f64 - 2.0);
        let read_pos =
            self.write_index as f64 - delay_samples + self.buffer.len() as f64;
        let i0 = read_pos.floor() as usize % self.buffer.len();
        let i1 = (i0 + 1) % self.buffer.len();
        let frac = read_pos.fract();
        let wet = self.buffer[i0] * (1.0 - frac) + self.buffer[i1] * frac;

        self.write_index = (self.write_index + 1) % self.buffer.len();
        wet
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "chorus" });
        }
        self.started = false;
        self.disposed = true;
        self.buffer.fill(0.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_comes_back_delayed() {
        let sr = 44100.0;
        let mut c = Chorus::new(2.0, 0.0025, 0.5, sr);
        // not started: fixed delay, exact echo position
        let delay_samples = (0.0025 * sr).round() as usize;
        let mut echo_at = None;
        for i in 0..500 {
            let input = if i == 0 { 1.0 } else { 0.0 };
            if c.process(input).abs() > 0.5 {
                echo_at = Some(i);
                break;
            }
        }
        let at: usize = echo_at.unwrap_or(0);
        assert!(
            at.abs_diff(delay_samples) <= 1,
            "echo at {at}, expected ~{delay_samples}"
        );
    }

    #[test]
    fn modulation_keeps_output_bounded() {
        let mut c = Chorus::new(2.0, 0.0025, 0.5, 44100.0);
        c.start();
        for i in 0..44100 {
            let t = i as f64 / 44100.0;
            let wet = c.process((TAU * 220.0 * t).sin());
            assert!(wet.abs() <= 1.001, "chorus output out of range: {wet}");
        }
    }

    #[test]
    fn dispose_silences() {
        let mut c = Chorus::new(2.0, 0.0025, 0.5, 44100.0);
        c.start();
        assert!(c.dispose().is_ok());
        assert!(c.dispose().is_err());
        assert_eq!(c.process(1.0), 0.0);
    }
}
