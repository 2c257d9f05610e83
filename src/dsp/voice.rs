//! A single synth voice: one oscillator shaped by an ADSR envelope, with
//! self-contained note scheduling against the session clock.

use crate::error::DroneError;

use super::envelope::Adsr;
use super::oscillator::{Oscillator, Waveform};

/// A single monophonic synth voice. Triggering a note arms the envelope
/// and records the release time; the voice gates itself off when the
/// clock passes it.
#[derive(Debug, Clone)]
pub struct SynthVoice {
    pub oscillator: Oscillator,
    pub envelope: Adsr,
    frequency: f64,
    release_at: Option<f64>,
    disposed: bool,
}

impl SynthVoice {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        SynthVoice {
            oscillator: Oscillator::new(waveform, sample_rate),
            envelope: Adsr::new(sample_rate),
            frequency: 440.0,
            release_at: None,
            disposed: false,
        }
    }

    /// Play at `frequency` Hz for `duration` seconds starting at `time`.
    pub fn trigger_attack_release(&mut self, frequency: f64, duration: f64, time: f64) {
        if self.disposed {
            return;
        }
        self.frequency = frequency;
        self.envelope.gate_on();
        self.release_at = Some(time + duration);
    }

    /// Un-pitched trigger: keep the current frequency, gate for `duration`.
    pub fn trigger_release_only(&mut self, duration: f64, time: f64) {
        if self.disposed {
            return;
        }
        self.envelope.gate_on();
        self.release_at = Some(time + duration);
    }

    pub fn next_sample(&mut self, now: f64) -> f64 {
        if self.disposed {
            return 0.0;
        }
        if let Some(at) = self.release_at {
            if now >= at {
                self.envelope.gate_off();
                self.release_at = None;
            }
        }
        let osc = self.oscillator.next_sample(self.frequency, 0.0);
        osc * self.envelope.next_sample()
    }

    pub fn is_active(&self) -> bool {
        !self.disposed && !self.envelope.is_finished()
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "synth_voice" });
        }
        self.disposed = true;
        self.release_at = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggered_voice_produces_sound_then_gates_off() {
        let mut v = SynthVoice::new(Waveform::Square, 44100.0);
        v.envelope.attack = 0.001;
        v.envelope.decay = 0.0;
        v.envelope.sustain = 1.0;
        v.envelope.release = 0.01;

        v.trigger_attack_release(110.0, 0.05, 0.0);

        let mut peak = 0.0_f64;
        let mut now = 0.0;
        let dt = 1.0 / 44100.0;
        // play through the gate
        for _ in 0..2000 {
            peak = peak.max(v.next_sample(now).abs());
            now += dt;
        }
        assert!(peak > 0.1, "voice should sound during the gate");

        // run well past gate + release
        for _ in 0..8000 {
            v.next_sample(now);
            now += dt;
        }
        assert!(!v.is_active(), "voice should be finished after release");
    }

    #[test]
    fn disposed_voice_is_silent_and_reports_double_dispose() {
        let mut v = SynthVoice::new(Waveform::Square, 44100.0);
        v.trigger_attack_release(220.0, 1.0, 0.0);
        assert!(v.dispose().is_ok());
        assert!(v.dispose().is_err());
        assert_eq!(v.next_sample(0.0), 0.0);
        assert!(!v.is_active());
    }
}
