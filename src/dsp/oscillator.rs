//! Oscillators — a band-limited phase oscillator and the FM voice built
//! from a carrier/modulator pair.

use std::f64::consts::PI;

use crate::error::DroneError;

use super::db_to_gain;
use super::param::{Param, RampCurve};

/// Waveform shapes used by the drone. The stack picks each carrier's
/// timbre at random between the two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    Sine,
    Square,
}

/// A single phase-accumulating oscillator. Square output is PolyBLEP
/// corrected to tame aliasing at the step discontinuities.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator { waveform, phase: 0.0, sample_rate }
    }

    /// Generate the next sample at `frequency` Hz, offsetting the read
    /// phase by `phase_offset` cycles (the FM input).
    pub fn next_sample(&mut self, frequency: f64, phase_offset: f64) -> f64 {
        let inc = frequency / self.sample_rate;
        let read = (self.phase + phase_offset).rem_euclid(1.0);

        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * read).sin(),
            Waveform::Square => {
                let mut v = if read < 0.5 { 1.0 } else { -1.0 };
                v += poly_blep(read, inc);
                v -= poly_blep((read + 0.5) % 1.0, inc);
                v
            }
        };

        self.phase = (self.phase + inc).rem_euclid(1.0);
        sample
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Polynomial band-limited step correction around a discontinuity.
/// `t` is the phase in [0, 1), `dt` the per-sample phase increment.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

/// An FM synthesis voice: a carrier whose phase is modulated by a square
/// modulator at the same frequency, with ramped frequency (Hz,
/// exponential) and volume (dB) parameters.
///
/// Owned exclusively by one drone session; the session connects it to the
/// bus by summing `next_sample` output.
#[derive(Debug, Clone)]
pub struct FmVoice {
    carrier: Oscillator,
    modulator: Oscillator,
    /// Carrier frequency in Hz.
    pub frequency: Param,
    /// Output level in dB.
    pub volume: Param,
    /// Modulator frequency as a multiple of the carrier's.
    pub harmonicity: f64,
    /// Depth of the phase modulation.
    pub modulation_index: f64,
    /// Alternating toggle for the frequency-drift loop.
    pub frequency_change_active: bool,
    /// Alternating toggle for the volume-swell loop.
    pub volume_change_active: bool,
    started: bool,
    disposed: bool,
}

impl FmVoice {
    pub fn new(frequency: f64, volume_db: f64, waveform: Waveform, sample_rate: f64) -> Self {
        FmVoice {
            carrier: Oscillator::new(waveform, sample_rate),
            modulator: Oscillator::new(Waveform::Square, sample_rate),
            frequency: Param::new(frequency),
            volume: Param::new(volume_db),
            harmonicity: 1.0,
            modulation_index: 2.0,
            frequency_change_active: true,
            volume_change_active: true,
            started: false,
            disposed: false,
        }
    }

    pub fn start(&mut self) {
        if !self.disposed {
            self.started = true;
        }
    }

    pub fn stop(&mut self) {
        self.started = false;
    }

    pub fn is_started(&self) -> bool {
        self.started && !self.disposed
    }

    /// Ramp the carrier frequency exponentially to `target` Hz.
    pub fn ramp_frequency(&mut self, target: f64, duration: f64, now: f64) {
        self.frequency.ramp_to(target, duration, now, RampCurve::Exponential);
    }

    /// Ramp the output level to `target_db` over `duration` seconds.
    pub fn ramp_volume(&mut self, target_db: f64, duration: f64, now: f64) {
        self.volume.ramp_to(target_db, duration, now, RampCurve::Linear);
    }

    /// Generate the next sample at clock time `now`. Silent when stopped
    /// or disposed.
    pub fn next_sample(&mut self, now: f64) -> f64 {
        if !self.is_started() {
            return 0.0;
        }
        let freq = self.frequency.value_at(now);
        let m = self.modulator.next_sample(freq * self.harmonicity, 0.0);
        let offset = self.modulation_index * m / (2.0 * PI);
        let c = self.carrier.next_sample(freq, offset);
        c * db_to_gain(self.volume.value_at(now))
    }

    /// Release the voice. Stop/dispose failures are reported so teardown
    /// can count them, never to abort cleanup.
    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "fm_voice" });
        }
        self.started = false;
        self.disposed = true;
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
