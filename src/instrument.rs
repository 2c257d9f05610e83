//! Instruments — thin adapters binding a synth voice to the mix at a
//! fixed output level, plus the compressed bass specialization.

use crate::dsp::compressor::Compressor;
use crate::dsp::db_to_gain;
use crate::dsp::oscillator::Waveform;
use crate::dsp::voice::SynthVoice;
use crate::error::DroneError;
use crate::theory::Note;

/// One synthesis voice with a fixed output gain in dB. Holds no state
/// beyond the wrapped voice and its level.
#[derive(Debug, Clone)]
pub struct Instrument {
    pub voice: SynthVoice,
    pub output_db: f64,
}

impl Instrument {
    pub fn new(waveform: Waveform, output_db: f64, sample_rate: f64) -> Self {
        Instrument { voice: SynthVoice::new(waveform, sample_rate), output_db }
    }

    /// Trigger a note for `duration` seconds starting at `time`. With no
    /// note the voice keeps its pitch and only gates (un-pitched use).
    pub fn trigger_attack_release(&mut self, note: Option<Note>, duration: f64, time: f64) {
        match note {
            Some(note) => self.voice.trigger_attack_release(note.frequency(), duration, time),
            None => self.voice.trigger_release_only(duration, time),
        }
    }

    pub fn next_sample(&mut self, now: f64) -> f64 {
        self.voice.next_sample(now) * db_to_gain(self.output_db)
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        self.voice.dispose()
    }
}

/// The bass voice: a square wave with near-instant attack, zero decay,
/// full sustain and a one-beat release, compressed hard (threshold
/// -30 dB, ratio 12:1) so it never swamps the swelling upper layers.
/// Output sits at -22 dB.
#[derive(Debug, Clone)]
pub struct FastAttackSquare {
    instrument: Instrument,
    compressor: Compressor,
}

impl FastAttackSquare {
    pub fn new(release: f64, sample_rate: f64) -> Self {
        let mut instrument = Instrument::new(Waveform::Square, -22.0, sample_rate);
        instrument.voice.envelope.attack = 0.02;
        instrument.voice.envelope.decay = 0.0;
        instrument.voice.envelope.sustain = 1.0;
        instrument.voice.envelope.release = release;
        FastAttackSquare {
            instrument,
            compressor: Compressor::new(-30.0, 12.0, sample_rate),
        }
    }

    pub fn trigger(&mut self, note: Note, duration: f64, time: f64) {
        self.instrument.trigger_attack_release(Some(note), duration, time);
    }

    pub fn next_sample(&mut self, now: f64) -> f64 {
        self.compressor.process(self.instrument.next_sample(now))
    }

    pub fn is_active(&self) -> bool {
        self.instrument.voice.is_active()
    }

    // The synth and its compressor are released as separate teardown
    // steps so one failure cannot strand the other.
    pub fn dispose_synth(&mut self) -> Result<(), DroneError> {
        self.instrument.dispose()
    }

    pub fn dispose_compressor(&mut self) -> Result<(), DroneError> {
        self.compressor.dispose()
    }
}
