//! The drone orchestrator — builds the oscillator stack, effects chain
//! and periodic modulation processes for one generative session, and
//! tears the whole thing down again on stop.
//!
//! A session is created by [`play`](DroneSession::play) and owns every
//! node it creates; nothing is shared between sessions. All scheduling
//! runs off the sample clock at render-block granularity, so tests
//! advance time by rendering rather than sleeping.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::dsp::bus::{Bus, SILENCE_DB};
use crate::dsp::chorus::Chorus;
use crate::dsp::db_to_gain;
use crate::dsp::filter::AutoFilter;
use crate::dsp::lfo::Lfo;
use crate::dsp::noise::PinkNoise;
use crate::dsp::oscillator::{FmVoice, Waveform};
use crate::dsp::phaser::Phaser;
use crate::dsp::reverb::Reverb;
use crate::error::DroneError;
use crate::instrument::FastAttackSquare;
use crate::random;
use crate::theory::{self, Note, Tonic};
use crate::transport::Transport;

use rand::Rng;
use rand_pcg::Pcg32;

/// Scheduler granularity in samples; matches the render quantum of the
/// browser's audio worklet.
const BLOCK: usize = 128;

/// Voice index of the dedicated harmony voice.
const HARMONY: usize = 0;

/// Resting level for voices that are built quiet and faded up later.
const QUIET_DB: f64 = -50.0;
/// Floor the volume swell ramps voices down to.
const SWELL_FLOOR_DB: f64 = -100.0;
/// Level the swell's featured voice comes back up to.
const SWELL_PEAK_DB: f64 = -6.0;
/// Level the harmony voice is raised to each cycle.
const HARMONY_PEAK_DB: f64 = -4.0;
/// Size of one frequency-drift step, in semitones.
const DRIFT_SEMITONES: f64 = 0.125;

/// Send levels into the shared wet effects.
const CHORUS_SEND: f64 = 0.5;
const PHASER_SEND: f64 = 0.5;

/// Session parameters. Everything random in a session derives from
/// `seed`, so a fixed seed replays the same composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    pub seed: u64,
    pub sample_rate: f64,
    /// Transport tempo in beats per minute.
    pub bpm: f64,
    pub swing: f64,
    /// Bus level the fade-in settles at, in dB.
    pub fade_in_db: f64,
    pub fade_in_secs: f64,
    pub fade_out_secs: f64,
    /// Delay from stop to resource release; slightly longer than the
    /// fade-out so nothing is freed while still audible.
    pub release_delay_secs: f64,
}

impl Default for DroneConfig {
    fn default() -> Self {
        DroneConfig {
            seed: 0,
            sample_rate: 44100.0,
            bpm: 70.0,
            swing: 0.0,
            fade_in_db: -32.0,
            fade_in_secs: 2.0,
            fade_out_secs: 3.0,
            release_delay_secs: 3.2,
        }
    }
}

/// The five periodic modulation processes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopKind {
    FrequencyDrift,
    VolumeSwell,
    ExtraFeature,
    HarmonyCycle,
    BassPattern,
}

/// One repeating scheduled process. Deactivating only stops future
/// firings; the handle itself is released at teardown.
#[derive(Debug, Clone)]
struct ModulationLoop {
    kind: LoopKind,
    interval: f64,
    next_fire: f64,
    active: bool,
    disposed: bool,
}

impl ModulationLoop {
    /// The first callback waits one full interval, so nothing modulates
    /// the stack while the bus is still fading in.
    fn new(kind: LoopKind, interval: f64) -> Self {
        ModulationLoop { kind, interval, next_fire: interval, active: true, disposed: false }
    }

    /// The bass pattern plays its first step right away.
    fn starting_now(kind: LoopKind, interval: f64) -> Self {
        ModulationLoop { next_fire: 0.0, ..ModulationLoop::new(kind, interval) }
    }

    fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "modulation_loop" });
        }
        self.active = false;
        self.disposed = true;
        Ok(())
    }
}

/// Deferred single actions scheduled by the loops and by teardown.
#[derive(Debug, Clone, Copy)]
enum OneShotAction {
    /// Raise one featured extra voice to full level.
    FeatureRampUp { voice: usize },
    /// Fade the harmony voice back down to its resting level.
    HarmonyRampDown,
    /// Final teardown: dispose every node the session owns.
    ReleaseResources,
}

#[derive(Debug, Clone, Copy)]
struct OneShot {
    at: f64,
    action: OneShotAction,
}

/// Outcome of the teardown pass: how many node disposals were attempted
/// and how many reported a failure. Failures never abort the pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisposeReport {
    pub attempted: usize,
    pub failed: usize,
}

/// One running drone session. Owns its voices, effects, loops and bus;
/// renders into caller-provided buffers via [`process`](Self::process).
#[derive(Debug)]
pub struct DroneSession {
    config: DroneConfig,
    rng: Pcg32,
    walk_rng: Pcg32,
    transport: Transport,

    root: &'static str,
    scale_name: &'static str,

    bus: Bus,
    voices: Vec<FmVoice>,
    with_volume_change: Vec<usize>,
    extra: Vec<usize>,

    harmony_notes: VecDeque<Note>,
    bass_notes: Vec<Note>,
    bass_index: usize,
    bass: FastAttackSquare,

    chorus: Chorus,
    phaser: Phaser,
    reverb: Reverb,
    reverb_wet: Lfo,
    noise: PinkNoise,
    noise_filter: AutoFilter,
    noise_level: Lfo,

    loops: Vec<ModulationLoop>,
    one_shots: Vec<OneShot>,

    samples_rendered: u64,
    stopping: bool,
    disposed: bool,
    dispose_report: Option<DisposeReport>,
}

impl DroneSession {
    /// Build and start a session: fade the bus in, pick the session's
    /// root and scale, raise the ten-voice stack, the bass pattern, the
    /// noise bed and the five modulation loops.
    pub fn play(config: DroneConfig) -> Result<DroneSession, DroneError> {
        let mut rng = random::create_rng(config.seed);
        let mut walk_rng = random::create_rng(random::derive_seed(config.seed, "walk"));

        let mut transport = Transport::new(config.bpm);
        transport.swing = config.swing;
        transport.start();

        let root = theory::random_root_note(&mut rng);
        let scale = theory::random_scale_type(&mut rng);
        log::info!("drone session: root {root}, scale {}", scale.name);

        // Upper-voice material spans two octaves above the root; the
        // harmony pool sits one octave above its base, in shuffled
        // order; the bass owns the lowest octave.
        let osc_scale = theory::notes_from_scale(Tonic::Name(root), scale.intervals, 2, 3)?;
        let mut harmony_pool =
            theory::notes_from_scale(Tonic::Name(root), scale.intervals, 3, 3)?;
        random::shuffle(&mut rng, &mut harmony_pool);
        let bass_notes = theory::notes_from_scale(Tonic::Name(root), scale.intervals, 1, 1)?;

        let sr = config.sample_rate;
        // The stack is rooted two octaves below the scale material, so
        // the root and its doublings fill octaves 0 through 2.
        let root_note = osc_scale[0].transpose(-24);

        let mut bus = Bus::new();
        bus.fade_to(config.fade_in_db, config.fade_in_secs, 0.0);

        let mut voices = Vec::with_capacity(10);
        // harmony voice: tuned to the root, waiting quiet
        voices.push(FmVoice::new(
            root_note.frequency(),
            QUIET_DB,
            pick_waveform(&mut rng),
            sr,
        ));
        // root and its two octave doublings, at full level
        for semitones in [0, 12, 24] {
            voices.push(FmVoice::new(
                root_note.transpose(semitones).frequency(),
                0.0,
                pick_waveform(&mut rng),
                sr,
            ));
        }
        // every other scale step from the 3rd up, quiet until featured
        for index in [3usize, 5, 7, 9, 11, 13] {
            voices.push(FmVoice::new(
                step_note(&osc_scale, index).frequency(),
                QUIET_DB,
                pick_waveform(&mut rng),
                sr,
            ));
        }
        for voice in voices.iter_mut() {
            voice.start();
        }

        let bass = FastAttackSquare::new(transport.beats(1.0), sr);
        let bass_index = random::pick_index(&mut walk_rng, bass_notes.len());

        let mut chorus = Chorus::new(2.0, 0.0025, 0.5, sr);
        chorus.start();
        let mut phaser = Phaser::new(0.2, sr);
        phaser.start();
        let reverb = Reverb::new(10.0, sr);
        let mut reverb_wet = Lfo::new(transport.measures(7.0), 0.7, 0.9);
        reverb_wet.start();

        let mut noise = PinkNoise::new(config.seed);
        noise.start();
        let mut noise_filter = AutoFilter::new(transport.measures(8.0), 800.0, 4.0, sr);
        noise_filter.start();
        let mut noise_level = Lfo::new(transport.measures(9.0), -22.0, -18.0);
        noise_level.start();

        let loops = vec![
            ModulationLoop::new(LoopKind::FrequencyDrift, transport.measures(4.0)),
            ModulationLoop::new(LoopKind::VolumeSwell, transport.measures(3.0)),
            ModulationLoop::new(LoopKind::ExtraFeature, transport.measures(6.0)),
            ModulationLoop::new(LoopKind::HarmonyCycle, transport.measures(7.0)),
            ModulationLoop::starting_now(LoopKind::BassPattern, transport.measures(4.0)),
        ];

        Ok(DroneSession {
            config,
            rng,
            walk_rng,
            transport,
            root,
            scale_name: scale.name,
            bus,
            voices,
            with_volume_change: vec![1, 2, 3, 4],
            extra: vec![5, 6, 7, 8, 9],
            harmony_notes: harmony_pool.into(),
            bass_notes,
            bass_index,
            bass,
            chorus,
            phaser,
            reverb,
            reverb_wet,
            noise,
            noise_filter,
            noise_level,
            loops,
            one_shots: Vec::new(),
            samples_rendered: 0,
            stopping: false,
            disposed: false,
            dispose_report: None,
        })
    }

    /// Begin teardown. Idempotent: the second and later calls do
    /// nothing. Loops stop scheduling immediately, the bus fades out,
    /// and resource release fires after `release_delay_secs`.
    pub fn stop(&mut self) {
        if self.stopping {
            return;
        }
        self.stopping = true;
        let now = self.clock();
        for modulation in self.loops.iter_mut() {
            modulation.active = false;
        }
        self.bus.fade_to(SILENCE_DB, self.config.fade_out_secs, now);
        self.one_shots.push(OneShot {
            at: now + self.config.release_delay_secs,
            action: OneShotAction::ReleaseResources,
        });
        log::debug!(
            "drone stopping: {}s fade, release at +{}s",
            self.config.fade_out_secs,
            self.config.release_delay_secs
        );
    }

    /// Render into `out`, advancing the session clock by its length.
    /// Scheduling runs at block boundaries; a disposed session renders
    /// silence.
    pub fn process(&mut self, out: &mut [f32]) {
        let sr = self.config.sample_rate;
        for chunk in out.chunks_mut(BLOCK) {
            let now = self.clock();
            if !self.disposed {
                self.run_scheduler(now);
            }
            if self.disposed {
                chunk.fill(0.0);
                self.samples_rendered += chunk.len() as u64;
                continue;
            }

            self.noise_filter.update(now);
            self.reverb.set_wet(self.reverb_wet.value_at(now));
            let noise_gain = db_to_gain(self.noise_level.value_at(now));
            let bus_gain = self.bus.gain_at(now);

            let mut t = now;
            let dt = 1.0 / sr;
            for sample in chunk.iter_mut() {
                let mut dry = 0.0;
                for voice in self.voices.iter_mut() {
                    dry += voice.next_sample(t);
                }
                let chorus_wet = self.chorus.process(dry);
                let phaser_wet = self.phaser.process(dry);
                let reverb_wet = self.reverb.process(dry);
                let bed = self.noise_filter.process(self.noise.next_sample()) * noise_gain;
                let bass = self.bass.next_sample(t);

                let mix = dry
                    + CHORUS_SEND * chorus_wet
                    + PHASER_SEND * phaser_wet
                    + reverb_wet
                    + bed
                    + bass;
                *sample = (mix * bus_gain).tanh() as f32;
                t += dt;
            }
            self.samples_rendered += chunk.len() as u64;
        }
    }

    /// Session time in seconds: samples rendered so far over the sample
    /// rate. Always advances while the host keeps rendering, which is
    /// what guarantees the delayed release fires even after the
    /// transport stops.
    fn clock(&self) -> f64 {
        self.samples_rendered as f64 / self.config.sample_rate
    }

    fn run_scheduler(&mut self, now: f64) {
        let mut due_loops = Vec::new();
        for modulation in self.loops.iter_mut() {
            if modulation.active && !modulation.disposed && now >= modulation.next_fire {
                due_loops.push(modulation.kind);
                modulation.next_fire += modulation.interval;
            }
        }
        for kind in due_loops {
            match kind {
                LoopKind::FrequencyDrift => self.drift_frequency(now),
                LoopKind::VolumeSwell => self.swell_volumes(now),
                LoopKind::ExtraFeature => self.feature_extra(now),
                LoopKind::HarmonyCycle => self.cycle_harmony(now),
                LoopKind::BassPattern => self.step_bass(now),
            }
        }

        let mut due_shots = Vec::new();
        self.one_shots.retain(|shot| {
            if now >= shot.at {
                due_shots.push(shot.action);
                false
            } else {
                true
            }
        });
        for action in due_shots {
            match action {
                OneShotAction::FeatureRampUp { voice } => {
                    let duration = self.transport.measures(1.0);
                    self.voices[voice].ramp_volume(0.0, duration, now);
                }
                OneShotAction::HarmonyRampDown => {
                    let duration = self.transport.measures(1.0);
                    self.voices[HARMONY].ramp_volume(QUIET_DB, duration, now);
                }
                OneShotAction::ReleaseResources => {
                    let report = self.dispose_all();
                    self.dispose_report = Some(report);
                    self.disposed = true;
                    self.transport.stop();
                    log::debug!(
                        "drone released: {} disposals, {} failed",
                        report.attempted,
                        report.failed
                    );
                }
            }
        }
    }

    /// Nudge one random voice's pitch by an eighth of a semitone over
    /// two beats. Direction alternates per voice, so each voice wanders
    /// around its tuning instead of walking away from it.
    fn drift_frequency(&mut self, now: f64) {
        let duration = self.transport.beats(2.0);
        let index = random::pick_index(&mut self.rng, self.voices.len());
        let voice = &mut self.voices[index];
        let up = voice.frequency_change_active;
        voice.frequency_change_active = !up;
        let semitones = if up { DRIFT_SEMITONES } else { -DRIFT_SEMITONES };
        let target = voice.frequency.target() * (2.0_f64).powf(semitones / 12.0);
        voice.ramp_frequency(target, duration, now);
    }

    /// Sink every swell-eligible voice to the floor, then bring one
    /// randomly chosen voice back up. The featured voice's up-ramp
    /// replaces its floor ramp, so exactly one survives each cycle.
    fn swell_volumes(&mut self, now: f64) {
        let duration = self.transport.measures(1.0);
        for &index in &self.with_volume_change {
            self.voices[index].ramp_volume(SWELL_FLOOR_DB, duration, now);
        }
        let pick = self.with_volume_change
            [random::pick_index(&mut self.rng, self.with_volume_change.len())];
        self.voices[pick].ramp_volume(SWELL_PEAK_DB, duration, now);
    }

    /// Spotlight one extra voice: duck the rest now, and schedule the
    /// pick's rise to full level two measures and two beats into the
    /// cycle.
    fn feature_extra(&mut self, now: f64) {
        let duration = self.transport.measures(1.0);
        let pick = self.extra[random::pick_index(&mut self.rng, self.extra.len())];
        for &index in &self.extra {
            if index != pick {
                self.voices[index].ramp_volume(QUIET_DB, duration, now);
            }
        }
        self.one_shots.push(OneShot {
            at: now + self.transport.measures(2.0) + self.transport.beats(2.0),
            action: OneShotAction::FeatureRampUp { voice: pick },
        });
    }

    /// Rotate the harmony queue: retune the harmony voice to the front
    /// note, raise it, schedule its fall two measures out, and requeue
    /// the note at the back.
    fn cycle_harmony(&mut self, now: f64) {
        let Some(note) = self.harmony_notes.pop_front() else {
            return;
        };
        let duration = self.transport.measures(1.0);
        let harmony = &mut self.voices[HARMONY];
        harmony.frequency.set(note.frequency());
        harmony.ramp_volume(HARMONY_PEAK_DB, duration, now);
        self.one_shots.push(OneShot {
            at: now + self.transport.measures(2.0),
            action: OneShotAction::HarmonyRampDown,
        });
        self.harmony_notes.push_back(note);
    }

    /// Advance the bass random walk one adjacent step (clamped at the
    /// range ends) and trigger the bass for the step's duration.
    fn step_bass(&mut self, now: f64) {
        if self.bass_notes.is_empty() {
            return;
        }
        let last = self.bass_notes.len() as i32 - 1;
        let step = if self.walk_rng.gen_bool(0.5) { 1 } else { -1 };
        self.bass_index = (self.bass_index as i32 + step).clamp(0, last) as usize;
        let note = self.bass_notes[self.bass_index];
        let duration = self.transport.measures(4.0);
        self.bass.trigger(note, duration, now);
    }

    /// Dispose every node the session owns, counting attempts and
    /// failures. A failed disposal is logged and skipped, never fatal.
    fn dispose_all(&mut self) -> DisposeReport {
        let mut report = DisposeReport::default();
        let mut track = |result: Result<(), DroneError>| {
            report.attempted += 1;
            if let Err(e) = result {
                report.failed += 1;
                log::warn!("teardown: {e}");
            }
        };

        for voice in self.voices.iter_mut() {
            if voice.is_started() {
                voice.stop();
            }
            track(voice.dispose());
        }
        track(self.noise.dispose());
        track(self.noise_filter.dispose());
        track(self.noise_level.dispose());
        track(self.reverb_wet.dispose());
        for modulation in self.loops.iter_mut() {
            track(modulation.dispose());
        }
        track(self.chorus.dispose());
        track(self.reverb.dispose());
        track(self.phaser.dispose());
        track(self.bass.dispose_synth());
        track(self.bass.dispose_compressor());
        track(self.bus.dispose());

        self.one_shots.clear();
        report
    }

    pub fn root(&self) -> &'static str {
        self.root
    }

    pub fn scale_name(&self) -> &'static str {
        self.scale_name
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose_report(&self) -> Option<DisposeReport> {
        self.dispose_report
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_started()).count()
    }
}

fn pick_waveform(rng: &mut Pcg32) -> Waveform {
    if rng.gen_bool(0.5) {
        Waveform::Sine
    } else {
        Waveform::Square
    }
}

/// Scale step lookup for the upper voices. Short scales (pentatonic,
/// blues) run out of entries before the 13th step, so the index wraps
/// into the next octave to keep the stack ascending.
fn step_note(scale: &[Note], index: usize) -> Note {
    let len = scale.len();
    scale[index % len].transpose(12 * (index / len) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low sample rate keeps the teardown window cheap to render.
    const TEST_SR: f64 = 8000.0;
    // 25 owned nodes: 10 voices, noise + filter, 2 LFOs, 5 loops,
    // chorus/reverb/phaser, bass synth + compressor, the bus.
    const NODE_COUNT: usize = 25;

    fn test_config(seed: u64) -> DroneConfig {
        DroneConfig { seed, sample_rate: TEST_SR, ..DroneConfig::default() }
    }

    fn render_seconds(session: &mut DroneSession, seconds: f64) {
        let total = (seconds * TEST_SR).ceil() as usize;
        let mut buf = vec![0.0_f32; 512];
        let mut remaining = total;
        while remaining > 0 {
            let n = remaining.min(buf.len());
            session.process(&mut buf[..n]);
            remaining -= n;
        }
    }

    #[test]
    fn session_starts_with_full_stack() {
        let session = DroneSession::play(test_config(1)).expect("play");
        assert_eq!(session.voices.len(), 10);
        assert_eq!(session.active_voice_count(), 10);
        assert_eq!(session.loops.len(), 5);
        assert!(crate::theory::ROOTS.contains(&session.root()));
        assert!(!session.is_stopping());
        assert!(!session.is_disposed());

        // the root stack sits at the bottom of the register, doubled
        // upward an octave at a time, with the harmony voice on the root
        let root_hz = session.voices[1].frequency.target();
        assert!(root_hz < 31.0, "root voice belongs in octave 0, got {root_hz} Hz");
        assert!((session.voices[2].frequency.target() - root_hz * 2.0).abs() < 1e-6);
        assert!((session.voices[3].frequency.target() - root_hz * 4.0).abs() < 1e-6);
        assert!((session.voices[HARMONY].frequency.target() - root_hz).abs() < 1e-9);
    }

    #[test]
    fn harmony_pool_spans_the_octave_above_the_scale_base() {
        let session = DroneSession::play(test_config(8)).expect("play");
        let scale = crate::theory::SCALES
            .iter()
            .find(|s| s.name == session.scale_name())
            .expect("catalog scale");
        assert_eq!(session.harmony_notes.len(), scale.intervals.len() + 1);

        // shuffled, but the lowest note is the tonic restated at octave 3
        let lowest = session.harmony_notes.iter().min().expect("pool not empty");
        assert_eq!(lowest.octave(), 3, "pool starts one octave above the scale base");
        let root_pc = Note::from_name(session.root()).expect("parses").pitch_class();
        assert_eq!(lowest.pitch_class(), root_pc);
    }

    #[test]
    fn renders_audible_output_during_fade_in() {
        let mut session = DroneSession::play(test_config(2)).expect("play");
        let mut buf = vec![0.0_f32; (TEST_SR as usize) * 2];
        session.process(&mut buf);
        let peak = buf.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(peak > 1e-6, "session should become audible, peak {peak}");
        assert!(peak <= 1.0, "soft clip bounds the output, peak {peak}");
    }

    #[test]
    fn stop_then_delay_disposes_every_node_once() {
        let mut session = DroneSession::play(test_config(3)).expect("play");
        session.stop();
        assert!(session.is_stopping());
        assert!(!session.is_disposed(), "release waits for the delay");

        render_seconds(&mut session, 3.3);

        assert!(session.is_disposed());
        assert_eq!(session.active_voice_count(), 0);
        let report = session.dispose_report().expect("report recorded");
        assert_eq!(report.attempted, NODE_COUNT);
        assert_eq!(report.failed, 0, "every node disposed exactly once");
        assert!(session.one_shots.is_empty());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut session = DroneSession::play(test_config(4)).expect("play");
        session.stop();
        session.stop();
        assert_eq!(
            session.one_shots.len(),
            1,
            "second stop must not queue another release"
        );

        render_seconds(&mut session, 3.3);
        let report = session.dispose_report().expect("report recorded");
        assert_eq!(report, DisposeReport { attempted: NODE_COUNT, failed: 0 });

        // stop after disposal is also a no-op on the report
        session.stop();
        render_seconds(&mut session, 0.5);
        assert_eq!(session.dispose_report(), Some(report));
    }

    #[test]
    fn stop_immediately_after_start_is_safe() {
        let mut session = DroneSession::play(test_config(5)).expect("play");
        session.stop();
        render_seconds(&mut session, 4.0);
        assert!(session.is_disposed());

        // a disposed session renders silence
        let mut buf = vec![1.0_f32; 256];
        session.process(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn harmony_queue_is_a_rotation() {
        let mut session = DroneSession::play(test_config(6)).expect("play");
        let before: Vec<Note> = session.harmony_notes.iter().copied().collect();
        let len = before.len();
        assert!(len > 0);

        for i in 0..len {
            session.cycle_harmony(i as f64);
            // the harmony voice is retuned to the note just consumed
            let expected = before[i].frequency();
            let actual = session.voices[HARMONY].frequency.target();
            assert!((actual - expected).abs() < 1e-9);
        }
        let after: Vec<Note> = session.harmony_notes.iter().copied().collect();
        assert_eq!(after, before, "full rotation restores the queue order");
    }

    #[test]
    fn bass_walk_moves_one_adjacent_step() {
        let mut session = DroneSession::play(test_config(7)).expect("play");
        let last = session.bass_notes.len() - 1;
        let mut previous = session.bass_index;
        for i in 0..200 {
            session.step_bass(i as f64);
            let current = session.bass_index;
            assert!(current <= last);
            assert!(
                current.abs_diff(previous) <= 1,
                "walk must move to an adjacent note: {previous} -> {current}"
            );
            previous = current;
        }
    }

    #[test]
    fn sessions_replay_deterministically_per_seed() {
        let a = DroneSession::play(test_config(9)).expect("play");
        let b = DroneSession::play(test_config(9)).expect("play");
        assert_eq!(a.root(), b.root());
        assert_eq!(a.scale_name(), b.scale_name());
        let qa: Vec<Note> = a.harmony_notes.iter().copied().collect();
        let qb: Vec<Note> = b.harmony_notes.iter().copied().collect();
        assert_eq!(qa, qb);
        assert_eq!(a.bass_index, b.bass_index);
    }

    #[test]
    fn modulation_loops_wait_one_cycle_but_the_bass_starts_now() {
        let mut session = DroneSession::play(test_config(10)).expect("play");
        let mut buf = vec![0.0_f32; BLOCK];
        session.process(&mut buf);

        // the bass pattern triggers its first step at t = 0
        assert!(session.bass.is_active(), "bass should play from the start");
        // the four modulation loops hold off for one full interval, so
        // the fade-in finishes over an unmodulated stack
        for modulation in &session.loops {
            if modulation.kind != LoopKind::BassPattern {
                assert!(
                    (modulation.next_fire - modulation.interval).abs() < 1e-9,
                    "{:?} must wait one cycle before first firing",
                    modulation.kind
                );
            }
        }
        assert!(session.one_shots.is_empty(), "no feature/harmony ramps yet");
        let harmony_db = session.voices[HARMONY].volume.target();
        assert!((harmony_db - QUIET_DB).abs() < 1e-9, "harmony voice still resting");

        // past the 3-measure swell interval the swell has fired once
        render_seconds(&mut session, 10.5);
        let swell = &session.loops[1];
        assert_eq!(swell.kind, LoopKind::VolumeSwell);
        assert!(swell.next_fire > swell.interval, "swell fires after its first cycle");
    }

    #[test]
    fn stopped_loops_schedule_nothing_further() {
        let mut session = DroneSession::play(test_config(10)).expect("play");
        session.stop();
        let scheduled: Vec<f64> = session.loops.iter().map(|l| l.next_fire).collect();
        // render well past the shortest loop interval
        render_seconds(&mut session, 11.0);
        let after: Vec<f64> = session.loops.iter().map(|l| l.next_fire).collect();
        assert_eq!(after, scheduled, "deactivated loops must not fire");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = DroneConfig { seed: 42, ..DroneConfig::default() };
        let json = serde_json::to_string(&config).expect("serialize");
        let back: DroneConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.seed, 42);
        assert_eq!(back.bpm, 70.0);
        assert_eq!(back.release_delay_secs, 3.2);
    }
}
