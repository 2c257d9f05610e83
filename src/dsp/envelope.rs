//! ADSR envelope with per-sample linear slopes.

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// A linear ADSR envelope. Times are in seconds, sustain is a level in
/// [0, 1]. The release slope anchors at whatever level the gate-off
/// interrupts, so early releases stay click-free.
#[derive(Debug, Clone)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,

    stage: Stage,
    level: f64,
    release_step: f64,
    sample_rate: f64,
}

impl Adsr {
    pub fn new(sample_rate: f64) -> Self {
        Adsr {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
            stage: Stage::Idle,
            level: 0.0,
            release_step: 0.0,
            sample_rate,
        }
    }

    /// Note on: restart the attack from the current level.
    pub fn gate_on(&mut self) {
        self.stage = Stage::Attack;
    }

    /// Note off: begin the release from the current level.
    pub fn gate_off(&mut self) {
        if self.stage == Stage::Idle {
            return;
        }
        self.stage = Stage::Release;
        self.release_step = if self.release > 0.0 {
            self.level / (self.release * self.sample_rate)
        } else {
            self.level
        };
    }

    /// Advance one sample and return the envelope level in [0, 1].
    pub fn next_sample(&mut self) -> f64 {
        let dt = 1.0 / self.sample_rate;
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                if self.attack > 0.0 {
                    self.level += dt / self.attack;
                } else {
                    self.level = 1.0;
                }
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                if self.decay > 0.0 {
                    self.level -= dt * (1.0 - self.sustain) / self.decay;
                } else {
                    self.level = self.sustain;
                }
                if self.level <= self.sustain {
                    self.level = self.sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {
                self.level = self.sustain;
            }
            Stage::Release => {
                self.level -= self.release_step;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }

    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_at_zero() {
        let mut env = Adsr::new(44100.0);
        assert!(env.is_finished());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn fast_attack_reaches_full_level() {
        let mut env = Adsr::new(44100.0);
        env.attack = 0.02;
        env.decay = 0.0;
        env.sustain = 1.0;
        env.gate_on();

        // 0.02 s = 882 samples to full level
        let mut level = 0.0;
        for _ in 0..900 {
            level = env.next_sample();
        }
        assert!((level - 1.0).abs() < 1e-9, "attack should reach 1.0, got {level}");
    }

    #[test]
    fn zero_decay_full_sustain_holds() {
        let mut env = Adsr::new(44100.0);
        env.attack = 0.001;
        env.decay = 0.0;
        env.sustain = 1.0;
        env.gate_on();
        for _ in 0..1000 {
            env.next_sample();
        }
        assert!((env.next_sample() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn release_reaches_silence() {
        let mut env = Adsr::new(44100.0);
        env.attack = 0.001;
        env.decay = 0.0;
        env.sustain = 1.0;
        env.release = 0.05;
        env.gate_on();
        for _ in 0..500 {
            env.next_sample();
        }
        env.gate_off();
        for _ in 0..(44100 / 10) {
            env.next_sample();
        }
        assert!(env.is_finished());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn level_always_in_range() {
        let mut env = Adsr::new(44100.0);
        env.attack = 0.01;
        env.decay = 0.05;
        env.sustain = 0.4;
        env.release = 0.1;
        env.gate_on();
        for _ in 0..5000 {
            let l = env.next_sample();
            assert!((0.0..=1.0).contains(&l), "envelope out of range: {l}");
        }
        env.gate_off();
        for _ in 0..10000 {
            let l = env.next_sample();
            assert!((0.0..=1.0).contains(&l), "release out of range: {l}");
        }
    }
}
