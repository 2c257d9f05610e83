//! Session layer — the start/stop/toggle surface the host UI drives,
//! mirroring the playing state into a persisted settings flag.

use serde::{Deserialize, Serialize};

use crate::drone::{DroneConfig, DroneSession};
use crate::error::DroneError;

/// Host-visible settings, persisted by the embedding UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DroneSettings {
    pub sound_on: bool,
}

/// Owns at most one drone session and the settings flag it mirrors.
/// Double-start and double-stop are no-ops, never errors.
#[derive(Debug)]
pub struct DroneControl {
    config: DroneConfig,
    session: Option<DroneSession>,
    settings: DroneSettings,
}

impl DroneControl {
    pub fn new(sample_rate: f64) -> Self {
        DroneControl {
            config: DroneConfig { sample_rate, ..DroneConfig::default() },
            session: None,
            settings: DroneSettings::default(),
        }
    }

    /// Start a session seeded with `seed`. No-op while already playing.
    /// Restarting during a previous session's fade-out drops the old
    /// session immediately.
    pub fn start_drone(&mut self, seed: u64) -> Result<(), DroneError> {
        if self.settings.sound_on {
            return Ok(());
        }
        let config = DroneConfig { seed, ..self.config.clone() };
        self.session = Some(DroneSession::play(config)?);
        self.settings.sound_on = true;
        Ok(())
    }

    /// Begin the fade-out teardown. No-op when nothing is playing.
    pub fn stop_drone(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
        self.settings.sound_on = false;
    }

    pub fn toggle_drone(&mut self, seed: u64) -> Result<(), DroneError> {
        if self.settings.sound_on {
            self.stop_drone();
            Ok(())
        } else {
            self.start_drone(seed)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.settings.sound_on
    }

    pub fn settings(&self) -> &DroneSettings {
        &self.settings
    }

    pub fn session(&self) -> Option<&DroneSession> {
        self.session.as_ref()
    }

    /// Render the next buffer. A stopped session keeps rendering its
    /// fade-out tail and is dropped once its delayed release has run.
    pub fn process(&mut self, out: &mut [f32]) {
        match self.session.as_mut() {
            Some(session) => {
                session.process(out);
                if session.is_disposed() {
                    self.session = None;
                }
            }
            None => out.fill(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SR: f64 = 8000.0;

    fn render_seconds(control: &mut DroneControl, seconds: f64) {
        let total = (seconds * TEST_SR).ceil() as usize;
        let mut buf = vec![0.0_f32; 512];
        let mut remaining = total;
        while remaining > 0 {
            let n = remaining.min(buf.len());
            control.process(&mut buf[..n]);
            remaining -= n;
        }
    }

    #[test]
    fn toggle_flips_playing_state() {
        let mut control = DroneControl::new(TEST_SR);
        assert!(!control.is_playing());
        control.toggle_drone(1).expect("start");
        assert!(control.is_playing());
        assert!(control.settings().sound_on);
        control.toggle_drone(1).expect("stop");
        assert!(!control.is_playing());
        assert!(!control.settings().sound_on);
    }

    #[test]
    fn double_start_keeps_the_first_session() {
        let mut control = DroneControl::new(TEST_SR);
        control.start_drone(1).expect("start");
        let root = control.session().map(|s| s.root());
        control.start_drone(2).expect("second start is a no-op");
        assert_eq!(control.session().map(|s| s.root()), root);
    }

    #[test]
    fn double_stop_is_a_no_op() {
        let mut control = DroneControl::new(TEST_SR);
        control.start_drone(1).expect("start");
        control.stop_drone();
        control.stop_drone();
        assert!(!control.is_playing());
        assert!(control.session().is_some(), "tail still rendering");
    }

    #[test]
    fn stopped_session_is_dropped_after_release() {
        let mut control = DroneControl::new(TEST_SR);
        control.start_drone(1).expect("start");
        control.stop_drone();
        render_seconds(&mut control, 3.5);
        assert!(control.session().is_none(), "disposed session is released");

        let mut buf = vec![1.0_f32; 128];
        control.process(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0), "no session renders silence");
    }

    #[test]
    fn stop_without_start_does_nothing() {
        let mut control = DroneControl::new(TEST_SR);
        control.stop_drone();
        assert!(!control.is_playing());
        assert!(control.session().is_none());
    }
}
