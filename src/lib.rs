pub mod drone;
pub mod dsp;
pub mod error;
pub mod instrument;
pub mod random;
pub mod session;
pub mod theory;
pub mod transport;

use crate::session::DroneControl;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the droneweaver version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed drone controller. The host constructs one per audio
/// context and pulls rendered blocks from an AudioWorklet; start/stop
/// map onto the UI's sound toggle.
#[wasm_bindgen]
pub struct DroneApp {
    control: DroneControl,
}

#[wasm_bindgen]
impl DroneApp {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> DroneApp {
        DroneApp { control: DroneControl::new(sample_rate) }
    }

    /// Start a drone session seeded with `seed`. No-op while playing.
    pub fn start(&mut self, seed: u64) -> Result<(), JsValue> {
        self.control.start_drone(seed).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// Fade out and release the running session. No-op when idle.
    pub fn stop(&mut self) {
        self.control.stop_drone();
    }

    pub fn toggle(&mut self, seed: u64) -> Result<(), JsValue> {
        self.control.toggle_drone(seed).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn is_playing(&self) -> bool {
        self.control.is_playing()
    }

    /// Render the next `len` mono samples for AudioWorklet playback.
    pub fn render_block(&mut self, len: usize) -> Vec<f32> {
        let mut buf = vec![0.0_f32; len];
        self.control.process(&mut buf);
        buf
    }

    /// Current settings as a JS object (mirrors the UI checkbox state).
    pub fn settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.control.settings())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }
}
