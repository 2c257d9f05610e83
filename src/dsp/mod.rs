//! DSP primitives — pure Rust synthesis and processing.
//!
//! All audio runs in Rust so the same code powers both WebAudio playback
//! (via AudioWorklet + WASM) and native tests. Everything here is driven
//! by the session clock; nothing spawns threads or touches wall time.

pub mod bus;
pub mod chorus;
pub mod compressor;
pub mod envelope;
pub mod filter;
pub mod lfo;
pub mod noise;
pub mod oscillator;
pub mod param;
pub mod phaser;
pub mod reverb;
pub mod voice;

/// Convert decibels to linear gain.
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear gain to decibels. Zero or negative gain maps to -120 dB.
pub fn gain_to_db(gain: f64) -> f64 {
    if gain <= 0.0 {
        -120.0
    } else {
        20.0 * gain.log10()
    }
}
