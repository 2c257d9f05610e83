//! A lowpass biquad and the LFO-swept auto-filter that shapes the
//! noise bed.

use std::f64::consts::PI;

use crate::error::DroneError;

use super::lfo::Lfo;

/// A 2nd-order lowpass IIR filter (Direct Form II Transposed, Audio EQ
/// Cookbook coefficients).
#[derive(Debug, Clone)]
pub struct LowpassFilter {
    pub cutoff: f64,
    pub q: f64,

    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,

    sample_rate: f64,
}

impl LowpassFilter {
    pub fn new(cutoff: f64, sample_rate: f64) -> Self {
        let mut f = LowpassFilter {
            cutoff,
            q: 0.707,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
        };
        f.update_coefficients();
        f
    }

    pub fn set_cutoff(&mut self, cutoff: f64) {
        // Keep the corner below Nyquist with some headroom.
        self.cutoff = cutoff.clamp(10.0, self.sample_rate * 0.45);
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        let w0 = 2.0 * PI * self.cutoff / self.sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * self.q);

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// A lowpass filter whose cutoff sweeps over `octaves` above
/// `base_frequency`, driven by a slow LFO. The sweep is sampled once per
/// render block via `update`.
#[derive(Debug, Clone)]
pub struct AutoFilter {
    filter: LowpassFilter,
    sweep: Lfo,
    pub base_frequency: f64,
    pub octaves: f64,
    disposed: bool,
}

impl AutoFilter {
    pub fn new(period: f64, base_frequency: f64, octaves: f64, sample_rate: f64) -> Self {
        AutoFilter {
            filter: LowpassFilter::new(base_frequency, sample_rate),
            sweep: Lfo::new(period, 0.0, 1.0),
            base_frequency,
            octaves,
            disposed: false,
        }
    }

    pub fn start(&mut self) {
        self.sweep.start();
    }

    /// Re-aim the cutoff for the block starting at `now`.
    pub fn update(&mut self, now: f64) {
        if self.disposed {
            return;
        }
        let position = self.sweep.sweep_at(now);
        let cutoff = self.base_frequency * (2.0_f64).powf(self.octaves * position);
        self.filter.set_cutoff(cutoff);
    }

    pub fn process(&mut self, input: f64) -> f64 {
        if self.disposed {
            return 0.0;
        }
        self.filter.process(input)
    }

    pub fn dispose(&mut self) -> Result<(), DroneError> {
        if self.disposed {
            return Err(DroneError::NodeDisposed { node: "auto_filter" });
        }
        self.disposed = true;
        self.filter.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_passes_dc() {
        let mut f = LowpassFilter::new(5000.0, 44100.0);
        let mut out = 0.0;
        for _ in 0..2000 {
            out = f.process(1.0);
        }
        assert!((out - 1.0).abs() < 0.001, "lowpass should pass DC, got {out}");
    }

    #[test]
    fn lowpass_attenuates_high_frequency() {
        let mut f = LowpassFilter::new(200.0, 44100.0);
        let mut peak = 0.0_f64;
        for i in 0..8820 {
            let t = i as f64 / 44100.0;
            let out = f.process((2.0 * PI * 10000.0 * t).sin());
            if i > 2000 {
                peak = peak.max(out.abs());
            }
        }
        assert!(peak < 0.01, "10 kHz through a 200 Hz lowpass, got {peak}");
    }

    #[test]
    fn auto_filter_sweeps_cutoff() {
        let mut af = AutoFilter::new(8.0, 800.0, 4.0, 44100.0);
        af.start();
        af.update(0.0);
        let mid = af.filter.cutoff;
        af.update(2.0); // quarter period: sweep peak
        let high = af.filter.cutoff;
        assert!(high > mid, "cutoff should rise toward the sweep peak");
        assert!(high <= 800.0 * 16.0 + 1.0, "sweep must cap at base * 2^octaves");
    }

    #[test]
    fn auto_filter_dispose_silences() {
        let mut af = AutoFilter::new(8.0, 800.0, 4.0, 44100.0);
        af.start();
        assert!(af.dispose().is_ok());
        assert!(af.dispose().is_err());
        assert_eq!(af.process(1.0), 0.0);
    }
}
