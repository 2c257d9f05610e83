//! Ramped parameters — scheduled smooth transitions against the session
//! clock, in the manner of WebAudio's AudioParam ramps.

/// Curve shape for a parameter ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampCurve {
    Linear,
    Exponential,
}

/// Smallest magnitude an exponential ramp endpoint may take; exponential
/// interpolation is undefined through zero.
const EXP_FLOOR: f64 = 1e-6;

/// A scalar parameter with at most one active ramp. Values are evaluated
/// lazily against the clock, so no per-sample bookkeeping is needed.
///
/// Scheduling a new ramp replaces any ramp in flight, anchoring at the
/// value the parameter holds at the new ramp's start time.
#[derive(Debug, Clone)]
pub struct Param {
    from: f64,
    to: f64,
    start: f64,
    end: f64,
    curve: RampCurve,
}

impl Param {
    pub fn new(value: f64) -> Self {
        Param { from: value, to: value, start: 0.0, end: 0.0, curve: RampCurve::Linear }
    }

    /// The parameter's value at clock time `now`.
    pub fn value_at(&self, now: f64) -> f64 {
        if now <= self.start || self.end <= self.start {
            return self.from;
        }
        if now >= self.end {
            return self.to;
        }
        let t = (now - self.start) / (self.end - self.start);
        match self.curve {
            RampCurve::Linear => self.from + (self.to - self.from) * t,
            RampCurve::Exponential => {
                // Endpoints must share a sign and stay away from zero.
                let from = clamp_exp(self.from, self.to);
                let to = clamp_exp(self.to, from);
                from * (to / from).powf(t)
            }
        }
    }

    /// Set the value immediately, cancelling any ramp.
    pub fn set(&mut self, value: f64) {
        self.from = value;
        self.to = value;
        self.start = 0.0;
        self.end = 0.0;
    }

    /// Ramp from the current value (at `now`) to `target` over `duration`
    /// seconds, replacing any ramp in flight.
    pub fn ramp_to(&mut self, target: f64, duration: f64, now: f64, curve: RampCurve) {
        let current = self.value_at(now);
        self.from = current;
        self.to = target;
        self.start = now;
        self.end = now + duration.max(0.0);
        self.curve = curve;
    }

    /// The final value once all scheduled motion completes.
    pub fn target(&self) -> f64 {
        self.to
    }

    /// True while a ramp is still in flight at `now`.
    pub fn is_ramping(&self, now: f64) -> bool {
        now < self.end && self.end > self.start
    }
}

fn clamp_exp(value: f64, reference: f64) -> f64 {
    if value.abs() >= EXP_FLOOR {
        value
    } else if reference < 0.0 {
        -EXP_FLOOR
    } else {
        EXP_FLOOR
    }
}
