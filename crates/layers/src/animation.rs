use foundation::time::Time;

/// Quartic ease-in-out on `t` in `[0, 1]`.
pub fn ease_quart_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        8.0 * t * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
    }
}

/// Tween from `from` to `to` that waits `delay_s` and then runs for
/// `duration_s`. The clock starts at the first sample.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GrowthTween {
    pub from: f64,
    pub to: f64,
    pub delay_s: f64,
    pub duration_s: f64,
    started: Option<Time>,
}

impl GrowthTween {
    pub fn new(from: f64, to: f64, delay_s: f64, duration_s: f64) -> Self {
        Self {
            from,
            to,
            delay_s,
            duration_s,
            started: None,
        }
    }

    /// Value at `now`.
    pub fn sample(&mut self, now: Time) -> f64 {
        let start = *self.started.get_or_insert(now);
        let elapsed = now.since(start) - self.delay_s;
        if elapsed <= 0.0 {
            return self.from;
        }
        if self.duration_s <= 0.0 || elapsed >= self.duration_s {
            return self.to;
        }
        let k = ease_quart_in_out(elapsed / self.duration_s);
        self.from + (self.to - self.from) * k
    }

    pub fn is_finished(&self, now: Time) -> bool {
        match self.started {
            Some(start) => now.since(start) >= self.delay_s + self.duration_s,
            None => false,
        }
    }
}
