use foundation::time::Time;

/// Deterministic frame metadata handed to per-frame updaters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous frame.
    pub dt_s: f64,
    /// Clock time at the start of the frame.
    pub time: Time,
}

/// Fixed-rate frame source standing in for the display refresh callback.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameClock {
    dt_s: f64,
    next_index: u64,
}

impl FrameClock {
    pub fn new(rate_hz: f64) -> Self {
        let dt_s = if rate_hz > 0.0 { 1.0 / rate_hz } else { 0.0 };
        Self {
            dt_s,
            next_index: 0,
        }
    }

    pub fn dt_s(&self) -> f64 {
        self.dt_s
    }

    /// Produce the next frame. Time is derived from the index so long runs do
    /// not accumulate rounding drift.
    pub fn tick(&mut self) -> Frame {
        let index = self.next_index;
        self.next_index += 1;
        Frame {
            index,
            dt_s: self.dt_s,
            time: Time(index as f64 * self.dt_s),
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameClock;
    use foundation::time::Time;

    #[test]
    fn ticks_advance_index_and_time() {
        let mut clock = FrameClock::new(2.0);
        let f0 = clock.tick();
        let f1 = clock.tick();
        assert_eq!(f0.index, 0);
        assert_eq!(f0.time, Time(0.0));
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(0.5));
        assert_eq!(f1.dt_s, 0.5);
    }

    #[test]
    fn non_positive_rate_freezes_time() {
        let mut clock = FrameClock::new(0.0);
        clock.tick();
        assert_eq!(clock.tick().time, Time(0.0));
    }
}
