use std::time::Duration;

/// Fixed-window frame history for the HUD.
pub struct FrameTimer {
    history: Vec<Duration>,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame window must hold at least one sample");
        Self {
            history: vec![Duration::ZERO; capacity],
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.history.len();
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.history.len()
        } else {
            self.index
        }
    }

    pub fn average(&self) -> Duration {
        let count = self.count();
        if count == 0 {
            return Duration::ZERO;
        }
        let total: Duration = self.history[..count].iter().sum();
        total / count as u32
    }

    pub fn worst(&self) -> Duration {
        self.history[..self.count()]
            .iter()
            .copied()
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Frames per second over the window; zero before the first sample.
    pub fn fps(&self) -> f32 {
        let average = self.average().as_secs_f32();
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }
}
