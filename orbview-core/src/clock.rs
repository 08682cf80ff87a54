/// Monotonic elapsed-time source for the animator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationClock {
    elapsed: f32,
    frame_index: u64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the clock started
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of accepted ticks
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Move the clock to `elapsed` seconds and return the seconds advanced
    ///
    /// Values that would move the clock backwards (or are not finite) are
    /// ignored and return 0.
    pub fn advance_to(&mut self, elapsed: f32) -> f32 {
        if !elapsed.is_finite() || elapsed < self.elapsed {
            return 0.0;
        }
        let dt = elapsed - self.elapsed;
        self.elapsed = elapsed;
        self.frame_index = self.frame_index.wrapping_add(1);
        dt
    }

    pub fn advance_by(&mut self, dt: f32) -> f32 {
        self.advance_to(self.elapsed + dt)
    }
}
