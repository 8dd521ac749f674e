//! Volume ramp bookkeeping for fading sounds.
//!
//! A [`Fade`] tracks one in-flight ramp against the player's logical
//! clock. Pausing freezes the elapsed time so the ramp picks up exactly
//! where it left off on resume.

/// Direction of an in-flight ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FadeDirection {
    /// Ramp toward full volume, ends in `Playing`
    In,
    /// Ramp toward silence, ends in `Ended`
    Out,
}

/// One volume ramp in progress
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fade {
    direction: FadeDirection,
    /// Ramp factor at the moment the fade started
    from: f32,
    duration_ms: u64,
    /// Player-clock time the ramp started
    started_at_ms: u64,
    /// Elapsed milliseconds captured by a pause
    frozen_elapsed_ms: Option<u64>,
}

impl Fade {
    pub(crate) fn new(direction: FadeDirection, from: f32, duration_ms: u64, now_ms: u64) -> Self {
        Self {
            direction,
            from,
            duration_ms,
            started_at_ms: now_ms,
            frozen_elapsed_ms: None,
        }
    }

    pub(crate) fn direction(&self) -> FadeDirection {
        self.direction
    }

    /// Ramp factor the fade is heading toward
    pub(crate) fn target(&self) -> f32 {
        match self.direction {
            FadeDirection::In => 1.0,
            FadeDirection::Out => 0.0,
        }
    }

    fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.frozen_elapsed_ms {
            Some(elapsed) => elapsed,
            None => now_ms.saturating_sub(self.started_at_ms),
        }
    }

    /// Linear progress through the ramp, clamped to [0, 1]
    pub(crate) fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms(now_ms) as f32 / self.duration_ms as f32).clamp(0.0, 1.0)
    }

    /// Current ramp factor, interpolated between start value and target
    pub(crate) fn factor(&self, now_ms: u64) -> f32 {
        let progress = self.progress(now_ms);
        self.from + (self.target() - self.from) * progress
    }

    pub(crate) fn is_complete(&self, now_ms: u64) -> bool {
        self.elapsed_ms(now_ms) >= self.duration_ms
    }

    /// Capture elapsed time so the ramp stops progressing
    pub(crate) fn freeze(&mut self, now_ms: u64) {
        if self.frozen_elapsed_ms.is_none() {
            self.frozen_elapsed_ms = Some(self.elapsed_ms(now_ms));
        }
    }

    /// Let the ramp continue from its frozen position
    pub(crate) fn unfreeze(&mut self, now_ms: u64) {
        if let Some(elapsed) = self.frozen_elapsed_ms.take() {
            self.started_at_ms = now_ms.saturating_sub(elapsed);
        }
    }
}
