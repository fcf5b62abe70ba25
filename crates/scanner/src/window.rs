//! The adaptive log-filter window policy (`spec.md` §4.2): shrink on error,
//! grow after a run of successes. Pure over plain integers so it is tested
//! without any I/O.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub min: u64,
    pub max: u64,
    pub grow_after_successes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub current: u64,
    consecutive_successes: u32,
}

impl WindowState {
    pub fn new(initial: u64) -> Self {
        Self { current: initial, consecutive_successes: 0 }
    }

    /// Halves the window down to `policy.min` and resets the success streak.
    pub fn on_error(&mut self, policy: &WindowPolicy) {
        self.current = (self.current / 2).max(policy.min);
        self.consecutive_successes = 0;
    }

    /// Records a successful tick; grows the window toward `policy.max` once
    /// `grow_after_successes` consecutive ticks have succeeded.
    pub fn on_success(&mut self, policy: &WindowPolicy) {
        self.consecutive_successes += 1;
        if self.consecutive_successes >= policy.grow_after_successes {
            self.current = (self.current * 2).min(policy.max);
            self.consecutive_successes = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> WindowPolicy {
        WindowPolicy { min: 16, max: 500, grow_after_successes: 3 }
    }

    #[test]
    fn shrinks_on_error_down_to_floor() {
        let policy = policy();
        let mut state = WindowState::new(500);
        state.on_error(&policy);
        assert_eq!(state.current, 250);
        for _ in 0..10 {
            state.on_error(&policy);
        }
        assert_eq!(state.current, policy.min);
    }

    #[test]
    fn grows_only_after_k_consecutive_successes() {
        let policy = policy();
        let mut state = WindowState::new(16);
        state.on_success(&policy);
        state.on_success(&policy);
        assert_eq!(state.current, 16, "grows only on the Kth success");
        state.on_success(&policy);
        assert_eq!(state.current, 32);
    }

    #[test]
    fn grows_capped_at_ceiling() {
        let policy = policy();
        let mut state = WindowState::new(400);
        for _ in 0..3 {
            state.on_success(&policy);
        }
        assert_eq!(state.current, 500);
        for _ in 0..3 {
            state.on_success(&policy);
        }
        assert_eq!(state.current, 500);
    }

    #[test]
    fn error_resets_success_streak() {
        let policy = policy();
        let mut state = WindowState::new(16);
        state.on_success(&policy);
        state.on_success(&policy);
        state.on_error(&policy);
        state.on_success(&policy);
        state.on_success(&policy);
        assert_eq!(state.current, policy.min, "streak reset, third success hasn't landed yet");
    }
}
