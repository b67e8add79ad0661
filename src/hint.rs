//! The interaction hint overlay: appears shortly after startup, disappears
//! after a while or on the first pointer interaction.

use web_time::{Duration, Instant};

use crate::constants::{HINT_DELAY_MS, HINT_DURATION_MS};

#[derive(Debug, Clone, Copy)]
pub struct InteractionHint {
    shows_at: Instant,
    duration: Duration,
    dismissed: bool,
}

impl InteractionHint {
    pub fn new(started: Instant) -> Self {
        Self {
            shows_at: started + Duration::from_millis(HINT_DELAY_MS),
            duration: Duration::from_millis(HINT_DURATION_MS),
            dismissed: false,
        }
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        !self.dismissed && now >= self.shows_at && now < self.shows_at + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_window() {
        let start = Instant::now();
        let hint = InteractionHint::new(start);
        assert!(!hint.is_visible(start));
        assert!(hint.is_visible(start + Duration::from_millis(1000)));
        assert!(hint.is_visible(start + Duration::from_millis(5999)));
        assert!(!hint.is_visible(start + Duration::from_millis(6000)));
    }

    #[test]
    fn test_dismissed_hint_stays_hidden() {
        let start = Instant::now();
        let mut hint = InteractionHint::new(start);
        hint.dismiss();
        assert!(!hint.is_visible(start + Duration::from_millis(2000)));
    }
}
