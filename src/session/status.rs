//! Transient status line with debounce generations
//!
//! Each `set` bumps the generation; an expiry only clears the message if it
//! carries the current generation, so a newer message restarts the window
//! instead of being cut short by an older timer.

#[derive(Debug, Default)]
pub struct StatusLine {
    message: String,
    generation: u64,
}

impl StatusLine {
    pub fn set(&mut self, message: impl Into<String>) -> u64 {
        self.message = message.into();
        self.generation += 1;
        self.generation
    }

    /// Clear the message if `generation` is still current.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.message.is_empty() {
            return false;
        }
        self.message.clear();
        true
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_generation_does_not_clear() {
        let mut line = StatusLine::default();
        let first = line.set("Connected");
        let second = line.set("Account changed");
        assert!(!line.expire(first));
        assert_eq!(line.message(), "Account changed");
        assert!(line.expire(second));
        assert_eq!(line.message(), "");
        assert!(!line.expire(second));
    }
}
