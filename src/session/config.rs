//! Session configuration - passed from higher layers

use std::time::Duration;

pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(7);
pub const DEFAULT_DISPLAY_DECIMALS: u32 = 6;
pub const DEFAULT_EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub app: String,
    /// How long a status message stays visible
    pub status_ttl: Duration,
    /// Fractional digits kept (truncated) in the displayed balance
    pub display_decimals: u32,
    /// Capacity of the provider event queue
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app: "beeconnect".into(),
            status_ttl: DEFAULT_STATUS_TTL,
            display_decimals: DEFAULT_DISPLAY_DECIMALS,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl SessionConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into(), ..Default::default() }
    }
    pub fn with_status_ttl(mut self, ttl: Duration) -> Self { self.status_ttl = ttl; self }
    pub fn with_display_decimals(mut self, places: u32) -> Self { self.display_decimals = places; self }
    pub fn with_event_buffer(mut self, capacity: usize) -> Self { self.event_buffer = capacity.max(1); self }
}
