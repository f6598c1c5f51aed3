use chrono::{DateTime, Utc};

/// Clock trait for abstracting time operations
/// Rate-limit windows and usage timing read time through this so tests can
/// pin it.
pub trait Clock: Send + Sync {
    /// Current time as RFC3339 string (for usage-log timestamps)
    fn now_rfc3339(&self) -> String;

    /// Current time as epoch seconds (for rate-limit windows)
    fn now_epoch_seconds(&self) -> i64;

    /// Current time as epoch milliseconds (for execution timing)
    fn now_epoch_millis(&self) -> i64;
}

/// Production implementation of Clock using system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339()
    }

    fn now_epoch_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn now_epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Test implementation of Clock with fixed/controllable time
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }

    /// Create a FixedClock from RFC3339 string
    pub fn from_rfc3339(timestamp_str: &str) -> Result<Self, chrono::ParseError> {
        let timestamp = DateTime::parse_from_rfc3339(timestamp_str)?.with_timezone(&Utc);
        Ok(Self { timestamp })
    }

    /// Advance time by the given number of seconds
    pub fn advance_seconds(&mut self, seconds: i64) {
        self.timestamp += chrono::Duration::seconds(seconds);
    }
}

impl Clock for FixedClock {
    fn now_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339()
    }

    fn now_epoch_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }

    fn now_epoch_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}
