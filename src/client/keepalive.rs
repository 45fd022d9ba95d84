// ABOUTME: Enquire_link bookkeeping for a bound session: when to ping, and when to give up
// ABOUTME: Time is passed in by the caller so the session's interval ticks drive it deterministically

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for SMPP keep-alive functionality
///
/// Controls the periodic enquire_link PDUs sent while the session is bound.
/// A response that does not arrive within `timeout` counts as a failure;
/// after `max_failures` failures in a row the session is considered dead.
///
/// # Example
///
/// ```rust
/// use smpp_loadtest::client::KeepAliveConfig;
/// use std::time::Duration;
///
/// // Default configuration (30s interval, 10s timeout, 3 max failures)
/// let config = KeepAliveConfig::default();
///
/// // Custom configuration
/// let config = KeepAliveConfig::new(Duration::from_secs(5))
///     .with_timeout(Duration::from_secs(15))
///     .with_max_failures(5);
///
/// // Disabled keep-alive
/// let config = KeepAliveConfig::disabled();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KeepAliveConfig {
    /// Interval between enquire_link PDUs (default: 30 seconds)
    pub interval: Duration,

    /// Time allowed for an enquire_link_resp (default: 10 seconds)
    pub timeout: Duration,

    /// Consecutive failures before the connection is considered dead (default: 3)
    pub max_failures: u32,

    /// Whether keep-alive is enabled (default: true)
    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            max_failures: 3,
            enabled: true,
        }
    }
}

impl KeepAliveConfig {
    /// Create a new keep-alive configuration with custom interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Set the timeout for enquire_link responses
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum consecutive failures before connection is considered dead
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Create a disabled keep-alive configuration
    ///
    /// ```rust
    /// use smpp_loadtest::client::KeepAliveConfig;
    ///
    /// let config = KeepAliveConfig::disabled();
    /// assert!(!config.enabled);
    /// ```
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Snapshot of keep-alive health, logged when the session closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveStatus {
    pub running: bool,
    pub consecutive_failures: u32,
    pub total_pings: u32,
    pub total_pongs: u32,
}

/// Tracks enquire_link timing and response health.
///
/// The session's keep-alive task drives it on every interval tick:
/// 1. `check_timeout(now)` turns an overdue response into a failure
/// 2. `is_connection_failed()` ends the session once failures pile up
/// 3. `should_ping(now)` decides whether to send, followed by `on_ping_sent(now)`
///
/// The reader task calls `on_ping_success()` when enquire_link_resp arrives.
#[derive(Debug)]
pub struct KeepAliveManager {
    config: KeepAliveConfig,
    last_ping: Option<Instant>,
    /// When the oldest unanswered enquire_link was sent
    outstanding_since: Option<Instant>,
    consecutive_failures: u32,
    total_pings: u32,
    total_pongs: u32,
}

impl KeepAliveManager {
    pub fn new(config: KeepAliveConfig) -> Self {
        Self {
            config,
            last_ping: None,
            outstanding_since: None,
            consecutive_failures: 0,
            total_pings: 0,
            total_pongs: 0,
        }
    }

    /// True when keep-alive is enabled, the connection has not failed, and
    /// an interval has passed since the last ping.
    pub fn should_ping(&self, now: Instant) -> bool {
        if !self.config.enabled {
            return false;
        }

        if self.is_connection_failed() {
            debug!("Max failures reached, not sending more pings");
            return false;
        }

        match self.last_ping {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.config.interval,
        }
    }

    pub fn on_ping_sent(&mut self, now: Instant) {
        self.last_ping = Some(now);
        self.outstanding_since.get_or_insert(now);
        self.total_pings += 1;
        debug!("Enquire_link sent (total: {})", self.total_pings);
    }

    pub fn on_ping_success(&mut self) {
        self.outstanding_since = None;
        self.consecutive_failures = 0;
        self.total_pongs += 1;
        debug!("Enquire_link answered (total: {})", self.total_pongs);
    }

    pub fn on_ping_failure(&mut self) {
        self.outstanding_since = None;
        self.consecutive_failures += 1;
        warn!(
            "Enquire_link failed (consecutive failures: {})",
            self.consecutive_failures
        );
    }

    /// Record a failure once the oldest unanswered ping is older than the
    /// timeout. Later pings do not extend the deadline. Returns true if a
    /// failure was recorded.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        let overdue = self
            .outstanding_since
            .is_some_and(|sent| now.saturating_duration_since(sent) >= self.config.timeout);
        if overdue {
            self.on_ping_failure();
        }
        overdue
    }

    pub fn is_connection_failed(&self) -> bool {
        self.config.enabled && self.consecutive_failures >= self.config.max_failures
    }

    pub fn status(&self) -> KeepAliveStatus {
        KeepAliveStatus {
            running: self.config.enabled,
            consecutive_failures: self.consecutive_failures,
            total_pings: self.total_pings,
            total_pongs: self.total_pongs,
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_keep_alive_config_defaults() {
        let config = KeepAliveConfig::default();
        assert_eq!(config.interval, secs(30));
        assert_eq!(config.timeout, secs(10));
        assert_eq!(config.max_failures, 3);
        assert!(config.enabled);
    }

    #[test]
    fn test_keep_alive_config_builder() {
        let config = KeepAliveConfig::new(secs(5))
            .with_timeout(secs(2))
            .with_max_failures(5);

        assert_eq!(config.interval, secs(5));
        assert_eq!(config.timeout, secs(2));
        assert_eq!(config.max_failures, 5);
        assert!(config.enabled);
    }

    #[test]
    fn test_should_ping_follows_interval() {
        let start = Instant::now();
        let mut manager = KeepAliveManager::new(KeepAliveConfig::new(secs(5)));

        assert!(manager.should_ping(start));
        manager.on_ping_sent(start);
        assert!(!manager.should_ping(start + secs(4)));
        assert!(manager.should_ping(start + secs(5)));
    }

    #[test]
    fn test_timeout_counts_as_failure() {
        let start = Instant::now();
        let config = KeepAliveConfig::new(secs(5))
            .with_timeout(secs(10))
            .with_max_failures(2);
        let mut manager = KeepAliveManager::new(config);

        manager.on_ping_sent(start);
        assert!(!manager.check_timeout(start + secs(5)));
        assert!(manager.check_timeout(start + secs(10)));
        // Already counted, not counted again
        assert!(!manager.check_timeout(start + secs(15)));
        assert_eq!(manager.status().consecutive_failures, 1);
        assert!(!manager.is_connection_failed());

        manager.on_ping_sent(start + secs(15));
        assert!(manager.check_timeout(start + secs(25)));
        assert!(manager.is_connection_failed());
        assert!(!manager.should_ping(start + secs(30)));
    }

    #[test]
    fn test_repeated_pings_do_not_extend_deadline() {
        let start = Instant::now();
        let mut manager =
            KeepAliveManager::new(KeepAliveConfig::new(secs(5)).with_timeout(secs(10)));

        manager.on_ping_sent(start);
        manager.on_ping_sent(start + secs(5));
        assert!(manager.check_timeout(start + secs(10)));
        assert_eq!(manager.status().consecutive_failures, 1);
    }

    #[test]
    fn test_answered_ping_is_not_a_failure() {
        let start = Instant::now();
        let mut manager = KeepAliveManager::new(KeepAliveConfig::new(secs(5)));

        manager.on_ping_sent(start);
        manager.on_ping_failure();
        manager.on_ping_sent(start + secs(5));
        manager.on_ping_success();
        assert!(!manager.check_timeout(start + secs(60)));
        assert_eq!(
            manager.status(),
            KeepAliveStatus {
                running: true,
                consecutive_failures: 0,
                total_pings: 2,
                total_pongs: 1,
            }
        );
    }

    #[test]
    fn test_keep_alive_disabled() {
        let mut manager = KeepAliveManager::new(KeepAliveConfig::disabled().with_max_failures(1));
        assert!(!manager.should_ping(Instant::now()));
        manager.on_ping_failure();
        assert!(!manager.is_connection_failed());
        assert!(!manager.status().running);
    }
}
