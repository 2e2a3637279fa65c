//! Alert Manager Implementation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Webhook receiving alert embeds (alerts are only logged when unset)
    pub webhook_url: Option<String>,
    /// Cooldown period between duplicate alerts (seconds)
    pub cooldown_seconds: u64,
    /// Maximum alerts per hour before throttling
    pub max_alerts_per_hour: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            cooldown_seconds: 1800, // 30 minutes
            max_alerts_per_hour: 10,
        }
    }
}

/// State of an alert kind
#[derive(Debug, Clone)]
pub struct AlertState {
    /// Last time this alert was fired
    pub last_fired: Instant,
    /// Number of times fired
    pub fire_count: usize,
}

/// Alert manager for deduplication and throttling
pub struct AlertManager {
    /// Configuration
    config: AlertConfig,
    /// Alert states by failure kind
    states: HashMap<String, AlertState>,
    /// Alerts fired in current hour
    hourly_count: usize,
    /// Hour start time
    hour_start: Instant,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        info!(
            "Creating alert manager (cooldown {}s, max {}/h)",
            config.cooldown_seconds, config.max_alerts_per_hour
        );
        Self {
            config,
            states: HashMap::new(),
            hourly_count: 0,
            hour_start: Instant::now(),
        }
    }

    /// Check if an alert of this kind should be delivered
    pub fn should_fire(&mut self, kind: &str) -> bool {
        // Reset hourly counter if needed
        if self.hour_start.elapsed() > Duration::from_secs(3600) {
            self.hourly_count = 0;
            self.hour_start = Instant::now();
        }

        if self.hourly_count >= self.config.max_alerts_per_hour {
            warn!("Alert throttled: max alerts per hour reached");
            return false;
        }

        if let Some(state) = self.states.get(kind) {
            let cooldown = Duration::from_secs(self.config.cooldown_seconds);
            if state.last_fired.elapsed() < cooldown {
                debug!("Alert suppressed: {} in cooldown period", kind);
                return false;
            }
        }

        true
    }

    /// Record that an alert was delivered
    pub fn record_fire(&mut self, kind: &str) {
        self.hourly_count += 1;

        let state = self.states.entry(kind.to_string()).or_insert(AlertState {
            last_fired: Instant::now(),
            fire_count: 0,
        });

        state.last_fired = Instant::now();
        state.fire_count += 1;

        info!("Alert recorded: {} (count: {})", kind, state.fire_count);
    }

    /// State of an alert kind, if it ever fired
    pub fn state(&self, kind: &str) -> Option<&AlertState> {
        self.states.get(kind)
    }

    /// Get hourly alert count
    pub fn hourly_count(&self) -> usize {
        self.hourly_count
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
