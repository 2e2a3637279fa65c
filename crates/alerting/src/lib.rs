//! Alerting System
//!
//! Delivers failure alerts to a chat webhook and throttles repeats.

mod manager;
mod webhook;

pub use manager::{AlertConfig, AlertManager, AlertState};
pub use webhook::{Alert, AlertError, Alerter, WebhookAlerter};

/// Embed colour used for failures (red)
pub const ERROR_COLOR: u32 = 15548997;
