//! Weather Sampling Scheduler
//!
//! Runs the polling loop that captures one weather sample per recording
//! hour and day.

mod clock;
mod config;
mod scheduler;

pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, FailurePolicy, PollerConfig};
pub use scheduler::{PollError, Poller, TickOutcome, WeatherSource};
