//! Blocking connect-with-retry for the external stores.
//!
//! Both store clients are supervised once at startup and the connections are
//! held for the process lifetime. The supervisor only covers the initial
//! handshake: a connection dropping mid-operation surfaces as an ordinary
//! operation error and is handled by the worker's error policy.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::models::{BackoffConfig, BackoffStrategy};

/// Connection lifecycle of one external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Delay schedule between connect attempts.
#[derive(Debug, Clone)]
pub enum BackoffPolicy {
    Fixed(Duration),
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
    },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Fixed(Duration::from_secs(5))
    }
}

impl BackoffPolicy {
    /// Delay after the given number of consecutive failures.
    pub fn delay(&self, failures: u32) -> Duration {
        match self {
            BackoffPolicy::Fixed(delay) => *delay,
            BackoffPolicy::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(failures.min(32) as i32);
                Duration::from_secs_f64((initial.as_secs_f64() * factor).min(max.as_secs_f64()))
            }
        }
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        match config.strategy {
            BackoffStrategy::Fixed => BackoffPolicy::Fixed(Duration::from_secs(config.delay_secs)),
            BackoffStrategy::Exponential => BackoffPolicy::Exponential {
                initial: Duration::from_secs(config.delay_secs),
                max: Duration::from_secs(config.max_delay_secs),
                multiplier: config.multiplier,
            },
        }
    }
}

/// Drives one store client from `Disconnected` to `Connected`, blocking the
/// caller until a health probe answers.
pub struct ConnectionSupervisor {
    name: &'static str,
    policy: BackoffPolicy,
    state: ConnectionState,
}

impl ConnectionSupervisor {
    pub fn new(name: &'static str, policy: BackoffPolicy) -> Self {
        Self {
            name,
            policy,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Block until the probe succeeds. Failures are logged and retried
    /// indefinitely on the policy's schedule; there is no attempt cap, so
    /// this call cannot fail, only wait. Calling it while already connected
    /// is a no-op.
    pub async fn connect<F, Fut, E>(&mut self, mut probe: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        if self.state == ConnectionState::Connected {
            return;
        }

        self.state = ConnectionState::Connecting;
        let mut failures: u32 = 0;

        loop {
            info!(store = self.name, "attempting to connect");
            match probe().await {
                Ok(()) => {
                    self.state = ConnectionState::Connected;
                    info!(store = self.name, "connected");
                    return;
                }
                Err(e) => {
                    let delay = self.policy.delay(failures);
                    warn!(
                        store = self.name,
                        error = %e,
                        retry_in_secs = delay.as_secs_f64(),
                        "could not connect, retrying"
                    );
                    sleep(delay).await;
                    failures = failures.saturating_add(1);
                }
            }
        }
    }
}
