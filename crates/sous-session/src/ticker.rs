//! Background tick loop.
//!
//! One loop per session container. Every period it removes one second from
//! every running timer (unless the kitchen break is on), then hands new
//! completions to the alert sink. Tick-driven changes are flushed to the
//! store every few ticks instead of on every second.

use std::sync::Arc;
use std::time::Duration;

use sous_core::config::TimerConfig;
use sous_core::error::Result;
use tokio::sync::Notify;

use crate::session::{lock_session, SharedSession, TimerCompletion};
use crate::timers::CompletionAlert;

/// Outcome of a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Timers that lost a second.
    pub advanced: usize,
    pub completions: Vec<TimerCompletion>,
}

pub struct Ticker {
    session: SharedSession,
    alert: Arc<dyn CompletionAlert>,
    interval: Duration,
    persist_every: u32,
    shutdown: Arc<Notify>,
}

impl Ticker {
    pub fn new(session: SharedSession, alert: Arc<dyn CompletionAlert>, config: &TimerConfig) -> Self {
        Self {
            session,
            alert,
            interval: config.tick_interval(),
            persist_every: config.persist_every_ticks.max(1),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Advance running timers by one second and process completions.
    pub fn tick_once(&self) -> Result<TickReport> {
        let mut session = lock_session(&self.session)?;
        let advanced = session.tick();
        let completions = session.process_completions(self.alert.as_ref());
        Ok(TickReport {
            advanced,
            completions,
        })
    }

    /// Run until `shutdown` is called. Pending tick changes are flushed on exit.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.interval);
        // The first tick of a tokio interval fires immediately.
        interval.tick().await;

        let mut since_flush = 0u32;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick_once() {
                        Ok(report) if !report.completions.is_empty() => {
                            tracing::debug!(
                                advanced = report.advanced,
                                completed = report.completions.len(),
                                "Tick produced completions"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "Tick loop stopped");
                            return;
                        }
                    }

                    since_flush += 1;
                    if since_flush >= self.persist_every {
                        since_flush = 0;
                        self.flush();
                    }
                }
                _ = self.shutdown.notified() => {
                    self.flush();
                    tracing::info!("Tick loop shut down");
                    return;
                }
            }
        }
    }

    /// Signal the loop to exit.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    fn flush(&self) {
        match lock_session(&self.session) {
            Ok(mut session) => session.flush(),
            Err(e) => tracing::warn!(error = %e, "Skipping session flush"),
        }
    }
}
