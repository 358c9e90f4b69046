//! Scheduler loop and inbound command surface.

use crate::accessor::{AccessError, PriorityLevel, ProcessAccessor};
use crate::config::Config;
use crate::policy::{self, PolicyConfig};
use crate::protocol::{Response, StatusData};
use crate::publisher::Publisher;
use crate::sampler;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

/// Drives pass -> policy -> publish on a fixed cadence and serves the
/// boost/kill/config/stop commands. Exactly one background task runs the loop;
/// any number of consumers read the publisher concurrently.
pub struct Engine {
    accessor: Arc<dyn ProcessAccessor>,
    publisher: Arc<Publisher>,
    policy: RwLock<PolicyConfig>,
    period: Duration,
    stopped: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    events_tx: broadcast::Sender<String>,
    boost_count: AtomicU64,
}

impl Engine {
    pub fn new(
        accessor: Arc<dyn ProcessAccessor>,
        config: Config,
        events_tx: broadcast::Sender<String>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            accessor,
            publisher: Arc::new(Publisher::new(config.general.log_capacity)),
            policy: RwLock::new(config.policy),
            period: Duration::from_secs(config.general.sample_interval_secs),
            stopped: AtomicBool::new(false),
            shutdown_tx,
            events_tx,
            boost_count: AtomicU64::new(0),
        }
    }

    pub fn publisher(&self) -> &Arc<Publisher> {
        &self.publisher
    }

    pub async fn policy(&self) -> PolicyConfig {
        self.policy.read().await.clone()
    }

    /// One sampling/policy/publish pass. Transient failures inside the pass
    /// are absorbed; the pass always completes and publishes.
    pub async fn run_pass(&self) {
        // One consistent config copy per pass, never field-by-field reads.
        let config = self.policy.read().await.clone();

        let snapshot = sampler::sample(self.accessor.as_ref());
        let actions = policy::evaluate(&snapshot, &config, self.accessor.as_ref());
        let process_count = snapshot.processes.len();

        let total_boosts = self
            .boost_count
            .fetch_add(actions.len() as u64, Ordering::Relaxed)
            + actions.len() as u64;
        for message in actions {
            self.publisher.append_log(message);
        }
        self.publisher.publish(snapshot);

        let status = Response::Status {
            data: StatusData {
                process_count: process_count as u32,
                boost_count: total_boosts,
            },
        };
        if let Ok(json) = serde_json::to_string(&status) {
            let _ = self.events_tx.send(json);
        }
        debug!(processes = process_count, "pass complete");
    }

    /// Run until `stop` is requested. The delay is a fixed `period` after each
    /// pass completes, regardless of pass duration; a stop request during a
    /// pass takes effect before the next pass begins.
    pub async fn run(&self) {
        let mut shutdown = self.shutdown_tx.subscribe();
        info!(period_secs = self.period.as_secs(), "monitoring loop started");
        loop {
            if self.stopped.load(Ordering::SeqCst) {
                break;
            }
            self.run_pass().await;
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.period) => {}
            }
        }
        info!("monitoring loop stopped");
    }

    /// Request a clean stop. The in-flight pass, if any, completes.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Manually re-prioritize one process. Unlike the automatic path, the
    /// outcome is surfaced to the caller as-is, and failures are logged too.
    pub fn boost(&self, pid: u32, level: PriorityLevel) -> Result<(), AccessError> {
        match self.accessor.set_priority(pid, level) {
            Ok(()) => {
                self.publisher
                    .append_log(format!("Boosted PID {} to {} priority", pid, level));
                Ok(())
            }
            Err(e) => {
                self.publisher
                    .append_log(format!("Failed to boost PID {}", pid));
                Err(e)
            }
        }
    }

    /// Terminate one process, escalating to a forceful kill after the grace
    /// period. Runs on a blocking task since the accessor waits out the grace.
    pub async fn kill(&self, pid: u32) -> Result<(), AccessError> {
        let accessor = Arc::clone(&self.accessor);
        let result = match tokio::task::spawn_blocking(move || accessor.terminate(pid)).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "terminate task failed");
                Err(AccessError::NotFound)
            }
        };
        if result.is_ok() {
            self.publisher.append_log(format!("Killed PID {}", pid));
        }
        result
    }

    /// Replace the policy config as a whole. Takes effect from the next pass;
    /// the current pass keeps the copy it already read.
    pub async fn update_policy(&self, config: PolicyConfig) {
        *self.policy.write().await = config;
    }
}
