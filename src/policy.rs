//! Auto-boost policy evaluation.

use crate::accessor::{AccessError, PriorityLevel, ProcessAccessor};
use crate::sampler::Snapshot;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fallback level when the configured boost level is unsupported on this
/// platform. Applies to the automatic path only; manual boosts surface
/// `Unsupported` to the caller instead.
const FALLBACK_LEVEL: PriorityLevel = PriorityLevel::High;

/// Auto-boost configuration, read as one consistent copy at the start of each
/// pass. A single pass never mixes fields from concurrent updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub auto_boost_enabled: bool,
    pub threshold: f64,
    pub boost_level: PriorityLevel,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            auto_boost_enabled: false,
            threshold: 50.0,
            boost_level: PriorityLevel::High,
        }
    }
}

/// Evaluate the auto-boost rule against every process in the snapshot and
/// issue priority changes for those scoring strictly above the threshold.
/// Returns one action-log message per successful boost; failed attempts are
/// traced but produce no log entry. Each process is evaluated at most once,
/// and a process above the threshold is re-boosted on every pass.
pub fn evaluate(
    snapshot: &Snapshot,
    config: &PolicyConfig,
    accessor: &dyn ProcessAccessor,
) -> Vec<String> {
    if !config.auto_boost_enabled {
        return Vec::new();
    }

    let mut actions = Vec::new();
    for sample in &snapshot.processes {
        if sample.score <= config.threshold {
            continue;
        }
        let mut result = accessor.set_priority(sample.pid, config.boost_level);
        if result == Err(AccessError::Unsupported) {
            result = accessor.set_priority(sample.pid, FALLBACK_LEVEL);
        }
        match result {
            Ok(()) => actions.push(format!(
                "Auto-boosted PID {} ({}) - Score: {:.2}",
                sample.pid, sample.name, sample.score
            )),
            Err(e) => debug!(pid = sample.pid, error = %e, "auto-boost failed"),
        }
    }
    actions
}
