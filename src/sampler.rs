//! One full enumeration pass over all visible processes.

use crate::accessor::{AccessError, ProcessAccessor, ProcessSample, SystemSample};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Immutable bundle of one pass's system and process data. All process samples
/// in a snapshot belong to the same pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub system: SystemSample,
    pub processes: Vec<ProcessSample>,
    /// Pass start time, unix seconds.
    pub timestamp: i64,
}

pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Produce one snapshot. A pass never fails outright: processes that vanish or
/// deny access between enumeration and sampling are dropped from the listing,
/// and the pass completes with whatever survived.
pub fn sample(accessor: &dyn ProcessAccessor) -> Snapshot {
    let timestamp = now_unix();
    let pids = accessor.list_pids();

    let mut processes = Vec::with_capacity(pids.len());
    for pid in pids {
        match accessor.sample_process(pid) {
            Ok(sample) => processes.push(sample),
            Err(AccessError::NotFound) => {}
            Err(e) => debug!(pid, error = %e, "skipping process"),
        }
    }

    let system = accessor.system_sample();

    Snapshot {
        system,
        processes,
        timestamp,
    }
}
