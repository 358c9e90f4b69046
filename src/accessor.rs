//! Process accessor contract (OS process enumeration, metrics, priorities)

use serde::{Deserialize, Serialize};

mod linux;
pub use linux::LinuxProcessAccessor;

/// One process at one sampling instant. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub pid: u32,
    /// Best-effort process name, "N/A" if unavailable.
    pub name: String,
    /// Percent of one core, unnormalized. May exceed 100 on multi-core systems.
    pub cpu_percent: f64,
    pub ram_percent: f64,
    /// Derived ranking score, always recomputed from this sample's cpu/ram.
    pub score: f64,
    /// Opaque OS process state ("running", "sleeping", "zombie", ...).
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub percent: f64,
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskStats {
    pub percent: f64,
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// System-wide aggregate at one instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSample {
    pub cpu_percent: f64,
    pub memory: MemoryStats,
    pub disk: DiskStats,
}

/// OS-independent scheduling priority tiers. The accessor maps these to the
/// native mechanism (nice values on POSIX); core logic never sees the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    VeryHigh,
    High,
    AboveNormal,
    Normal,
    BelowNormal,
    Low,
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PriorityLevel::VeryHigh => "Very High",
            PriorityLevel::High => "High",
            PriorityLevel::AboveNormal => "Above Normal",
            PriorityLevel::Normal => "Normal",
            PriorityLevel::BelowNormal => "Below Normal",
            PriorityLevel::Low => "Low",
        };
        f.write_str(name)
    }
}

/// Typed outcomes for per-process operations.
///
/// `NotFound` is expected and frequent (process exited between enumeration and
/// access) and is skipped silently during sampling. `AccessDenied` is reported
/// to callers and never retried. `Unsupported` means the priority level has no
/// mapping on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("process not found")]
    NotFound,
    #[error("access denied")]
    AccessDenied,
    #[error("priority level not supported on this platform")]
    Unsupported,
}

/// Abstraction over OS process primitives. The core depends on this trait
/// exclusively; `LinuxProcessAccessor` is the production implementation and
/// tests substitute their own.
pub trait ProcessAccessor: Send + Sync {
    /// Best-effort enumeration. May omit processes that exit mid-call and
    /// never fails as a whole.
    fn list_pids(&self) -> Vec<u32>;

    /// Read current metrics for one process. A process that exits between
    /// enumeration and sampling yields `NotFound`, not a panic or partial data.
    fn sample_process(&self, pid: u32) -> Result<ProcessSample, AccessError>;

    /// Translate `level` to the OS-native priority and apply it. Re-asserting
    /// the same level is idempotent at the OS level.
    fn set_priority(&self, pid: u32, level: PriorityLevel) -> Result<(), AccessError>;

    /// Request graceful termination; if the process is still alive after a
    /// bounded grace period, escalate to a forceful kill. One call, combined
    /// semantic. Blocks for up to the grace period.
    fn terminate(&self, pid: u32) -> Result<(), AccessError>;

    /// System-wide cpu/memory/disk aggregates. Disk fields are zeroed on
    /// failure rather than failing the whole call.
    fn system_sample(&self) -> SystemSample;
}
