use super::{
    AccessError, DiskStats, MemoryStats, PriorityLevel, ProcessAccessor, ProcessSample,
    SystemSample,
};
use crate::score::score;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Grace period between SIGTERM and the SIGKILL escalation.
const TERMINATE_GRACE: Duration = Duration::from_millis(500);
const TERMINATE_POLL: Duration = Duration::from_millis(50);

#[derive(Clone)]
struct CpuSample {
    total_ticks: u64, // utime + stime
    timestamp: Instant,
}

#[derive(Clone, Copy)]
struct CpuTotals {
    total: u64,
    idle: u64,
}

/// Production accessor backed by `/proc` and libc priority/signal calls.
///
/// Per-process CPU usage is derived from utime+stime tick deltas between
/// consecutive calls for the same pid, expressed as percent of one core,
/// unnormalized. The first sample for a pid reports 0.0.
pub struct LinuxProcessAccessor {
    page_size: u64,
    clock_ticks: u64,
    total_memory: u64,
    cpu_samples: Mutex<HashMap<u32, CpuSample>>,
    system_cpu: Mutex<Option<CpuTotals>>,
}

impl LinuxProcessAccessor {
    pub fn new() -> Self {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) as u64 };
        let clock_ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) as u64 }.max(1);
        let total_memory = read_meminfo().map(|(total, _)| total).unwrap_or(0);
        Self {
            page_size,
            clock_ticks,
            total_memory,
            cpu_samples: Mutex::new(HashMap::new()),
            system_cpu: Mutex::new(None),
        }
    }

    fn cpu_percent(&self, pid: u32, total_ticks: u64) -> f64 {
        let now = Instant::now();
        let mut samples = self.cpu_samples.lock().unwrap();
        let percent = if let Some(prev) = samples.get(&pid) {
            let tick_delta = total_ticks.saturating_sub(prev.total_ticks);
            let elapsed = now.duration_since(prev.timestamp).as_secs_f64();
            if elapsed > 0.0 {
                let cpu_seconds = tick_delta as f64 / self.clock_ticks as f64;
                (cpu_seconds / elapsed) * 100.0
            } else {
                0.0
            }
        } else {
            0.0
        };
        samples.insert(
            pid,
            CpuSample {
                total_ticks,
                timestamp: now,
            },
        );
        percent
    }

    /// Drop cached CPU samples for pids no longer present.
    fn prune_cpu_samples(&self, live: &HashSet<u32>) {
        let mut samples = self.cpu_samples.lock().unwrap();
        samples.retain(|pid, _| live.contains(pid));
    }

    fn system_cpu_percent(&self) -> f64 {
        let Some(current) = read_cpu_totals() else {
            return 0.0;
        };
        let mut prev = self.system_cpu.lock().unwrap();
        let percent = match *prev {
            Some(p) => {
                let total_delta = current.total.saturating_sub(p.total);
                let idle_delta = current.idle.saturating_sub(p.idle);
                if total_delta > 0 {
                    (1.0 - idle_delta as f64 / total_delta as f64) * 100.0
                } else {
                    0.0
                }
            }
            None => 0.0,
        };
        *prev = Some(current);
        percent
    }
}

impl Default for LinuxProcessAccessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessAccessor for LinuxProcessAccessor {
    fn list_pids(&self) -> Vec<u32> {
        let mut pids = Vec::new();
        if let Ok(entries) = fs::read_dir("/proc") {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Ok(pid) = name.parse::<u32>() {
                        pids.push(pid);
                    }
                }
            }
        }
        let live: HashSet<u32> = pids.iter().copied().collect();
        self.prune_cpu_samples(&live);
        pids
    }

    fn sample_process(&self, pid: u32) -> Result<ProcessSample, AccessError> {
        let stat = fs::read_to_string(format!("/proc/{}/stat", pid)).map_err(map_io_error)?;

        // comm is parenthesized and may itself contain spaces or parens, so
        // split around the last ')'.
        let close = stat.rfind(')').ok_or(AccessError::NotFound)?;
        let open = stat.find('(').ok_or(AccessError::NotFound)?;
        let name = stat[open + 1..close].to_string();
        let rest: Vec<&str> = stat[close + 1..].split_whitespace().collect();
        if rest.len() < 22 {
            return Err(AccessError::NotFound);
        }

        let state = rest[0].chars().next().unwrap_or('?');
        let utime: u64 = rest[11].parse().unwrap_or(0);
        let stime: u64 = rest[12].parse().unwrap_or(0);
        let rss_pages: u64 = rest[21].parse().unwrap_or(0);

        let cpu_percent = self.cpu_percent(pid, utime + stime);
        let ram_percent = if self.total_memory > 0 {
            (rss_pages * self.page_size) as f64 / self.total_memory as f64 * 100.0
        } else {
            0.0
        };

        Ok(ProcessSample {
            pid,
            name: if name.is_empty() {
                "N/A".to_string()
            } else {
                name
            },
            cpu_percent,
            ram_percent,
            score: score(cpu_percent, ram_percent),
            status: state_name(state),
        })
    }

    fn set_priority(&self, pid: u32, level: PriorityLevel) -> Result<(), AccessError> {
        let nice = nice_value(level);
        let rc = unsafe {
            libc::setpriority(libc::PRIO_PROCESS as _, pid as libc::id_t, nice)
        };
        if rc == 0 {
            Ok(())
        } else {
            Err(map_errno(io::Error::last_os_error()))
        }
    }

    fn terminate(&self, pid: u32) -> Result<(), AccessError> {
        let rc = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
        if rc != 0 {
            return Err(map_errno(io::Error::last_os_error()));
        }

        let deadline = Instant::now() + TERMINATE_GRACE;
        while Instant::now() < deadline {
            std::thread::sleep(TERMINATE_POLL);
            if unsafe { libc::kill(pid as i32, 0) } != 0 {
                return Ok(());
            }
        }

        // Still alive after the grace period, escalate.
        unsafe { libc::kill(pid as i32, libc::SIGKILL) };
        Ok(())
    }

    fn system_sample(&self) -> SystemSample {
        let cpu_percent = self.system_cpu_percent();

        let memory = match read_meminfo() {
            Some((total, available)) => {
                let used = total.saturating_sub(available);
                MemoryStats {
                    percent: if total > 0 {
                        used as f64 / total as f64 * 100.0
                    } else {
                        0.0
                    },
                    total,
                    used,
                    available,
                }
            }
            None => MemoryStats::default(),
        };

        // Zeroed disk stats when the root filesystem cannot be queried.
        let disk = read_disk_stats("/").unwrap_or_default();

        SystemSample {
            cpu_percent,
            memory,
            disk,
        }
    }
}

fn nice_value(level: PriorityLevel) -> libc::c_int {
    match level {
        PriorityLevel::VeryHigh => -10,
        PriorityLevel::High => -5,
        PriorityLevel::AboveNormal => -2,
        PriorityLevel::Normal => 0,
        PriorityLevel::BelowNormal => 5,
        PriorityLevel::Low => 10,
    }
}

fn state_name(state: char) -> String {
    match state {
        'R' => "running".to_string(),
        'S' => "sleeping".to_string(),
        'D' => "disk-sleep".to_string(),
        'Z' => "zombie".to_string(),
        'T' | 't' => "stopped".to_string(),
        'I' => "idle".to_string(),
        'X' => "dead".to_string(),
        other => other.to_string(),
    }
}

fn map_io_error(e: io::Error) -> AccessError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => AccessError::AccessDenied,
        _ => AccessError::NotFound,
    }
}

fn map_errno(e: io::Error) -> AccessError {
    match e.raw_os_error() {
        Some(libc::EPERM) | Some(libc::EACCES) => AccessError::AccessDenied,
        _ => AccessError::NotFound,
    }
}

/// Returns (total, available) in bytes.
fn read_meminfo() -> Option<(u64, u64)> {
    let content = fs::read_to_string("/proc/meminfo").ok()?;
    let mut total = None;
    let mut available = None;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = parse_kb(rest);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available = parse_kb(rest);
        }
    }
    Some((total?, available?))
}

fn parse_kb(s: &str) -> Option<u64> {
    s.split_whitespace()
        .next()
        .and_then(|v| v.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

fn read_cpu_totals() -> Option<CpuTotals> {
    let content = fs::read_to_string("/proc/stat").ok()?;
    let line = content.lines().next()?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|v| v.parse().ok())
        .collect();
    if fields.len() < 5 {
        return None;
    }
    let idle = fields[3] + fields[4]; // idle + iowait
    let total: u64 = fields.iter().sum();
    Some(CpuTotals { total, idle })
}

fn read_disk_stats(path: &str) -> Option<DiskStats> {
    let mut vfs: libc::statvfs = unsafe { std::mem::zeroed() };
    let c_path = std::ffi::CString::new(path).ok()?;
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut vfs) };
    if rc != 0 {
        return None;
    }
    let frsize = vfs.f_frsize as u64;
    let total = vfs.f_blocks as u64 * frsize;
    let free = vfs.f_bavail as u64 * frsize;
    let used = total.saturating_sub(vfs.f_bfree as u64 * frsize);
    let percent = if total > 0 {
        used as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    Some(DiskStats {
        percent,
        total,
        used,
        free,
    })
}
