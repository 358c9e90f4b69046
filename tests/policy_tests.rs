use boost_daemon::accessor::{
    AccessError, PriorityLevel, ProcessAccessor, ProcessSample, SystemSample,
};
use boost_daemon::policy::{self, PolicyConfig};
use boost_daemon::sampler::Snapshot;
use boost_daemon::score::score;
use std::collections::HashMap;
use std::sync::Mutex;

/// Records every priority change and returns scripted outcomes.
struct RecordingAccessor {
    calls: Mutex<Vec<(u32, PriorityLevel)>>,
    failures: HashMap<u32, AccessError>,
    unsupported_level: Option<PriorityLevel>,
}

impl RecordingAccessor {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: HashMap::new(),
            unsupported_level: None,
        }
    }

    fn calls(&self) -> Vec<(u32, PriorityLevel)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessAccessor for RecordingAccessor {
    fn list_pids(&self) -> Vec<u32> {
        Vec::new()
    }

    fn sample_process(&self, _pid: u32) -> Result<ProcessSample, AccessError> {
        Err(AccessError::NotFound)
    }

    fn set_priority(&self, pid: u32, level: PriorityLevel) -> Result<(), AccessError> {
        self.calls.lock().unwrap().push((pid, level));
        if self.unsupported_level == Some(level) {
            return Err(AccessError::Unsupported);
        }
        match self.failures.get(&pid) {
            Some(e) => Err(*e),
            None => Ok(()),
        }
    }

    fn terminate(&self, _pid: u32) -> Result<(), AccessError> {
        Ok(())
    }

    fn system_sample(&self) -> SystemSample {
        SystemSample::default()
    }
}

fn process(pid: u32, name: &str, cpu: f64, ram: f64) -> ProcessSample {
    ProcessSample {
        pid,
        name: name.to_string(),
        cpu_percent: cpu,
        ram_percent: ram,
        score: score(cpu, ram),
        status: "running".to_string(),
    }
}

fn snapshot_with(processes: Vec<ProcessSample>) -> Snapshot {
    Snapshot {
        system: SystemSample::default(),
        processes,
        timestamp: 0,
    }
}

fn enabled_config(threshold: f64) -> PolicyConfig {
    PolicyConfig {
        auto_boost_enabled: true,
        threshold,
        boost_level: PriorityLevel::High,
    }
}

#[test]
fn test_score_is_deterministic_weighted_sum() {
    for cpu in [0.0, 0.3, 1.5, 50.0, 99.9, 150.0, 250.0] {
        for ram in [0.0, 0.1, 2.5, 49.9, 100.0] {
            let expected = 0.6 * cpu + 0.4 * ram;
            assert!((score(cpu, ram) - expected).abs() < 1e-9);
        }
    }
}

#[test]
fn test_boosts_only_processes_strictly_above_threshold() {
    // Scores: 10, 51, 80 against threshold 50.
    let snapshot = snapshot_with(vec![
        process(1, "proc-a", 10.0, 10.0),
        process(2, "proc-b", 85.0, 0.0),
        process(3, "proc-c", 100.0, 50.0),
    ]);
    let accessor = RecordingAccessor::new();
    let actions = policy::evaluate(&snapshot, &enabled_config(50.0), &accessor);

    let boosted: Vec<u32> = accessor.calls().iter().map(|(pid, _)| *pid).collect();
    assert_eq!(boosted, vec![2, 3]);
    assert_eq!(actions.len(), 2);
}

#[test]
fn test_score_equal_to_threshold_is_not_boosted() {
    // 0.6*50 + 0.4*50 == 50 exactly.
    let snapshot = snapshot_with(vec![process(7, "edge", 50.0, 50.0)]);
    let accessor = RecordingAccessor::new();
    let actions = policy::evaluate(&snapshot, &enabled_config(50.0), &accessor);
    assert!(accessor.calls().is_empty());
    assert!(actions.is_empty());
}

#[test]
fn test_disabled_policy_issues_no_boosts() {
    let snapshot = snapshot_with(vec![process(2, "hot", 200.0, 90.0)]);
    let accessor = RecordingAccessor::new();
    let config = PolicyConfig {
        auto_boost_enabled: false,
        ..enabled_config(50.0)
    };
    let actions = policy::evaluate(&snapshot, &config, &accessor);
    assert!(accessor.calls().is_empty());
    assert!(actions.is_empty());
}

#[test]
fn test_successful_boost_message_format() {
    let snapshot = snapshot_with(vec![process(42, "crunch", 85.0, 0.0)]);
    let accessor = RecordingAccessor::new();
    let actions = policy::evaluate(&snapshot, &enabled_config(50.0), &accessor);
    assert_eq!(actions, vec!["Auto-boosted PID 42 (crunch) - Score: 51.00"]);
}

#[test]
fn test_failed_boost_produces_no_log_entry() {
    let snapshot = snapshot_with(vec![
        process(1, "denied", 85.0, 0.0),
        process(2, "fine", 85.0, 0.0),
    ]);
    let mut accessor = RecordingAccessor::new();
    accessor.failures.insert(1, AccessError::AccessDenied);
    let actions = policy::evaluate(&snapshot, &enabled_config(50.0), &accessor);
    // Both attempts were made, only the success was logged.
    assert_eq!(accessor.calls().len(), 2);
    assert_eq!(actions.len(), 1);
    assert!(actions[0].contains("PID 2"));
}

#[test]
fn test_unsupported_level_falls_back_to_high() {
    let snapshot = snapshot_with(vec![process(9, "hot", 85.0, 0.0)]);
    let mut accessor = RecordingAccessor::new();
    accessor.unsupported_level = Some(PriorityLevel::VeryHigh);
    let config = PolicyConfig {
        boost_level: PriorityLevel::VeryHigh,
        ..enabled_config(50.0)
    };
    let actions = policy::evaluate(&snapshot, &config, &accessor);
    assert_eq!(
        accessor.calls(),
        vec![(9, PriorityLevel::VeryHigh), (9, PriorityLevel::High)]
    );
    assert_eq!(actions.len(), 1);
}
