//! Ranking score for process samples.

/// CPU weighs higher than RAM as the more common bottleneck.
pub const CPU_WEIGHT: f64 = 0.6;
pub const RAM_WEIGHT: f64 = 0.4;

/// Weighted linear score over instantaneous CPU and RAM usage. Pure and total
/// for all non-negative inputs, including values above 100. No history, no
/// smoothing.
pub fn score(cpu_percent: f64, ram_percent: f64) -> f64 {
    CPU_WEIGHT * cpu_percent + RAM_WEIGHT * ram_percent
}
