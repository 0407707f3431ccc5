//! Process-wide resource governor, grounded on `original_source`'s
//! `core/utils/resource_monitor.py` (`ResourceMonitor`/`ResourceLimits`/
//! `ResourceState`) and its exact threshold table in the distilled spec's
//! §3 data model and §4.1 component design. Memory sampling uses `sysinfo`
//! rather than `psutil` since this is Rust, not Python; the threshold
//! arithmetic, the 1 s sample cache, and the circuit-breaker latch are
//! carried over unchanged.

use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::System;

/// Ordered resource pressure level. Ordering matters: callers compare
/// `wait_for`'s `min_state` against the live state with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceState {
    Healthy,
    Warning,
    Critical,
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub memory_warning_threshold: f64,
    pub memory_critical_threshold: f64,
    pub memory_exhausted_threshold: f64,
    pub min_free_memory_mb: u64,
    pub circuit_breaker_cooldown: Duration,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_warning_threshold: 70.0,
            memory_critical_threshold: 85.0,
            memory_exhausted_threshold: 95.0,
            min_free_memory_mb: 100,
            circuit_breaker_cooldown: Duration::from_secs(60),
        }
    }
}

/// Injectable sample for tests. Production code samples via `sysinfo`.
#[derive(Debug, Clone, Copy)]
struct Sample {
    memory_percent: f64,
    available_mb: u64,
}

struct Inner {
    limits: ResourceLimits,
    last_sample: Option<(Sample, Instant)>,
    tripped_until: Option<Instant>,
    injected: Option<Sample>,
}

/// The singleton governor. All mutable state lives behind one mutex, per
/// the locking-discipline rule that no other core component keeps
/// process-wide mutable state.
pub struct ResourceGovernor {
    inner: Mutex<Inner>,
}

static GOVERNOR: Lazy<ResourceGovernor> = Lazy::new(|| ResourceGovernor::new(ResourceLimits::default()));

impl ResourceGovernor {
    fn new(limits: ResourceLimits) -> Self {
        Self {
            inner: Mutex::new(Inner {
                limits,
                last_sample: None,
                tripped_until: None,
                injected: None,
            }),
        }
    }

    pub fn global() -> &'static ResourceGovernor {
        &GOVERNOR
    }

    /// Sample memory once, cached for 1 second. Returns `None` when
    /// sampling is unavailable (degrades callers to `HEALTHY`).
    fn sample(&self, inner: &mut Inner) -> Option<Sample> {
        if let Some(sample) = inner.injected {
            return Some(sample);
        }

        if let Some((sample, taken_at)) = inner.last_sample {
            if taken_at.elapsed() < Duration::from_secs(1) {
                return Some(sample);
            }
        }

        let mut system = System::new();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return None;
        }

        let used = system.used_memory();
        let available_mb = system.available_memory() / (1024 * 1024);
        let memory_percent = used as f64 / total as f64 * 100.0;

        let sample = Sample {
            memory_percent,
            available_mb,
        };
        inner.last_sample = Some((sample, Instant::now()));
        Some(sample)
    }

    fn classify(limits: &ResourceLimits, sample: Sample) -> ResourceState {
        if sample.memory_percent >= limits.memory_exhausted_threshold
            || sample.available_mb < limits.min_free_memory_mb
        {
            return ResourceState::Exhausted;
        }
        if sample.memory_percent >= limits.memory_critical_threshold {
            return ResourceState::Critical;
        }
        if sample.memory_percent >= limits.memory_warning_threshold {
            return ResourceState::Warning;
        }
        ResourceState::Healthy
    }

    pub fn check_state(&self) -> ResourceState {
        let mut inner = self.inner.lock().unwrap();

        if let Some(tripped_until) = inner.tripped_until {
            if Instant::now() < tripped_until {
                return ResourceState::Exhausted;
            }
            inner.tripped_until = None;
        }

        let state = match self.sample(&mut inner) {
            Some(sample) => Self::classify(&inner.limits, sample),
            None => ResourceState::Healthy,
        };

        if state == ResourceState::Exhausted {
            tracing::warn!(
                cooldown_secs = inner.limits.circuit_breaker_cooldown.as_secs(),
                "resource governor tripped: EXHAUSTED, breaker engaged"
            );
            inner.tripped_until = Some(Instant::now() + inner.limits.circuit_breaker_cooldown);
        }

        state
    }

    pub fn safe_worker_count(&self, requested: usize) -> usize {
        match self.check_state() {
            ResourceState::Healthy => requested,
            ResourceState::Warning => (requested / 2).max(1),
            ResourceState::Critical => (requested / 4).max(1),
            ResourceState::Exhausted => 1,
        }
    }

    pub fn safe_chunk_size(&self, requested: usize) -> usize {
        match self.check_state() {
            ResourceState::Healthy => requested,
            ResourceState::Warning => (requested / 2).max(1),
            ResourceState::Critical => (requested / 4).max(1),
            ResourceState::Exhausted => 1,
        }
    }

    pub async fn wait_for(&self, min_state: ResourceState, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.check_state() <= min_state {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    #[cfg(test)]
    fn inject(&self, memory_percent: f64, available_mb: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.injected = Some(Sample {
            memory_percent,
            available_mb,
        });
        inner.last_sample = None;
    }

    #[cfg(test)]
    fn with_limits(limits: ResourceLimits) -> Self {
        Self::new(limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_resources_healthy() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(50.0, 2048);
        assert_eq!(governor.check_state(), ResourceState::Healthy);
    }

    #[test]
    fn test_check_resources_warning() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(75.0, 500);
        assert_eq!(governor.check_state(), ResourceState::Warning);
    }

    #[test]
    fn test_check_resources_critical() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(90.0, 200);
        assert_eq!(governor.check_state(), ResourceState::Critical);
    }

    #[test]
    fn test_check_resources_exhausted_by_percent() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(96.0, 50);
        assert_eq!(governor.check_state(), ResourceState::Exhausted);
    }

    #[test]
    fn test_check_resources_exhausted_by_min_free() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(40.0, 10);
        assert_eq!(governor.check_state(), ResourceState::Exhausted);
    }

    #[test]
    fn test_circuit_breaker_cooldown() {
        let limits = ResourceLimits {
            circuit_breaker_cooldown: Duration::from_millis(100),
            ..ResourceLimits::default()
        };
        let governor = ResourceGovernor::with_limits(limits);
        governor.inject(96.0, 50);
        assert_eq!(governor.check_state(), ResourceState::Exhausted);

        governor.inject(50.0, 2048);
        assert_eq!(governor.check_state(), ResourceState::Exhausted);

        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(governor.check_state(), ResourceState::Healthy);
    }

    #[test]
    fn test_safe_worker_count_reduces_on_pressure() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(75.0, 500);
        assert_eq!(governor.safe_worker_count(8), 4);
    }

    #[test]
    fn test_safe_chunk_size_reduces_on_pressure() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(75.0, 500);
        assert_eq!(governor.safe_chunk_size(100_000), 50_000);
    }

    #[tokio::test]
    async fn test_wait_for_resources_succeeds_when_already_healthy() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(50.0, 2048);
        let ok = governor
            .wait_for(ResourceState::Warning, Duration::from_secs(2))
            .await;
        assert!(ok);
    }

    #[tokio::test]
    async fn test_wait_for_resources_times_out_under_sustained_pressure() {
        let governor = ResourceGovernor::with_limits(ResourceLimits::default());
        governor.inject(96.0, 50);
        let ok = governor
            .wait_for(ResourceState::Warning, Duration::from_millis(200))
            .await;
        assert!(!ok);
    }
}
