//! Traffic scenarios and the worker loop that drives them.
//!
//! # Data Flow
//! ```text
//! ScenarioKind → ScenarioPlan (defaults) → PlanOverrides (CLI)
//!     → run_plan: N workers, each picking from the plan's mix
//!     → per-worker Report → merged Report
//! ```
//!
//! # Design Decisions
//! - Workers run as joined futures on the caller's task; the load is I/O bound
//! - Every sleep and every in-flight request races the shutdown signal, so
//!   Ctrl+C yields a partial report instead of a hung process

use std::time::{Duration, Instant};

use clap::{Args, ValueEnum};
use futures_util::future::join_all;

use super::client::{Operation, ServiceClient};
use super::report::Report;
use crate::lifecycle::Shutdown;

/// Uniform pause between a worker's operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn fixed(delay: Duration) -> Self {
        Self { min: delay, max: delay }
    }

    pub fn between_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max.max(min)),
        }
    }

    pub fn sample(&self) -> Duration {
        let (min, max) = (self.min.as_millis() as u64, self.max.as_millis() as u64);
        if max <= min {
            return self.min;
        }
        Duration::from_millis(fastrand::u64(min..=max))
    }
}

/// Shape of one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioPlan {
    pub name: &'static str,
    pub workers: usize,
    /// Per-worker operation cap; `None` runs until `duration` elapses.
    pub ops_per_worker: Option<usize>,
    pub duration: Option<Duration>,
    pub delay: DelayRange,
    /// Delay between consecutive worker starts.
    pub stagger: Duration,
    pub mix: Vec<Operation>,
    pub progress_every: Option<Duration>,
}

impl ScenarioPlan {
    /// Many workers mixing writes, reads and coin-flip failures.
    pub fn burst() -> Self {
        Self {
            name: "burst",
            workers: 8,
            ops_per_worker: Some(5),
            duration: None,
            delay: DelayRange::between_millis(100, 300),
            stagger: Duration::ZERO,
            mix: vec![Operation::AddBook, Operation::GetBook { max_id: 10 }, Operation::Random],
            progress_every: None,
        }
    }

    /// One slow trickle of errors for five minutes.
    pub fn sustained() -> Self {
        Self {
            name: "sustained",
            workers: 1,
            ops_per_worker: None,
            duration: Some(Duration::from_secs(300)),
            delay: DelayRange::between_millis(2_000, 8_000),
            stagger: Duration::ZERO,
            mix: vec![
                Operation::AddBook,
                Operation::GetBook { max_id: 100 },
                Operation::GenerateError,
                Operation::Health,
            ],
            progress_every: Some(Duration::from_secs(60)),
        }
    }

    /// Staggered rapid fire aimed at error-rate alerts.
    pub fn spike() -> Self {
        Self {
            name: "spike",
            workers: 6,
            ops_per_worker: Some(10),
            duration: None,
            delay: DelayRange::fixed(Duration::from_millis(100)),
            stagger: Duration::from_millis(200),
            mix: vec![
                Operation::AddBook,
                Operation::GetBook { max_id: 1000 },
                Operation::Error,
                Operation::Random,
            ],
            progress_every: None,
        }
    }

    /// Widely spaced health probes and random calls.
    pub fn degradation() -> Self {
        Self {
            name: "degradation",
            workers: 1,
            ops_per_worker: Some(10),
            duration: None,
            delay: DelayRange::between_millis(5_000, 15_000),
            stagger: Duration::ZERO,
            mix: vec![Operation::Health, Operation::Random],
            progress_every: None,
        }
    }

    /// Concurrent calls to the slow endpoint.
    pub fn latency() -> Self {
        Self {
            name: "latency",
            workers: 4,
            ops_per_worker: Some(3),
            duration: None,
            delay: DelayRange::fixed(Duration::ZERO),
            stagger: Duration::ZERO,
            mix: vec![Operation::Slow],
            progress_every: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    Burst,
    Sustained,
    Spike,
    Degradation,
    Latency,
    /// Every scenario in turn, the long sustained one last.
    All,
}

impl ScenarioKind {
    pub fn plans(self) -> Vec<ScenarioPlan> {
        match self {
            ScenarioKind::Burst => vec![ScenarioPlan::burst()],
            ScenarioKind::Sustained => vec![ScenarioPlan::sustained()],
            ScenarioKind::Spike => vec![ScenarioPlan::spike()],
            ScenarioKind::Degradation => vec![ScenarioPlan::degradation()],
            ScenarioKind::Latency => vec![ScenarioPlan::latency()],
            ScenarioKind::All => vec![
                ScenarioPlan::burst(),
                ScenarioPlan::spike(),
                ScenarioPlan::degradation(),
                ScenarioPlan::latency(),
                ScenarioPlan::sustained(),
            ],
        }
    }
}

/// Command line tweaks applied on top of a scenario's defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct PlanOverrides {
    /// Number of concurrent workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Operations per worker
    #[arg(long)]
    pub ops: Option<usize>,

    /// Run time limit in seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Minimum pause between operations, in milliseconds
    #[arg(long)]
    pub min_delay_ms: Option<u64>,

    /// Maximum pause between operations, in milliseconds
    #[arg(long)]
    pub max_delay_ms: Option<u64>,
}

impl PlanOverrides {
    pub fn apply(&self, mut plan: ScenarioPlan) -> ScenarioPlan {
        if let Some(workers) = self.workers {
            plan.workers = workers.max(1);
        }
        if let Some(ops) = self.ops {
            plan.ops_per_worker = Some(ops);
        }
        if let Some(secs) = self.duration_secs {
            plan.duration = Some(Duration::from_secs(secs));
        }
        if self.min_delay_ms.is_some() || self.max_delay_ms.is_some() {
            let min = self.min_delay_ms.unwrap_or(plan.delay.min.as_millis() as u64);
            let max = self.max_delay_ms.unwrap_or(plan.delay.max.as_millis() as u64);
            plan.delay = DelayRange::between_millis(min, max);
        }
        plan
    }
}

/// Run `plan` to completion or until `shutdown` fires.
pub async fn run_plan(client: &ServiceClient, plan: &ScenarioPlan, shutdown: &Shutdown) -> Report {
    tracing::info!(
        scenario = plan.name,
        workers = plan.workers,
        ops_per_worker = ?plan.ops_per_worker,
        duration_secs = ?plan.duration.map(|d| d.as_secs()),
        "Scenario starting"
    );

    let start = Instant::now();
    let workers = (0..plan.workers).map(|index| run_worker(client, plan, index, start, shutdown));

    let mut report = Report::new(plan.name);
    for worker in join_all(workers).await {
        report.merge(worker);
    }
    report.elapsed = start.elapsed();

    tracing::info!(
        scenario = plan.name,
        total = report.total,
        failures = report.failures(),
        cancelled = report.cancelled,
        "Scenario finished"
    );
    report
}

async fn run_worker(
    client: &ServiceClient,
    plan: &ScenarioPlan,
    index: usize,
    start: Instant,
    shutdown: &Shutdown,
) -> Report {
    let mut report = Report::new(plan.name);
    if plan.mix.is_empty() {
        return report;
    }

    let stagger = plan.stagger * index as u32;
    if !stagger.is_zero() && !pause(stagger, shutdown).await {
        report.cancelled = true;
        return report;
    }

    let mut done = 0usize;
    let mut next_progress = plan.progress_every.map(|every| start + every);

    loop {
        if shutdown.is_triggered() {
            report.cancelled = true;
            break;
        }
        if plan.ops_per_worker.is_some_and(|cap| done >= cap) {
            break;
        }
        if plan.duration.is_some_and(|limit| start.elapsed() >= limit) {
            break;
        }

        let operation = plan.mix[fastrand::usize(..plan.mix.len())];
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                report.cancelled = true;
                break;
            }
            result = client.execute(operation) => match result {
                Ok(probe) => report.record(&probe),
                Err(e) => {
                    tracing::warn!(worker = index, operation = %operation, error = %e, "Request failed");
                    report.record_transport_error();
                }
            },
        }
        done += 1;

        if let (Some(at), Some(every)) = (next_progress, plan.progress_every) {
            if Instant::now() >= at {
                tracing::info!(
                    scenario = plan.name,
                    minutes = start.elapsed().as_secs() / 60,
                    operations = report.total,
                    "Progress"
                );
                next_progress = Some(at + every);
            }
        }

        if !pause(plan.delay.sample(), shutdown).await {
            report.cancelled = true;
            break;
        }
    }

    report
}

/// Sleep unless shutdown fires first. Returns `false` when cancelled.
async fn pause(duration: Duration, shutdown: &Shutdown) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_range_sample() {
        let range = DelayRange::between_millis(100, 300);
        for _ in 0..200 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(300));
        }
        assert_eq!(DelayRange::fixed(Duration::from_millis(100)).sample(), Duration::from_millis(100));
        assert_eq!(DelayRange::between_millis(50, 10).max, Duration::from_millis(50));
    }

    #[test]
    fn test_default_plans() {
        let burst = ScenarioPlan::burst();
        assert_eq!((burst.workers, burst.ops_per_worker), (8, Some(5)));

        let sustained = ScenarioPlan::sustained();
        assert_eq!(sustained.duration, Some(Duration::from_secs(300)));
        assert_eq!(sustained.ops_per_worker, None);

        let spike = ScenarioPlan::spike();
        assert_eq!(spike.stagger, Duration::from_millis(200));
        assert!(spike.mix.contains(&Operation::GetBook { max_id: 1000 }));
    }

    #[test]
    fn test_all_runs_sustained_last() {
        let names: Vec<_> = ScenarioKind::All.plans().iter().map(|p| p.name).collect();
        assert_eq!(names, ["burst", "spike", "degradation", "latency", "sustained"]);
        assert_eq!(ScenarioKind::Latency.plans().len(), 1);
    }

    #[test]
    fn test_overrides() {
        let overrides = PlanOverrides {
            workers: Some(0),
            ops: Some(2),
            duration_secs: None,
            min_delay_ms: Some(0),
            max_delay_ms: None,
        };
        let plan = overrides.apply(ScenarioPlan::burst());
        assert_eq!(plan.workers, 1);
        assert_eq!(plan.ops_per_worker, Some(2));
        assert_eq!(plan.delay, DelayRange::between_millis(0, 300));

        let untouched = PlanOverrides::default().apply(ScenarioPlan::spike());
        assert_eq!(untouched.delay, ScenarioPlan::spike().delay);
    }

    #[tokio::test]
    async fn test_pause_cancelled() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(!pause(Duration::from_secs(60), &shutdown).await);
    }
}
