// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock report scheduler.
//!
//! The scheduler samples the clock on a fixed poll interval and fires a
//! period when the local time matches its configured slot. Two guards
//! apply per period: a fired-minute key so one slot never fires twice,
//! and a running flag so an overlapping run of the same period is dropped
//! while the previous one is still in flight. Different periods may run
//! concurrently.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cartpulse_config::{ReportingConfig, ScheduleConfig};
use cartpulse_core::{CartpulseError, ReportPeriod};
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Work executed when a period fires.
#[async_trait]
pub trait PeriodJob: Send + Sync {
    async fn run(&self, period: ReportPeriod) -> Result<(), CartpulseError>;
}

/// A clock slot in "HH:mm" form. Out-of-range components are clamped,
/// not rejected, so a misconfigured slot still fires at a nearby time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn parse(value: &str) -> Self {
        let mut parts = value.splitn(2, ':');
        let hour = parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(0)
            .min(23);
        let minute = parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(0)
            .min(59);
        Self { hour, minute }
    }

    fn matches(&self, local: DateTime<Tz>) -> bool {
        local.hour() == self.hour && local.minute() == self.minute
    }
}

/// Resolved schedule: one slot per period, in one timezone.
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub daily: TimeOfDay,
    pub weekly: TimeOfDay,
    /// Day of week the weekly report fires, 0-6 with 0 = Sunday.
    pub weekly_day: u8,
    pub monthly: TimeOfDay,
    /// Day of month the monthly report fires, 1-31.
    pub monthly_day: u8,
    pub timezone: Tz,
    pub poll_interval: Duration,
}

impl ScheduleSpec {
    pub fn from_config(
        schedule: &ScheduleConfig,
        reporting: &ReportingConfig,
    ) -> Result<Self, CartpulseError> {
        let timezone = Tz::from_str(&reporting.timezone).map_err(|_| {
            CartpulseError::Config(format!("invalid reporting timezone: {}", reporting.timezone))
        })?;
        Ok(Self {
            daily: TimeOfDay::parse(&schedule.daily_time),
            weekly: TimeOfDay::parse(&schedule.weekly_time),
            weekly_day: schedule.weekly_day.min(6),
            monthly: TimeOfDay::parse(&schedule.monthly_time),
            monthly_day: schedule.monthly_day.clamp(1, 31),
            timezone,
            poll_interval: Duration::from_secs(schedule.poll_interval_secs.max(1)),
        })
    }

    /// Whether a period's slot matches the given local instant.
    pub fn matches(&self, period: ReportPeriod, local: DateTime<Tz>) -> bool {
        match period {
            ReportPeriod::Daily => self.daily.matches(local),
            ReportPeriod::Weekly => {
                self.weekly.matches(local)
                    && local.weekday().num_days_from_sunday() == u32::from(self.weekly_day)
            }
            ReportPeriod::Monthly => {
                self.monthly.matches(local) && local.day() == u32::from(self.monthly_day)
            }
        }
    }
}

/// Per-period running flags. A period can have at most one run in flight.
pub struct RunGuards {
    flags: [AtomicBool; 3],
}

impl RunGuards {
    pub fn new() -> Self {
        Self {
            flags: [
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ],
        }
    }

    fn try_acquire(&self, period: ReportPeriod) -> bool {
        self.flags[period.index()]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self, period: ReportPeriod) {
        self.flags[period.index()].store(false, Ordering::Release);
    }
}

impl Default for RunGuards {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases a period's running flag when dropped, so a panicking run
/// cannot leave its period wedged.
struct AcquiredGuard {
    guards: Arc<RunGuards>,
    period: ReportPeriod,
}

impl Drop for AcquiredGuard {
    fn drop(&mut self) {
        self.guards.release(self.period);
    }
}

/// Spawns one run of `period`, unless a run of the same period is still
/// in flight. Returns whether the run was started.
pub fn dispatch(job: Arc<dyn PeriodJob>, guards: Arc<RunGuards>, period: ReportPeriod) -> bool {
    if !guards.try_acquire(period) {
        warn!(%period, "previous run still in flight, dropping this slot");
        return false;
    }
    tokio::spawn(async move {
        let _acquired = AcquiredGuard { guards, period };
        if let Err(error) = job.run(period).await {
            error!(%period, %error, "report run failed");
        }
    });
    true
}

/// Drives the poll loop and dispatches report runs.
pub struct ReportScheduler {
    spec: ScheduleSpec,
    job: Arc<dyn PeriodJob>,
    guards: Arc<RunGuards>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReportScheduler {
    pub fn new(spec: ScheduleSpec, job: Arc<dyn PeriodJob>) -> Self {
        Self {
            spec,
            job,
            guards: Arc::new(RunGuards::new()),
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Starts the poll loop. A previous loop, if any, is stopped first.
    pub fn start(&mut self) {
        self.stop();
        self.cancel = CancellationToken::new();

        let spec = self.spec.clone();
        let job = self.job.clone();
        let guards = self.guards.clone();
        let cancel = self.cancel.clone();

        info!(
            timezone = %spec.timezone,
            poll_secs = spec.poll_interval.as_secs(),
            "report scheduler started"
        );
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(spec.poll_interval);
            // The first tick completes immediately; consume it so the loop
            // starts sampling one interval from now.
            interval.tick().await;
            // Minute key of the last firing, per period.
            let mut fired: [Option<String>; 3] = [None, None, None];

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("report scheduler loop cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        let local = Utc::now().with_timezone(&spec.timezone);
                        let minute_key = local.format("%Y-%m-%d %H:%M").to_string();
                        for period in ReportPeriod::ALL {
                            if !spec.matches(period, local) {
                                continue;
                            }
                            if fired[period.index()].as_deref() == Some(minute_key.as_str()) {
                                continue;
                            }
                            fired[period.index()] = Some(minute_key.clone());
                            info!(%period, minute = %minute_key, "schedule slot matched");
                            dispatch(job.clone(), guards.clone(), period);
                        }
                    }
                }
            }
        }));
    }

    /// Stops the poll loop. Runs already dispatched keep going.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ReportScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
