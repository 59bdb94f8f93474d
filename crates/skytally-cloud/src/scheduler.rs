//! Aggregation scheduler
//!
//! Fans a [`WorkPlan`] out over a bounded pool of tokio tasks. Each task owns
//! its session for the duration of one unit and hands back a single
//! `(unit, result)` pair through the join set; merging happens on the calling
//! task once every unit has reported, so workers share no mutable state.

use crate::error::{CloudError, Result};
use crate::plan::{UnitCoordinates, WorkPlan, WorkUnit};
use crate::provider::{CollectorRegistry, SessionFactory};
use crate::summary::{AccountSummary, RunSummary, ServiceOutcome, UnitFailure};
use chrono::NaiveDate;
use skytally_core::{Record, ServiceKind, TableBuilder};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_UNIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Worker pool width
    pub concurrency: usize,

    /// Budget for one unit (session + full paging)
    pub unit_timeout: Duration,

    /// Date tag for the produced tables
    pub run_date: NaiveDate,
}

impl AggregatorOptions {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            unit_timeout: DEFAULT_UNIT_TIMEOUT,
            run_date,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_unit_timeout(mut self, unit_timeout: Duration) -> Self {
        self.unit_timeout = unit_timeout;
        self
    }
}

/// Progress notifications, e.g. for a terminal progress bar.
pub trait ProgressSink: Send + Sync {
    fn unit_finished(
        &self,
        unit: &UnitCoordinates,
        outcome: std::result::Result<usize, &CloudError>,
    );
}

impl ProgressSink for () {
    fn unit_finished(&self, _: &UnitCoordinates, _: std::result::Result<usize, &CloudError>) {}
}

pub struct Aggregator<F, C> {
    factory: Arc<F>,
    collectors: Arc<C>,
    options: AggregatorOptions,
}

impl<F, C> Aggregator<F, C>
where
    F: SessionFactory + 'static,
    C: CollectorRegistry<F::Session> + 'static,
{
    pub fn new(factory: Arc<F>, collectors: Arc<C>, options: AggregatorOptions) -> Self {
        Self {
            factory,
            collectors,
            options,
        }
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    pub async fn run(&self, plan: &WorkPlan) -> RunSummary {
        self.run_with_progress(plan, &()).await
    }

    /// Run every unit of the plan and merge the results per service.
    ///
    /// Never fails as a whole: unit errors are collected into the summary.
    pub async fn run_with_progress(
        &self,
        plan: &WorkPlan,
        progress: &dyn ProgressSink,
    ) -> RunSummary {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut pending: HashSet<UnitCoordinates> = HashSet::new();

        tracing::info!(
            provider = self.factory.name(),
            units = plan.len(),
            concurrency = self.options.concurrency,
            "starting collection"
        );

        for unit in plan.units() {
            pending.insert(unit.coordinates());
            let unit = unit.clone();
            let factory = Arc::clone(&self.factory);
            let collectors = Arc::clone(&self.collectors);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.options.unit_timeout;

            tasks.spawn(async move {
                let coordinates = unit.coordinates();
                // The semaphore is never closed, so acquire only fails if it is.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (coordinates, Err(unit_error(&unit, "worker pool closed")));
                };
                let result = match tokio::time::timeout(
                    timeout,
                    run_unit(factory.as_ref(), collectors.as_ref(), &unit),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(unit_error(
                        &unit,
                        format!("timed out after {}s", timeout.as_secs()),
                    )),
                };
                (coordinates, result)
            });
        }

        let mut merged: BTreeMap<ServiceKind, Vec<(UnitCoordinates, Vec<Record>)>> =
            BTreeMap::new();
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (unit, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    // Coordinates are recovered from `pending` below.
                    tracing::error!(error = %e, "collection task aborted");
                    continue;
                }
            };
            pending.remove(&unit);

            match result {
                Ok(records) => {
                    tracing::info!(
                        service = %unit.service,
                        account_id = %unit.account_id,
                        region = %unit.region,
                        records = records.len(),
                        "unit collected"
                    );
                    progress.unit_finished(&unit, Ok(records.len()));
                    merged.entry(unit.service).or_default().push((unit, records));
                }
                Err(error) => {
                    tracing::warn!(
                        service = %unit.service,
                        account_id = %unit.account_id,
                        region = %unit.region,
                        error = %error,
                        "unit failed"
                    );
                    progress.unit_finished(&unit, Err(&error));
                    failures.push(UnitFailure { unit, error });
                }
            }
        }

        let mut aborted: Vec<UnitCoordinates> = pending.into_iter().collect();
        aborted.sort();
        for unit in aborted {
            let error = CloudError::collection(
                unit.service,
                unit.account_id.clone(),
                unit.region.clone(),
                "collection task aborted",
            );
            progress.unit_finished(&unit, Err(&error));
            failures.push(UnitFailure { unit, error });
        }
        failures.sort_by(|a, b| a.unit.cmp(&b.unit));

        let mut summary = self.merge(plan, merged, failures);
        summary.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            records = summary.total_records(),
            failed_units = summary.failures.len(),
            duration_ms = summary.duration_ms,
            "collection finished"
        );
        summary
    }

    fn merge(
        &self,
        plan: &WorkPlan,
        mut merged: BTreeMap<ServiceKind, Vec<(UnitCoordinates, Vec<Record>)>>,
        failures: Vec<UnitFailure>,
    ) -> RunSummary {
        let mut accounts: BTreeMap<String, AccountSummary> = BTreeMap::new();
        let mut services = Vec::new();

        for service in plan.services() {
            let columns = self.collectors.collector(*service).columns();
            let mut builder = TableBuilder::new(*service, self.options.run_date, columns);

            // Completion order varies between runs; row order must not.
            let mut reported = merged.remove(service).unwrap_or_default();
            reported.sort_by(|a, b| a.0.cmp(&b.0));

            for (unit, records) in reported {
                let kept = builder.extend(records);
                let account = accounts.entry(unit.account_id).or_default();
                account.resources += kept;
                account.succeeded += 1;
            }

            let units_failed = failures.iter().filter(|f| f.unit.service == *service).count();
            let outcome = ServiceOutcome {
                table: builder.build(),
                units_total: plan.units_for(*service),
                units_failed,
            };
            if outcome.is_flagged() {
                tracing::error!(service = %service, "every unit failed; table is empty");
            }
            services.push(outcome);
        }

        for failure in &failures {
            accounts
                .entry(failure.unit.account_id.clone())
                .or_default()
                .failed += 1;
        }

        RunSummary {
            services,
            failures,
            accounts,
            duration_ms: 0,
        }
    }
}

async fn run_unit<F, C>(factory: &F, collectors: &C, unit: &WorkUnit) -> Result<Vec<Record>>
where
    F: SessionFactory,
    C: CollectorRegistry<F::Session>,
{
    let session = factory.acquire(&unit.account, &unit.region).await?;
    collectors
        .collector(unit.service)
        .collect(&session, &unit.region)
        .await
}

fn unit_error(unit: &WorkUnit, cause: impl ToString) -> CloudError {
    CloudError::collection(
        unit.service,
        unit.account.account_id.clone(),
        unit.region.clone(),
        cause,
    )
}
