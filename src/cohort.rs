//! Running the collection of many subjects on a bounded worker pool.

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::aggregate::{aggregate, AggregationOptions, CohortReport, CohortTable, TableFormat};
use crate::atlas::{Atlas, SourceKey};
use crate::cache::{Fingerprint, SubjectCache};
use crate::error::{FsStatsError, Result};
use crate::subject::{SubjectCollector, SubjectInput, SubjectTable};


/// A flag to stop a running cohort. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}


/// Settings of a cohort run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortConfig {
    /// The maximal number of worker threads. Zero is treated as one.
    pub max_workers: usize,
    /// The stats files every subject should have.
    pub expected_sources: BTreeSet<SourceKey>,
    /// What to write for missing cells in CSV output.
    pub missing_token: String,
}

impl Default for CohortConfig {
    fn default() -> CohortConfig {
        let mut expected_sources: BTreeSet<SourceKey> = SourceKey::all_for(Atlas::Desikan).into_iter().collect();
        expected_sources.extend(SourceKey::all_for(Atlas::Aseg));
        CohortConfig {
            max_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            expected_sources,
            missing_token: String::from("NA"),
        }
    }
}

impl CohortConfig {
    pub fn with_max_workers(mut self, max_workers: usize) -> CohortConfig {
        self.max_workers = max_workers;
        self
    }

    /// Expect all sources of the given atlases.
    pub fn with_atlases(mut self, atlases: &[Atlas]) -> CohortConfig {
        self.expected_sources = atlases.iter().flat_map(|a| SourceKey::all_for(*a)).collect();
        self
    }

    pub fn with_expected_sources(mut self, expected_sources: BTreeSet<SourceKey>) -> CohortConfig {
        self.expected_sources = expected_sources;
        self
    }

    pub fn collector(&self) -> SubjectCollector {
        SubjectCollector::new(self.expected_sources.clone())
    }
}


/// The outcome of a cohort run. Subjects keep their input order.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortRun {
    /// The subjects which were fully processed.
    pub completed: Vec<SubjectTable>,
    /// The ids of the subjects which were not processed, or abandoned, due to cancellation.
    pub not_completed: Vec<String>,
}

impl CohortRun {
    /// Whether the run was cut short by cancellation.
    pub fn cancelled(&self) -> bool {
        !self.not_completed.is_empty()
    }

    /// Aggregate the completed subjects. The report lists the subjects that were not completed.
    pub fn aggregate(&self, format: TableFormat, options: &AggregationOptions) -> (CohortTable, CohortReport) {
        let (table, mut report) = aggregate(&self.completed, format, options);
        report.not_completed = self.not_completed.clone();
        (table, report)
    }
}


/// Collect all subjects, at most `config.max_workers` at a time.
///
/// The `cache` is consulted for every subject with a fingerprint of its stats files. When
/// `cancel` is triggered, subjects which have not started are skipped and running ones stop
/// before their next stats file, they are listed in [`CohortRun::not_completed`].
///
/// Problems with individual stats files never fail the run. Fails if two inputs share a
/// subject id, if the worker pool cannot be created or if the cache storage is unusable.
pub fn run_cohort(
    inputs: &[SubjectInput],
    config: &CohortConfig,
    cache: &dyn SubjectCache,
    cancel: &CancellationToken,
) -> Result<CohortRun> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(inputs.len());
    if let Some(dup) = inputs.iter().find(|input| !seen.insert(input.subject_id.as_str())) {
        return Err(FsStatsError::DuplicateSubject(dup.subject_id.clone()));
    }

    let workers = config.max_workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
    let collector = config.collector();
    info!("Collecting {} subjects with up to {} workers.", inputs.len(), workers);

    let outcomes: Vec<Result<Option<SubjectTable>>> =
        pool.install(|| inputs.par_iter().map(|input| run_subject(input, &collector, cache, cancel)).collect());

    let mut completed: Vec<SubjectTable> = Vec::with_capacity(inputs.len());
    let mut not_completed: Vec<String> = Vec::new();
    for (input, outcome) in inputs.iter().zip(outcomes) {
        match outcome? {
            Some(table) => completed.push(table),
            None => not_completed.push(input.subject_id.clone()),
        }
    }

    if !not_completed.is_empty() {
        warn!("Run cancelled, {} of {} subjects completed.", completed.len(), inputs.len());
    } else {
        info!("Collected {} subjects.", completed.len());
    }
    Ok(CohortRun { completed, not_completed })
}


fn run_subject(
    input: &SubjectInput,
    collector: &SubjectCollector,
    cache: &dyn SubjectCache,
    cancel: &CancellationToken,
) -> Result<Option<SubjectTable>> {
    if cancel.is_cancelled() {
        return Ok(None);
    }
    let fingerprint = Fingerprint::of_subject(input, collector.expected_sources());
    let mut compute = || collector.collect_cancellable(input, cancel);
    match cache.get_or_compute(&input.subject_id, &fingerprint, &mut compute) {
        Ok(table) => Ok(Some(table)),
        Err(FsStatsError::Cancelled) => Ok(None),
        Err(e) => Err(e),
    }
}
