//! Parsing and aggregation of the statistics files written by FreeSurfer's recon-all.
//!
//! The per-region stats files of many subjects (`lh.aparc.stats`, `aseg.stats`, ...) are parsed,
//! mapped onto one canonical schema and aggregated into long or wide cohort tables, together with
//! a report of everything that was missing or broken.

pub mod aggregate;
pub mod atlas;
pub mod cache;
pub mod cohort;
pub mod error;
pub mod fs_stats;
pub mod normalize;
pub mod regions;
pub mod subject;
pub mod traits;
pub mod util;

pub use aggregate::{
    aggregate, AggregationOptions, CellConflict, CohortReport, CohortTable, ExclusionPolicy, LongRow, LongTable,
    SubjectReport, TableFormat, WideColumn, WideTable,
};
pub use atlas::{Atlas, ColumnRole, Hemisphere, Measure, RecordKey, SourceKey, ALL_ATLASES};
pub use cache::{CacheEntry, DiskCache, Fingerprint, MemoryCache, NoCache, SubjectCache};
pub use cohort::{run_cohort, CancellationToken, CohortConfig, CohortRun};
pub use error::{DuplicateRecordError, FsStatsError, ParseError, ParseErrorKind, Result, SourceParseError};
pub use fs_stats::{read_stats, FsStats, FsStatsRow};
pub use normalize::{normalize_row, normalize_stats, StatRecord};
pub use subject::{StatsSource, SubjectCollector, SubjectInput, SubjectTable};
pub use traits::Tabular;
