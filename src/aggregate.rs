//! Aggregation of many subject tables into one cohort table, in long or wide format.
//!
//! Aggregation is purely structural: values are copied, never combined across subjects.
//! Missing measurements stay missing (`None`), they are never turned into zeros.

use log::{debug, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::io::Write;

use crate::atlas::{Atlas, Hemisphere, Measure, SourceKey};
use crate::error::{DuplicateRecordError, Result, SourceParseError};
use crate::normalize::StatRecord;
use crate::subject::SubjectTable;
use crate::traits::Tabular;


/// Which subjects are left out of an aggregated table. They are still listed in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionPolicy {
    /// Keep every subject.
    KeepAll,
    /// Leave out subjects with any parse or duplicate error.
    ExcludeWithErrors,
    /// Leave out subjects with any error or missing source.
    ExcludeIncomplete,
}

impl Default for ExclusionPolicy {
    fn default() -> ExclusionPolicy {
        ExclusionPolicy::KeepAll
    }
}

impl ExclusionPolicy {
    pub fn excludes(&self, subject: &SubjectTable) -> bool {
        match self {
            ExclusionPolicy::KeepAll => false,
            ExclusionPolicy::ExcludeWithErrors => subject.has_errors(),
            ExclusionPolicy::ExcludeIncomplete => !subject.is_complete(),
        }
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationOptions {
    pub exclusion: ExclusionPolicy,
    /// Only use records of these atlases. All atlases if `None`.
    pub atlases: Option<BTreeSet<Atlas>>,
}

impl AggregationOptions {
    pub fn with_exclusion(mut self, exclusion: ExclusionPolicy) -> AggregationOptions {
        self.exclusion = exclusion;
        self
    }

    pub fn with_atlases(mut self, atlases: &[Atlas]) -> AggregationOptions {
        self.atlases = Some(atlases.iter().cloned().collect());
        self
    }

    fn includes_record(&self, record: &StatRecord) -> bool {
        self.atlases.as_ref().map(|a| a.contains(&record.source_atlas)).unwrap_or(true)
    }
}


/// One row of a long table: a single measurement of a single subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    pub subject_id: String,
    pub region_id: String,
    pub hemisphere: Hemisphere,
    pub measure: Measure,
    pub value: f64,
    pub source_atlas: Atlas,
}

impl LongRow {
    pub fn unit(&self) -> &'static str {
        self.measure.unit()
    }
}


/// A tidy table with one row per measurement. Rows follow subject order, then record order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongTable {
    pub rows: Vec<LongRow>,
}

pub const LONG_COLUMNS: [&str; 7] = ["subject_id", "region_id", "hemisphere", "measure_name", "value", "unit", "source_atlas"];

impl LongTable {
    pub fn from_subjects<'a, I>(subjects: I, options: &AggregationOptions) -> LongTable
    where
        I: IntoIterator<Item = &'a SubjectTable>,
    {
        let mut rows: Vec<LongRow> = Vec::new();
        for subject in subjects {
            for record in subject.records.iter().filter(|r| options.includes_record(r)) {
                rows.push(LongRow {
                    subject_id: subject.subject_id.clone(),
                    region_id: record.region_id.clone(),
                    hemisphere: record.hemisphere,
                    measure: record.measure,
                    value: record.value,
                    source_atlas: record.source_atlas,
                });
            }
        }
        LongTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Tabular for LongTable {
    fn column_names(&self) -> Vec<String> {
        LONG_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn cell_rows(&self, _missing_token: &str) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.subject_id.clone(),
                    r.region_id.clone(),
                    r.hemisphere.code().to_string(),
                    r.measure.name().to_string(),
                    r.value.to_string(),
                    r.unit().to_string(),
                    r.source_atlas.name().to_string(),
                ]
            })
            .collect()
    }
}


/// A column of a wide table. Columns sort by measure name, then region id, then hemisphere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WideColumn {
    pub measure: Measure,
    pub region_id: String,
    pub hemisphere: Hemisphere,
}

impl WideColumn {
    pub fn new<S: Into<String>>(measure: Measure, region_id: S, hemisphere: Hemisphere) -> WideColumn {
        WideColumn { measure, region_id: region_id.into(), hemisphere }
    }

    fn of_record(record: &StatRecord) -> WideColumn {
        WideColumn::new(record.measure, record.region_id.clone(), record.hemisphere)
    }

    /// The column name, e.g. `thickness__bankssts__rh`.
    pub fn name(&self) -> String {
        format!("{}__{}__{}", self.measure.name(), self.region_id, self.hemisphere.code())
    }
}

impl Ord for WideColumn {
    fn cmp(&self, other: &WideColumn) -> Ordering {
        self.measure
            .name()
            .cmp(other.measure.name())
            .then_with(|| self.region_id.cmp(&other.region_id))
            .then_with(|| self.hemisphere.cmp(&other.hemisphere))
    }
}

impl PartialOrd for WideColumn {
    fn partial_cmp(&self, other: &WideColumn) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for WideColumn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}


/// A subject had more than one record (from different atlases) for a single wide cell.
/// The cell is left missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellConflict {
    pub subject_id: String,
    pub column: WideColumn,
    pub atlases: Vec<Atlas>,
}

impl fmt::Display for CellConflict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let atlases: Vec<&str> = self.atlases.iter().map(|a| a.name()).collect();
        write!(f, "Subject {}: {} measured by several atlases ({})", self.subject_id, self.column, atlases.join(", "))
    }
}


/// A table with one row per subject and one column per (measure, region, hemisphere) seen in the cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub subject_ids: Vec<String>,
    pub columns: Vec<WideColumn>,
    /// Subjects by columns. `None` marks a measurement the subject does not have.
    pub values: Array2<Option<f64>>,
    pub conflicts: Vec<CellConflict>,
}

impl WideTable {
    pub fn from_subjects<'a, I>(subjects: I, options: &AggregationOptions) -> WideTable
    where
        I: IntoIterator<Item = &'a SubjectTable>,
    {
        let subjects: Vec<&SubjectTable> = subjects.into_iter().collect();

        let universe: BTreeSet<WideColumn> = subjects
            .iter()
            .flat_map(|s| s.records.iter())
            .filter(|r| options.includes_record(r))
            .map(WideColumn::of_record)
            .collect();
        let columns: Vec<WideColumn> = universe.into_iter().collect();
        let column_index: HashMap<&WideColumn, usize> = columns.iter().enumerate().map(|(idx, c)| (c, idx)).collect();

        let mut values: Array2<Option<f64>> = Array2::from_elem((subjects.len(), columns.len()), None);
        let mut conflicts: Vec<CellConflict> = Vec::new();
        for (row, subject) in subjects.iter().enumerate() {
            let mut cell_atlases: BTreeMap<usize, Vec<Atlas>> = BTreeMap::new();
            for record in subject.records.iter().filter(|r| options.includes_record(r)) {
                let col = column_index[&WideColumn::of_record(record)];
                cell_atlases.entry(col).or_default().push(record.source_atlas);
                values[[row, col]] = Some(record.value);
            }
            for (col, atlases) in cell_atlases {
                if atlases.len() > 1 {
                    values[[row, col]] = None;
                    let conflict = CellConflict { subject_id: subject.subject_id.clone(), column: columns[col].clone(), atlases };
                    warn!("{}", conflict);
                    conflicts.push(conflict);
                }
            }
        }
        debug!("Wide table with {} subjects and {} columns.", subjects.len(), columns.len());

        WideTable {
            subject_ids: subjects.iter().map(|s| s.subject_id.clone()).collect(),
            columns,
            values,
            conflicts,
        }
    }

    pub fn num_subjects(&self) -> usize {
        self.subject_ids.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, column: &WideColumn) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Get a cell. Returns `None` for unknown subjects or columns, `Some(None)` for a missing measurement.
    pub fn get(&self, subject_id: &str, column: &WideColumn) -> Option<Option<f64>> {
        let row = self.subject_ids.iter().position(|s| s == subject_id)?;
        let col = self.column_index(column)?;
        Some(self.values[[row, col]])
    }

    /// The number of missing cells.
    pub fn num_missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

impl Tabular for WideTable {
    fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.columns.len() + 1);
        names.push(String::from("subject_id"));
        names.extend(self.columns.iter().map(|c| c.name()));
        names
    }

    fn cell_rows(&self, missing_token: &str) -> Vec<Vec<String>> {
        self.subject_ids
            .iter()
            .zip(self.values.outer_iter())
            .map(|(subject_id, cells)| {
                let mut row: Vec<String> = Vec::with_capacity(cells.len() + 1);
                row.push(subject_id.clone());
                row.extend(cells.iter().map(|cell| match cell {
                    Some(value) => value.to_string(),
                    None => missing_token.to_string(),
                }));
                row
            })
            .collect()
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableFormat {
    Long,
    Wide,
}

/// An aggregated cohort table in either format.
#[derive(Debug, Clone, PartialEq)]
pub enum CohortTable {
    Long(LongTable),
    Wide(WideTable),
}

impl CohortTable {
    pub fn write_csv<W: Write>(&self, output: W, missing_token: &str) -> Result<()> {
        match self {
            CohortTable::Long(table) => table.write_csv(output, missing_token),
            CohortTable::Wide(table) => table.write_csv(output, missing_token),
        }
    }

    pub fn to_csv_string(&self, missing_token: &str) -> Result<String> {
        match self {
            CohortTable::Long(table) => table.to_csv_string(missing_token),
            CohortTable::Wide(table) => table.to_csv_string(missing_token),
        }
    }
}


/// What was and was not recovered for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectReport {
    pub subject_id: String,
    pub missing_sources: BTreeSet<SourceKey>,
    pub parse_errors: Vec<SourceParseError>,
    pub duplicate_errors: Vec<DuplicateRecordError>,
    /// Whether the subject was left out of the table.
    pub excluded: bool,
}

impl SubjectReport {
    pub fn is_clean(&self) -> bool {
        self.missing_sources.is_empty() && self.parse_errors.is_empty() && self.duplicate_errors.is_empty()
    }
}


/// The error report accompanying every aggregated table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortReport {
    /// One entry per aggregated subject, in input order.
    pub subjects: Vec<SubjectReport>,
    /// Subjects whose processing did not complete, see [`crate::CohortRun`].
    pub not_completed: Vec<String>,
    /// Wide cells left missing because several atlases measured them.
    pub conflicts: Vec<CellConflict>,
}

impl CohortReport {
    pub fn excluded(&self) -> Vec<&str> {
        self.subjects.iter().filter(|s| s.excluded).map(|s| s.subject_id.as_str()).collect()
    }

    /// The subjects with any missing source or error.
    pub fn with_problems(&self) -> Vec<&SubjectReport> {
        self.subjects.iter().filter(|s| !s.is_clean()).collect()
    }
}

impl fmt::Display for CohortReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Report for {} subjects: {} with problems, {} excluded, {} not completed, {} cell conflicts.",
            self.subjects.len(),
            self.with_problems().len(),
            self.excluded().len(),
            self.not_completed.len(),
            self.conflicts.len()
        )
    }
}


/// Aggregate subject tables into a cohort table in the requested format, together with a full report.
///
/// Never fails: a cohort without usable subjects gives an empty table.
///
/// # Examples
///
/// ```
/// use fsstats::{aggregate, AggregationOptions, CohortTable, TableFormat};
/// let (table, report) = aggregate(&[], TableFormat::Wide, &AggregationOptions::default());
/// match table {
///     CohortTable::Wide(wide) => assert_eq!(0, wide.num_subjects()),
///     CohortTable::Long(_) => unreachable!(),
/// }
/// assert!(report.subjects.is_empty());
/// ```
pub fn aggregate(subjects: &[SubjectTable], format: TableFormat, options: &AggregationOptions) -> (CohortTable, CohortReport) {
    let mut report = CohortReport::default();
    let mut included: Vec<&SubjectTable> = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let excluded = options.exclusion.excludes(subject);
        if excluded {
            debug!("Excluding subject {} from the table.", subject.subject_id);
        } else {
            included.push(subject);
        }
        report.subjects.push(SubjectReport {
            subject_id: subject.subject_id.clone(),
            missing_sources: subject.missing_sources.clone(),
            parse_errors: subject.parse_errors.clone(),
            duplicate_errors: subject.duplicate_errors.clone(),
            excluded,
        });
    }

    let table = match format {
        TableFormat::Long => CohortTable::Long(LongTable::from_subjects(included, options)),
        TableFormat::Wide => {
            let wide = WideTable::from_subjects(included, options);
            report.conflicts = wide.conflicts.clone();
            CohortTable::Wide(wide)
        }
    };
    (table, report)
}
