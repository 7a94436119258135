//! Collection of all stats files of one subject into a single [`SubjectTable`].
//!
//! Every stats file is parsed and normalized on its own. A broken file is recorded in the
//! table and skipped, it never affects the other files of the subject.

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::atlas::{Atlas, Hemisphere, RecordKey, SourceKey};
use crate::cohort::CancellationToken;
use crate::error::{DuplicateRecordError, FsStatsError, ParseError, Result, SourceParseError};
use crate::fs_stats::FsStats;
use crate::normalize::{normalize_stats, StatRecord};
use crate::util::read_file_bytes;


/// The raw content of one stats file of a subject, together with the source it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSource {
    pub key: SourceKey,
    pub content: Vec<u8>,
}

impl StatsSource {
    /// Create a stats source from file content. Fails if the hemisphere does not fit the atlas.
    pub fn new<C: Into<Vec<u8>>>(hemisphere: Hemisphere, atlas: Atlas, content: C) -> Result<StatsSource> {
        Ok(StatsSource {
            key: SourceKey::new(hemisphere, atlas)?,
            content: content.into(),
        })
    }

    /// Read a stats source from a file. If the file's name ends with ".gz", it is GZip decoded.
    pub fn from_file<P: AsRef<Path>>(path: P, hemisphere: Hemisphere, atlas: Atlas) -> Result<StatsSource> {
        let key = SourceKey::new(hemisphere, atlas)?;
        Ok(StatsSource { key, content: read_file_bytes(path)? })
    }

    /// The content as text. Stats files are plain ASCII, anything else gets replaced.
    pub fn text(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Parse and normalize this source into records.
    pub fn records(&self) -> std::result::Result<Vec<StatRecord>, ParseError> {
        let stats = FsStats::parse(&self.text(), self.key)?;
        normalize_stats(&stats)
    }
}


/// All stats files available for one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectInput {
    pub subject_id: String,
    pub sources: Vec<StatsSource>,
}

impl SubjectInput {
    pub fn new<S: Into<String>>(subject_id: S) -> SubjectInput {
        SubjectInput {
            subject_id: subject_id.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: StatsSource) -> SubjectInput {
        self.sources.push(source);
        self
    }

    /// Load the given sources from the `stats` directory of a recon-all subject, using the
    /// standard file names (or their ".gz" variants). Sources without a file are skipped.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fsstats::{CohortConfig, SubjectInput};
    /// let config = CohortConfig::default();
    /// let input = SubjectInput::from_stats_dir("subject1", "/path/to/subjects_dir/subject1/stats", &config.expected_sources).unwrap();
    /// println!("Found {} stats files.", input.sources.len());
    /// ```
    pub fn from_stats_dir<S, P>(subject_id: S, stats_dir: P, sources: &BTreeSet<SourceKey>) -> Result<SubjectInput>
    where
        S: Into<String>,
        P: AsRef<Path>,
    {
        let mut input = SubjectInput::new(subject_id);
        for key in sources.iter() {
            let file_name = key.stats_file_name();
            let plain = stats_dir.as_ref().join(&file_name);
            let packed = stats_dir.as_ref().join(format!("{}.gz", file_name));
            let path = if plain.is_file() {
                plain
            } else if packed.is_file() {
                packed
            } else {
                debug!("Subject {}: no file {} in {}", input.subject_id, file_name, stats_dir.as_ref().display());
                continue;
            };
            input.sources.push(StatsSource::from_file(path, key.hemisphere, key.atlas)?);
        }
        Ok(input)
    }
}


/// All records recovered for one subject, plus a full account of what could not be recovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectTable {
    pub subject_id: String,
    /// Records ordered by source (hemisphere, then atlas), then by file order.
    pub records: Vec<StatRecord>,
    /// The sources for which a stats file was supplied, whether it could be parsed or not.
    pub present_sources: BTreeSet<SourceKey>,
    /// Expected sources for which no stats file was supplied.
    pub missing_sources: BTreeSet<SourceKey>,
    pub parse_errors: Vec<SourceParseError>,
    pub duplicate_errors: Vec<DuplicateRecordError>,
}

impl SubjectTable {
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.parse_errors.is_empty() || !self.duplicate_errors.is_empty()
    }

    /// Whether all expected sources were supplied and everything was parsed without problems.
    pub fn is_complete(&self) -> bool {
        !self.has_errors() && self.missing_sources.is_empty()
    }

    /// The sources which were supplied but could not be parsed.
    pub fn failed_sources(&self) -> BTreeSet<SourceKey> {
        self.parse_errors.iter().map(|e| e.source).collect()
    }

    /// The sources which were supplied and parsed.
    pub fn recovered_sources(&self) -> BTreeSet<SourceKey> {
        let failed = self.failed_sources();
        self.present_sources.difference(&failed).cloned().collect()
    }

    /// Find the record with the given key.
    pub fn record(&self, key: &RecordKey) -> Option<&StatRecord> {
        self.records.iter().find(|r| {
            r.region_id == key.region_id && r.hemisphere == key.hemisphere && r.measure == key.measure && r.source_atlas == key.atlas
        })
    }
}

impl fmt::Display for SubjectTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Subject {} with {} records from {} sources, {} missing sources, {} errors.",
            self.subject_id,
            self.records.len(),
            self.present_sources.len(),
            self.missing_sources.len(),
            self.parse_errors.len() + self.duplicate_errors.len()
        )
    }
}


/// Builds [`SubjectTable`]s. The expected sources define which stats files every subject should have.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectCollector {
    expected_sources: BTreeSet<SourceKey>,
}

impl SubjectCollector {
    pub fn new(expected_sources: BTreeSet<SourceKey>) -> SubjectCollector {
        SubjectCollector { expected_sources }
    }

    pub fn expected_sources(&self) -> &BTreeSet<SourceKey> {
        &self.expected_sources
    }

    /// Collect all sources of a subject into a table. The files are processed in parallel on the current rayon pool.
    pub fn collect(&self, input: &SubjectInput) -> SubjectTable {
        let sources = sorted_sources(input);
        let outcomes: Vec<std::result::Result<Vec<StatRecord>, ParseError>> =
            sources.par_iter().map(|source| source.records()).collect();
        self.merge(input, &sources, outcomes)
    }

    /// Like [`SubjectCollector::collect`], but checks `cancel` before each stats file.
    ///
    /// Returns [`FsStatsError::Cancelled`] if any file was skipped due to cancellation, a partial
    /// table is never returned.
    pub fn collect_cancellable(&self, input: &SubjectInput, cancel: &CancellationToken) -> Result<SubjectTable> {
        let sources = sorted_sources(input);
        let outcomes: Option<Vec<std::result::Result<Vec<StatRecord>, ParseError>>> = sources
            .par_iter()
            .map(|source| if cancel.is_cancelled() { None } else { Some(source.records()) })
            .collect();
        let outcomes = outcomes.ok_or(FsStatsError::Cancelled)?;
        Ok(self.merge(input, &sources, outcomes))
    }

    fn merge(
        &self,
        input: &SubjectInput,
        sources: &[&StatsSource],
        outcomes: Vec<std::result::Result<Vec<StatRecord>, ParseError>>,
    ) -> SubjectTable {
        let mut present_sources: BTreeSet<SourceKey> = BTreeSet::new();
        let mut parse_errors: Vec<SourceParseError> = Vec::new();
        let mut tagged: Vec<(SourceKey, StatRecord)> = Vec::new();
        for (source, outcome) in sources.iter().zip(outcomes) {
            present_sources.insert(source.key);
            match outcome {
                Ok(records) => tagged.extend(records.into_iter().map(|r| (source.key, r))),
                Err(error) => {
                    warn!("Subject {}: skipping {}: {}", input.subject_id, source.key, error);
                    parse_errors.push(SourceParseError { source: source.key, error });
                }
            }
        }

        let (records, duplicate_errors) = remove_duplicates(tagged);
        for err in duplicate_errors.iter() {
            warn!("Subject {}: {}", input.subject_id, err);
        }

        for unexpected in present_sources.difference(&self.expected_sources) {
            warn!("Subject {}: source {} was supplied but is not expected", input.subject_id, unexpected);
        }
        let missing_sources: BTreeSet<SourceKey> = self.expected_sources.difference(&present_sources).cloned().collect();

        debug!(
            "Subject {}: {} records, {} missing sources, {} parse errors",
            input.subject_id,
            records.len(),
            missing_sources.len(),
            parse_errors.len()
        );

        SubjectTable {
            subject_id: input.subject_id.clone(),
            records,
            present_sources,
            missing_sources,
            parse_errors,
            duplicate_errors,
        }
    }
}


/// The sources of a subject in merge order. The sort is stable, repeated sources keep their input order.
fn sorted_sources(input: &SubjectInput) -> Vec<&StatsSource> {
    let mut sources: Vec<&StatsSource> = input.sources.iter().collect();
    sources.sort_by_key(|s| s.key);
    sources
}


/// Drop every record whose key occurs more than once, reporting each such key once, at the
/// position of its first occurrence.
fn remove_duplicates(tagged: Vec<(SourceKey, StatRecord)>) -> (Vec<StatRecord>, Vec<DuplicateRecordError>) {
    let mut key_sources: HashMap<RecordKey, Vec<SourceKey>> = HashMap::new();
    for (source, record) in tagged.iter() {
        key_sources.entry(record.key()).or_default().push(*source);
    }

    let mut records: Vec<StatRecord> = Vec::with_capacity(tagged.len());
    let mut duplicate_errors: Vec<DuplicateRecordError> = Vec::new();
    let mut reported: HashSet<RecordKey> = HashSet::new();
    for (_, record) in tagged {
        let key = record.key();
        match key_sources.get(&key) {
            Some(sources) if sources.len() > 1 => {
                if !reported.contains(&key) {
                    duplicate_errors.push(DuplicateRecordError { key: key.clone(), sources: sources.clone() });
                    reported.insert(key);
                }
            }
            _ => records.push(record),
        }
    }
    (records, duplicate_errors)
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::atlas::Measure;
    use crate::error::ParseErrorKind;

    const HEADER: &str = "# ColHeaders StructName NumVert SurfArea GrayVol ThickAvg ThickStd MeanCurv GausCurv FoldInd CurvInd\n";

    fn aparc(rows: &[(&str, f64)]) -> String {
        let mut text = String::from("# Table of FreeSurfer cortical parcellation anatomical statistics\n");
        text.push_str(HEADER);
        for (region, thickness) in rows {
            text.push_str(&format!("{:<20} 1000 700 2000 {:.3} 0.500 0.100 0.020 10 1.0\n", region, thickness));
        }
        text
    }

    fn desikan_collector() -> SubjectCollector {
        SubjectCollector::new(SourceKey::all_for(Atlas::Desikan).into_iter().collect())
    }

    #[test]
    fn a_subject_missing_one_hemisphere_records_the_missing_source() {
        let input = SubjectInput::new("sub-01")
            .with_source(StatsSource::new(Hemisphere::Left, Atlas::Desikan, aparc(&[("bankssts", 2.3), ("insula", 2.9)])).unwrap());
        let table = desikan_collector().collect(&input);

        let thickness: Vec<&StatRecord> = table.records.iter().filter(|r| r.measure == Measure::Thickness).collect();
        assert_eq!(2, thickness.len());
        assert_eq!(18, table.num_records());
        let expected_missing: BTreeSet<SourceKey> = vec![SourceKey::new(Hemisphere::Right, Atlas::Desikan).unwrap()].into_iter().collect();
        assert_eq!(expected_missing, table.missing_sources);
        assert!(!table.has_errors());
        assert!(!table.is_complete());
    }

    #[test]
    fn a_broken_file_does_not_affect_its_siblings() {
        let broken = format!("{}insula 1 2 3\n", HEADER);
        let input = SubjectInput::new("sub-02")
            .with_source(StatsSource::new(Hemisphere::Right, Atlas::Desikan, broken).unwrap())
            .with_source(StatsSource::new(Hemisphere::Left, Atlas::Desikan, aparc(&[("insula", 2.9)])).unwrap());
        let table = desikan_collector().collect(&input);

        assert!(table.missing_sources.is_empty());
        assert_eq!(1, table.parse_errors.len());
        assert_eq!(ParseErrorKind::MalformedRow, table.parse_errors[0].error.kind);
        assert_eq!(Some(2), table.parse_errors[0].error.line_number);
        assert!(table.records.iter().all(|r| r.hemisphere == Hemisphere::Left));
        assert_eq!(9, table.num_records());

        let rh: BTreeSet<SourceKey> = vec![SourceKey::new(Hemisphere::Right, Atlas::Desikan).unwrap()].into_iter().collect();
        assert_eq!(rh, table.failed_sources());
        assert_eq!(1, table.recovered_sources().len());
    }

    #[test]
    fn records_are_merged_in_source_order_regardless_of_input_order() {
        let lh = StatsSource::new(Hemisphere::Left, Atlas::Desikan, aparc(&[("insula", 2.9)])).unwrap();
        let rh = StatsSource::new(Hemisphere::Right, Atlas::Desikan, aparc(&[("insula", 3.0)])).unwrap();
        let forward = SubjectInput::new("s").with_source(lh.clone()).with_source(rh.clone());
        let backward = SubjectInput::new("s").with_source(rh).with_source(lh);

        let collector = desikan_collector();
        let a = collector.collect(&forward);
        let b = collector.collect(&backward);
        assert_eq!(a, b);
        assert_eq!(Hemisphere::Left, a.records[0].hemisphere);
    }

    #[test]
    fn duplicate_records_are_reported_and_dropped() {
        let text = aparc(&[("insula", 2.9), ("cuneus", 1.9), ("insula", 3.1)]);
        let input = SubjectInput::new("s").with_source(StatsSource::new(Hemisphere::Left, Atlas::Desikan, text).unwrap());
        let table = desikan_collector().collect(&input);

        assert_eq!(9, table.duplicate_errors.len());
        assert!(table.records.iter().all(|r| r.region_id == "cuneus"));
        assert_eq!(9, table.num_records());
        let dup = &table.duplicate_errors[0];
        assert_eq!("insula", dup.key.region_id);
        assert_eq!(2, dup.sources.len());
    }

    #[test]
    fn the_same_source_supplied_twice_is_a_duplicate() {
        let lh = StatsSource::new(Hemisphere::Left, Atlas::Desikan, aparc(&[("insula", 2.9)])).unwrap();
        let input = SubjectInput::new("s").with_source(lh.clone()).with_source(lh);
        let table = desikan_collector().collect(&input);
        assert!(table.records.is_empty());
        assert_eq!(9, table.duplicate_errors.len());
    }

    #[test]
    fn a_cancelled_collection_returns_no_table() {
        let input = SubjectInput::new("s")
            .with_source(StatsSource::new(Hemisphere::Left, Atlas::Desikan, aparc(&[("insula", 2.9)])).unwrap());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(desikan_collector().collect_cancellable(&input, &cancel), Err(FsStatsError::Cancelled)));
    }

    #[test]
    fn invalid_source_combinations_are_rejected() {
        assert!(StatsSource::new(Hemisphere::NotApplicable, Atlas::Desikan, "").is_err());
    }
}
