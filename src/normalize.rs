//! Mapping of parsed stats rows onto the canonical record schema.
//!
//! A single row holds several measures (one per numeric column), so it turns into several
//! [`StatRecord`]s. Raw column names and region labels are translated through the declarative
//! tables of the row's [`Atlas`]. Anything missing from those tables is an error.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::atlas::{Atlas, ColumnRole, Hemisphere, Measure, RecordKey, SourceKey};
use crate::error::{ParseError, ParseErrorKind};
use crate::fs_stats::{parse_value, FsStats, FsStatsRow};


/// One measured quantity of one brain region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub region_id: String,
    pub hemisphere: Hemisphere,
    pub measure: Measure,
    pub value: f64,
    pub source_atlas: Atlas,
    /// The region label as found in the stats file.
    pub raw_label: Option<String>,
}

impl StatRecord {
    pub fn measure_name(&self) -> &'static str {
        self.measure.name()
    }

    pub fn unit(&self) -> &'static str {
        self.measure.unit()
    }

    /// The key identifying this record within a subject.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            region_id: self.region_id.clone(),
            hemisphere: self.hemisphere,
            measure: self.measure,
            atlas: self.source_atlas,
        }
    }
}

impl fmt::Display for StatRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {} = {} {}", self.region_id, self.hemisphere, self.measure, self.value, self.unit())
    }
}


/// Check that all columns of a parsed stats table are known for its atlas.
pub fn check_columns(stats: &FsStats) -> Result<(), ParseError> {
    for column in stats.column_headers.iter() {
        if stats.source.atlas.column_role(column).is_none() {
            return Err(ParseError::at_line(
                ParseErrorKind::UnknownColumn,
                stats.header_line_number,
                format!("column '{}' is not known for atlas {}", column, stats.source.atlas),
            ));
        }
    }
    Ok(())
}


/// Turn one parsed row into records, one per measure column, in column order.
///
/// The hemisphere of the records is the one of the `source`, unless the region label itself
/// encodes a hemisphere (as in `Left-Hippocampus`).
pub fn normalize_row(row: &FsStatsRow, source: SourceKey) -> Result<Vec<StatRecord>, ParseError> {
    let atlas = source.atlas;
    let label = row.get(atlas.label_column()).ok_or_else(|| {
        ParseError::at_line(ParseErrorKind::MalformedRow, row.line_number, format!("no value for column '{}'", atlas.label_column()))
    })?;
    let region = atlas.region(label).ok_or_else(|| {
        ParseError::at_line(ParseErrorKind::UnknownRegion, row.line_number, format!("region '{}' is not known for atlas {}", label, atlas))
    })?;
    let hemisphere = region.hemisphere.unwrap_or(source.hemisphere);

    let mut records: Vec<StatRecord> = Vec::new();
    for (column, raw_value) in row.fields.iter() {
        let measure = match atlas.column_role(column) {
            Some(ColumnRole::Measure(measure)) => measure,
            Some(ColumnRole::Label) | Some(ColumnRole::Ignored) => continue,
            None => {
                return Err(ParseError::at_line(
                    ParseErrorKind::UnknownColumn,
                    row.line_number,
                    format!("column '{}' is not known for atlas {}", column, atlas),
                ))
            }
        };
        let value = parse_value(raw_value).ok_or_else(|| {
            ParseError::at_line(ParseErrorKind::MalformedRow, row.line_number, format!("non-numeric value '{}' in column '{}'", raw_value, column))
        })?;
        records.push(StatRecord {
            region_id: region.region_id.to_string(),
            hemisphere,
            measure,
            value,
            source_atlas: atlas,
            raw_label: Some(label.to_string()),
        });
    }
    Ok(records)
}


/// Turn a whole parsed stats table into records, in row order. Stops at the first problem.
pub fn normalize_stats(stats: &FsStats) -> Result<Vec<StatRecord>, ParseError> {
    check_columns(stats)?;
    let mut records: Vec<StatRecord> = Vec::new();
    for row in stats.rows.iter() {
        records.extend(normalize_row(row, stats.source)?);
    }
    Ok(records)
}
