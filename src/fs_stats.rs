//! Functions for reading FreeSurfer stats files.
//!
//! These are the per-region text tables written by recon-all into the `stats` directory
//! of a subject, e.g. `lh.aparc.stats` or `aseg.stats`. A stats file starts with a block of
//! comment lines holding provenance data and, somewhere within it, the column declaration:
//!
//! ```text
//! # ColHeaders StructName NumVert SurfArea GrayVol ThickAvg ThickStd MeanCurv GausCurv FoldInd CurvInd
//! bankssts    1376    902    2462  2.494 0.512     0.099     0.018        9     1.0
//! ```
//!
//! The data lines are aligned for display but separated by a variable amount of whitespace.

use std::io::Read;
use std::path::Path;
use std::fmt;

use crate::atlas::SourceKey;
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::util::read_text_file;

/// Every line starting with this is a comment line.
pub const COMMENT_MARKER: &str = "#";

/// The first token of the comment line that declares the column names.
pub const COLUMN_HEADER_MARKER: &str = "ColHeaders";


/// One data line of a stats file: the raw string values, keyed by column name in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FsStatsRow {
    /// The 1-based line number in the file.
    pub line_number: usize,
    pub fields: Vec<(String, String)>,
}

impl FsStatsRow {
    /// Get the raw value of the given column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.iter().find(|(name, _)| name == column).map(|(_, value)| value.as_str())
    }
}


/// Models the content of a FreeSurfer stats file.
#[derive(Debug, Clone, PartialEq)]
pub struct FsStats {
    pub source: SourceKey,
    pub column_headers: Vec<String>,
    /// The 1-based line number of the column declaration.
    pub header_line_number: usize,
    pub rows: Vec<FsStatsRow>,
}

impl FsStats {
    /// Read a stats file. If the file's name ends with ".gz", the file is assumed to need GZip decoding.
    pub fn from_file<P: AsRef<Path>>(path: P, source: SourceKey) -> Result<FsStats> {
        let text = read_text_file(path)?;
        Ok(FsStats::parse(&text, source)?)
    }

    /// Read a stats file from the given byte stream, which must be at the start of the file.
    /// Invalid UTF-8 is replaced, as in [`FsStats::from_file`].
    pub fn from_reader<S>(mut input: S, source: SourceKey) -> Result<FsStats>
    where
        S: Read,
    {
        let mut content: Vec<u8> = Vec::new();
        input.read_to_end(&mut content)?;
        Ok(FsStats::parse(&String::from_utf8_lossy(&content), source)?)
    }

    /// Parse the text content of a stats file.
    ///
    /// The atlas in `source` determines which column holds the region label. All other
    /// columns must hold numbers. Parsing stops at the first problem, no partial result is returned.
    pub fn parse(text: &str, source: SourceKey) -> std::result::Result<FsStats, ParseError> {
        let label_column = source.atlas.label_column();
        let mut column_headers: Option<Vec<String>> = None;
        let mut header_line_number: usize = 0;
        let mut rows: Vec<FsStatsRow> = Vec::new();
        let mut has_content = false;

        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            has_content = true;

            if let Some(comment) = line.strip_prefix(COMMENT_MARKER) {
                let mut tokens = comment.split_whitespace();
                if tokens.next() != Some(COLUMN_HEADER_MARKER) {
                    continue; // free-form provenance comment
                }
                if column_headers.is_some() {
                    return Err(ParseError::at_line(ParseErrorKind::MalformedHeader, line_number, "repeated column declaration"));
                }
                let names: Vec<String> = tokens.map(String::from).collect();
                check_column_headers(&names, label_column, line_number)?;
                column_headers = Some(names);
                header_line_number = line_number;
                continue;
            }

            let headers = column_headers.as_ref().ok_or_else(|| {
                ParseError::at_line(ParseErrorKind::MalformedHeader, line_number, "data line before the column declaration")
            })?;
            rows.push(parse_row(line, headers, label_column, line_number)?);
        }

        if !has_content {
            return Err(ParseError::new(ParseErrorKind::EmptyFile, None, "file has no content"));
        }
        let column_headers = column_headers.ok_or_else(|| {
            ParseError::new(ParseErrorKind::MalformedHeader, None, format!("no '{} {}' line found", COMMENT_MARKER, COLUMN_HEADER_MARKER))
        })?;
        if rows.is_empty() {
            return Err(ParseError::new(ParseErrorKind::EmptyFile, None, "no data rows"));
        }

        Ok(FsStats { source, column_headers, header_line_number, rows })
    }

    /// Get the number of data rows, i.e., of brain regions.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

impl fmt::Display for FsStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Stats table {} with {} columns and {} regions.", self.source, self.column_headers.len(), self.rows.len())
    }
}


fn check_column_headers(names: &[String], label_column: &str, line_number: usize) -> std::result::Result<(), ParseError> {
    if names.is_empty() {
        return Err(ParseError::at_line(ParseErrorKind::MalformedHeader, line_number, "column declaration without column names"));
    }
    for (idx, name) in names.iter().enumerate() {
        if names[..idx].contains(name) {
            return Err(ParseError::at_line(ParseErrorKind::MalformedHeader, line_number, format!("duplicate column '{}'", name)));
        }
    }
    if !names.iter().any(|n| n == label_column) {
        return Err(ParseError::at_line(ParseErrorKind::MalformedHeader, line_number, format!("missing label column '{}'", label_column)));
    }
    Ok(())
}


/// Parse a numeric field. Only finite numbers are values, `nan` and `inf` are not.
pub(crate) fn parse_value(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}


fn parse_row(line: &str, headers: &[String], label_column: &str, line_number: usize) -> std::result::Result<FsStatsRow, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != headers.len() {
        return Err(ParseError::at_line(
            ParseErrorKind::MalformedRow,
            line_number,
            format!("expected {} fields, found {}", headers.len(), tokens.len()),
        ));
    }

    let mut fields: Vec<(String, String)> = Vec::with_capacity(headers.len());
    for (name, token) in headers.iter().zip(tokens) {
        if name != label_column && parse_value(token).is_none() {
            return Err(ParseError::at_line(
                ParseErrorKind::MalformedRow,
                line_number,
                format!("non-numeric value '{}' in column '{}'", token, name),
            ));
        }
        fields.push((name.clone(), token.to_string()));
    }
    Ok(FsStatsRow { line_number, fields })
}


/// Read a FreeSurfer stats file.
///
/// # Examples
///
/// ```no_run
/// use fsstats::{Atlas, Hemisphere, SourceKey};
/// let source = SourceKey::new(Hemisphere::Left, Atlas::Desikan).unwrap();
/// let stats = fsstats::read_stats("/path/to/subjects_dir/subject1/stats/lh.aparc.stats", source).unwrap();
/// println!("Found {} regions.", stats.num_rows());
/// ```
pub fn read_stats<P: AsRef<Path>>(path: P, source: SourceKey) -> Result<FsStats> {
    FsStats::from_file(path, source)
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::atlas::{Atlas, Hemisphere};

    const LH_DESIKAN: SourceKey = SourceKey { hemisphere: Hemisphere::Left, atlas: Atlas::Desikan };
    const ASEG: SourceKey = SourceKey { hemisphere: Hemisphere::NotApplicable, atlas: Atlas::Aseg };

    const SMALL_APARC: &str = "# Table of FreeSurfer cortical parcellation anatomical statistics
# hemi lh
# TableCol  1 ColHeader StructName
# NTableCols 10
# ColHeaders StructName NumVert SurfArea GrayVol ThickAvg ThickStd MeanCurv GausCurv FoldInd CurvInd
bankssts                                 1376     902    2462  2.300 0.512        0.099     0.018        9     1.0
insula                                   3350    2216    7366  2.900 0.772        0.108     0.024       33     3.3
";

    #[test]
    fn a_small_aparc_table_can_be_parsed() {
        let stats = FsStats::parse(SMALL_APARC, LH_DESIKAN).unwrap();

        assert_eq!(10, stats.column_headers.len());
        assert_eq!(5, stats.header_line_number);
        assert_eq!(2, stats.num_rows());
        assert_eq!(Some("bankssts"), stats.rows[0].get("StructName"));
        assert_eq!(Some("2.900"), stats.rows[1].get("ThickAvg"));
        assert_eq!(6, stats.rows[0].line_number);
        assert_eq!(7, stats.rows[1].line_number);
    }

    #[test]
    fn the_header_is_found_by_marker_not_position() {
        let text = "# ColHeaders  Index SegId NVoxels Volume_mm3 StructName normMean normStdDev normMin normMax normRange
# some trailing provenance
  1   4     6563     6563.0  Left-Lateral-Ventricle            33.4   13.0     9.0   87.0    78.0
";
        let stats = FsStats::parse(text, ASEG).unwrap();
        assert_eq!(1, stats.num_rows());
        assert_eq!(Some("Left-Lateral-Ventricle"), stats.rows[0].get("StructName"));
        assert_eq!(3, stats.rows[0].line_number);
    }

    #[test]
    fn a_row_with_a_wrong_token_count_is_rejected_with_its_line_number() {
        let text = format!("{}lingual 5100 3402\n", SMALL_APARC);
        let err = FsStats::parse(&text, LH_DESIKAN).unwrap_err();
        assert_eq!(ParseErrorKind::MalformedRow, err.kind);
        assert_eq!(Some(8), err.line_number);
    }

    #[test]
    fn a_non_numeric_value_is_a_malformed_row() {
        let text = SMALL_APARC.replace("2.900", "n/a");
        let err = FsStats::parse(&text, LH_DESIKAN).unwrap_err();
        assert_eq!(ParseErrorKind::MalformedRow, err.kind);
        assert_eq!(Some(7), err.line_number);
        assert!(err.detail.contains("ThickAvg"));
    }

    #[test]
    fn non_finite_values_are_malformed_rows() {
        for token in ["nan", "NaN", "inf", "-inf"].iter() {
            let text = format!("# ColHeaders StructName ThickAvg ThickStd\nbankssts 2.3 0.5\ninsula 2.9 {}\n", token);
            let err = FsStats::parse(&text, LH_DESIKAN).unwrap_err();
            assert_eq!(ParseErrorKind::MalformedRow, err.kind);
            assert_eq!(Some(3), err.line_number);
            assert!(err.detail.contains("ThickStd"));
        }
    }

    #[test]
    fn header_without_rows_is_an_empty_file() {
        let text = "# ColHeaders StructName NumVert SurfArea GrayVol ThickAvg ThickStd MeanCurv GausCurv FoldInd CurvInd\n";
        let err = FsStats::parse(text, LH_DESIKAN).unwrap_err();
        assert_eq!(ParseErrorKind::EmptyFile, err.kind);

        let err = FsStats::parse("\n  \n", LH_DESIKAN).unwrap_err();
        assert_eq!(ParseErrorKind::EmptyFile, err.kind);
    }

    #[test]
    fn header_problems_are_malformed_headers() {
        let no_header = "# just a comment\nbankssts 1 2 3\n";
        let err = FsStats::parse(no_header, LH_DESIKAN).unwrap_err();
        assert_eq!(ParseErrorKind::MalformedHeader, err.kind);
        assert_eq!(Some(2), err.line_number);

        let only_comments = "# just a comment\n";
        let err = FsStats::parse(only_comments, LH_DESIKAN).unwrap_err();
        assert_eq!(ParseErrorKind::MalformedHeader, err.kind);
        assert_eq!(None, err.line_number);

        let empty_decl = "# ColHeaders\n";
        assert_eq!(ParseErrorKind::MalformedHeader, FsStats::parse(empty_decl, LH_DESIKAN).unwrap_err().kind);

        let dup = "# ColHeaders StructName ThickAvg ThickAvg\n";
        assert_eq!(ParseErrorKind::MalformedHeader, FsStats::parse(dup, LH_DESIKAN).unwrap_err().kind);

        let no_label = "# ColHeaders NumVert ThickAvg\n1 2\n";
        assert_eq!(ParseErrorKind::MalformedHeader, FsStats::parse(no_label, LH_DESIKAN).unwrap_err().kind);

        let twice = format!("{}# ColHeaders StructName ThickAvg\n", SMALL_APARC);
        let err = FsStats::parse(&twice, LH_DESIKAN).unwrap_err();
        assert_eq!(ParseErrorKind::MalformedHeader, err.kind);
        assert_eq!(Some(8), err.line_number);
    }

    #[test]
    fn stats_can_be_read_from_a_reader() {
        let stats = FsStats::from_reader(SMALL_APARC.as_bytes(), LH_DESIKAN).unwrap();
        assert_eq!(2, stats.num_rows());
    }

    #[test]
    fn invalid_utf8_is_replaced_when_reading_from_a_reader() {
        let mut content = SMALL_APARC.as_bytes().to_vec();
        content.extend_from_slice(b"# provenance \xff\xfe\n");
        let stats = FsStats::from_reader(content.as_slice(), LH_DESIKAN).unwrap();
        assert_eq!(2, stats.num_rows());
    }
}
