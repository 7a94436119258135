//! The controlled vocabulary shared by all other modules: hemispheres, brain atlases and
//! the measures found in FreeSurfer stats files.
//!
//! Each atlas carries a declarative mapping from the raw column names of its stats files
//! to measures, and from its raw region labels to canonical region ids. Anything not listed
//! in these tables is unknown and gets reported, so that changes in the stats files written
//! by newer FreeSurfer versions do not go unnoticed.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::error::{FsStatsError, Result};
use crate::regions::{RegionEntry, ASEG_REGIONS, DESIKAN_REGIONS, DESTRIEUX_REGIONS, DKT_REGIONS};


/// A brain hemisphere. Subcortical structures like the brain stem belong to none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hemisphere {
    Left,
    Right,
    NotApplicable,
}

impl Hemisphere {
    /// The short FreeSurfer-style code, e.g. `lh`. This is also used in file names and column names.
    pub fn code(&self) -> &'static str {
        match self {
            Hemisphere::Left => "lh",
            Hemisphere::Right => "rh",
            Hemisphere::NotApplicable => "na",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}


/// A brain atlas (parcellation scheme) for which recon-all writes stats files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Atlas {
    /// Desikan-Killiany cortical atlas, `?h.aparc.stats`.
    Desikan,
    /// Destrieux cortical atlas, `?h.aparc.a2009s.stats`.
    Destrieux,
    /// Desikan-Killiany-Tourville cortical atlas, `?h.aparc.DKTatlas.stats`.
    Dkt,
    /// Subcortical segmentation, `aseg.stats`.
    Aseg,
}

pub const ALL_ATLASES: [Atlas; 4] = [Atlas::Desikan, Atlas::Destrieux, Atlas::Dkt, Atlas::Aseg];

impl Atlas {
    pub fn name(&self) -> &'static str {
        match self {
            Atlas::Desikan => "desikan",
            Atlas::Destrieux => "destrieux",
            Atlas::Dkt => "dkt",
            Atlas::Aseg => "aseg",
        }
    }

    /// Whether stats files of this atlas come in one file per hemisphere.
    pub fn is_lateralized(&self) -> bool {
        !matches!(self, Atlas::Aseg)
    }

    /// The hemispheres for which this atlas has stats files.
    pub fn hemispheres(&self) -> &'static [Hemisphere] {
        if self.is_lateralized() {
            &[Hemisphere::Left, Hemisphere::Right]
        } else {
            &[Hemisphere::NotApplicable]
        }
    }

    /// The name of the stats file recon-all writes for this atlas, relative to the `stats` directory of a subject.
    ///
    /// # Examples
    ///
    /// ```
    /// use fsstats::{Atlas, Hemisphere};
    /// assert_eq!("lh.aparc.a2009s.stats", Atlas::Destrieux.stats_file_name(Hemisphere::Left));
    /// assert_eq!("aseg.stats", Atlas::Aseg.stats_file_name(Hemisphere::NotApplicable));
    /// ```
    pub fn stats_file_name(&self, hemisphere: Hemisphere) -> String {
        let prefix = if self.is_lateralized() { format!("{}.", hemisphere.code()) } else { String::new() };
        let base = match self {
            Atlas::Desikan => "aparc.stats",
            Atlas::Destrieux => "aparc.a2009s.stats",
            Atlas::Dkt => "aparc.DKTatlas.stats",
            Atlas::Aseg => "aseg.stats",
        };
        format!("{}{}", prefix, base)
    }

    /// The raw column names of the stats files of this atlas, with their role.
    pub fn columns(&self) -> &'static [(&'static str, ColumnRole)] {
        match self {
            Atlas::Desikan | Atlas::Destrieux | Atlas::Dkt => CORTICAL_COLUMNS,
            Atlas::Aseg => SUBCORTICAL_COLUMNS,
        }
    }

    /// Look up the role of a raw column name. Returns `None` for unknown columns.
    pub fn column_role(&self, column: &str) -> Option<ColumnRole> {
        self.columns().iter().find(|(name, _)| *name == column).map(|(_, role)| *role)
    }

    /// The name of the text column holding the region label. All other columns are numeric.
    pub fn label_column(&self) -> &'static str {
        self.columns()
            .iter()
            .find(|(_, role)| *role == ColumnRole::Label)
            .map(|(name, _)| *name)
            .unwrap_or("StructName")
    }

    /// The known regions of this atlas.
    pub fn regions(&self) -> &'static [RegionEntry] {
        match self {
            Atlas::Desikan => DESIKAN_REGIONS,
            Atlas::Destrieux => DESTRIEUX_REGIONS,
            Atlas::Dkt => DKT_REGIONS,
            Atlas::Aseg => ASEG_REGIONS,
        }
    }

    /// Look up a raw region label as it appears in the stats file. Returns `None` for unknown labels.
    pub fn region(&self, raw_label: &str) -> Option<&'static RegionEntry> {
        self.regions().iter().find(|r| r.raw_label == raw_label)
    }
}

impl fmt::Display for Atlas {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}


/// A measure found in stats files. Each measure has exactly one fixed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Measure {
    NumVertices,
    SurfaceArea,
    GrayMatterVolume,
    Thickness,
    ThicknessStd,
    MeanCurvature,
    GaussianCurvature,
    FoldingIndex,
    CurvatureIndex,
    NumVoxels,
    Volume,
    IntensityMean,
    IntensityStd,
    IntensityMin,
    IntensityMax,
    IntensityRange,
}

impl Measure {
    pub fn name(&self) -> &'static str {
        match self {
            Measure::NumVertices => "num_vertices",
            Measure::SurfaceArea => "surface_area",
            Measure::GrayMatterVolume => "gray_matter_volume",
            Measure::Thickness => "thickness",
            Measure::ThicknessStd => "thickness_std",
            Measure::MeanCurvature => "mean_curvature",
            Measure::GaussianCurvature => "gaussian_curvature",
            Measure::FoldingIndex => "folding_index",
            Measure::CurvatureIndex => "curvature_index",
            Measure::NumVoxels => "num_voxels",
            Measure::Volume => "volume",
            Measure::IntensityMean => "intensity_mean",
            Measure::IntensityStd => "intensity_std",
            Measure::IntensityMin => "intensity_min",
            Measure::IntensityMax => "intensity_max",
            Measure::IntensityRange => "intensity_range",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Measure::NumVertices | Measure::NumVoxels => "count",
            Measure::SurfaceArea => "mm^2",
            Measure::GrayMatterVolume | Measure::Volume => "mm^3",
            Measure::Thickness | Measure::ThicknessStd => "mm",
            Measure::MeanCurvature => "mm^-1",
            Measure::GaussianCurvature => "mm^-2",
            Measure::FoldingIndex | Measure::CurvatureIndex => "unitless",
            Measure::IntensityMean
            | Measure::IntensityStd
            | Measure::IntensityMin
            | Measure::IntensityMax
            | Measure::IntensityRange => "MR",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}


/// What a raw stats file column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// The region label. Text.
    Label,
    /// A known numeric column which is not turned into records, e.g. the segmentation index.
    Ignored,
    /// A numeric column holding the given measure.
    Measure(Measure),
}

const CORTICAL_COLUMNS: &[(&str, ColumnRole)] = &[
    ("StructName", ColumnRole::Label),
    ("NumVert", ColumnRole::Measure(Measure::NumVertices)),
    ("SurfArea", ColumnRole::Measure(Measure::SurfaceArea)),
    ("GrayVol", ColumnRole::Measure(Measure::GrayMatterVolume)),
    ("ThickAvg", ColumnRole::Measure(Measure::Thickness)),
    ("ThickStd", ColumnRole::Measure(Measure::ThicknessStd)),
    ("MeanCurv", ColumnRole::Measure(Measure::MeanCurvature)),
    ("GausCurv", ColumnRole::Measure(Measure::GaussianCurvature)),
    ("FoldInd", ColumnRole::Measure(Measure::FoldingIndex)),
    ("CurvInd", ColumnRole::Measure(Measure::CurvatureIndex)),
];

const SUBCORTICAL_COLUMNS: &[(&str, ColumnRole)] = &[
    ("Index", ColumnRole::Ignored),
    ("SegId", ColumnRole::Ignored),
    ("NVoxels", ColumnRole::Measure(Measure::NumVoxels)),
    ("Volume_mm3", ColumnRole::Measure(Measure::Volume)),
    ("StructName", ColumnRole::Label),
    ("normMean", ColumnRole::Measure(Measure::IntensityMean)),
    ("normStdDev", ColumnRole::Measure(Measure::IntensityStd)),
    ("normMin", ColumnRole::Measure(Measure::IntensityMin)),
    ("normMax", ColumnRole::Measure(Measure::IntensityMax)),
    ("normRange", ColumnRole::Measure(Measure::IntensityRange)),
];


/// Identifies one stats file of a subject: a (hemisphere, atlas) combination.
///
/// The derived ordering (hemisphere first, then atlas) is the order in which sources are
/// merged into a subject table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    pub hemisphere: Hemisphere,
    pub atlas: Atlas,
}

impl SourceKey {
    /// Create a source key, checking that the hemisphere fits the atlas: cortical atlases need
    /// `Left` or `Right`, the subcortical atlas needs `NotApplicable`.
    pub fn new(hemisphere: Hemisphere, atlas: Atlas) -> Result<SourceKey> {
        if atlas.hemispheres().contains(&hemisphere) {
            Ok(SourceKey { hemisphere, atlas })
        } else {
            Err(FsStatsError::InvalidSource(hemisphere, atlas))
        }
    }

    /// All source keys of the given atlas, i.e., one per hemisphere for cortical atlases.
    pub fn all_for(atlas: Atlas) -> Vec<SourceKey> {
        atlas.hemispheres().iter().map(|h| SourceKey { hemisphere: *h, atlas }).collect()
    }

    /// The name of the stats file for this source, see [`Atlas::stats_file_name`].
    pub fn stats_file_name(&self) -> String {
        self.atlas.stats_file_name(self.hemisphere)
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.hemisphere, self.atlas)
    }
}


/// The identifying key of a [`crate::StatRecord`] within one subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub region_id: String,
    pub hemisphere: Hemisphere,
    pub measure: Measure,
    pub atlas: Atlas,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.atlas, self.hemisphere, self.region_id, self.measure)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stats_file_names_follow_recon_all_conventions() {
        assert_eq!("lh.aparc.stats", Atlas::Desikan.stats_file_name(Hemisphere::Left));
        assert_eq!("rh.aparc.DKTatlas.stats", Atlas::Dkt.stats_file_name(Hemisphere::Right));
        assert_eq!("aseg.stats", Atlas::Aseg.stats_file_name(Hemisphere::NotApplicable));
    }

    #[test]
    fn source_keys_reject_lateralization_mismatch() {
        assert!(SourceKey::new(Hemisphere::Left, Atlas::Desikan).is_ok());
        assert!(SourceKey::new(Hemisphere::NotApplicable, Atlas::Aseg).is_ok());
        assert!(SourceKey::new(Hemisphere::NotApplicable, Atlas::Destrieux).is_err());
        assert!(SourceKey::new(Hemisphere::Right, Atlas::Aseg).is_err());
    }

    #[test]
    fn source_keys_sort_by_hemisphere_then_atlas() {
        let mut keys = vec![
            SourceKey { hemisphere: Hemisphere::NotApplicable, atlas: Atlas::Aseg },
            SourceKey { hemisphere: Hemisphere::Right, atlas: Atlas::Desikan },
            SourceKey { hemisphere: Hemisphere::Left, atlas: Atlas::Dkt },
            SourceKey { hemisphere: Hemisphere::Left, atlas: Atlas::Desikan },
        ];
        keys.sort();
        let names: Vec<String> = keys.iter().map(|k| k.stats_file_name()).collect();
        assert_eq!(vec!["lh.aparc.stats", "lh.aparc.DKTatlas.stats", "rh.aparc.stats", "aseg.stats"], names);
    }

    #[test]
    fn column_mappings_are_complete() {
        assert_eq!(10, Atlas::Desikan.columns().len());
        assert_eq!(10, Atlas::Aseg.columns().len());
        assert_eq!("StructName", Atlas::Aseg.label_column());
        assert_eq!(Some(ColumnRole::Measure(Measure::Thickness)), Atlas::Destrieux.column_role("ThickAvg"));
        assert_eq!(Some(ColumnRole::Ignored), Atlas::Aseg.column_role("SegId"));
        assert_eq!(None, Atlas::Desikan.column_role("Volume_mm3"));
    }

    #[test]
    fn every_measure_has_a_unit() {
        assert_eq!("mm", Measure::Thickness.unit());
        assert_eq!("mm^3", Measure::Volume.unit());
        assert_eq!("mm^2", Measure::SurfaceArea.unit());
        for (_, role) in Atlas::Desikan.columns().iter().chain(Atlas::Aseg.columns().iter()) {
            if let ColumnRole::Measure(m) = role {
                assert!(!m.unit().is_empty());
            }
        }
    }

    #[test]
    fn atlas_region_counts() {
        assert_eq!(34, Atlas::Desikan.regions().len());
        assert_eq!(74, Atlas::Destrieux.regions().len());
        assert_eq!(31, Atlas::Dkt.regions().len());
    }
}
