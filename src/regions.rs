//! Region vocabularies of the supported atlases: the raw labels found in the `StructName`
//! column of the stats files, and the canonical region id each one maps to.

use crate::atlas::Hemisphere;


/// One known region label of an atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEntry {
    /// The label as written in the stats file.
    pub raw_label: &'static str,
    /// The canonical region id.
    pub region_id: &'static str,
    /// The hemisphere encoded in the label itself. `None` for cortical atlases, where the
    /// hemisphere is given by the stats file.
    pub hemisphere: Option<Hemisphere>,
}

const fn cortical(raw_label: &'static str, region_id: &'static str) -> RegionEntry {
    RegionEntry { raw_label, region_id, hemisphere: None }
}

const fn subcortical(raw_label: &'static str, region_id: &'static str, hemisphere: Hemisphere) -> RegionEntry {
    RegionEntry { raw_label, region_id, hemisphere: Some(hemisphere) }
}

/// Desikan-Killiany atlas (aparc), 34 regions.
pub const DESIKAN_REGIONS: &[RegionEntry] = &[
    cortical("bankssts", "bankssts"),
    cortical("caudalanteriorcingulate", "caudalanteriorcingulate"),
    cortical("caudalmiddlefrontal", "caudalmiddlefrontal"),
    cortical("cuneus", "cuneus"),
    cortical("entorhinal", "entorhinal"),
    cortical("fusiform", "fusiform"),
    cortical("inferiorparietal", "inferiorparietal"),
    cortical("inferiortemporal", "inferiortemporal"),
    cortical("isthmuscingulate", "isthmuscingulate"),
    cortical("lateraloccipital", "lateraloccipital"),
    cortical("lateralorbitofrontal", "lateralorbitofrontal"),
    cortical("lingual", "lingual"),
    cortical("medialorbitofrontal", "medialorbitofrontal"),
    cortical("middletemporal", "middletemporal"),
    cortical("parahippocampal", "parahippocampal"),
    cortical("paracentral", "paracentral"),
    cortical("parsopercularis", "parsopercularis"),
    cortical("parsorbitalis", "parsorbitalis"),
    cortical("parstriangularis", "parstriangularis"),
    cortical("pericalcarine", "pericalcarine"),
    cortical("postcentral", "postcentral"),
    cortical("posteriorcingulate", "posteriorcingulate"),
    cortical("precentral", "precentral"),
    cortical("precuneus", "precuneus"),
    cortical("rostralanteriorcingulate", "rostralanteriorcingulate"),
    cortical("rostralmiddlefrontal", "rostralmiddlefrontal"),
    cortical("superiorfrontal", "superiorfrontal"),
    cortical("superiorparietal", "superiorparietal"),
    cortical("superiortemporal", "superiortemporal"),
    cortical("supramarginal", "supramarginal"),
    cortical("frontalpole", "frontalpole"),
    cortical("temporalpole", "temporalpole"),
    cortical("transversetemporal", "transversetemporal"),
    cortical("insula", "insula"),
];

/// Desikan-Killiany-Tourville atlas (aparc.DKTatlas). Same naming as Desikan, without bankssts and the poles.
pub const DKT_REGIONS: &[RegionEntry] = &[
    cortical("caudalanteriorcingulate", "caudalanteriorcingulate"),
    cortical("caudalmiddlefrontal", "caudalmiddlefrontal"),
    cortical("cuneus", "cuneus"),
    cortical("entorhinal", "entorhinal"),
    cortical("fusiform", "fusiform"),
    cortical("inferiorparietal", "inferiorparietal"),
    cortical("inferiortemporal", "inferiortemporal"),
    cortical("isthmuscingulate", "isthmuscingulate"),
    cortical("lateraloccipital", "lateraloccipital"),
    cortical("lateralorbitofrontal", "lateralorbitofrontal"),
    cortical("lingual", "lingual"),
    cortical("medialorbitofrontal", "medialorbitofrontal"),
    cortical("middletemporal", "middletemporal"),
    cortical("parahippocampal", "parahippocampal"),
    cortical("paracentral", "paracentral"),
    cortical("parsopercularis", "parsopercularis"),
    cortical("parsorbitalis", "parsorbitalis"),
    cortical("parstriangularis", "parstriangularis"),
    cortical("pericalcarine", "pericalcarine"),
    cortical("postcentral", "postcentral"),
    cortical("posteriorcingulate", "posteriorcingulate"),
    cortical("precentral", "precentral"),
    cortical("precuneus", "precuneus"),
    cortical("rostralanteriorcingulate", "rostralanteriorcingulate"),
    cortical("rostralmiddlefrontal", "rostralmiddlefrontal"),
    cortical("superiorfrontal", "superiorfrontal"),
    cortical("superiorparietal", "superiorparietal"),
    cortical("superiortemporal", "superiortemporal"),
    cortical("supramarginal", "supramarginal"),
    cortical("transversetemporal", "transversetemporal"),
    cortical("insula", "insula"),
];

/// Destrieux atlas (aparc.a2009s), 74 regions.
pub const DESTRIEUX_REGIONS: &[RegionEntry] = &[
    cortical("G_and_S_frontomargin", "g_and_s_frontomargin"),
    cortical("G_and_S_occipital_inf", "g_and_s_occipital_inf"),
    cortical("G_and_S_paracentral", "g_and_s_paracentral"),
    cortical("G_and_S_subcentral", "g_and_s_subcentral"),
    cortical("G_and_S_transv_frontopol", "g_and_s_transv_frontopol"),
    cortical("G_and_S_cingul-Ant", "g_and_s_cingul_ant"),
    cortical("G_and_S_cingul-Mid-Ant", "g_and_s_cingul_mid_ant"),
    cortical("G_and_S_cingul-Mid-Post", "g_and_s_cingul_mid_post"),
    cortical("G_cingul-Post-dorsal", "g_cingul_post_dorsal"),
    cortical("G_cingul-Post-ventral", "g_cingul_post_ventral"),
    cortical("G_cuneus", "g_cuneus"),
    cortical("G_front_inf-Opercular", "g_front_inf_opercular"),
    cortical("G_front_inf-Orbital", "g_front_inf_orbital"),
    cortical("G_front_inf-Triangul", "g_front_inf_triangul"),
    cortical("G_front_middle", "g_front_middle"),
    cortical("G_front_sup", "g_front_sup"),
    cortical("G_Ins_lg_and_S_cent_ins", "g_ins_lg_and_s_cent_ins"),
    cortical("G_insular_short", "g_insular_short"),
    cortical("G_occipital_middle", "g_occipital_middle"),
    cortical("G_occipital_sup", "g_occipital_sup"),
    cortical("G_oc-temp_lat-fusifor", "g_oc_temp_lat_fusifor"),
    cortical("G_oc-temp_med-Lingual", "g_oc_temp_med_lingual"),
    cortical("G_oc-temp_med-Parahip", "g_oc_temp_med_parahip"),
    cortical("G_orbital", "g_orbital"),
    cortical("G_pariet_inf-Angular", "g_pariet_inf_angular"),
    cortical("G_pariet_inf-Supramar", "g_pariet_inf_supramar"),
    cortical("G_parietal_sup", "g_parietal_sup"),
    cortical("G_postcentral", "g_postcentral"),
    cortical("G_precentral", "g_precentral"),
    cortical("G_precuneus", "g_precuneus"),
    cortical("G_rectus", "g_rectus"),
    cortical("G_subcallosal", "g_subcallosal"),
    cortical("G_temp_sup-G_T_transv", "g_temp_sup_g_t_transv"),
    cortical("G_temp_sup-Lateral", "g_temp_sup_lateral"),
    cortical("G_temp_sup-Plan_polar", "g_temp_sup_plan_polar"),
    cortical("G_temp_sup-Plan_tempo", "g_temp_sup_plan_tempo"),
    cortical("G_temporal_inf", "g_temporal_inf"),
    cortical("G_temporal_middle", "g_temporal_middle"),
    cortical("Lat_Fis-ant-Horizont", "lat_fis_ant_horizont"),
    cortical("Lat_Fis-ant-Vertical", "lat_fis_ant_vertical"),
    cortical("Lat_Fis-post", "lat_fis_post"),
    cortical("Pole_occipital", "pole_occipital"),
    cortical("Pole_temporal", "pole_temporal"),
    cortical("S_calcarine", "s_calcarine"),
    cortical("S_central", "s_central"),
    cortical("S_cingul-Marginalis", "s_cingul_marginalis"),
    cortical("S_circular_insula_ant", "s_circular_insula_ant"),
    cortical("S_circular_insula_inf", "s_circular_insula_inf"),
    cortical("S_circular_insula_sup", "s_circular_insula_sup"),
    cortical("S_collat_transv_ant", "s_collat_transv_ant"),
    cortical("S_collat_transv_post", "s_collat_transv_post"),
    cortical("S_front_inf", "s_front_inf"),
    cortical("S_front_middle", "s_front_middle"),
    cortical("S_front_sup", "s_front_sup"),
    cortical("S_interm_prim-Jensen", "s_interm_prim_jensen"),
    cortical("S_intrapariet_and_P_trans", "s_intrapariet_and_p_trans"),
    cortical("S_oc_middle_and_Lunatus", "s_oc_middle_and_lunatus"),
    cortical("S_oc_sup_and_transversal", "s_oc_sup_and_transversal"),
    cortical("S_occipital_ant", "s_occipital_ant"),
    cortical("S_oc-temp_lat", "s_oc_temp_lat"),
    cortical("S_oc-temp_med_and_Lingual", "s_oc_temp_med_and_lingual"),
    cortical("S_orbital_lateral", "s_orbital_lateral"),
    cortical("S_orbital_med-olfact", "s_orbital_med_olfact"),
    cortical("S_orbital-H_Shaped", "s_orbital_h_shaped"),
    cortical("S_parieto_occipital", "s_parieto_occipital"),
    cortical("S_pericallosal", "s_pericallosal"),
    cortical("S_postcentral", "s_postcentral"),
    cortical("S_precentral-inf-part", "s_precentral_inf_part"),
    cortical("S_precentral-sup-part", "s_precentral_sup_part"),
    cortical("S_suborbital", "s_suborbital"),
    cortical("S_subparietal", "s_subparietal"),
    cortical("S_temporal_inf", "s_temporal_inf"),
    cortical("S_temporal_sup", "s_temporal_sup"),
    cortical("S_temporal_transverse", "s_temporal_transverse"),
];

/// Subcortical segmentation (aseg). `Thalamus-Proper` is the FreeSurfer 6 spelling of `Thalamus`.
pub const ASEG_REGIONS: &[RegionEntry] = &[
    subcortical("Left-Lateral-Ventricle", "lateral_ventricle", Hemisphere::Left),
    subcortical("Left-Inf-Lat-Vent", "inferior_lateral_ventricle", Hemisphere::Left),
    subcortical("Left-Cerebellum-White-Matter", "cerebellum_white_matter", Hemisphere::Left),
    subcortical("Left-Cerebellum-Cortex", "cerebellum_cortex", Hemisphere::Left),
    subcortical("Left-Thalamus", "thalamus", Hemisphere::Left),
    subcortical("Left-Thalamus-Proper", "thalamus", Hemisphere::Left),
    subcortical("Left-Caudate", "caudate", Hemisphere::Left),
    subcortical("Left-Putamen", "putamen", Hemisphere::Left),
    subcortical("Left-Pallidum", "pallidum", Hemisphere::Left),
    subcortical("Left-Hippocampus", "hippocampus", Hemisphere::Left),
    subcortical("Left-Amygdala", "amygdala", Hemisphere::Left),
    subcortical("Left-Accumbens-area", "accumbens_area", Hemisphere::Left),
    subcortical("Left-VentralDC", "ventral_dc", Hemisphere::Left),
    subcortical("Left-vessel", "vessel", Hemisphere::Left),
    subcortical("Left-choroid-plexus", "choroid_plexus", Hemisphere::Left),
    subcortical("Left-WM-hypointensities", "wm_hypointensities", Hemisphere::Left),
    subcortical("Left-non-WM-hypointensities", "non_wm_hypointensities", Hemisphere::Left),
    subcortical("Right-Lateral-Ventricle", "lateral_ventricle", Hemisphere::Right),
    subcortical("Right-Inf-Lat-Vent", "inferior_lateral_ventricle", Hemisphere::Right),
    subcortical("Right-Cerebellum-White-Matter", "cerebellum_white_matter", Hemisphere::Right),
    subcortical("Right-Cerebellum-Cortex", "cerebellum_cortex", Hemisphere::Right),
    subcortical("Right-Thalamus", "thalamus", Hemisphere::Right),
    subcortical("Right-Thalamus-Proper", "thalamus", Hemisphere::Right),
    subcortical("Right-Caudate", "caudate", Hemisphere::Right),
    subcortical("Right-Putamen", "putamen", Hemisphere::Right),
    subcortical("Right-Pallidum", "pallidum", Hemisphere::Right),
    subcortical("Right-Hippocampus", "hippocampus", Hemisphere::Right),
    subcortical("Right-Amygdala", "amygdala", Hemisphere::Right),
    subcortical("Right-Accumbens-area", "accumbens_area", Hemisphere::Right),
    subcortical("Right-VentralDC", "ventral_dc", Hemisphere::Right),
    subcortical("Right-vessel", "vessel", Hemisphere::Right),
    subcortical("Right-choroid-plexus", "choroid_plexus", Hemisphere::Right),
    subcortical("Right-WM-hypointensities", "wm_hypointensities", Hemisphere::Right),
    subcortical("Right-non-WM-hypointensities", "non_wm_hypointensities", Hemisphere::Right),
    subcortical("3rd-Ventricle", "third_ventricle", Hemisphere::NotApplicable),
    subcortical("4th-Ventricle", "fourth_ventricle", Hemisphere::NotApplicable),
    subcortical("5th-Ventricle", "fifth_ventricle", Hemisphere::NotApplicable),
    subcortical("Brain-Stem", "brain_stem", Hemisphere::NotApplicable),
    subcortical("CSF", "csf", Hemisphere::NotApplicable),
    subcortical("WM-hypointensities", "wm_hypointensities", Hemisphere::NotApplicable),
    subcortical("non-WM-hypointensities", "non_wm_hypointensities", Hemisphere::NotApplicable),
    subcortical("Optic-Chiasm", "optic_chiasm", Hemisphere::NotApplicable),
    subcortical("CC_Posterior", "cc_posterior", Hemisphere::NotApplicable),
    subcortical("CC_Mid_Posterior", "cc_mid_posterior", Hemisphere::NotApplicable),
    subcortical("CC_Central", "cc_central", Hemisphere::NotApplicable),
    subcortical("CC_Mid_Anterior", "cc_mid_anterior", Hemisphere::NotApplicable),
    subcortical("CC_Anterior", "cc_anterior", Hemisphere::NotApplicable),
];
