//! Application constants for eprime2spm
//!
//! This module contains scanner timing defaults, E-Prime column names shared
//! by several studies, the fixed contrast tables and the AAL label map used
//! by the cluster report.

// =============================================================================
// Application Defaults
// =============================================================================

/// Directory name used under the platform config directory
pub const CONFIG_DIR_NAME: &str = "eprime2spm";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the output directory
pub const ENV_OUTPUT_DIR: &str = "EPRIME2SPM_OUTPUT_DIR";

/// Environment variable overriding the worker count
pub const ENV_WORKERS: &str = "EPRIME2SPM_WORKERS";

/// Extension of E-Prime table exports picked up when walking directories
pub const INPUT_EXTENSION: &str = "txt";

/// Upper bound on concurrent conversions
pub const MAX_WORKERS: usize = 64;

/// Default block plan file consulted by the DCM converter
pub const DEFAULT_BLOCK_PLAN: &str = "blocks.txt";

// =============================================================================
// Scanner Timing
// =============================================================================

/// Repetition time and lead-in scans of a paradigm
pub mod timing {
    /// TR used by the 2-second acquisition protocols (ms)
    pub const TR_2000_MS: u32 = 2000;

    /// TR used by the 1-second acquisition protocols (ms)
    pub const TR_1000_MS: u32 = 1000;

    /// "Get ready" lead-in scans before the first logged event
    pub const LEAD_IN_SCANS: u32 = 2;
}

// =============================================================================
// Timeouts and Derived Phases (ms)
// =============================================================================

/// Values substituted for zero reaction times and fixed phase durations
pub mod timeouts {
    pub const BAR_PROBLEM_MS: i64 = 30000;
    pub const BAR_CHOICE_MS: i64 = 4000;

    pub const DISCOURSE_PROBE_MS: i64 = 3000;
    pub const DISCOURSE_CONTEXT_LEAD_MS: i64 = 24000;
    pub const DISCOURSE_CONTEXT_MS: i64 = 9000;
    pub const DISCOURSE_CRITICAL_LEAD_MS: i64 = 9000;
    pub const DISCOURSE_CRITICAL_MS: i64 = 4000;

    pub const SENTENCE_LEAD_MS: i64 = 13000;
    pub const SENTENCE_MS: i64 = 7000;
    pub const COMPREHENSION_MS: i64 = 5000;

    pub const WORDS_PRIME_LEAD_MS: i64 = 4000;
    pub const WORDS_PRIME_MS: i64 = 2000;
    pub const WORDS_CHOICE_MS: i64 = 2000;

    /// Fixed gap after the encoding screen before the first delay
    pub const ENCODING_GAP_MS: i64 = 2000;
    /// Fixed gap after the execution screen before the second delay
    pub const EXECUTION_GAP_MS: i64 = 1000;

    /// Duration written for a discarded inst probe without a response
    pub const INST_PROBE_MS: i64 = 2000;
}

// =============================================================================
// Task Switching
// =============================================================================

/// Samples per task-switching block; sample numbers `k * 49 + 1` open a block
pub const TASK_SWITCHING_BLOCK_SAMPLES: i64 = 49;

/// Language-repetition/task-repetition trials retained for the balanced design
pub const SELECTED_REPETITION_TRIALS: &[i64] = &[
    32, 38, 44, 18, 23, 37, 8, 29, //
    85, 66, 87, 91, 77, 95, 79, 70, //
    100, 113, 122, 110, 125, 143, 104, 141, //
    150, 156, 190, 163, 186, 169, 183, 167,
];

// =============================================================================
// ROI Contrasts
// =============================================================================

/// Number of condition columns in an ROI block
pub const ROI_CONDITIONS: usize = 10;

/// Named ROI contrasts over the order ReIP ReXP ReIN ReXN ReR RoIP RoXP RoIN RoXN RoR
///
/// Re/Ro: recall or rotate; I/X: encoding or execution; P/N: practiced or
/// novel; R: probe response.
pub const ROI_CONTRASTS: &[(&str, [i8; ROI_CONDITIONS])] = &[
    ("ReIP", [1, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
    ("ReXP", [0, 1, 0, 0, 0, 0, 0, 0, 0, 0]),
    ("ReIN", [0, 0, 1, 0, 0, 0, 0, 0, 0, 0]),
    ("ReXN", [0, 0, 0, 1, 0, 0, 0, 0, 0, 0]),
    ("ReR", [0, 0, 0, 0, 1, 0, 0, 0, 0, 0]),
    ("RoIP", [0, 0, 0, 0, 0, 1, 0, 0, 0, 0]),
    ("RoXP", [0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
    ("RoIN", [0, 0, 0, 0, 0, 0, 0, 1, 0, 0]),
    ("RoXN", [0, 0, 0, 0, 0, 0, 0, 0, 1, 0]),
    ("RoR", [0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
    // Operation
    ("Re > Ro", [1, 1, 1, 1, 1, -1, -1, -1, -1, -1]),
    ("Ro > Re", [-1, -1, -1, -1, -1, 1, 1, 1, 1, 1]),
    // Phase
    ("I > X", [1, -1, 1, -1, 0, 1, -1, 1, -1, 0]),
    ("X > I", [-1, 1, -1, 1, 0, -1, 1, -1, 1, 0]),
    // Practice
    ("P > N", [1, 1, -1, -1, 0, 1, 1, -1, -1, 0]),
    ("N > P", [-1, -1, 1, 1, 0, -1, -1, 1, 1, 0]),
    // Operation x phase
    ("ReI > RoI", [1, 0, 1, 0, 0, -1, 0, -1, 0, 0]),
    ("RoI > ReI", [-1, 0, -1, 0, 0, 1, 0, 1, 0, 0]),
    ("ReX > RoX", [0, 1, 0, 1, 0, 0, -1, 0, -1, 0]),
    ("RoX > ReX", [0, -1, 0, -1, 0, 0, 1, 0, 1, 0]),
    ("ReR > RoR", [0, 0, 0, 0, 1, 0, 0, 0, 0, -1]),
    ("RoR > ReR", [0, 0, 0, 0, -1, 0, 0, 0, 0, 1]),
    // Phase x practice
    ("IP > XP", [1, -1, 0, 0, 0, 1, -1, 0, 0, 0]),
    ("XP > IP", [-1, 1, 0, 0, 0, -1, 1, 0, 0, 0]),
    ("IN > XN", [0, 0, 1, -1, 0, 0, 0, 1, -1, 0]),
    ("XN > IN", [0, 0, -1, 1, 0, 0, 0, -1, 1, 0]),
    // Operation x practice
    ("ReP > ReN", [1, 1, -1, -1, 0, 0, 0, 0, 0, 0]),
    ("ReN > ReP", [-1, -1, 1, 1, 0, 0, 0, 0, 0, 0]),
    ("RoP > RoN", [0, 0, 0, 0, 0, 1, 1, -1, -1, 0]),
    ("RoN > RoP", [0, 0, 0, 0, 0, -1, -1, 1, 1, 0]),
    // Operation x phase x practice
    ("ReIP > RoIP", [1, 0, 0, 0, 0, -1, 0, 0, 0, 0]),
    ("RoIP > ReIP", [-1, 0, 0, 0, 0, 1, 0, 0, 0, 0]),
    ("ReXP > RoXP", [0, 1, 0, 0, 0, 0, -1, 0, 0, 0]),
    ("RoXP > ReXP", [0, -1, 0, 0, 0, 0, 1, 0, 0, 0]),
    ("ReIN > RoIN", [0, 0, 1, 0, 0, 0, 0, -1, 0, 0]),
    ("RoIN > ReIN", [0, 0, -1, 0, 0, 0, 0, 1, 0, 0]),
    ("ReXN > RoXN", [0, 0, 0, 1, 0, 0, 0, 0, -1, 0]),
    ("RoXN > ReXN", [0, 0, 0, -1, 0, 0, 0, 0, 1, 0]),
    ("ReIP > ReXP", [1, -1, 0, 0, 0, 0, 0, 0, 0, 0]),
    ("ReXP > ReIP", [-1, 1, 0, 0, 0, 0, 0, 0, 0, 0]),
    ("ReIN > ReXN", [0, 0, 1, -1, 0, 0, 0, 0, 0, 0]),
    ("ReXN > ReIN", [0, 0, -1, 1, 0, 0, 0, 0, 0, 0]),
    ("RoIP > RoXP", [0, 0, 0, 0, 0, 1, -1, 0, 0, 0]),
    ("RoXP > RoIP", [0, 0, 0, 0, 0, -1, 1, 0, 0, 0]),
    ("RoIN > RoXN", [0, 0, 0, 0, 0, 0, 0, 1, -1, 0]),
    ("RoXN > RoIN", [0, 0, 0, 0, 0, 0, 0, -1, 1, 0]),
    ("ReIP > ReIN", [1, 0, -1, 0, 0, 0, 0, 0, 0, 0]),
    ("ReIN > ReIP", [-1, 0, 1, 0, 0, 0, 0, 0, 0, 0]),
    ("ReXP > ReXN", [0, 1, 0, -1, 0, 0, 0, 0, 0, 0]),
    ("ReXN > ReXP", [0, -1, 0, 1, 0, 0, 0, 0, 0, 0]),
    ("RoIP > RoIN", [0, 0, 0, 0, 0, 1, 0, -1, 0, 0]),
    ("RoIN > RoIP", [0, 0, 0, 0, 0, -1, 0, 1, 0, 0]),
    ("RoXP > RoXN", [0, 0, 0, 0, 0, 0, 1, 0, -1, 0]),
    ("RoXN > RoXP", [0, 0, 0, 0, 0, 0, -1, 0, 1, 0]),
];

// =============================================================================
// INST Contrasts
// =============================================================================

/// Condition columns of an inst block: ENC/P+ ENC/P- EXE/P+ EXE/P- Probes
pub const INST_CONDITIONS: usize = 5;

/// Named inst contrasts, in output order
pub const INST_CONTRASTS: &[(&str, [f64; INST_CONDITIONS])] = &[
    ("Enc P+", [1.0, 0.0, 0.0, 0.0, 0.0]),
    ("Enc P-", [0.0, 1.0, 0.0, 0.0, 0.0]),
    ("Exe P+", [0.0, 0.0, 1.0, 0.0, 0.0]),
    ("Exe P-", [0.0, 0.0, 0.0, 1.0, 0.0]),
    ("Probe", [0.0, 0.0, 0.0, 0.0, 1.0]),
    ("Enc", [0.5, 0.5, 0.0, 0.0, 0.0]),
    ("Exe", [0.0, 0.0, 0.5, 0.5, 0.0]),
    ("P+", [0.5, 0.0, 0.5, 0.0, 0.0]),
    ("P-", [0.0, 0.5, 0.0, 0.5, 0.0]),
    ("Enc > Exe", [0.5, 0.5, -0.5, -0.5, 0.0]),
    ("Exe > Enc", [-0.5, -0.5, 0.5, 0.5, 0.0]),
    ("P+ > P-", [0.5, -0.5, 0.5, -0.5, 0.0]),
    ("P- > P+", [-0.5, 0.5, -0.5, 0.5, 0.0]),
    ("P- > P+ | Enc", [-1.0, 1.0, 0.0, 0.0, 0.0]),
    ("P+ > P- | Enc", [1.0, -1.0, 0.0, 0.0, 0.0]),
    ("P- > P+ | Exe", [0.0, 0.0, -1.0, 1.0, 0.0]),
    ("P+ > P- | Exe", [0.0, 0.0, 1.0, -1.0, 0.0]),
    ("Enc > Exe | P-", [0.0, 1.0, 0.0, -1.0, 0.0]),
    ("Enc > Exe | P+", [1.0, 0.0, -1.0, 0.0, 0.0]),
    ("Exe > Enc | P-", [0.0, -1.0, 0.0, 1.0, 0.0]),
    ("Exe > Enc | P+", [-1.0, 0.0, 1.0, 0.0, 0.0]),
    ("d(Exe P+)", [-0.3333, -0.3333, 1.0, -0.3333, 0.0]),
    ("d(Exe P-)", [-0.3333, -0.3333, -0.3333, 1.0, 0.0]),
    ("d(Enc P+)", [1.0, -0.3333, -0.3333, -0.3333, 0.0]),
    ("d(Enc P-)", [-0.3333, 1.0, -0.3333, -0.3333, 0.0]),
    ("Exe > Enc | P- > P-", [0.5, -0.5, -0.5, 0.5, 0.0]),
    ("2XN > IN+XP", [0.0, -0.5, -0.5, 1.0, 0.0]),
];

/// Practice and complexity codes of the inst log
pub const INST_CONDITION_CODES: &[(&str, char)] = &[("NIL", '-'), ("T", '+'), ("HIGH", '+'), ("LOW", '-')];

// =============================================================================
// Global Contrasts
// =============================================================================

/// Rows of an inclusion matrix (sessions)
pub const INCLUSION_ROWS: usize = 4;

/// Condition columns per session of a global contrast
pub const INCLUSION_COLUMNS: usize = 5;

// =============================================================================
// AAL Atlas Labels
// =============================================================================

/// Readable names of AAL atlas regions, keyed by label without hemisphere suffix
///
/// The medial orbital label shares the `Frontal_Mid_Orb` key with the middle
/// frontal orbital part; the medial orbital name is the one reported.
pub const AAL_LABELS: &[(&str, &str)] = &[
    ("Precentral", "Precental gyrus"),
    ("Frontal_Sup", "Superior frontal gyrus, dorsolateral"),
    ("Frontal_Sup_Orb", "Superior frontal gyrus, orbital part"),
    ("Frontal_Mid", "Middle frontal gyrus"),
    ("Frontal_Mid_Orb", "Superior frontal gyrus, medial orbital"),
    ("Frontal_Inf_Oper", "Inferior frontal gyrus, opercular part"),
    ("Frontal_Inf_Tri", "Inferior frontal gyrus, triangular part"),
    ("Frontal_Inf_Orb", "Inferior frontal gyrus, orbital part"),
    ("Rolandic_Oper", "Rolandic operculum"),
    ("Supp_Motor_Area", "Supplementary motor area"),
    ("Olfactory", "Olfactory cortex"),
    ("Frontal_Sup_Medial", "Superior frontal gyrus, medial"),
    ("Rectus", "Gyrus rectus"),
    ("Insula", "Insula"),
    ("Cingulum_Ant", "Anterior cingulate and paracingulate gyri"),
    ("Cingulum_Mid", "Median cingulate and paracingulate gyri"),
    ("Cingulum_Post", "Posterior cingulate gyrus"),
    ("Hippocampus", "Hippocampus"),
    ("ParaHippocampal", "Parahippocampal gyrus"),
    ("Amygdala", "Amygdala"),
    ("Calcarine", "Calcarine fissure and surrounding cortex"),
    ("Cuneus", "Cuneus"),
    ("Lingual", "Lingual gyrus"),
    ("Occipital_Sup", "Superior occipital gyrus"),
    ("Occipital_Mid", "Middle occipital gyrus"),
    ("Occipital_Inf", "Inferior occipital gyrus"),
    ("Fusiform", "Fusiform gyrus"),
    ("Postcentral", "Postcentral gyrus"),
    ("Parietal_Sup", "Superior parietal gyrus"),
    ("Parietal_Inf", "Inferior parietal, but supramarginal and angular gyri"),
    ("SupraMarginal", "Supramarginal gyrus"),
    ("Angular", "Angular gyrus"),
    ("Precuneus", "Precuneus"),
    ("Paracentral_Lobule", "Paracentral lobule"),
    ("Caudate", "Caudate nucleus"),
    ("Putamen", "Lenticular nucleus, putamen"),
    ("Pallidum", "Lenticular nucleus, pallidum"),
    ("Thalamus", "Thalamus"),
    ("Heschl", "Heschl gyrus"),
    ("Temporal_Sup", "Superior temporal gyrus"),
    ("Temporal_Pole_Sup", "Temporal pole: superior temporal gyrus"),
    ("Temporal_Mid", "Middle temporal gyrus"),
    ("Temporal_Pole_Mid", "Temporal pole: middle temporal gyrus"),
    ("Temporal_Inf", "Inferior temporal gyrus"),
];

// =============================================================================
// Lookups
// =============================================================================

/// Readable name of an AAL label such as `Insula_L`
///
/// Only `_L`/`_R` labels are known; anything else returns `None`.
pub fn aal_description(label: &str) -> Option<&'static str> {
    let base = label
        .strip_suffix("_L")
        .or_else(|| label.strip_suffix("_R"))?;
    AAL_LABELS
        .iter()
        .find(|(key, _)| *key == base)
        .map(|(_, name)| *name)
}

/// Map an inst practice/complexity code to `+` or `-`
pub fn inst_condition_code(value: &str) -> Option<char> {
    INST_CONDITION_CODES
        .iter()
        .find(|(code, _)| *code == value)
        .map(|(_, sign)| *sign)
}

/// Lead time before the first logged event of a block (ms)
pub fn lead_ms(tr_ms: u32, offset_scans: u32) -> i64 {
    i64::from(tr_ms) * i64::from(offset_scans)
}
