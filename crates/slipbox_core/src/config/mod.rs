//! Scoring configuration loading and validation.
//!
//! # Responsibility
//! - Declare the versioned, operator-edited scoring parameters.
//! - Load them from TOML and reject malformed definitions before any score
//!   is computed.
//!
//! # Invariants
//! - Configuration is a plain value; nothing in core reads it from globals.
//! - Every edit is expected to bump `version`; scores are stamped with it.
//! - Validation failures are fatal at load time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod profile;

pub use profile::ScoringProfile;

/// Most negative points a single penalty signal may carry.
pub const PENALTY_FLOOR: f64 = -5.0;
/// Least negative points a single penalty signal may carry.
pub const PENALTY_CEILING: f64 = -1.0;

/// Top-level scoring configuration, usually read from `scoring.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Bumped by the operator on every edit.
    pub version: u32,
    /// Multiplier per tier; index 0 is tier 1.
    pub tier_multipliers: Vec<f64>,
    /// Hit schedule used by clusters without their own `hit_points`.
    pub default_hit_points: Vec<f64>,
    pub clusters: Vec<ClusterConfig>,
    pub generic: GenericConfig,
    pub structural: StructuralConfig,
    pub novel_framing: NovelFramingConfig,
    pub breadth: TierTable,
    pub length: TierTable,
    pub turn_depth: TierTable,
    pub engagement: TierTable,
    pub density: TierTable,
    pub penalties: PenaltyConfig,
    pub feedback: FeedbackConfig,
}

/// Named group of domain terms sharing one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub name: String,
    /// 1-based tier, resolved through `tier_multipliers`.
    pub tier: u8,
    pub terms: Vec<String>,
    /// Points for the 1st, 2nd, ... distinct hit; the last value repeats.
    #[serde(default)]
    pub hit_points: Option<Vec<f64>>,
}

/// Flat keyword layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenericConfig {
    pub keywords: Vec<String>,
    pub points_per_keyword: f64,
}

/// Named regex rule used by the structural and novel-framing layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructuralConfig {
    pub patterns: Vec<PatternConfig>,
    pub points_per_pattern: f64,
    pub cap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NovelFramingConfig {
    pub patterns: Vec<PatternConfig>,
    pub points_per_pattern: f64,
    pub cap: f64,
}

/// Threshold table shared by the breadth, length, turn, engagement and
/// density layers.
///
/// Breadth and density award only the highest tier reached; length, turn
/// depth and engagement add up every tier reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierTable {
    pub tiers: Vec<Tier>,
    pub cap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tier {
    /// Inclusive lower bound of the measured quantity.
    pub at: f64,
    pub points: f64,
}

impl TierTable {
    fn from_pairs(pairs: &[(f64, f64)], cap: f64) -> Self {
        Self {
            tiers: pairs
                .iter()
                .map(|&(at, points)| Tier { at, points })
                .collect(),
            cap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PenaltyConfig {
    pub low_value_terms: Vec<String>,
    pub low_value_points: f64,
    pub strong_terms: Vec<String>,
    pub strong_points: f64,
    /// Documents at least this long with zero cluster hits are "aimless".
    pub aimless_min_words: usize,
    pub aimless_points: f64,
}

/// Thresholds used by the feedback analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedbackConfig {
    /// Lower edges of the score bands; must start at 0 and increase.
    pub band_edges: Vec<u32>,
    /// Gold below this score is reported as a missed pattern.
    pub expected_gold_threshold: u32,
    /// Skip at or above this score is reported as a false positive.
    pub expected_skip_threshold: u32,
    /// Skip at or above this score is offered for another review.
    pub review_skip_threshold: u32,
    /// Clusters whose gold rate falls below this are reported as weak.
    pub weak_cluster_gold_rate: f64,
    /// Minimum decided entries before a cluster can be called weak.
    pub weak_cluster_min_samples: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: 1,
            tier_multipliers: vec![2.0, 1.5, 1.0, 0.75],
            default_hit_points: vec![4.0, 4.0, 3.0, 3.0, 2.0],
            clusters: Vec::new(),
            generic: GenericConfig::default(),
            structural: StructuralConfig::default(),
            novel_framing: NovelFramingConfig::default(),
            breadth: TierTable::from_pairs(&[(2.0, 4.0), (3.0, 8.0), (4.0, 12.0)], 12.0),
            length: TierTable::from_pairs(&[(1000.0, 2.0), (3000.0, 2.0), (6000.0, 1.0)], 5.0),
            turn_depth: TierTable::from_pairs(&[(4.0, 1.0), (8.0, 1.0)], 2.0),
            engagement: TierTable::from_pairs(&[(30.0, 5.0), (60.0, 5.0)], 10.0),
            density: TierTable::from_pairs(&[(0.5, 2.0), (1.5, 5.0), (3.0, 8.0)], 8.0),
            penalties: PenaltyConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl Default for GenericConfig {
    fn default() -> Self {
        Self {
            keywords: to_strings(&[
                "framework",
                "principle",
                "philosophy",
                "methodology",
                "approach",
                "innovation",
                "validation",
                "product",
                "architecture",
                "design",
                "coaching",
                "transformation",
                "mindset",
                "belief",
                "identity",
                "purpose",
                "strategy",
                "business model",
                "pricing",
                "growth",
                "marketing",
                "positioning",
                "decision",
                "trade-off",
                "tradeoff",
                "chose",
                "decided",
                "because",
            ]),
            points_per_keyword: 1.0,
        }
    }
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            patterns: patterns(&[
                ("numbered_steps", r"(?m)^\s*(?:step\s+)?3[.):]\s+\S"),
                ("comparison_table", r"(?m)^\s*\|?\s*:?-{3,}:?\s*\|"),
                (
                    "framework_shape",
                    r"\b(?:framework|model|matrix|taxonomy|playbook)\b[^.\n]{0,40}\b(?:three|four|five|six|[3-9])\b",
                ),
                ("template_language", r"\b(?:template|checklist|canvas)\b"),
                (
                    "staged_progression",
                    r"\b(?:phase|stage|level|pillar)\s+(?:1|one|i)\b",
                ),
                ("archetypes", r"\barchetypes?\b"),
            ]),
            points_per_pattern: 3.0,
            cap: 15.0,
        }
    }
}

impl Default for NovelFramingConfig {
    fn default() -> Self {
        Self {
            patterns: patterns(&[
                (
                    "tension",
                    r"\b(?:the|a)\s+(?:real\s+|core\s+|central\s+)?tension\s+(?:between|is|here)\b",
                ),
                (
                    "reframe",
                    r"\b(?:reframe|reframing|flip\s+(?:it|this)|another\s+way\s+to\s+(?:see|look\s+at))\b",
                ),
                ("what_if", r"\bwhat\s+if\b"),
                (
                    "whats_really_going_on",
                    r"\bwhat(?:'s|\s+is)\s+really\s+(?:going\s+on|happening)\b",
                ),
                (
                    "not_really_about",
                    r"\b(?:isn't|is\s+not|it's\s+not)\s+really\s+about\b",
                ),
                (
                    "naming_a_model",
                    r"\b(?:call\s+(?:it|this)|i'd\s+call|let's\s+call\s+(?:it|this)|name\s+(?:it|this))\b",
                ),
                (
                    "underlying_problem",
                    r"\bthe\s+(?:underlying|hidden|real)\s+(?:problem|question|pattern)\b",
                ),
                (
                    "unclaimed_opportunity",
                    r"\b(?:nobody|no\s+one)\s+(?:is\s+)?(?:doing|solving|talking\s+about)\b",
                ),
            ]),
            points_per_pattern: 4.0,
            cap: 20.0,
        }
    }
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            low_value_terms: to_strings(&[
                "code",
                "error",
                "bug",
                "fix",
                "debug",
                "syntax",
                "translate",
                "translation",
                "recipe",
                "weather",
                "directions",
                "joke",
                "fun",
                "game",
            ]),
            low_value_points: -1.0,
            strong_terms: to_strings(&[
                "stack trace",
                "traceback",
                "syntax error",
                "npm install",
                "pip install",
                "translate this",
                "translate the following",
            ]),
            strong_points: -5.0,
            aimless_min_words: 20_000,
            aimless_points: -5.0,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            band_edges: vec![0, 10, 20, 30, 40, 50, 60, 70, 80],
            expected_gold_threshold: 50,
            expected_skip_threshold: 50,
            review_skip_threshold: 30,
            weak_cluster_gold_rate: 0.35,
            weak_cluster_min_samples: 3,
        }
    }
}

impl ScoringConfig {
    /// Parses a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Serializes this configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Multiplier for a 1-based tier, `None` when the tier is not configured.
    pub fn tier_multiplier(&self, tier: u8) -> Option<f64> {
        let index = usize::from(tier).checked_sub(1)?;
        self.tier_multipliers.get(index).copied()
    }

    /// Validates declaration-level invariants that do not need regex
    /// compilation.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.version == 0 {
            return Err(ConfigValidationError::InvalidVersion);
        }

        if self.tier_multipliers.is_empty() {
            return Err(ConfigValidationError::InvalidTierMultipliers(
                "at least one tier is required".to_string(),
            ));
        }
        if let Some(bad) = self
            .tier_multipliers
            .iter()
            .find(|value| !value.is_finite() || **value <= 0.0)
        {
            return Err(ConfigValidationError::InvalidTierMultipliers(format!(
                "multiplier {bad} must be positive"
            )));
        }

        validate_hit_points("default_hit_points", &self.default_hit_points)?;

        let mut cluster_names = BTreeSet::<String>::new();
        for (index, cluster) in self.clusters.iter().enumerate() {
            let name = cluster.name.trim();
            if name.is_empty() {
                return Err(ConfigValidationError::EmptyClusterName(index));
            }
            if !cluster_names.insert(name.to_lowercase()) {
                return Err(ConfigValidationError::DuplicateCluster(name.to_string()));
            }
            if self.tier_multiplier(cluster.tier).is_none() {
                return Err(ConfigValidationError::UnknownTier {
                    cluster: name.to_string(),
                    tier: cluster.tier,
                });
            }
            if cluster.terms.is_empty() {
                return Err(ConfigValidationError::EmptyClusterTerms(name.to_string()));
            }
            if cluster.terms.iter().any(|term| term.trim().is_empty()) {
                return Err(ConfigValidationError::EmptyTerm(name.to_string()));
            }
            if let Some(points) = &cluster.hit_points {
                validate_hit_points(name, points)?;
            }
        }

        if self.generic.keywords.iter().any(|term| term.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyTerm("generic".to_string()));
        }
        validate_non_negative("generic.points_per_keyword", self.generic.points_per_keyword)?;

        validate_patterns("structural", &self.structural.patterns)?;
        validate_non_negative("structural.points_per_pattern", self.structural.points_per_pattern)?;
        validate_non_negative("structural.cap", self.structural.cap)?;
        validate_patterns("novel_framing", &self.novel_framing.patterns)?;
        validate_non_negative(
            "novel_framing.points_per_pattern",
            self.novel_framing.points_per_pattern,
        )?;
        validate_non_negative("novel_framing.cap", self.novel_framing.cap)?;

        validate_tier_table("breadth", &self.breadth)?;
        validate_tier_table("length", &self.length)?;
        validate_tier_table("turn_depth", &self.turn_depth)?;
        validate_tier_table("engagement", &self.engagement)?;
        validate_tier_table("density", &self.density)?;

        validate_penalty("penalties.low_value_points", self.penalties.low_value_points)?;
        validate_penalty("penalties.strong_points", self.penalties.strong_points)?;
        validate_penalty("penalties.aimless_points", self.penalties.aimless_points)?;
        if self
            .penalties
            .low_value_terms
            .iter()
            .chain(self.penalties.strong_terms.iter())
            .any(|term| term.trim().is_empty())
        {
            return Err(ConfigValidationError::EmptyTerm("penalties".to_string()));
        }

        let edges = &self.feedback.band_edges;
        if edges.first() != Some(&0) || edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigValidationError::InvalidBandEdges);
        }
        let rate = self.feedback.weak_cluster_gold_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigValidationError::InvalidGoldRate(rate));
        }

        Ok(())
    }
}

fn validate_hit_points(owner: &str, points: &[f64]) -> Result<(), ConfigValidationError> {
    let invalid = |reason: &str| ConfigValidationError::InvalidHitPoints {
        owner: owner.to_string(),
        reason: reason.to_string(),
    };
    if points.is_empty() {
        return Err(invalid("schedule must not be empty"));
    }
    if points.iter().any(|value| !value.is_finite() || *value < 0.0) {
        return Err(invalid("points must be non-negative"));
    }
    if points.windows(2).any(|pair| pair[1] > pair[0]) {
        return Err(invalid("points must not increase with additional hits"));
    }
    Ok(())
}

fn validate_patterns(layer: &str, patterns: &[PatternConfig]) -> Result<(), ConfigValidationError> {
    let mut names = BTreeSet::<&str>::new();
    for pattern in patterns {
        let name = pattern.name.trim();
        if name.is_empty() || pattern.pattern.trim().is_empty() {
            return Err(ConfigValidationError::InvalidPattern {
                name: format!("{layer}.{name}"),
                message: "pattern name and expression must not be empty".to_string(),
            });
        }
        if !names.insert(name) {
            return Err(ConfigValidationError::DuplicatePattern(format!("{layer}.{name}")));
        }
    }
    Ok(())
}

fn validate_tier_table(layer: &'static str, table: &TierTable) -> Result<(), ConfigValidationError> {
    let invalid = |reason: &str| ConfigValidationError::InvalidTierTable {
        layer,
        reason: reason.to_string(),
    };
    if !table.cap.is_finite() || table.cap < 0.0 {
        return Err(invalid("cap must be non-negative"));
    }
    if table
        .tiers
        .iter()
        .any(|tier| !tier.at.is_finite() || !tier.points.is_finite() || tier.points < 0.0)
    {
        return Err(invalid("tier bounds and points must be finite and non-negative"));
    }
    if table.tiers.windows(2).any(|pair| pair[0].at >= pair[1].at) {
        return Err(invalid("tiers must be listed in strictly increasing order"));
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ConfigValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigValidationError::NegativeValue(field));
    }
    Ok(())
}

fn validate_penalty(field: &'static str, value: f64) -> Result<(), ConfigValidationError> {
    if !(PENALTY_FLOOR..=PENALTY_CEILING).contains(&value) {
        return Err(ConfigValidationError::PenaltyOutOfRange { field, value });
    }
    Ok(())
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn patterns(values: &[(&str, &str)]) -> Vec<PatternConfig> {
    values
        .iter()
        .map(|(name, pattern)| PatternConfig {
            name: (*name).to_string(),
            pattern: (*pattern).to_string(),
        })
        .collect()
}

/// Declaration-level configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    InvalidVersion,
    InvalidTierMultipliers(String),
    EmptyClusterName(usize),
    DuplicateCluster(String),
    UnknownTier { cluster: String, tier: u8 },
    EmptyClusterTerms(String),
    EmptyTerm(String),
    InvalidHitPoints { owner: String, reason: String },
    InvalidTerm { term: String, message: String },
    InvalidPattern { name: String, message: String },
    DuplicatePattern(String),
    InvalidTierTable { layer: &'static str, reason: String },
    NegativeValue(&'static str),
    PenaltyOutOfRange { field: &'static str, value: f64 },
    InvalidBandEdges,
    InvalidGoldRate(f64),
}

impl Display for ConfigValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidVersion => write!(f, "config version must be at least 1"),
            Self::InvalidTierMultipliers(reason) => {
                write!(f, "invalid tier multipliers: {reason}")
            }
            Self::EmptyClusterName(index) => write!(f, "cluster #{index} has an empty name"),
            Self::DuplicateCluster(name) => write!(f, "cluster is defined twice: {name}"),
            Self::UnknownTier { cluster, tier } => {
                write!(f, "cluster `{cluster}` references unknown tier {tier}")
            }
            Self::EmptyClusterTerms(name) => write!(f, "cluster `{name}` has no terms"),
            Self::EmptyTerm(owner) => write!(f, "`{owner}` contains an empty term"),
            Self::InvalidHitPoints { owner, reason } => {
                write!(f, "invalid hit points for `{owner}`: {reason}")
            }
            Self::InvalidTerm { term, message } => write!(f, "invalid term `{term}`: {message}"),
            Self::InvalidPattern { name, message } => {
                write!(f, "invalid pattern `{name}`: {message}")
            }
            Self::DuplicatePattern(name) => write!(f, "pattern is defined twice: {name}"),
            Self::InvalidTierTable { layer, reason } => {
                write!(f, "invalid `{layer}` tier table: {reason}")
            }
            Self::NegativeValue(field) => write!(f, "`{field}` must be non-negative"),
            Self::PenaltyOutOfRange { field, value } => write!(
                f,
                "`{field}` is {value}; penalties must lie in {PENALTY_FLOOR}..={PENALTY_CEILING}"
            ),
            Self::InvalidBandEdges => write!(
                f,
                "feedback band edges must start at 0 and strictly increase"
            ),
            Self::InvalidGoldRate(value) => {
                write!(f, "weak cluster gold rate {value} must lie in 0..=1")
            }
        }
    }
}

impl Error for ConfigValidationError {}

/// Configuration load failure. Always fatal for the caller.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(String),
    Invalid(ConfigValidationError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(message) => write!(f, "failed to parse config: {message}"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(_) => None,
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<ConfigValidationError> for ConfigError {
    fn from(value: ConfigValidationError) -> Self {
        Self::Invalid(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ClusterConfig, ConfigError, ConfigValidationError, ScoringConfig};

    fn cluster(name: &str, tier: u8, terms: &[&str]) -> ClusterConfig {
        ClusterConfig {
            name: name.to_string(),
            tier,
            terms: terms.iter().map(|term| term.to_string()).collect(),
            hit_points: None,
        }
    }

    #[test]
    fn default_config_is_valid() {
        ScoringConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_unknown_tier() {
        let mut config = ScoringConfig::default();
        config.clusters.push(cluster("calibration", 7, &["calibration"]));
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigValidationError::UnknownTier {
                cluster: "calibration".to_string(),
                tier: 7
            }
        );
    }

    #[test]
    fn rejects_duplicate_cluster_names_case_insensitively() {
        let mut config = ScoringConfig::default();
        config.clusters.push(cluster("Pricing", 1, &["pricing"]));
        config.clusters.push(cluster("pricing", 2, &["price"]));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigValidationError::DuplicateCluster(_)));
    }

    #[test]
    fn rejects_increasing_hit_schedule() {
        let mut config = ScoringConfig::default();
        let mut bad = cluster("growth", 2, &["growth loop"]);
        bad.hit_points = Some(vec![2.0, 3.0]);
        config.clusters.push(bad);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigValidationError::InvalidHitPoints { .. }));
    }

    #[test]
    fn rejects_penalty_outside_range() {
        let mut config = ScoringConfig::default();
        config.penalties.strong_points = -9.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigValidationError::PenaltyOutOfRange { .. }));
    }

    #[test]
    fn rejects_band_edges_not_starting_at_zero() {
        let mut config = ScoringConfig::default();
        config.feedback.band_edges = vec![10, 20];
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::InvalidBandEdges
        );
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = ScoringConfig::from_toml_str(
            r#"
            version = 4

            [[clusters]]
            name = "calibration"
            tier = 1
            terms = ["calibration", "signal to noise"]

            [feedback]
            expected_gold_threshold = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.version, 4);
        assert_eq!(config.clusters.len(), 1);
        assert_eq!(config.feedback.expected_gold_threshold, 40);
        assert_eq!(config.feedback.expected_skip_threshold, 50);
        assert_eq!(config.feedback.review_skip_threshold, 30);
        assert_eq!(config.structural.cap, 15.0);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let err = ScoringConfig::from_toml_str("verison = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip_preserves_defaults() {
        let config = ScoringConfig::default();
        let raw = config.to_toml_string().unwrap();
        assert_eq!(ScoringConfig::from_toml_str(&raw).unwrap(), config);
    }
}
