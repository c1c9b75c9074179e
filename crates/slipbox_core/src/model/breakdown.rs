//! Score breakdown model.
//!
//! # Responsibility
//! - Describe every partial contribution that produced a score.
//! - Keep enough derived metrics for the feedback analyzer to explain a score
//!   without re-reading the document.
//!
//! # Invariants
//! - `contributions` are ordered by layer order, then by configuration order.
//! - `total_score == max(0, raw_total)`.
//! - `raw_total` equals the rounded sum of `layers[*].capped_points`.

use serde::{Deserialize, Serialize};

/// Scoring layers in aggregation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    DomainCluster,
    Breadth,
    GenericKeyword,
    Structural,
    NovelFraming,
    Length,
    TurnDepth,
    Engagement,
    Density,
    Penalty,
}

impl LayerId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DomainCluster => "domain_cluster",
            Self::Breadth => "breadth",
            Self::GenericKeyword => "generic_keyword",
            Self::Structural => "structural",
            Self::NovelFraming => "novel_framing",
            Self::Length => "length",
            Self::TurnDepth => "turn_depth",
            Self::Engagement => "engagement",
            Self::Density => "density",
            Self::Penalty => "penalty",
        }
    }
}

/// One partial score produced by an extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContribution {
    pub layer: LayerId,
    /// Cluster name, pattern family or penalty signal name.
    pub label: String,
    pub points: f64,
    /// Terms or pattern names that fired, in match order.
    pub matched_terms: Vec<String>,
}

/// Per-layer sum before and after the layer cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTotal {
    pub layer: LayerId,
    pub raw_points: f64,
    pub capped_points: f64,
}

/// Coarse explanation of why a document scored the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreReason {
    NovelFraming,
    DeepFramework,
    NovelThinking,
    FocusedDomain,
    CrossDomain,
    StructuralDepth,
    DomainRelevant,
    LikelyLowValue,
    Neutral,
    Malformed,
}

impl ScoreReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NovelFraming => "novel_framing",
            Self::DeepFramework => "deep_framework",
            Self::NovelThinking => "novel_thinking",
            Self::FocusedDomain => "focused_domain",
            Self::CrossDomain => "cross_domain",
            Self::StructuralDepth => "structural_depth",
            Self::DomainRelevant => "domain_relevant",
            Self::LikelyLowValue => "likely_low_value",
            Self::Neutral => "neutral",
            Self::Malformed => "malformed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "novel_framing" => Some(Self::NovelFraming),
            "deep_framework" => Some(Self::DeepFramework),
            "novel_thinking" => Some(Self::NovelThinking),
            "focused_domain" => Some(Self::FocusedDomain),
            "cross_domain" => Some(Self::CrossDomain),
            "structural_depth" => Some(Self::StructuralDepth),
            "domain_relevant" => Some(Self::DomainRelevant),
            "likely_low_value" => Some(Self::LikelyLowValue),
            "neutral" => Some(Self::Neutral),
            "malformed" => Some(Self::Malformed),
            _ => None,
        }
    }
}

/// Document-level metrics observed during one scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub word_count: usize,
    pub turn_count: usize,
    /// Domain + generic hits per 1000 words.
    pub density: f64,
    /// Cluster names with at least one hit, in configuration order.
    pub clusters_hit: Vec<String>,
    pub domain_hits: usize,
    pub generic_hits: usize,
    pub structural_hits: usize,
    pub novel_framing_hits: usize,
    pub low_value_hits: usize,
}

/// Full audit trail of a single scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub config_version: u32,
    pub contributions: Vec<SignalContribution>,
    pub layers: Vec<LayerTotal>,
    /// Rounded sum of capped layer points; may be negative.
    pub raw_total: i64,
    /// `raw_total` floor-clamped to zero.
    pub total_score: u32,
    pub reason: ScoreReason,
    pub metrics: ScoreMetrics,
}

impl ScoreBreakdown {
    /// Capped points for one layer, zero when the layer did not fire.
    pub fn layer_points(&self, layer: LayerId) -> f64 {
        self.layers
            .iter()
            .find(|total| total.layer == layer)
            .map_or(0.0, |total| total.capped_points)
    }

    /// Contributions for one layer in breakdown order.
    pub fn contributions_for(&self, layer: LayerId) -> impl Iterator<Item = &SignalContribution> {
        self.contributions
            .iter()
            .filter(move |contribution| contribution.layer == layer)
    }
}
