//! Multi-signal scoring engine.
//!
//! # Responsibility
//! - Run every extractor over one document and fold their output into a
//!   [`ScoreBreakdown`] under per-layer caps.
//! - Classify the result into a coarse [`ScoreReason`].
//!
//! # Invariants
//! - Scoring is a pure function of (document, profile): no globals, no
//!   randomness, no I/O.
//! - Caps clamp a layer's sum after tier multipliers are applied.
//! - The grand total is floor-clamped to zero only here, never per layer.

use log::warn;

use crate::config::ScoringProfile;
use crate::model::breakdown::{
    LayerId, LayerTotal, ScoreBreakdown, ScoreMetrics, ScoreReason, SignalContribution,
};
use crate::model::document::Document;

pub mod extractors;
pub mod matcher;

use extractors::ExtractionContext;

type Extractor = fn(&ExtractionContext<'_>) -> Vec<SignalContribution>;

/// Extractors in aggregation order; one per layer.
const EXTRACTORS: &[(LayerId, Extractor)] = &[
    (LayerId::DomainCluster, extractors::domain_clusters),
    (LayerId::Breadth, extractors::breadth),
    (LayerId::GenericKeyword, extractors::generic_keywords),
    (LayerId::Structural, extractors::structural),
    (LayerId::NovelFraming, extractors::novel_framing),
    (LayerId::Length, extractors::length),
    (LayerId::TurnDepth, extractors::turn_depth),
    (LayerId::Engagement, extractors::engagement),
    (LayerId::Density, extractors::density),
    (LayerId::Penalty, extractors::penalties),
];

/// Scores one document against a compiled profile.
///
/// Malformed documents are scored as empty text and logged as a
/// data-quality warning.
pub fn score_document(document: &Document, profile: &ScoringProfile) -> ScoreBreakdown {
    if document.is_malformed() {
        warn!(
            "event=score_document module=scoring status=warn reason=malformed_content id={}",
            document.id()
        );
        return ScoreBreakdown {
            config_version: profile.version(),
            contributions: Vec::new(),
            layers: Vec::new(),
            raw_total: 0,
            total_score: 0,
            reason: ScoreReason::Malformed,
            metrics: ScoreMetrics::default(),
        };
    }

    let ctx = ExtractionContext::new(document, profile);
    let mut contributions = Vec::new();
    let mut layers = Vec::new();

    for (layer, extract) in EXTRACTORS {
        let produced = extract(&ctx);
        if produced.is_empty() {
            continue;
        }
        let raw_points = produced.iter().map(|c| c.points).sum::<f64>();
        let capped_points = match layer_cap(profile, *layer) {
            Some(cap) => raw_points.min(cap),
            None => raw_points,
        };
        layers.push(LayerTotal {
            layer: *layer,
            raw_points,
            capped_points,
        });
        contributions.extend(produced);
    }

    let raw_total = layers
        .iter()
        .map(|total| total.capped_points)
        .sum::<f64>()
        .round() as i64;
    let total_score = u32::try_from(raw_total.max(0)).unwrap_or(u32::MAX);

    let low_value_hits = contributions
        .iter()
        .filter(|c| c.layer == LayerId::Penalty && c.label == "low_value_terms")
        .map(|c| c.matched_terms.len())
        .sum();
    let metrics = ScoreMetrics {
        word_count: document.word_count(),
        turn_count: document.turn_count(),
        density: (ctx.density * 100.0).round() / 100.0,
        clusters_hit: ctx.clusters_hit().map(str::to_string).collect(),
        domain_hits: ctx.domain_hits(),
        generic_hits: ctx.generic_hits.len(),
        structural_hits: matched_count(&contributions, LayerId::Structural),
        novel_framing_hits: matched_count(&contributions, LayerId::NovelFraming),
        low_value_hits,
    };

    ScoreBreakdown {
        config_version: profile.version(),
        contributions,
        layers,
        raw_total,
        total_score,
        reason: classify(&metrics, ctx.density),
        metrics,
    }
}

/// Cap for a layer, `None` for uncapped layers.
pub fn layer_cap(profile: &ScoringProfile, layer: LayerId) -> Option<f64> {
    let config = profile.config();
    match layer {
        LayerId::DomainCluster | LayerId::GenericKeyword | LayerId::Penalty => None,
        LayerId::Breadth => Some(config.breadth.cap),
        LayerId::Structural => Some(config.structural.cap),
        LayerId::NovelFraming => Some(config.novel_framing.cap),
        LayerId::Length => Some(config.length.cap),
        LayerId::TurnDepth => Some(config.turn_depth.cap),
        LayerId::Engagement => Some(config.engagement.cap),
        LayerId::Density => Some(config.density.cap),
    }
}

fn matched_count(contributions: &[SignalContribution], layer: LayerId) -> usize {
    contributions
        .iter()
        .filter(|c| c.layer == layer)
        .map(|c| c.matched_terms.len())
        .sum()
}

/// First matching rule wins.
fn classify(metrics: &ScoreMetrics, density: f64) -> ScoreReason {
    let clusters = metrics.clusters_hit.len();
    let structural = metrics.structural_hits;
    let novel = metrics.novel_framing_hits;

    if novel >= 3 && clusters >= 2 {
        ScoreReason::NovelFraming
    } else if clusters >= 3 && structural >= 2 {
        ScoreReason::DeepFramework
    } else if novel >= 3 {
        ScoreReason::NovelThinking
    } else if clusters >= 2 && density >= 1.5 {
        ScoreReason::FocusedDomain
    } else if clusters >= 2 {
        ScoreReason::CrossDomain
    } else if structural >= 2 {
        ScoreReason::StructuralDepth
    } else if metrics.domain_hits >= 3 {
        ScoreReason::DomainRelevant
    } else if metrics.low_value_hits > metrics.domain_hits {
        ScoreReason::LikelyLowValue
    } else {
        ScoreReason::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::classify;
    use crate::model::breakdown::{ScoreMetrics, ScoreReason};

    fn metrics(clusters: usize, structural: usize, novel: usize) -> ScoreMetrics {
        ScoreMetrics {
            clusters_hit: (0..clusters).map(|i| format!("c{i}")).collect(),
            domain_hits: clusters,
            structural_hits: structural,
            novel_framing_hits: novel,
            ..ScoreMetrics::default()
        }
    }

    #[test]
    fn classify_prefers_novel_framing_with_domain_breadth() {
        assert_eq!(classify(&metrics(2, 3, 3), 0.0), ScoreReason::NovelFraming);
        assert_eq!(classify(&metrics(3, 2, 0), 0.0), ScoreReason::DeepFramework);
        assert_eq!(classify(&metrics(0, 0, 4), 0.0), ScoreReason::NovelThinking);
        assert_eq!(classify(&metrics(2, 0, 0), 2.0), ScoreReason::FocusedDomain);
        assert_eq!(classify(&metrics(2, 0, 0), 0.4), ScoreReason::CrossDomain);
        assert_eq!(classify(&metrics(0, 0, 0), 0.0), ScoreReason::Neutral);
    }

    #[test]
    fn classify_flags_low_value_dominated_documents() {
        let mut low = metrics(0, 0, 0);
        low.low_value_hits = 2;
        assert_eq!(classify(&low, 0.0), ScoreReason::LikelyLowValue);
    }
}
