//! Signal extractors.
//!
//! Each extractor reads the same [`ExtractionContext`] and returns the
//! contributions of exactly one layer. Extractors never see each other's
//! output; shared inputs (term hits, density) are derived up front from the
//! document and profile alone.

use crate::config::profile::NamedPattern;
use crate::config::{ScoringProfile, TierTable};
use crate::model::breakdown::{LayerId, SignalContribution};
use crate::model::document::Document;
use crate::scoring::matcher::{normalize_text, TermHit};

/// Deterministic per-document analysis shared by all extractors.
pub struct ExtractionContext<'a> {
    pub document: &'a Document,
    pub profile: &'a ScoringProfile,
    pub text: String,
    /// Matched terms per cluster index, in declaration order.
    pub cluster_hits: Vec<Vec<String>>,
    pub generic_hits: Vec<String>,
    pub density: f64,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(document: &'a Document, profile: &'a ScoringProfile) -> Self {
        let text = normalize_text(document.text());

        let mut cluster_hits = vec![Vec::new(); profile.clusters().len()];
        for hit in profile.cluster_terms().find(&text) {
            if let Some(terms) = cluster_hits.get_mut(hit.owner) {
                terms.push(hit.term);
            }
        }

        let generic_hits = profile
            .generic_terms()
            .find(&text)
            .into_iter()
            .map(|hit| hit.term)
            .collect::<Vec<_>>();

        let domain_hits = cluster_hits.iter().map(Vec::len).sum::<usize>();
        let density = density_per_thousand(domain_hits + generic_hits.len(), document.word_count());

        Self {
            document,
            profile,
            text,
            cluster_hits,
            generic_hits,
            density,
        }
    }

    pub fn clusters_hit(&self) -> impl Iterator<Item = &str> {
        self.profile
            .clusters()
            .iter()
            .zip(&self.cluster_hits)
            .filter(|(_, hits)| !hits.is_empty())
            .map(|(cluster, _)| cluster.name.as_str())
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_hits.iter().filter(|hits| !hits.is_empty()).count()
    }

    pub fn domain_hits(&self) -> usize {
        self.cluster_hits.iter().map(Vec::len).sum()
    }
}

/// Hits per 1000 words; zero for empty documents.
pub fn density_per_thousand(hits: usize, word_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    hits as f64 / (word_count as f64 / 1000.0)
}

pub fn domain_clusters(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    ctx.profile
        .clusters()
        .iter()
        .zip(&ctx.cluster_hits)
        .filter(|(_, hits)| !hits.is_empty())
        .map(|(cluster, hits)| SignalContribution {
            layer: LayerId::DomainCluster,
            label: cluster.name.clone(),
            points: cluster.base_points(hits.len()) * cluster.multiplier,
            matched_terms: hits.clone(),
        })
        .collect()
}

pub fn breadth(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    let count = ctx.cluster_count();
    let points = highest_tier(&ctx.profile.config().breadth, count as f64);
    single(
        LayerId::Breadth,
        "cross_cluster",
        points,
        ctx.clusters_hit().map(str::to_string).collect(),
    )
}

pub fn generic_keywords(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    let per_keyword = ctx.profile.config().generic.points_per_keyword;
    single(
        LayerId::GenericKeyword,
        "generic_keywords",
        ctx.generic_hits.len() as f64 * per_keyword,
        ctx.generic_hits.clone(),
    )
}

pub fn structural(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    let matched = matched_pattern_names(&ctx.text, ctx.profile.structural_patterns());
    let per_pattern = ctx.profile.config().structural.points_per_pattern;
    single(
        LayerId::Structural,
        "structural_markers",
        matched.len() as f64 * per_pattern,
        matched,
    )
}

pub fn novel_framing(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    let matched = matched_pattern_names(&ctx.text, ctx.profile.novel_framing_patterns());
    let per_pattern = ctx.profile.config().novel_framing.points_per_pattern;
    single(
        LayerId::NovelFraming,
        "novel_framing",
        matched.len() as f64 * per_pattern,
        matched,
    )
}

pub fn length(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    let words = ctx.document.word_count();
    single(
        LayerId::Length,
        "word_count",
        cumulative_tiers(&ctx.profile.config().length, words as f64),
        Vec::new(),
    )
}

pub fn turn_depth(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    let turns = ctx.document.turn_count();
    single(
        LayerId::TurnDepth,
        "turn_count",
        cumulative_tiers(&ctx.profile.config().turn_depth, turns as f64),
        Vec::new(),
    )
}

/// Long threads only earn the engagement bonus once they touch a cluster.
pub fn engagement(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    if ctx.cluster_count() == 0 {
        return Vec::new();
    }
    let turns = ctx.document.turn_count();
    single(
        LayerId::Engagement,
        "sustained_engagement",
        cumulative_tiers(&ctx.profile.config().engagement, turns as f64),
        Vec::new(),
    )
}

pub fn density(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    single(
        LayerId::Density,
        "hits_per_1000_words",
        highest_tier(&ctx.profile.config().density, ctx.density),
        Vec::new(),
    )
}

pub fn penalties(ctx: &ExtractionContext<'_>) -> Vec<SignalContribution> {
    let config = &ctx.profile.config().penalties;
    let mut contributions = Vec::new();

    let low_value = terms_of(ctx.profile.low_value_terms().find(&ctx.text));
    contributions.extend(single(
        LayerId::Penalty,
        "low_value_terms",
        low_value.len() as f64 * config.low_value_points,
        low_value,
    ));

    let strong = terms_of(ctx.profile.strong_terms().find(&ctx.text));
    contributions.extend(single(
        LayerId::Penalty,
        "strong_low_value_terms",
        strong.len() as f64 * config.strong_points,
        strong,
    ));

    if ctx.document.word_count() >= config.aimless_min_words && ctx.cluster_count() == 0 {
        contributions.extend(single(
            LayerId::Penalty,
            "aimless_length",
            config.aimless_points,
            Vec::new(),
        ));
    }

    contributions
}

fn terms_of(hits: Vec<TermHit>) -> Vec<String> {
    hits.into_iter().map(|hit| hit.term).collect()
}

fn matched_pattern_names(text: &str, patterns: &[NamedPattern]) -> Vec<String> {
    patterns
        .iter()
        .filter(|pattern| pattern.regex.is_match(text))
        .map(|pattern| pattern.name.clone())
        .collect()
}

fn single(
    layer: LayerId,
    label: &str,
    points: f64,
    matched_terms: Vec<String>,
) -> Vec<SignalContribution> {
    if points == 0.0 {
        return Vec::new();
    }
    vec![SignalContribution {
        layer,
        label: label.to_string(),
        points,
        matched_terms,
    }]
}

fn cumulative_tiers(table: &TierTable, value: f64) -> f64 {
    table
        .tiers
        .iter()
        .filter(|tier| value >= tier.at)
        .map(|tier| tier.points)
        .sum()
}

fn highest_tier(table: &TierTable, value: f64) -> f64 {
    table
        .tiers
        .iter()
        .rev()
        .find(|tier| value >= tier.at)
        .map_or(0.0, |tier| tier.points)
}
