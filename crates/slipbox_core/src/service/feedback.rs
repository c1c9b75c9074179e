//! Feedback analyzer ("learn").
//!
//! # Responsibility
//! - Reconcile human dispositions with predicted scores.
//! - Surface miscalibration as structured findings an operator can act on
//!   by editing the scoring configuration.
//!
//! # Invariants
//! - Analysis is read-only: it never writes the store or the configuration.
//! - Findings are ordered: band summaries ascending, low-score gold by
//!   ascending score, high-score skips by descending score, weak clusters in
//!   configuration order.
//! - Entries without a stored breakdown count as matching no cluster.

use crate::config::ScoringProfile;
use crate::model::breakdown::{LayerId, ScoreReason};
use crate::model::entry::{CorpusEntry, Disposition, EntryId};
use crate::repo::entry_repo::{CorpusStore, EntryListQuery, StoreResult};
use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const TOP_LAYER_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    ScoreBandSummary,
    LowScoreGold,
    HighScoreSkip,
    WeakCluster,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FindingDetail {
    ScoreBand {
        label: String,
        lower: u32,
        upper: Option<u32>,
        gold: usize,
        skip: usize,
        gold_rate: f64,
    },
    LowScoreGold {
        score: u32,
        matched_clusters: Vec<String>,
        missed_clusters: Vec<String>,
        missed_keywords: Vec<String>,
    },
    HighScoreSkip {
        score: u32,
        driving_clusters: Vec<String>,
        driving_terms: Vec<String>,
        top_layers: Vec<(LayerId, f64)>,
        reason: ScoreReason,
    },
    WeakCluster {
        cluster: String,
        gold: usize,
        skip: usize,
        gold_rate: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackFinding {
    pub kind: FindingKind,
    pub entry_ids: Vec<EntryId>,
    pub detail: FindingDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackReport {
    pub findings: Vec<FeedbackFinding>,
    /// Entries with a gold or skip disposition.
    pub decided: usize,
    pub gold: usize,
    /// Cluster frequency among high-score skips, most frequent first.
    pub false_positive_clusters: Vec<(String, usize)>,
    /// Reason frequency among high-score skips, most frequent first.
    pub false_positive_reasons: Vec<(ScoreReason, usize)>,
}

impl FeedbackReport {
    pub fn findings_of(&self, kind: FindingKind) -> impl Iterator<Item = &FeedbackFinding> {
        self.findings
            .iter()
            .filter(move |finding| finding.kind == kind)
    }
}

/// Half-open score interval `[lower, upper)`; `upper = None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBand {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl ScoreBand {
    pub fn label(&self) -> String {
        match self.upper {
            Some(upper) => format!("{}-{}", self.lower, upper.saturating_sub(1)),
            None => format!("{}+", self.lower),
        }
    }
}

/// Band containing `score` for validated, increasing `edges` starting at 0.
pub fn band_for(edges: &[u32], score: u32) -> ScoreBand {
    let index = edges.partition_point(|&edge| edge <= score).saturating_sub(1);
    ScoreBand {
        lower: edges.get(index).copied().unwrap_or(0),
        upper: edges.get(index + 1).copied(),
    }
}

/// Cross-references every decided entry against its stored breakdown.
pub fn analyze<S: CorpusStore>(store: &S, profile: &ScoringProfile) -> StoreResult<FeedbackReport> {
    let mut decided = Vec::new();
    for disposition in [Disposition::Gold, Disposition::Skip] {
        decided.extend(store.list_entries(&EntryListQuery {
            disposition: Some(disposition),
            ..EntryListQuery::default()
        })?);
    }
    decided.sort_by(|a, b| a.id.cmp(&b.id));

    let config = &profile.config().feedback;
    let gold = decided
        .iter()
        .filter(|entry| entry.disposition == Disposition::Gold)
        .count();

    let mut findings = band_summaries(&decided, &config.band_edges);
    findings.extend(low_score_gold(&decided, profile));
    let HighScoreSkips {
        findings: high_skips,
        clusters: false_positive_clusters,
        reasons: false_positive_reasons,
    } = high_score_skips(&decided, config.expected_skip_threshold);
    findings.extend(high_skips);
    findings.extend(weak_clusters(&decided, profile));

    info!(
        "event=feedback_analyze module=service status=ok config_version={} decided={} gold={} findings={}",
        profile.version(),
        decided.len(),
        gold,
        findings.len()
    );

    Ok(FeedbackReport {
        findings,
        decided: decided.len(),
        gold,
        false_positive_clusters,
        false_positive_reasons,
    })
}

fn band_summaries(decided: &[CorpusEntry], edges: &[u32]) -> Vec<FeedbackFinding> {
    let mut bands: BTreeMap<u32, (ScoreBand, Vec<&CorpusEntry>)> = BTreeMap::new();
    for entry in decided {
        let band = band_for(edges, entry.score);
        bands
            .entry(band.lower)
            .or_insert_with(|| (band, Vec::new()))
            .1
            .push(entry);
    }

    bands
        .into_values()
        .map(|(band, entries)| {
            let gold = entries
                .iter()
                .filter(|entry| entry.disposition == Disposition::Gold)
                .count();
            let skip = entries.len() - gold;
            FeedbackFinding {
                kind: FindingKind::ScoreBandSummary,
                entry_ids: entries.iter().map(|entry| entry.id.clone()).collect(),
                detail: FindingDetail::ScoreBand {
                    label: band.label(),
                    lower: band.lower,
                    upper: band.upper,
                    gold,
                    skip,
                    gold_rate: rate(gold, entries.len()),
                },
            }
        })
        .collect()
}

fn low_score_gold(decided: &[CorpusEntry], profile: &ScoringProfile) -> Vec<FeedbackFinding> {
    let threshold = profile.config().feedback.expected_gold_threshold;
    let mut misses = decided
        .iter()
        .filter(|entry| entry.disposition == Disposition::Gold && entry.score < threshold)
        .collect::<Vec<_>>();
    misses.sort_by(|a, b| a.score.cmp(&b.score).then_with(|| a.id.cmp(&b.id)));

    misses
        .into_iter()
        .map(|entry| {
            let matched_clusters = entry.clusters_hit().to_vec();
            let missed_clusters = profile
                .clusters()
                .iter()
                .map(|cluster| cluster.name.clone())
                .filter(|name| !matched_clusters.contains(name))
                .collect();
            let matched_keywords = entry
                .breakdown
                .iter()
                .flat_map(|breakdown| breakdown.contributions_for(LayerId::GenericKeyword))
                .flat_map(|contribution| contribution.matched_terms.iter())
                .map(String::as_str)
                .collect::<BTreeSet<_>>();
            let missed_keywords = profile
                .config()
                .generic
                .keywords
                .iter()
                .filter(|keyword| !matched_keywords.contains(keyword.trim().to_lowercase().as_str()))
                .cloned()
                .collect();

            FeedbackFinding {
                kind: FindingKind::LowScoreGold,
                entry_ids: vec![entry.id.clone()],
                detail: FindingDetail::LowScoreGold {
                    score: entry.score,
                    matched_clusters,
                    missed_clusters,
                    missed_keywords,
                },
            }
        })
        .collect()
}

struct HighScoreSkips {
    findings: Vec<FeedbackFinding>,
    clusters: Vec<(String, usize)>,
    reasons: Vec<(ScoreReason, usize)>,
}

fn high_score_skips(decided: &[CorpusEntry], threshold: u32) -> HighScoreSkips {
    let mut skips = decided
        .iter()
        .filter(|entry| entry.disposition == Disposition::Skip && entry.score >= threshold)
        .collect::<Vec<_>>();
    skips.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

    let mut cluster_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut reason_counts: BTreeMap<&'static str, (ScoreReason, usize)> = BTreeMap::new();
    let findings = skips
        .into_iter()
        .map(|entry| {
            let driving_clusters = entry.clusters_hit().to_vec();
            for cluster in &driving_clusters {
                *cluster_counts.entry(cluster.clone()).or_default() += 1;
            }
            reason_counts
                .entry(entry.reason.as_str())
                .or_insert((entry.reason, 0))
                .1 += 1;

            let (driving_terms, top_layers) = match &entry.breakdown {
                Some(breakdown) => {
                    let terms = breakdown
                        .contributions_for(LayerId::DomainCluster)
                        .flat_map(|contribution| contribution.matched_terms.iter().cloned())
                        .collect::<Vec<_>>();
                    let mut layers = breakdown
                        .layers
                        .iter()
                        .filter(|total| total.capped_points > 0.0)
                        .map(|total| (total.layer, total.capped_points))
                        .collect::<Vec<_>>();
                    layers.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
                    layers.truncate(TOP_LAYER_COUNT);
                    (terms, layers)
                }
                None => (Vec::new(), Vec::new()),
            };

            FeedbackFinding {
                kind: FindingKind::HighScoreSkip,
                entry_ids: vec![entry.id.clone()],
                detail: FindingDetail::HighScoreSkip {
                    score: entry.score,
                    driving_clusters,
                    driving_terms,
                    top_layers,
                    reason: entry.reason,
                },
            }
        })
        .collect();

    let mut false_positive_clusters = cluster_counts.into_iter().collect::<Vec<_>>();
    false_positive_clusters.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    // Keys are reason names, so ties stay in name order after the stable sort.
    let mut false_positive_reasons = reason_counts.into_values().collect::<Vec<_>>();
    false_positive_reasons.sort_by(|a, b| b.1.cmp(&a.1));

    HighScoreSkips {
        findings,
        clusters: false_positive_clusters,
        reasons: false_positive_reasons,
    }
}

fn weak_clusters(decided: &[CorpusEntry], profile: &ScoringProfile) -> Vec<FeedbackFinding> {
    let config = &profile.config().feedback;
    profile
        .clusters()
        .iter()
        .filter_map(|cluster| {
            let fired = decided
                .iter()
                .filter(|entry| entry.clusters_hit().contains(&cluster.name))
                .collect::<Vec<_>>();
            if fired.len() < config.weak_cluster_min_samples {
                return None;
            }
            let gold = fired
                .iter()
                .filter(|entry| entry.disposition == Disposition::Gold)
                .count();
            let gold_rate = rate(gold, fired.len());
            if gold_rate >= config.weak_cluster_gold_rate {
                return None;
            }
            Some(FeedbackFinding {
                kind: FindingKind::WeakCluster,
                entry_ids: fired.iter().map(|entry| entry.id.clone()).collect(),
                detail: FindingDetail::WeakCluster {
                    cluster: cluster.name.clone(),
                    gold,
                    skip: fired.len() - gold,
                    gold_rate,
                },
            })
        })
        .collect()
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

#[cfg(test)]
mod tests {
    use super::band_for;

    const EDGES: [u32; 9] = [0, 10, 20, 30, 40, 50, 60, 70, 80];

    #[test]
    fn band_lookup_uses_half_open_intervals() {
        assert_eq!(band_for(&EDGES, 0).label(), "0-9");
        assert_eq!(band_for(&EDGES, 9).label(), "0-9");
        assert_eq!(band_for(&EDGES, 16).label(), "10-19");
        assert_eq!(band_for(&EDGES, 79).label(), "70-79");
        assert_eq!(band_for(&EDGES, 80).label(), "80+");
        assert_eq!(band_for(&EDGES, 500).label(), "80+");
    }

    #[test]
    fn band_lookup_reports_open_upper_bound() {
        let band = band_for(&EDGES, 85);
        assert_eq!(band.lower, 80);
        assert_eq!(band.upper, None);
    }
}
