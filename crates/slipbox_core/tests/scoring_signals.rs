use slipbox_core::config::ClusterConfig;
use slipbox_core::service::feedback::band_for;
use slipbox_core::{
    score_document, Document, LayerId, ScoreReason, ScoringConfig, ScoringProfile,
};

fn cluster(name: &str, tier: u8, terms: &[&str]) -> ClusterConfig {
    ClusterConfig {
        name: name.to_string(),
        tier,
        terms: terms.iter().map(|term| term.to_string()).collect(),
        hit_points: None,
    }
}

fn test_config() -> ScoringConfig {
    let mut config = ScoringConfig::default();
    config.clusters = vec![
        cluster(
            "pricing",
            1,
            &["pricing", "willingness to pay", "discount", "anchor", "margin"],
        ),
        cluster("retention", 1, &["churn", "cohort"]),
        cluster("coaching", 2, &["mentoring", "limiting belief"]),
        cluster("business", 2, &["business model", "moat"]),
        cluster("writing", 3, &["outline", "model"]),
    ];
    config
}

fn profile() -> ScoringProfile {
    ScoringProfile::compile(test_config()).unwrap()
}

fn filler(words: usize) -> String {
    vec!["alpha"; words].join(" ")
}

fn doc(text: impl Into<String>) -> Document {
    Document::new("doc.md", text, None)
}

#[test]
fn scoring_is_deterministic() {
    let profile = profile();
    let document = doc(
        "## User\nWhat if pricing is the real lever?\n## Assistant\nThe tension between churn and margin matters because cohorts differ.",
    );

    let first = score_document(&document, &profile);
    let second = score_document(&document, &profile);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn two_tier_one_hits_score_at_least_sixteen_and_land_in_their_band() {
    let profile = profile();
    let document = doc("## User\nLet's talk pricing. What is their willingness to pay?");

    let breakdown = score_document(&document, &profile);

    assert_eq!(breakdown.layer_points(LayerId::DomainCluster), 16.0);
    assert!(breakdown.total_score >= 16);
    assert_eq!(breakdown.metrics.clusters_hit, vec!["pricing".to_string()]);

    let band = band_for(&profile.config().feedback.band_edges, breakdown.total_score);
    assert!(band.lower <= breakdown.total_score);
    assert!(band.upper.map_or(true, |upper| breakdown.total_score < upper));
    assert!(band.lower >= 10);
}

#[test]
fn novel_framing_is_capped_at_twenty() {
    let profile = profile();
    let phrases = [
        "the real tension between speed and care",
        "let me reframe that",
        "what if we stopped",
        "what's really going on here",
        "it isn't really about money",
        "i'd call it the drift",
        "the underlying problem is trust",
        "nobody is doing this well",
    ];
    let text = (0..6)
        .flat_map(|_| phrases.iter().copied())
        .collect::<Vec<_>>()
        .join(". ");

    let breakdown = score_document(&doc(text), &profile);
    let novel = breakdown
        .layers
        .iter()
        .find(|total| total.layer == LayerId::NovelFraming)
        .unwrap();

    assert_eq!(novel.raw_points, 32.0);
    assert_eq!(novel.capped_points, 20.0);
    assert_eq!(breakdown.metrics.novel_framing_hits, phrases.len());
}

#[test]
fn structural_cap_applies_to_the_layer_sum() {
    let profile = profile();
    let text = "1. a\n2. b\n3. c\n| a | b |\n|---|---|\nthe framework has three parts\nuse this template\nphase 1 starts now\nthe archetypes are clear";

    let breakdown = score_document(&doc(text), &profile);
    let structural = breakdown
        .layers
        .iter()
        .find(|total| total.layer == LayerId::Structural)
        .unwrap();

    assert_eq!(structural.raw_points, 18.0);
    assert_eq!(structural.capped_points, 15.0);
}

#[test]
fn breadth_and_total_never_decrease_with_more_clusters() {
    let profile = profile();
    let terms = ["pricing", "churn", "mentoring", "moat", "outline"];
    let base = filler(300);

    let mut previous_breadth = 0.0;
    let mut previous_total = 0;
    let mut breadth_seen = Vec::new();
    for count in 1..=terms.len() {
        let text = format!("{base} {}", terms[..count].join(" "));
        let breakdown = score_document(&doc(text), &profile);
        let breadth = breakdown.layer_points(LayerId::Breadth);

        assert!(breadth >= previous_breadth);
        assert!(breakdown.total_score >= previous_total);
        previous_breadth = breadth;
        previous_total = breakdown.total_score;
        breadth_seen.push(breadth);
    }

    assert_eq!(breadth_seen, vec![0.0, 4.0, 8.0, 12.0, 12.0]);
}

#[test]
fn penalties_drive_raw_total_negative_but_score_is_floored() {
    let profile = profile();
    let document = doc("stack trace then traceback then syntax error then npm install then pip install");

    let breakdown = score_document(&document, &profile);

    assert!(breakdown.raw_total < 0);
    assert_eq!(breakdown.total_score, 0);
    assert!(breakdown.layer_points(LayerId::Penalty) <= -25.0);
}

#[test]
fn density_favours_the_shorter_document() {
    let profile = profile();
    let hits = "pricing discount anchor margin";
    let short = doc(format!("{} {hits}", filler(490)));
    let long = doc(format!("{} {hits}", filler(4990)));

    let short_breakdown = score_document(&short, &profile);
    let long_breakdown = score_document(&long, &profile);

    assert_eq!(
        short_breakdown.layer_points(LayerId::DomainCluster),
        long_breakdown.layer_points(LayerId::DomainCluster)
    );
    assert!(
        short_breakdown.layer_points(LayerId::Density)
            > long_breakdown.layer_points(LayerId::Density)
    );
    assert!(short_breakdown.total_score > long_breakdown.total_score);
}

#[test]
fn empty_document_scores_zero() {
    let breakdown = score_document(&doc(""), &profile());

    assert_eq!(breakdown.total_score, 0);
    assert_eq!(breakdown.raw_total, 0);
    assert!(breakdown.contributions.is_empty());
    assert_eq!(breakdown.reason, ScoreReason::Neutral);
}

#[test]
fn malformed_document_scores_zero_with_malformed_reason() {
    let document = doc("## User\n[object Object]\npricing pricing willingness to pay");

    let breakdown = score_document(&document, &profile());

    assert_eq!(breakdown.total_score, 0);
    assert!(breakdown.layers.is_empty());
    assert_eq!(breakdown.reason, ScoreReason::Malformed);
}

#[test]
fn longer_phrase_claims_its_span() {
    let breakdown = score_document(&doc("our business model is simple"), &profile());

    assert_eq!(breakdown.metrics.clusters_hit, vec!["business".to_string()]);
    assert_eq!(breakdown.metrics.domain_hits, 1);
}

#[test]
fn shared_term_belongs_to_highest_multiplier_cluster() {
    let mut config = test_config();
    config.clusters.insert(0, cluster("craft", 3, &["cohort"]));
    let profile = ScoringProfile::compile(config).unwrap();

    let breakdown = score_document(&doc("each cohort behaves differently"), &profile);

    assert_eq!(breakdown.metrics.clusters_hit, vec!["retention".to_string()]);
    assert_eq!(breakdown.layer_points(LayerId::DomainCluster), 8.0);
}

#[test]
fn engagement_requires_a_cluster_hit() {
    let profile = profile();
    let turns = (0..20)
        .map(|_| "## User\nhello\n## Assistant\nhi")
        .collect::<Vec<_>>()
        .join("\n");

    let without = score_document(&doc(turns.clone()), &profile);
    let with = score_document(&doc(format!("{turns}\npricing")), &profile);

    assert_eq!(without.layer_points(LayerId::Engagement), 0.0);
    assert_eq!(with.layer_points(LayerId::Engagement), 5.0);
    assert_eq!(with.layer_points(LayerId::TurnDepth), 2.0);
}

#[test]
fn breakdown_is_stamped_with_config_version() {
    let mut config = test_config();
    config.version = 7;
    let profile = ScoringProfile::compile(config).unwrap();

    let breakdown = score_document(&doc("pricing"), &profile);

    assert_eq!(breakdown.config_version, 7);
}

#[test]
fn example_config_loads_and_compiles() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/scoring.example.toml");

    let profile = ScoringProfile::load(path).unwrap();

    assert_eq!(profile.version(), 1);
    assert!(!profile.clusters().is_empty());
}
