//! Compiled scoring profile.
//!
//! # Responsibility
//! - Turn a validated [`ScoringConfig`] into matchers and regexes once, so
//!   scoring calls never recompile anything.
//! - Resolve overlapping cluster terms to a single owning cluster.
//!
//! # Invariants
//! - A profile can only be built from a configuration that passed
//!   validation and whose patterns all compile.
//! - A term declared by several clusters belongs to the cluster with the
//!   highest tier multiplier; equal multipliers fall back to declaration
//!   order.

use log::info;
use regex::Regex;
use std::path::Path;

use super::{ConfigError, ConfigValidationError, PatternConfig, ScoringConfig};
use crate::scoring::matcher::{TermMatcher, TermSpec};

/// Cluster with its resolved multiplier and hit schedule.
#[derive(Debug, Clone)]
pub struct CompiledCluster {
    pub name: String,
    pub tier: u8,
    pub multiplier: f64,
    pub hit_points: Vec<f64>,
}

impl CompiledCluster {
    /// Points for `hits` distinct hits before the tier multiplier.
    pub fn base_points(&self, hits: usize) -> f64 {
        let Some(&last) = self.hit_points.last() else {
            return 0.0;
        };
        (0..hits)
            .map(|index| self.hit_points.get(index).copied().unwrap_or(last))
            .sum()
    }
}

/// Named compiled regex rule.
#[derive(Debug, Clone)]
pub struct NamedPattern {
    pub name: String,
    pub regex: Regex,
}

/// Immutable, ready-to-score view of one configuration version.
#[derive(Debug, Clone)]
pub struct ScoringProfile {
    config: ScoringConfig,
    clusters: Vec<CompiledCluster>,
    cluster_terms: TermMatcher,
    generic_terms: TermMatcher,
    low_value_terms: TermMatcher,
    strong_terms: TermMatcher,
    structural: Vec<NamedPattern>,
    novel_framing: Vec<NamedPattern>,
}

impl ScoringProfile {
    /// Validates and compiles `config`.
    pub fn compile(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let clusters = config
            .clusters
            .iter()
            .map(|cluster| CompiledCluster {
                name: cluster.name.trim().to_string(),
                tier: cluster.tier,
                multiplier: config.tier_multiplier(cluster.tier).unwrap_or(1.0),
                hit_points: cluster
                    .hit_points
                    .clone()
                    .unwrap_or_else(|| config.default_hit_points.clone()),
            })
            .collect::<Vec<_>>();

        let mut precedence = (0..clusters.len()).collect::<Vec<_>>();
        precedence.sort_by(|&a, &b| {
            clusters[b]
                .multiplier
                .total_cmp(&clusters[a].multiplier)
                .then(a.cmp(&b))
        });
        let mut rank_of = vec![0; clusters.len()];
        for (rank, &index) in precedence.iter().enumerate() {
            rank_of[index] = rank;
        }

        let mut ordinal = 0;
        let mut cluster_specs = Vec::new();
        for (index, cluster) in config.clusters.iter().enumerate() {
            for term in &cluster.terms {
                cluster_specs.push(TermSpec {
                    term: term.clone(),
                    owner: index,
                    rank: rank_of[index],
                    ordinal,
                });
                ordinal += 1;
            }
        }

        let cluster_terms = build_matcher(cluster_specs)?;
        let generic_terms = build_matcher(flat_specs(&config.generic.keywords))?;
        let low_value_terms = build_matcher(flat_specs(&config.penalties.low_value_terms))?;
        let strong_terms = build_matcher(flat_specs(&config.penalties.strong_terms))?;
        let structural = compile_patterns("structural", &config.structural.patterns)?;
        let novel_framing = compile_patterns("novel_framing", &config.novel_framing.patterns)?;

        info!(
            "event=profile_compile module=config status=ok version={} clusters={} cluster_terms={} generic_terms={} structural_patterns={} novel_patterns={}",
            config.version,
            clusters.len(),
            cluster_terms.len(),
            generic_terms.len(),
            structural.len(),
            novel_framing.len()
        );

        Ok(Self {
            config,
            clusters,
            cluster_terms,
            generic_terms,
            low_value_terms,
            strong_terms,
            structural,
            novel_framing,
        })
    }

    /// Loads, validates and compiles a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::compile(ScoringConfig::load_from_path(path)?)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn version(&self) -> u32 {
        self.config.version
    }

    pub fn clusters(&self) -> &[CompiledCluster] {
        &self.clusters
    }

    pub fn cluster_terms(&self) -> &TermMatcher {
        &self.cluster_terms
    }

    pub fn generic_terms(&self) -> &TermMatcher {
        &self.generic_terms
    }

    pub fn low_value_terms(&self) -> &TermMatcher {
        &self.low_value_terms
    }

    pub fn strong_terms(&self) -> &TermMatcher {
        &self.strong_terms
    }

    pub fn structural_patterns(&self) -> &[NamedPattern] {
        &self.structural
    }

    pub fn novel_framing_patterns(&self) -> &[NamedPattern] {
        &self.novel_framing
    }
}

fn flat_specs(terms: &[String]) -> Vec<TermSpec> {
    terms
        .iter()
        .enumerate()
        .map(|(ordinal, term)| TermSpec {
            term: term.clone(),
            owner: 0,
            rank: ordinal,
            ordinal,
        })
        .collect()
}

fn build_matcher(specs: Vec<TermSpec>) -> Result<TermMatcher, ConfigError> {
    TermMatcher::build(specs).map_err(|(term, message)| {
        ConfigError::Invalid(ConfigValidationError::InvalidTerm { term, message })
    })
}

fn compile_patterns(
    layer: &str,
    patterns: &[PatternConfig],
) -> Result<Vec<NamedPattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            let regex = Regex::new(&pattern.pattern).map_err(|err| {
                ConfigError::Invalid(ConfigValidationError::InvalidPattern {
                    name: format!("{layer}.{}", pattern.name.trim()),
                    message: err.to_string(),
                })
            })?;
            Ok(NamedPattern {
                name: pattern.name.trim().to_string(),
                regex,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::ScoringProfile;
    use crate::config::{
        ClusterConfig, ConfigError, ConfigValidationError, PatternConfig, ScoringConfig,
    };

    fn cluster(name: &str, tier: u8, terms: &[&str]) -> ClusterConfig {
        ClusterConfig {
            name: name.to_string(),
            tier,
            terms: terms.iter().map(|term| term.to_string()).collect(),
            hit_points: None,
        }
    }

    #[test]
    fn default_profile_compiles() {
        let profile = ScoringProfile::compile(ScoringConfig::default()).unwrap();
        assert_eq!(profile.version(), 1);
        assert!(!profile.structural_patterns().is_empty());
        assert!(!profile.novel_framing_patterns().is_empty());
    }

    #[test]
    fn invalid_regex_fails_fast() {
        let mut config = ScoringConfig::default();
        config.structural.patterns.push(PatternConfig {
            name: "broken".to_string(),
            pattern: "(unclosed".to_string(),
        });
        let err = ScoringProfile::compile(config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigValidationError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn shared_term_belongs_to_highest_tier_cluster() {
        let mut config = ScoringConfig::default();
        config.clusters.push(cluster("support", 4, &["leverage", "ops"]));
        config.clusters.push(cluster("core", 1, &["leverage"]));
        let profile = ScoringProfile::compile(config).unwrap();

        let hits = profile.cluster_terms().find("leverage");
        assert_eq!(hits.len(), 1);
        assert_eq!(profile.clusters()[hits[0].owner].name, "core");
    }

    #[test]
    fn equal_tiers_fall_back_to_declaration_order() {
        let mut config = ScoringConfig::default();
        config.clusters.push(cluster("first", 2, &["moat"]));
        config.clusters.push(cluster("second", 2, &["moat"]));
        let profile = ScoringProfile::compile(config).unwrap();

        let hits = profile.cluster_terms().find("a real moat");
        assert_eq!(profile.clusters()[hits[0].owner].name, "first");
    }

    #[test]
    fn hit_schedule_repeats_last_value() {
        let mut config = ScoringConfig::default();
        let mut custom = cluster("custom", 3, &["x"]);
        custom.hit_points = Some(vec![5.0, 2.0]);
        config.clusters.push(custom);
        let profile = ScoringProfile::compile(config).unwrap();

        let compiled = &profile.clusters()[0];
        assert_eq!(compiled.base_points(0), 0.0);
        assert_eq!(compiled.base_points(1), 5.0);
        assert_eq!(compiled.base_points(4), 11.0);
    }
}
