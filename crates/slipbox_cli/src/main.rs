//! Command-line driver for the slipbox triage engine.
//!
//! # Responsibility
//! - Map subcommands onto core services without adding behavior of its own.
//! - Print deterministic, plain-text reports for review sessions.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use slipbox_core::manifest::{
    export_snapshot, import_legacy_manifest, import_snapshot, LEGACY_CONFIG_VERSION,
};
use slipbox_core::service::feedback::FindingDetail;
use slipbox_core::service::review::{resolve_entry_id, review_high_score_skips, IdMatch};
use slipbox_core::{
    analyze, init_logging, open_db, rescore, scan, CorpusEntry, CorpusStore, Disposition,
    DispositionOutcome, DispositionRequest, LogTarget, MarkdownDirectory, ScoringConfig,
    ScoringProfile, SqliteCorpusStore, StoreError,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "slipbox")]
#[command(about = "Score and triage conversation transcripts for knowledge extraction", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Corpus store database file
    #[arg(long, env = "SLIPBOX_DB", default_value = "slipbox.db")]
    db: PathBuf,

    /// Scoring configuration (TOML); built-in defaults when omitted
    #[arg(long, env = "SLIPBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of exported conversation markdown files
    #[arg(long, env = "SLIPBOX_CONVERSATIONS")]
    conversations: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Write rotating log files here instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Register and score every conversation in the source directory
    Scan,
    /// Re-apply the current configuration to every undecided entry
    Rescore,
    /// Show the highest-scoring undecided conversations
    Top {
        #[arg(default_value = "20")]
        count: u32,
    },
    /// Show processing totals and the undecided score distribution
    Stats,
    /// Show one entry with its score breakdown
    Show { id: String },
    /// Record a review decision
    Mark {
        /// Entry id or a unique fragment of it
        id: String,
        decision: Decision,
        #[arg(long)]
        reason: Option<String>,
        /// Identifier of a note created from this conversation (repeatable)
        #[arg(long = "ref")]
        refs: Vec<String>,
        /// Replace an existing decision
        #[arg(long)]
        force: bool,
    },
    /// Move a skipped entry back to the review queue
    Reopen { id: String },
    /// List skipped entries whose score suggests another look
    ReviewSkips {
        #[arg(default_value = "20")]
        count: u32,
    },
    /// Analyze decisions against scores and report miscalibration
    Learn,
    /// Write a JSON snapshot of the store
    Export { path: PathBuf },
    /// Load a JSON snapshot into the store
    Import { path: PathBuf },
    /// Load the legacy processing manifest into the store
    ImportLegacy { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Decision {
    Gold,
    Skip,
}

impl From<Decision> for Disposition {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Gold => Disposition::Gold,
            Decision::Skip => Disposition::Skip,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let target = match &cli.log_dir {
        Some(dir) => LogTarget::Directory(
            std::path::absolute(dir).with_context(|| format!("resolving {}", dir.display()))?,
        ),
        None => LogTarget::Stderr,
    };
    init_logging(&cli.log_level, target).map_err(anyhow::Error::msg)?;

    let conn = open_db(&cli.db).with_context(|| format!("opening {}", cli.db.display()))?;
    let store = SqliteCorpusStore::new(&conn);

    match &cli.command {
        Command::Scan => {
            let profile = load_profile(cli.config.as_deref())?;
            let source = conversations(&cli)?;
            let report = scan(&store, &source, &profile)?;
            println!(
                "scanned: {} new, {} rescored, {} already decided, {} missing",
                report.new_entries.len(),
                report.rescored,
                report.skipped_decided,
                report.missing.len()
            );
        }
        Command::Rescore => {
            let profile = load_profile(cli.config.as_deref())?;
            let source = conversations(&cli)?;
            let report = rescore(&store, &source, &profile)?;
            for change in &report.changed {
                println!("{:>4} -> {:<4} {}", change.previous, change.current, change.id);
            }
            println!(
                "rescored with config v{}: {} changed, {} unchanged, {} missing, {} decided meanwhile",
                profile.version(),
                report.changed.len(),
                report.unchanged_count,
                report.missing.len(),
                report.protected.len()
            );
        }
        Command::Top { count } => {
            for entry in store.get_top_unscored(*count)? {
                print_entry_line(&entry);
            }
        }
        Command::Stats => {
            let stats = store.stats()?;
            println!("total:     {}", stats.total);
            println!("processed: {}", stats.processed());
            println!("  gold:    {}", stats.gold);
            println!("  skip:    {}", stats.skip);
            println!("pending:   {}", stats.pending);
            if let Some(rate) = stats.gold_rate() {
                println!("gold rate: {:.1}%", rate * 100.0);
            }
            println!();
            println!("pending score distribution:");
            for bucket in store.score_distribution()? {
                println!("  {:>6}: {}", bucket.label, bucket.count);
            }
        }
        Command::Show { id } => {
            let id = resolve(&store, id)?;
            let Some(entry) = store.get_entry(&id)? else {
                bail!("entry not found: {id}");
            };
            print_entry_detail(&entry);
        }
        Command::Mark {
            id,
            decision,
            reason,
            refs,
            force,
        } => {
            let id = resolve(&store, id)?;
            let mut request =
                DispositionRequest::new(id.clone(), (*decision).into()).with_output_refs(refs.clone());
            if let Some(reason) = reason {
                request = request.with_reason(reason.clone());
            }
            if *force {
                request = request.overriding();
            }
            match store.set_disposition(&request) {
                Ok(DispositionOutcome::Applied) => println!("{id}: {}", request.disposition),
                Ok(DispositionOutcome::Overridden { previous }) => {
                    println!("{id}: {previous} -> {}", request.disposition)
                }
                Err(StoreError::Conflict(conflict)) => {
                    bail!("{conflict}; pass --force to replace it")
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Reopen { id } => {
            let id = resolve(&store, id)?;
            store.reopen_skip(&id)?;
            println!("{id}: skip -> unscored");
        }
        Command::ReviewSkips { count } => {
            let profile = load_profile(cli.config.as_deref())?;
            let skips = review_high_score_skips(&store, &profile, *count)?;
            if skips.is_empty() {
                println!("no skipped entries above the review threshold");
            }
            for entry in &skips {
                print_entry_line(entry);
                if let Some(reason) = &entry.disposition_reason {
                    println!("       skipped because: {reason}");
                }
            }
        }
        Command::Learn => {
            let profile = load_profile(cli.config.as_deref())?;
            let report = analyze(&store, &profile)?;
            print_feedback(&report);
        }
        Command::Export { path } => {
            let snapshot = export_snapshot(&store, path)?;
            println!("exported {} entries to {}", snapshot.entries.len(), path.display());
        }
        Command::Import { path } => {
            let report = import_snapshot(&store, path)?;
            println!(
                "imported {} entries ({} already present)",
                report.inserted, report.already_present
            );
        }
        Command::ImportLegacy { path } => {
            let report = import_legacy_manifest(&store, path)?;
            println!(
                "imported {} legacy entries ({} already present)",
                report.inserted, report.already_present
            );
        }
    }

    Ok(())
}

fn load_profile(path: Option<&Path>) -> Result<ScoringProfile> {
    match path {
        Some(path) => ScoringProfile::load(path)
            .with_context(|| format!("loading scoring config {}", path.display())),
        None => {
            warn!("event=profile_load module=cli status=warn reason=no_config_using_defaults");
            Ok(ScoringProfile::compile(ScoringConfig::default())?)
        }
    }
}

fn conversations(cli: &Cli) -> Result<MarkdownDirectory> {
    match &cli.conversations {
        Some(dir) => Ok(MarkdownDirectory::new(dir)),
        None => bail!("--conversations (or SLIPBOX_CONVERSATIONS) is required for this command"),
    }
}

fn resolve<S: CorpusStore>(store: &S, fragment: &str) -> Result<String> {
    match resolve_entry_id(store, fragment)? {
        IdMatch::Found(id) => Ok(id),
        IdMatch::Ambiguous(ids) => {
            let shown = ids.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
            bail!("`{fragment}` matches {} entries: {shown}", ids.len())
        }
        IdMatch::NotFound => bail!("entry not found: {fragment}"),
    }
}

fn print_entry_line(entry: &CorpusEntry) {
    println!(
        "{:>4}  {:<16} {}",
        entry.score,
        entry.reason.as_str(),
        entry.id
    );
    let clusters = entry.clusters_hit();
    if !clusters.is_empty() {
        println!("       clusters: {}", clusters.join(", "));
    }
}

fn print_entry_detail(entry: &CorpusEntry) {
    println!("id:          {}", entry.id);
    if let Some(path) = &entry.source_path {
        println!("path:        {path}");
    }
    println!("score:       {} ({})", entry.score, entry.reason.as_str());
    println!("disposition: {}", entry.disposition);
    if let Some(reason) = &entry.disposition_reason {
        println!("decided for: {reason}");
    }
    if !entry.output_refs.is_empty() {
        println!("outputs:     {}", entry.output_refs.join(", "));
    }
    let Some(breakdown) = &entry.breakdown else {
        println!("breakdown:   none (imported entry, not rescored yet)");
        return;
    };
    if breakdown.config_version == LEGACY_CONFIG_VERSION {
        println!("config:      legacy metrics (not rescored yet)");
    } else {
        println!("config:      v{}", breakdown.config_version);
    }
    println!(
        "metrics:     {} words, {} turns, density {:.2}",
        breakdown.metrics.word_count, breakdown.metrics.turn_count, breakdown.metrics.density
    );
    for layer in &breakdown.layers {
        println!(
            "  {:<16} {:>6.1} (raw {:.1})",
            layer.layer.as_str(),
            layer.capped_points,
            layer.raw_points
        );
        for contribution in breakdown.contributions_for(layer.layer) {
            if contribution.matched_terms.is_empty() {
                continue;
            }
            println!(
                "      {}: {}",
                contribution.label,
                contribution.matched_terms.join(", ")
            );
        }
    }
}

fn print_feedback(report: &slipbox_core::FeedbackReport) {
    println!(
        "{} decided entries, {} gold",
        report.decided, report.gold
    );
    for finding in &report.findings {
        match &finding.detail {
            FindingDetail::ScoreBand {
                label,
                gold,
                skip,
                gold_rate,
                ..
            } => println!(
                "band {label:>6}: {gold} gold / {skip} skip ({:.0}% gold)",
                gold_rate * 100.0
            ),
            FindingDetail::LowScoreGold {
                score,
                matched_clusters,
                missed_keywords,
                ..
            } => println!(
                "gold at {score}: {} (clusters: {}; unmatched keywords: {})",
                finding.entry_ids.join(", "),
                display_list(matched_clusters),
                missed_keywords.len()
            ),
            FindingDetail::HighScoreSkip {
                score,
                driving_clusters,
                driving_terms,
                ..
            } => println!(
                "skip at {score}: {} (clusters: {}; terms: {})",
                finding.entry_ids.join(", "),
                display_list(driving_clusters),
                display_list(driving_terms)
            ),
            FindingDetail::WeakCluster {
                cluster,
                gold,
                skip,
                gold_rate,
            } => println!(
                "weak cluster {cluster}: {gold} gold / {skip} skip ({:.0}% gold)",
                gold_rate * 100.0
            ),
        }
    }
    if !report.false_positive_clusters.is_empty() {
        println!("clusters in high-score skips:");
        for (cluster, count) in &report.false_positive_clusters {
            println!("  {cluster}: {count}");
        }
    }
    if !report.false_positive_reasons.is_empty() {
        println!("reasons in high-score skips:");
        for (reason, count) in &report.false_positive_reasons {
            println!("  {}: {count}", reason.as_str());
        }
    }
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items.join(", ")
}
