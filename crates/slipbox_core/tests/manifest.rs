use slipbox_core::db::open_db_in_memory;
use slipbox_core::manifest::{
    export_snapshot, import_legacy_manifest, import_snapshot, Snapshot, LEGACY_CONFIG_VERSION,
    SNAPSHOT_FORMAT_VERSION,
};
use slipbox_core::repo::entry_repo::EntryListQuery;
use slipbox_core::{
    CorpusStore, Disposition, DispositionRequest, ScoreBreakdown, ScoreReason, SqliteCorpusStore,
};

fn breakdown(total: u32) -> ScoreBreakdown {
    ScoreBreakdown {
        config_version: 3,
        contributions: Vec::new(),
        layers: Vec::new(),
        raw_total: i64::from(total),
        total_score: total,
        reason: ScoreReason::DomainRelevant,
        metrics: Default::default(),
    }
}

#[test]
fn export_writes_snapshot_atomically_and_import_restores_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let source_conn = open_db_in_memory().unwrap();
    let source = SqliteCorpusStore::new(&source_conn);
    source.upsert_score("b.md", &breakdown(14)).unwrap();
    source.upsert_score("a.md", &breakdown(61)).unwrap();
    source
        .set_disposition(
            &DispositionRequest::new("a.md", Disposition::Gold).with_output_refs(["note-4"]),
        )
        .unwrap();

    let snapshot = export_snapshot(&source, &path).unwrap();
    assert_eq!(snapshot.format_version, SNAPSHOT_FORMAT_VERSION);
    assert_eq!(snapshot.stats.total, 2);
    assert_eq!(snapshot.stats.gold, 1);
    assert_eq!(
        snapshot
            .entries
            .iter()
            .map(|entry| entry.id.as_str())
            .collect::<Vec<_>>(),
        vec!["a.md", "b.md"]
    );

    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 1);
    let on_disk: Snapshot =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, snapshot);

    let target_conn = open_db_in_memory().unwrap();
    let target = SqliteCorpusStore::new(&target_conn);
    let report = import_snapshot(&target, &path).unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.already_present, 0);

    let mut restored = target.list_entries(&EntryListQuery::default()).unwrap();
    restored.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(restored, snapshot.entries);

    let again = import_snapshot(&target, &path).unwrap();
    assert_eq!(again.inserted, 0);
    assert_eq!(again.already_present, 2);
}

#[test]
fn legacy_manifest_maps_status_reason_and_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processing.json");
    std::fs::write(
        &path,
        r#"{
            "files": {
                "2023-06-01-pricing.md": {
                    "path": "/vault/2023-06-01-pricing.md",
                    "status": "gold",
                    "score": 64,
                    "reason": "cross_domain",
                    "word_count": 2400,
                    "turn_count": 14,
                    "density": 2.5,
                    "clusters_hit": ["pricing", "coaching"],
                    "structural_hits": 2,
                    "novel_framing_hits": 1,
                    "flowers_extracted": ["Value anchors"],
                    "processed_date": "2024-02-10"
                },
                "2023-06-02-broken.md": {
                    "status": null,
                    "score": 0,
                    "reason": "corrupted",
                    "flowers_extracted": [],
                    "processed_date": null
                },
                "misc.md": {
                    "status": "skip",
                    "score": 12
                }
            },
            "stats": {"total": 3},
            "last_updated": "2024-02-10 09:00"
        }"#,
    )
    .unwrap();

    let conn = open_db_in_memory().unwrap();
    let store = SqliteCorpusStore::new(&conn);
    let report = import_legacy_manifest(&store, &path).unwrap();
    assert_eq!(report.inserted, 3);

    let gold = store.get_entry("2023-06-01-pricing.md").unwrap().unwrap();
    assert_eq!(gold.disposition, Disposition::Gold);
    assert_eq!(gold.score, 64);
    assert_eq!(gold.reason, ScoreReason::CrossDomain);
    assert_eq!(gold.output_refs, vec!["Value anchors".to_string()]);
    assert_eq!(gold.created_on, chrono::NaiveDate::from_ymd_opt(2023, 6, 1));
    assert_eq!(gold.decided_at, Some(1_707_523_200_000));
    assert_eq!(
        gold.clusters_hit(),
        ["pricing".to_string(), "coaching".to_string()]
    );
    let legacy_breakdown = gold.breakdown.unwrap();
    assert_eq!(legacy_breakdown.config_version, LEGACY_CONFIG_VERSION);
    assert_eq!(legacy_breakdown.total_score, 64);
    assert!(legacy_breakdown.contributions.is_empty());
    assert_eq!(legacy_breakdown.metrics.word_count, 2400);
    assert_eq!(legacy_breakdown.metrics.turn_count, 14);
    assert_eq!(legacy_breakdown.metrics.density, 2.5);
    assert_eq!(legacy_breakdown.metrics.structural_hits, 2);
    assert_eq!(legacy_breakdown.metrics.novel_framing_hits, 1);

    let broken = store.get_entry("2023-06-02-broken.md").unwrap().unwrap();
    assert_eq!(broken.disposition, Disposition::Unscored);
    assert_eq!(broken.reason, ScoreReason::Malformed);

    let misc = store.get_entry("misc.md").unwrap().unwrap();
    assert_eq!(misc.disposition, Disposition::Skip);
    assert_eq!(misc.decided_at, None);
    assert_eq!(misc.created_on, None);
    assert!(misc.breakdown.is_none());
    assert!(broken.breakdown.is_none());
}

#[test]
fn invalid_manifest_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();

    let conn = open_db_in_memory().unwrap();
    let store = SqliteCorpusStore::new(&conn);

    assert!(import_legacy_manifest(&store, &path).is_err());
    assert!(import_snapshot(&store, &path).is_err());
}
