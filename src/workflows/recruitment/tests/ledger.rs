use std::fs;

use serde_json::json;
use tempfile::TempDir;

use super::common::{sample_evaluation, MemorySnapshotStore};
use crate::workflows::recruitment::{
    CandidateLedger, CandidateStatus, JsonSnapshotStore, LedgerError, SnapshotStore,
};

#[test]
fn open_starts_empty_when_no_durable_copy_exists() {
    let dir = TempDir::new().expect("tempdir");
    let store = JsonSnapshotStore::new(dir.path().join("session.json"));
    let ledger = CandidateLedger::open(Box::new(store));

    assert!(ledger.candidates().is_empty());
    assert_eq!(ledger.counters().manual, 0);
    assert_eq!(ledger.counters().email, 0);
}

#[test]
fn snapshot_survives_a_restart() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("session.json");

    let ledger = CandidateLedger::open(Box::new(JsonSnapshotStore::new(path.clone())));
    ledger
        .replace_candidates(vec![sample_evaluation("Ada Lovelace", 91)])
        .expect("replace persists");
    drop(ledger);

    let reopened = CandidateLedger::open(Box::new(JsonSnapshotStore::new(path)));
    let candidates = reopened.candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].candidate_name, "Ada Lovelace");
    assert_eq!(candidates[0].score, 91);
}

#[test]
fn corrupt_snapshot_self_heals_to_empty() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("session.json");
    fs::write(&path, "{ this is not json").expect("write corrupt file");

    let ledger = CandidateLedger::open(Box::new(JsonSnapshotStore::new(path.clone())));
    assert!(ledger.candidates().is_empty());

    // The next successful write replaces the corrupt copy.
    ledger
        .replace_candidates(vec![sample_evaluation("Grace Hopper", 88)])
        .expect("replace persists");
    let reopened = CandidateLedger::open(Box::new(JsonSnapshotStore::new(path)));
    assert_eq!(reopened.candidates().len(), 1);
}

#[test]
fn older_records_hydrate_status_and_notes_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("session.json");
    let raw = json!({
        "candidates": [{
            "candidate_name": "Ada Lovelace",
            "score": 91,
            "stat_score": 88,
            "tech_score": 92,
            "team_score": 85,
            "summary": "Strong analytical profile",
            "rationale": ["Relevant delivery experience"],
            "email": "ada@example.com",
            "email_body": "Dear Ada, draft invitation.",
            "cv_filename": "ada.txt",
            "evaluated_at": "2026-08-01T12:00:00Z"
        }]
    });
    fs::write(&path, raw.to_string()).expect("write legacy snapshot");

    let ledger = CandidateLedger::open(Box::new(JsonSnapshotStore::new(path)));
    let candidates = ledger.candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].status, CandidateStatus::applied());
    assert_eq!(candidates[0].notes, "");
}

#[test]
fn append_adds_to_the_current_run_and_persists() {
    let store = MemorySnapshotStore::default();
    let ledger = CandidateLedger::open(Box::new(store.clone()));
    ledger
        .replace_candidates(vec![sample_evaluation("Ada Lovelace", 91)])
        .expect("seed candidates");

    ledger
        .append_candidate(sample_evaluation("Grace Hopper", 88))
        .expect("append persists");

    let candidates = ledger.candidates();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[1].candidate_name, "Grace Hopper");
    let durable = store.stored().expect("persisted snapshot");
    assert_eq!(durable.candidates.len(), 2);
}

#[test]
fn update_by_name_persists_status_and_notes() {
    let store = MemorySnapshotStore::default();
    let ledger = CandidateLedger::open(Box::new(store.clone()));
    ledger
        .replace_candidates(vec![
            sample_evaluation("Ada Lovelace", 91),
            sample_evaluation("Grace Hopper", 88),
        ])
        .expect("seed candidates");

    let updated = ledger
        .update_by_name(
            "Grace Hopper",
            Some(CandidateStatus::shortlisted()),
            Some("phone screen booked".to_string()),
        )
        .expect("update succeeds");
    assert!(updated);

    let grace = ledger.find_by_name("Grace Hopper").expect("record exists");
    assert_eq!(grace.status, CandidateStatus::shortlisted());
    assert_eq!(grace.notes, "phone screen booked");

    let durable = store.stored().expect("persisted snapshot");
    assert_eq!(durable.candidates[1].status, CandidateStatus::shortlisted());
}

#[test]
fn update_by_name_misses_without_persisting() {
    let store = MemorySnapshotStore::default();
    let ledger = CandidateLedger::open(Box::new(store.clone()));
    ledger
        .replace_candidates(vec![sample_evaluation("Ada Lovelace", 91)])
        .expect("seed candidates");
    let persists_before = store.persist_calls();

    // Matching is exact and case-sensitive.
    let updated = ledger
        .update_by_name("ada lovelace", Some(CandidateStatus::shortlisted()), None)
        .expect("lookup succeeds");

    assert!(!updated);
    assert_eq!(store.persist_calls(), persists_before);
    let ada = ledger.find_by_name("Ada Lovelace").expect("record exists");
    assert_eq!(ada.status, CandidateStatus::applied());
}

#[test]
fn failed_persist_leaves_memory_at_the_previous_state() {
    let store = MemorySnapshotStore::default();
    let ledger = CandidateLedger::open(Box::new(store.clone()));
    ledger
        .replace_candidates(vec![sample_evaluation("Ada Lovelace", 91)])
        .expect("seed candidates");

    store.fail_persist(true);
    let result = ledger.replace_candidates(vec![sample_evaluation("Grace Hopper", 88)]);

    assert!(matches!(result, Err(LedgerError::Persist(_))));
    let candidates = ledger.candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].candidate_name, "Ada Lovelace");
}

#[test]
fn json_store_write_is_atomic_rename() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("nested").join("session.json");
    let store = JsonSnapshotStore::new(path.clone());

    let mut snapshot = crate::workflows::recruitment::LedgerSnapshot::default();
    snapshot.candidates.push(sample_evaluation("Ada Lovelace", 91));
    store.persist(&snapshot).expect("persist succeeds");

    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
    let loaded = store.load().expect("load succeeds").expect("copy exists");
    assert_eq!(loaded.candidates.len(), 1);
}
