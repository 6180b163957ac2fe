//! Contract Test: ReconcileEngine runs
//!
//! Drives whole apply/refresh/destroy/import runs over a recording record
//! store and checks the remote calls, the persisted state and the events.
//!
//! Constraints verified:
//! - A converged declaration set produces no writes on the next apply
//! - Records gone remotely are recreated instead of failing the run
//! - One failing record does not stop the others
//! - State survives a restart when backed by a file

mod common;

use common::*;
use livedns_core::engine::EngineEvent;
use livedns_core::{
    DeleteOutcome, Error, FileStateStore, LiveDnsConfig, MemoryStateStore, RecordKey,
    RecordStore, ReconcileEngine, StateStore,
};
use tokio::sync::mpsc;

const ACME: &str = "example.com/_acme/TXT";
const WWW: &str = "example.com/www/A";

fn engine(
    store: &RecordingStore,
    state: &MemoryStateStore,
    config: LiveDnsConfig,
) -> (ReconcileEngine, mpsc::Receiver<EngineEvent>) {
    ReconcileEngine::new(Box::new(store.clone()), Box::new(state.clone()), config)
        .expect("valid configuration")
}

fn drain(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn apply_creates_then_converges() {
    let store = RecordingStore::new();
    let state = MemoryStateStore::new();
    let (engine, mut rx) = engine(
        &store,
        &state,
        config_with(vec![www_a(&["192.168.0.1"]), shared_txt(&["token"])]),
    );

    let summary = engine.apply().await.unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.created, vec![WWW.to_string(), ACME.to_string()]);
    assert_eq!(state.len().await, 2);

    let events = drain(&mut rx);
    assert_eq!(
        events.first(),
        Some(&EngineEvent::Started {
            operation: "apply",
            records_count: 2
        })
    );
    assert_eq!(
        events.last(),
        Some(&EngineEvent::Finished {
            operation: "apply",
            failures: 0
        })
    );

    // Second run only reads
    store.clear_calls();
    let summary = engine.apply().await.unwrap();
    assert!(summary.created.is_empty());
    assert!(summary.updated.is_empty());
    assert_eq!(summary.unchanged, vec![WWW.to_string(), ACME.to_string()]);
    assert!(store.writes().is_empty(), "unexpected writes: {:?}", store.writes());
}

#[tokio::test]
async fn apply_updates_changed_values() {
    let store = RecordingStore::new();
    let state = MemoryStateStore::new();

    let (first, _rx) = engine(&store, &state, config_with(vec![www_a(&["192.168.0.1"])]));
    first.apply().await.unwrap();

    let (second, _rx) = engine(&store, &state, config_with(vec![www_a(&["10.0.0.1"])]));
    let summary = second.apply().await.unwrap();

    assert_eq!(summary.updated, vec![WWW.to_string()]);
    assert_eq!(store.values(WWW).await, Some(strings(&["10.0.0.1"])));
    assert_eq!(
        state.get(WWW).await.unwrap().unwrap().values,
        strings(&["10.0.0.1"])
    );
}

#[tokio::test]
async fn apply_recreates_record_deleted_out_of_band() {
    let store = RecordingStore::new();
    let state = MemoryStateStore::new();
    let (engine, mut rx) = engine(&store, &state, config_with(vec![www_a(&["192.168.0.1"])]));

    engine.apply().await.unwrap();

    let key: RecordKey = WWW.parse().unwrap();
    store.records().delete(&key).await.unwrap();
    drain(&mut rx);

    let summary = engine.apply().await.unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.drifted, vec![WWW.to_string()]);
    assert_eq!(summary.created, vec![WWW.to_string()]);
    assert_eq!(store.values(WWW).await, Some(strings(&["192.168.0.1"])));

    let events = drain(&mut rx);
    assert!(events.contains(&EngineEvent::Drifted { id: WWW.to_string() }));
    assert!(events.contains(&EngineEvent::Created { id: WWW.to_string() }));
}

#[tokio::test]
async fn refresh_adopts_remote_values_without_writing() {
    let store = RecordingStore::new();
    let state = MemoryStateStore::new();
    let (engine, _rx) = engine(&store, &state, config_with(vec![www_a(&["192.168.0.1"])]));

    engine.apply().await.unwrap();
    store.seed(WWW, 3600, &["172.16.0.1"]).await;
    store.clear_calls();

    let summary = engine.refresh().await.unwrap();
    assert!(summary.is_success());
    assert!(store.writes().is_empty());
    assert_eq!(
        state.get(WWW).await.unwrap().unwrap().values,
        strings(&["172.16.0.1"])
    );

    // Plan now shows the drift as an update
    let changes = engine.plan().await.unwrap();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].is_change());
    assert!(changes[0].to_string().starts_with("~ update example.com/www/A"));
}

#[tokio::test]
async fn identity_change_deletes_old_record_and_creates_new_one() {
    let store = RecordingStore::new();
    let state = MemoryStateStore::new();

    let (first, _rx) = engine(&store, &state, config_with(vec![www_a(&["192.168.0.1"])]));
    first.apply().await.unwrap();

    let renamed = livedns_core::RecordConfig::new("example.com", "web", "A", 3600)
        .with_values(["192.168.0.1"]);
    let (second, _rx) = engine(&store, &state, config_with(vec![renamed]));
    store.clear_calls();

    let summary = second.apply().await.unwrap();
    assert_eq!(summary.deleted, vec![WWW.to_string()]);
    assert_eq!(summary.created, vec!["example.com/web/A".to_string()]);

    let writes = store.writes();
    assert_eq!(writes[0], Call::Delete(WWW.to_string()));
    assert!(matches!(&writes[1], Call::Create(id, 3600, _) if id == "example.com/web/A"));
    assert!(state.get(WWW).await.unwrap().is_none());
}

#[tokio::test]
async fn undeclared_shared_record_is_withdrawn_from() {
    let store = RecordingStore::new();
    store.seed(ACME, 300, &["\"theirs\""]).await;
    let state = MemoryStateStore::new();

    let (first, _rx) = engine(&store, &state, config_with(vec![shared_txt(&["mine"])]));
    first.apply().await.unwrap();
    assert_eq!(
        store.values(ACME).await,
        Some(strings(&["\"theirs\"", "\"mine\""]))
    );

    let (second, mut rx) = engine(&store, &state, config_with(Vec::new()));
    let summary = second.apply().await.unwrap();

    assert_eq!(summary.deleted, vec![ACME.to_string()]);
    assert_eq!(store.values(ACME).await, Some(strings(&["\"theirs\""])));
    assert!(state.is_empty().await);
    assert!(drain(&mut rx).contains(&EngineEvent::Deleted {
        id: ACME.to_string(),
        outcome: DeleteOutcome::Withdrawn {
            remaining: strings(&["\"theirs\""])
        },
    }));
}

#[tokio::test]
async fn destroy_removes_every_managed_record() {
    let store = RecordingStore::new();
    store.seed(ACME, 300, &["\"theirs\""]).await;
    let state = MemoryStateStore::new();
    let (engine, _rx) = engine(
        &store,
        &state,
        config_with(vec![www_a(&["192.168.0.1"]), shared_txt(&["mine"])]),
    );

    engine.apply().await.unwrap();
    let summary = engine.destroy().await.unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.deleted.len(), 2);
    assert!(store.values(WWW).await.is_none());
    assert_eq!(store.values(ACME).await, Some(strings(&["\"theirs\""])));
    assert!(state.is_empty().await);
}

#[tokio::test]
async fn failing_record_does_not_stop_the_run() {
    let store = RecordingStore::new();
    // The shared record exists already, so it goes through replace
    store.seed(ACME, 300, &["\"theirs\""]).await;
    store.fail_on(FailOn::Create);
    let state = MemoryStateStore::new();
    let (engine, mut rx) = engine(
        &store,
        &state,
        config_with(vec![www_a(&["192.168.0.1"]), shared_txt(&["mine"])]),
    );

    let summary = engine.apply().await.unwrap();
    assert!(!summary.is_success());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, WWW);
    assert_eq!(summary.created, vec![ACME.to_string()]);
    assert!(state.get(WWW).await.unwrap().is_none());

    let events = drain(&mut rx);
    assert!(events.contains(&EngineEvent::Finished {
        operation: "apply",
        failures: 1
    }));

    store.heal();
    let summary = engine.apply().await.unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.created, vec![WWW.to_string()]);
    assert_eq!(summary.unchanged, vec![ACME.to_string()]);
}

#[tokio::test]
async fn record_with_failed_refresh_is_skipped() {
    let store = RecordingStore::new();
    let state = MemoryStateStore::new();
    let (first, _rx) = engine(&store, &state, config_with(vec![www_a(&["192.168.0.1"])]));
    first.apply().await.unwrap();

    let (second, _rx) = engine(&store, &state, config_with(vec![www_a(&["10.0.0.1"])]));
    store.fail_on(FailOn::Fetch);
    store.clear_calls();

    let summary = second.apply().await.unwrap();
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.updated.is_empty());
    assert!(store.writes().is_empty());
    assert_eq!(store.values(WWW).await, Some(strings(&["192.168.0.1"])));
}

#[tokio::test]
async fn import_adopts_existing_record() {
    let store = RecordingStore::new();
    store.seed(WWW, 600, &["10.0.0.1", "10.0.0.2"]).await;
    let state = MemoryStateStore::new();
    let (engine, mut rx) = engine(&store, &state, config_with(vec![www_a(&["10.0.0.1"])]));

    let imported = engine.import(WWW).await.unwrap();
    assert_eq!(imported.values, strings(&["10.0.0.1", "10.0.0.2"]));
    assert_eq!(imported.ttl, 600);
    assert!(!imported.shared);
    assert!(store.writes().is_empty());
    assert!(drain(&mut rx).contains(&EngineEvent::Imported { id: WWW.to_string() }));

    // The next apply converges it to the declaration instead of creating it
    let summary = engine.apply().await.unwrap();
    assert_eq!(summary.updated, vec![WWW.to_string()]);
    assert_eq!(store.values(WWW).await, Some(strings(&["10.0.0.1"])));
}

#[tokio::test]
async fn import_rejects_missing_or_malformed_ids() {
    let store = RecordingStore::new();
    let state = MemoryStateStore::new();
    let (engine, _rx) = engine(&store, &state, config_with(Vec::new()));

    let err = engine.import(WWW).await.unwrap_err();
    assert!(err.is_not_found());

    let err = engine.import("example.com/www").await.unwrap_err();
    assert!(matches!(err, Error::MalformedId(_)));
    assert!(state.is_empty().await);
}

#[tokio::test]
async fn invalid_configuration_is_rejected_up_front() {
    let mut bad_ttl = www_a(&["192.168.0.1"]);
    bad_ttl.ttl = 60;

    let result = ReconcileEngine::new(
        Box::new(RecordingStore::new()),
        Box::new(MemoryStateStore::new()),
        config_with(vec![bad_ttl]),
    );
    assert!(matches!(result, Err(Error::Config(_))));

    let duplicate = config_with(vec![www_a(&["1.1.1.1"]), www_a(&["2.2.2.2"])]);
    let result = ReconcileEngine::new(
        Box::new(RecordingStore::new()),
        Box::new(MemoryStateStore::new()),
        duplicate,
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn file_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("livedns.json");
    let store = RecordingStore::new();
    let records = vec![www_a(&["192.168.0.1"]), shared_txt(&["token"])];

    {
        let state = FileStateStore::new(&path).await.unwrap();
        let (engine, _rx) = ReconcileEngine::new(
            Box::new(store.clone()),
            Box::new(state),
            config_with(records.clone()),
        )
        .unwrap();
        let summary = engine.apply().await.unwrap();
        assert_eq!(summary.created.len(), 2);
    }
    assert!(path.exists());

    let state = FileStateStore::new(&path).await.unwrap();
    assert_eq!(state.list().await.unwrap().len(), 2);

    let (engine, _rx) =
        ReconcileEngine::new(Box::new(store.clone()), Box::new(state), config_with(records))
            .unwrap();
    store.clear_calls();

    let summary = engine.apply().await.unwrap();
    assert_eq!(summary.unchanged.len(), 2);
    assert!(store.writes().is_empty());
}
