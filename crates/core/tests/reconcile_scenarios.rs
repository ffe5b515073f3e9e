//! Reconciliation integration tests.
//!
//! These tests drive the reconciler against the SQLite store (and the
//! in-memory mock where failures need injecting) through multi-client
//! scenarios.

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use suasor_core::{
    testing::{fixtures, MockMediaStore},
    ClientRef, ClientType, ExternalIds, FailureReason, MatchPolicy, MediaItem,
    MediaItemRepository, Movie, ReconcileAction, ReconcileError, ReconcileReport, Reconciler,
    SqliteMediaStore, Track,
};

const PLEX: ClientRef = ClientRef {
    client_id: 1,
    client_type: ClientType::Plex,
};
const JELLYFIN: ClientRef = ClientRef {
    client_id: 2,
    client_type: ClientType::Jellyfin,
};

/// Test helper owning a file-backed store.
struct TestHarness {
    store: SqliteMediaStore,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteMediaStore::new(&temp_dir.path().join("test.db"))
            .expect("Failed to create store");
        Self {
            store,
            _temp_dir: temp_dir,
        }
    }

    fn reconcile(&self, client: ClientRef, items: Vec<MediaItem<Movie>>) -> ReconcileReport<Movie> {
        Reconciler::<Movie>::new(&self.store, MatchPolicy::default())
            .reconcile(client, items, &CancellationToken::new())
            .expect("reconcile failed")
    }

    fn movies(&self) -> Vec<MediaItem<Movie>> {
        MediaItemRepository::<Movie>::get_by_type(&self.store).expect("get_by_type failed")
    }
}

fn dune_from(client: ClientRef, item_id: &str) -> MediaItem<Movie> {
    fixtures::movie_from(client.client_id, client.client_type, item_id, "Dune", 2021)
}

#[test]
fn test_same_client_item_twice_updates_one_row() {
    let harness = TestHarness::new();

    let first = harness.reconcile(PLEX, vec![dune_from(PLEX, "p100")]);
    let second = harness.reconcile(PLEX, vec![dune_from(PLEX, "p100")]);

    assert_eq!(first.entries[0].action, ReconcileAction::Created);
    assert_eq!(second.entries[0].action, ReconcileAction::Updated);
    assert_eq!(first.entries[0].item.id, second.entries[0].item.id);
    assert_eq!(harness.movies().len(), 1);
}

#[test]
fn test_dune_from_two_clients_is_one_row() {
    let harness = TestHarness::new();

    harness.reconcile(PLEX, vec![dune_from(PLEX, "p100")]);
    let report = harness.reconcile(JELLYFIN, vec![dune_from(JELLYFIN, "j55")]);

    assert_eq!(report.entries[0].action, ReconcileAction::Linked);

    let rows = harness.movies();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sync_clients.len(), 2);
    assert!(rows[0].sync_clients.contains(1, "p100"));
    assert!(rows[0].sync_clients.contains(2, "j55"));

    // Both clients can now resolve the shared row
    let via_plex: MediaItem<Movie> = harness.store.get_by_client_item_id(1, "p100").unwrap();
    let via_jellyfin: MediaItem<Movie> = harness.store.get_by_client_item_id(2, "j55").unwrap();
    assert_eq!(via_plex.id, via_jellyfin.id);
}

#[test]
fn test_second_overview_wins() {
    let harness = TestHarness::new();

    let mut first = dune_from(PLEX, "p100");
    first.data.details.description = Some("A noble family becomes embroiled".to_string());
    let mut second = dune_from(PLEX, "p100");
    second.data.details.description = Some("Paul Atreides unites with the Fremen".to_string());

    harness.reconcile(PLEX, vec![first]);
    harness.reconcile(PLEX, vec![second]);

    let rows = harness.movies();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].data.details.description.as_deref(),
        Some("Paul Atreides unites with the Fremen")
    );
}

#[test]
fn test_missing_client_id_is_skipped_without_write() {
    let harness = TestHarness::new();

    // Attributed to another client only
    let stray = fixtures::movie_from(9, ClientType::Emby, "e1", "Heat", 1995);
    let blank = fixtures::movie_from(1, ClientType::Plex, "", "Alien", 1979);
    let report = harness.reconcile(PLEX, vec![stray, blank, dune_from(PLEX, "p100")]);

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].item.title, "Dune");
    assert_eq!(report.summary.skipped, 2);
    assert!(report
        .failures
        .iter()
        .all(|f| f.reason == FailureReason::MissingClientId));
    assert_eq!(report.failures[0].position, 0);
    assert_eq!(report.failures[1].position, 1);
    assert_eq!(harness.movies().len(), 1);
}

#[test]
fn test_persistence_failure_is_isolated() {
    let store = MockMediaStore::<Movie>::new();
    store.fail_writes_for("Heat");

    let items = vec![
        fixtures::movie_from(1, ClientType::Plex, "p1", "Alien", 1979),
        fixtures::movie_from(1, ClientType::Plex, "p2", "Heat", 1995),
        fixtures::movie_from(1, ClientType::Plex, "p3", "Dune", 2021),
    ];
    let report = Reconciler::<Movie>::new(&store, MatchPolicy::default())
        .reconcile(PLEX, items, &CancellationToken::new())
        .expect("a per-item failure must not fail the batch");

    let titles: Vec<&str> = report.items().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Alien", "Dune"]);
    assert_eq!(store.len(), 2);

    assert_eq!(report.summary.failed, 1);
    let failure = &report.failures[0];
    assert_eq!(failure.position, 1);
    assert_eq!(failure.client_item_id.as_deref(), Some("p2"));
    assert_eq!(failure.reason, FailureReason::Store);
    assert!(failure.message.contains("Heat"));
}

#[test]
fn test_index_failure_aborts_batch() {
    let store = MockMediaStore::<Movie>::new();
    store.set_fail_get_by_type(true);

    let result = Reconciler::<Movie>::new(&store, MatchPolicy::default()).reconcile(
        PLEX,
        vec![dune_from(PLEX, "p100")],
        &CancellationToken::new(),
    );

    assert!(matches!(result, Err(ReconcileError::IndexBuild(_))));
    assert!(store.is_empty());
}

#[test]
fn test_conflicting_external_ids_prevent_merge() {
    let harness = TestHarness::new();

    // Two different films released the same year under the same title
    let villeneuve = fixtures::movie_with_ids(
        1,
        ClientType::Plex,
        "p100",
        "Dune",
        2021,
        ExternalIds {
            imdb: Some("tt1160419".to_string()),
            ..Default::default()
        },
    );
    let other = fixtures::movie_with_ids(
        2,
        ClientType::Jellyfin,
        "j77",
        "Dune",
        2021,
        ExternalIds {
            imdb: Some("tt0000001".to_string()),
            ..Default::default()
        },
    );

    harness.reconcile(PLEX, vec![villeneuve]);
    let report = harness.reconcile(JELLYFIN, vec![other]);

    assert_eq!(report.entries[0].action, ReconcileAction::Created);
    assert_eq!(harness.movies().len(), 2);
}

#[test]
fn test_external_ids_are_merged_on_link() {
    let harness = TestHarness::new();

    let from_plex = fixtures::movie_with_ids(
        1,
        ClientType::Plex,
        "p100",
        "Dune",
        2021,
        ExternalIds {
            imdb: Some("tt1160419".to_string()),
            ..Default::default()
        },
    );
    let from_jellyfin = fixtures::movie_with_ids(
        2,
        ClientType::Jellyfin,
        "j55",
        "Dune",
        2021,
        ExternalIds {
            tmdb: Some(438631),
            ..Default::default()
        },
    );

    harness.reconcile(PLEX, vec![from_plex]);
    harness.reconcile(JELLYFIN, vec![from_jellyfin]);

    let rows = harness.movies();
    assert_eq!(rows.len(), 1);
    let ids = &rows[0].data.details.external_ids;
    assert_eq!(ids.imdb.as_deref(), Some("tt1160419"));
    assert_eq!(ids.tmdb, Some(438631));
}

#[test]
fn test_renamed_client_id_relinks_in_place() {
    let harness = TestHarness::new();

    harness.reconcile(PLEX, vec![dune_from(PLEX, "p100")]);
    harness.reconcile(JELLYFIN, vec![dune_from(JELLYFIN, "j55")]);
    // Plex library rebuilt, the item got a new ID
    let report = harness.reconcile(PLEX, vec![dune_from(PLEX, "p900")]);

    assert_eq!(report.entries[0].action, ReconcileAction::Linked);
    let rows = harness.movies();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sync_clients.len(), 2);
    assert_eq!(rows[0].sync_clients.item_id_for(1), Some("p900"));
    assert_eq!(rows[0].sync_clients.item_id_for(2), Some("j55"));
    assert!(MediaItemRepository::<Movie>::get_by_client_item_id(&harness.store, 1, "p100")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_two_editions_on_one_client_stay_separate() {
    let harness = TestHarness::new();
    let editions = || vec![dune_from(PLEX, "p1"), dune_from(PLEX, "p2")];

    let first = harness.reconcile(PLEX, editions());
    let second = harness.reconcile(PLEX, editions());

    let actions = |report: &ReconcileReport<Movie>| -> Vec<ReconcileAction> {
        report.entries.iter().map(|e| e.action).collect()
    };
    assert_eq!(
        actions(&first),
        vec![ReconcileAction::Created, ReconcileAction::Created]
    );
    assert_eq!(
        actions(&second),
        vec![ReconcileAction::Updated, ReconcileAction::Updated]
    );
    assert_eq!(harness.movies().len(), 2);
    for item_id in ["p1", "p2"] {
        assert!(MediaItemRepository::<Movie>::get_by_client_item_id(&harness.store, 1, item_id)
            .is_ok());
    }
}

#[test]
fn test_client_id_beyond_storage_range_never_duplicates() {
    let harness = TestHarness::new();
    let huge = ClientRef::new(u64::MAX - 1, ClientType::Plex);

    for _ in 0..2 {
        let report = harness.reconcile(huge, vec![dune_from(huge, "x1")]);
        assert!(report.entries.is_empty());
        assert_eq!(report.failures[0].reason, FailureReason::Store);
    }
    assert!(harness.movies().is_empty());
}

#[test]
fn test_ambiguous_match_links_oldest_row() {
    let harness = TestHarness::new();

    let older = harness
        .store
        .create(dune_from(PLEX, "p100"))
        .expect("create failed");
    let newer = harness
        .store
        .create(dune_from(PLEX, "p101"))
        .expect("create failed");
    assert!(older.id < newer.id);

    let report = harness.reconcile(JELLYFIN, vec![dune_from(JELLYFIN, "j55")]);

    assert_eq!(report.entries[0].action, ReconcileAction::Linked);
    assert_eq!(report.entries[0].item.id, older.id);
}

#[test]
fn test_cancellation_keeps_committed_prefix() {
    let store = MockMediaStore::<Movie>::new();
    let cancel = CancellationToken::new();
    let reconciler = Reconciler::<Movie>::new(&store, MatchPolicy::default());

    let first = reconciler
        .reconcile(PLEX, vec![dune_from(PLEX, "p100")], &cancel)
        .unwrap();
    assert!(!first.is_cancelled());

    cancel.cancel();
    let second = reconciler
        .reconcile(
            PLEX,
            vec![
                fixtures::movie_from(1, ClientType::Plex, "p1", "Alien", 1979),
                fixtures::movie_from(1, ClientType::Plex, "p2", "Heat", 1995),
            ],
            &cancel,
        )
        .unwrap();

    assert!(second.is_cancelled());
    assert_eq!(second.summary.unprocessed, 2);
    assert!(second.entries.is_empty());
    // Earlier work stays committed
    assert_eq!(store.len(), 1);
}

#[test]
fn test_tracks_match_without_year_by_artist_and_album() {
    let store = SqliteMediaStore::in_memory().unwrap();
    let reconciler = Reconciler::<Track>::new(&store, MatchPolicy::default());
    let cancel = CancellationToken::new();

    reconciler
        .reconcile(
            PLEX,
            vec![fixtures::track_from(1, ClientType::Plex, "t1", "The XX", "xx", "Intro")],
            &cancel,
        )
        .unwrap();
    let report = reconciler
        .reconcile(
            JELLYFIN,
            vec![
                fixtures::track_from(2, ClientType::Jellyfin, "t9", "The xx", "XX", "Intro"),
                fixtures::track_from(2, ClientType::Jellyfin, "t10", "Other", "xx", "Intro"),
            ],
            &cancel,
        )
        .unwrap();

    assert_eq!(report.entries[0].action, ReconcileAction::Linked);
    assert_eq!(report.entries[1].action, ReconcileAction::Created);
    assert_eq!(
        MediaItemRepository::<Track>::get_by_type(&store).unwrap().len(),
        2
    );
}
