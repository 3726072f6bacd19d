use super::*;
use crate::storage::MemoryKeyValueStore;
use crate::testing::{detail, FakeCatalog};

fn loader() -> DetailLoader {
    DetailLoader::new(&Config::default())
}

#[tokio::test]
async fn test_load_replaces_detail() {
    let fake = FakeCatalog::new()
        .with_detail("tt1", Ok(detail("tt1", "Interstellar", Some(8.7))))
        .with_detail("tt2", Ok(detail("tt2", "Inception", Some(8.8))));
    let mut loader = loader();

    assert_eq!(loader.load(&fake, "tt1").await, Applied::Updated);
    assert_eq!(loader.detail().unwrap().title, "Interstellar");
    assert!(!loader.is_loading());

    loader.load(&fake, "tt2").await;
    assert_eq!(loader.detail().unwrap().title, "Inception");
    assert_eq!(loader.selected_id(), Some("tt2"));
}

#[tokio::test]
async fn test_switching_selection_ignores_late_previous_fetch() {
    let fake = FakeCatalog::new()
        .with_detail("tt1", Ok(detail("tt1", "Interstellar", Some(8.7))))
        .with_detail("tt2", Ok(detail("tt2", "Inception", Some(8.8))))
        .ignoring_cancellation();
    let release_first = fake.gate("detail:tt1");
    let mut loader = loader();

    let first = loader.select(Some("tt1".to_string())).unwrap();
    let second = loader.select(Some("tt2".to_string())).unwrap();
    assert!(first.cancel_token().is_cancelled());

    let (first_done, second_done) = tokio::join!(first.run(&fake), async {
        let done = second.run(&fake).await;
        release_first.send(()).unwrap();
        done
    });
    assert!(first_done.result().is_ok());

    assert_eq!(loader.apply(second_done), Applied::Updated);
    assert_eq!(loader.apply(first_done), Applied::Discarded);
    assert_eq!(loader.detail().unwrap().id, "tt2");
}

#[tokio::test]
async fn test_previous_fetch_finishing_first_keeps_loading_new_one() {
    let fake = FakeCatalog::new()
        .with_detail("tt1", Ok(detail("tt1", "Interstellar", Some(8.7))))
        .ignoring_cancellation();
    let mut loader = loader();

    let first = loader.select(Some("tt1".to_string())).unwrap();
    let _second = loader.select(Some("tt2".to_string())).unwrap();

    let first_done = first.run(&fake).await;
    assert_eq!(loader.apply(first_done), Applied::Discarded);
    assert!(loader.detail().is_none());
    assert!(loader.is_loading());
    assert_eq!(loader.selected_id(), Some("tt2"));
}

#[tokio::test]
async fn test_cancelled_fetch_returns_cancelled() {
    let fake = FakeCatalog::new().with_detail("tt1", Ok(detail("tt1", "Interstellar", Some(8.7))));
    let _gate = fake.gate("detail:tt1");
    let mut loader = loader();

    let ticket = loader.select(Some("tt1".to_string())).unwrap();
    loader.close();
    let done = ticket.run(&fake).await;
    assert_eq!(done.result(), &Err(CatalogError::Cancelled));
    assert_eq!(loader.apply(done), Applied::Discarded);
    assert_eq!(loader.error_message(), None);
}

#[tokio::test]
async fn test_close_discards_detail() {
    let fake = FakeCatalog::new().with_detail("tt1", Ok(detail("tt1", "Interstellar", Some(8.7))));
    let mut loader = loader();
    loader.load(&fake, "tt1").await;
    loader.set_pending_rating(7).unwrap();

    loader.close();
    assert!(loader.detail().is_none());
    assert_eq!(loader.selected_id(), None);
    assert_eq!(loader.pending_rating(), None);
    assert_eq!(loader.rating_revisions(), 0);
    assert!(!loader.is_highly_rated());
}

#[test]
fn test_reselecting_same_id_is_noop() {
    let mut loader = loader();
    let ticket = loader.select(Some("tt1".to_string())).unwrap();
    assert!(loader.select(Some("tt1".to_string())).is_none());
    assert!(!ticket.cancel_token().is_cancelled());
}

#[tokio::test]
async fn test_highly_rated_is_derived() {
    let fake = FakeCatalog::new()
        .with_detail("tt1", Ok(detail("tt1", "Interstellar", Some(8.7))))
        .with_detail("tt2", Ok(detail("tt2", "Exactly Eight", Some(8.0))))
        .with_detail("tt3", Ok(detail("tt3", "Unrated", None)));
    let mut loader = loader();
    assert!(!loader.is_highly_rated());

    loader.load(&fake, "tt1").await;
    assert!(loader.is_highly_rated());
    loader.load(&fake, "tt2").await;
    assert!(!loader.is_highly_rated());
    loader.load(&fake, "tt3").await;
    assert!(!loader.is_highly_rated());
}

#[tokio::test]
async fn test_failure_sets_detail_message() {
    let fake = FakeCatalog::new()
        .with_detail("tt1", Err(CatalogError::Transport("connection reset".to_string())));
    let mut loader = loader();
    loader.load(&fake, "tt1").await;

    assert!(loader.detail().is_none());
    assert!(!loader.is_loading());
    assert_eq!(
        loader.error_message(),
        Some(Config::default().messages.detail_failed.as_str())
    );
}

#[test]
fn test_rating_revisions_count_changes_only() {
    let mut loader = loader();
    assert_eq!(loader.set_pending_rating(5), Err(DetailError::NothingSelected));

    loader.select(Some("tt1".to_string()));
    loader.set_pending_rating(5).unwrap();
    loader.set_pending_rating(5).unwrap();
    loader.set_pending_rating(7).unwrap();
    assert_eq!(loader.pending_rating(), Some(7));
    assert_eq!(loader.rating_revisions(), 2);

    assert_eq!(loader.set_pending_rating(0), Err(DetailError::InvalidRating(0)));
    assert_eq!(loader.set_pending_rating(11), Err(DetailError::InvalidRating(11)));
    assert_eq!(loader.rating_revisions(), 2);

    loader.select(Some("tt2".to_string()));
    assert_eq!(loader.rating_revisions(), 0);
    assert_eq!(loader.pending_rating(), None);
}

#[tokio::test]
async fn test_confirm_preconditions() {
    let fake = FakeCatalog::new().with_detail("tt1", Ok(detail("tt1", "Interstellar", Some(8.7))));
    let mut store = WatchedStore::open(MemoryKeyValueStore::new());
    let mut loader = loader();

    assert_eq!(loader.confirm(&store), Err(DetailError::NothingSelected));

    let ticket = loader.select(Some("tt1".to_string())).unwrap();
    assert_eq!(loader.confirm(&store), Err(DetailError::NotLoaded));

    let done = ticket.run(&fake).await;
    loader.apply(done);
    assert_eq!(loader.confirm(&store), Err(DetailError::NoRating));

    loader.set_pending_rating(9).unwrap();
    let entry = loader.confirm(&store).unwrap();
    assert_eq!(entry.id, "tt1");
    assert_eq!(entry.user_rating, 9);
    assert_eq!(entry.imdb_rating, Some(8.7));
    assert_eq!(entry.runtime_minutes, Some(169.0));
    assert_eq!(entry.rating_revision_count, 1);

    store.add(entry).unwrap();
    assert_eq!(loader.confirm(&store), Err(DetailError::AlreadyWatched("tt1".to_string())));
    assert_eq!(loader.watched_rating(&store), Some(9));
}
