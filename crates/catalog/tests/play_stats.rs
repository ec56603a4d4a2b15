use catalog::{Catalog, CatalogError, DEFAULT_DASHBOARD_LIMIT};
use common::{NewSong, PlayTotals, PlayWindow};
use tempfile::TempDir;

fn open_catalog() -> (TempDir, Catalog) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::open(&dir.path().join("data").join("catalog.redb")).unwrap();
    (dir, catalog)
}

fn add(catalog: &Catalog, title: &str, artist: &str) -> String {
    catalog
        .create_song(NewSong {
            title: title.to_string(),
            artist: artist.to_string(),
            image_url: "cover.jpg".to_string(),
            audio_url: "song.mp3".to_string(),
            duration_secs: 200,
            album_id: None,
        })
        .unwrap()
        .id
}

#[test]
fn playback_then_weekly_rollover() {
    let (_dir, catalog) = open_catalog();
    let moon = add(&catalog, "Blue Moon", "A");
    let light = add(&catalog, "Moonlight", "B");
    let sun = add(&catalog, "Sun", "C");

    for _ in 0..3 {
        catalog.increment_play(&moon).unwrap();
    }
    catalog.increment_play(&light).unwrap();

    let before = catalog.global_totals().unwrap();
    assert_eq!(
        before,
        PlayTotals {
            total_plays: 4,
            weekly_plays: 4,
            monthly_plays: 4,
            yearly_plays: 4,
        }
    );

    let first = catalog.reset_window_named("weekly").unwrap();
    let second = catalog.reset_window_named("weekly").unwrap();
    assert_eq!(first.matched, 3);
    assert_eq!(second.modified, 0);

    let after = catalog.global_totals().unwrap();
    assert_eq!(after.weekly_plays, 0);
    assert_eq!(after.total_plays, 4);
    assert_eq!(after.monthly_plays, 4);
    assert_eq!(after.yearly_plays, 4);

    let dashboard = catalog.dashboard(DEFAULT_DASHBOARD_LIMIT).unwrap();
    assert_eq!(dashboard.top_songs[0].id, moon);
    assert_eq!(dashboard.top_songs[0].plays, 3);
    let recent: Vec<&str> = dashboard
        .recently_played
        .iter()
        .map(|item| item.id.as_str())
        .collect();
    assert!(!recent.contains(&sun.as_str()));
    assert_eq!(recent.len(), 2);
}

#[test]
fn catalog_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.redb");
    let id = {
        let catalog = Catalog::open(&path).unwrap();
        let id = add(&catalog, "Persisted", "A");
        catalog.increment_play(&id).unwrap();
        id
    };
    let catalog = Catalog::open(&path).unwrap();
    let song = catalog.get_song(&id).unwrap().unwrap();
    assert_eq!(song.plays.total, 1);
    assert!(song.last_played.is_some());
    let next = catalog.create_song(NewSong {
        title: "Next".to_string(),
        artist: "B".to_string(),
        image_url: "cover.jpg".to_string(),
        audio_url: "song.mp3".to_string(),
        duration_secs: 240,
        album_id: None,
    });
    assert!(next.unwrap().seq > song.seq);
}

#[test]
fn search_and_rank_errors_are_client_errors() {
    let (_dir, catalog) = open_catalog();
    let err = catalog.search("   ").unwrap_err();
    assert!(matches!(err, CatalogError::InvalidArgument(_)));
    assert!(!err.is_store_failure());

    let err = catalog.reset_window(PlayWindow::Total).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidArgument(_)));

    let err = catalog.increment_play("missing").unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
    assert!(!err.is_store_failure());
}
