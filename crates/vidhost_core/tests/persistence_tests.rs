mod fixtures;

use std::fs;

use fixtures::{file_store, reopen};
use vidhost_core::{
    Catalog, KeyValueStore, ProfileData, ProfileDraft, VideoId, PROFILE_KEY, USER_DATA_KEY,
};

#[test]
fn preferences_survive_reopening() {
    let (dir, mut store) = file_store();
    assert!(store.toggle_like(VideoId(1)));
    assert!(store.toggle_subscription("Science TV"));
    assert!(store.toggle_favorite(VideoId(5)));
    store.add_to_queue(VideoId(4));
    store.add_to_queue(VideoId(2));
    drop(store);

    let store = reopen(dir.path().to_path_buf());
    assert!(store.is_liked(VideoId(1)));
    assert!(store.is_subscribed("Science TV"));
    assert!(store.is_favorite(VideoId(5)));
    assert_eq!(store.list_queue_ids(), vec![VideoId(4), VideoId(2)]);
}

#[test]
fn fresh_directory_has_defaults() {
    let (_dir, store) = file_store();
    assert!(store.list_favorite_ids().is_empty());
    assert_eq!(store.get_profile(), ProfileData::default());
}

#[test]
fn validated_profile_round_trips_through_disk() {
    let (dir, mut store) = file_store();
    let profile = ProfileDraft {
        name: "Ann".into(),
        bio: "Weekend filmmaker".into(),
        avatar: "an".into(),
    }
    .validate()
    .unwrap();
    store.save_profile(&profile);

    let store = reopen(dir.path().to_path_buf());
    assert_eq!(store.get_profile(), profile);
    assert_eq!(store.get_profile().avatar, "AN");
}

#[test]
fn hand_edited_blob_is_read_leniently() {
    let (dir, _store) = file_store();
    fs::write(
        dir.path().join(format!("{USER_DATA_KEY}.json")),
        r#"{"favorites":[3,3,1],"queue":[2,2,6],"likes":null}"#,
    )
    .unwrap();
    fs::write(dir.path().join(format!("{PROFILE_KEY}.json")), "not json").unwrap();

    let store = reopen(dir.path().to_path_buf());
    assert_eq!(store.list_favorite_ids().len(), 2);
    assert_eq!(store.list_queue_ids(), vec![VideoId(2), VideoId(6)]);
    assert!(!store.is_liked(VideoId(3)));
    assert_eq!(store.get_profile(), ProfileData::default());
}

#[test]
fn deleting_a_video_cleans_up_preferences() {
    let (_dir, mut store) = file_store();
    let mut catalog = Catalog::demo();
    store.toggle_favorite(VideoId(3));
    store.toggle_favorite(VideoId(1));
    store.add_to_queue(VideoId(3));

    let removed = catalog.remove(VideoId(3)).unwrap();
    store.forget_video(removed.id);

    let favorites: Vec<VideoId> = catalog
        .resolve(&store.list_favorite_ids())
        .iter()
        .map(|video| video.id)
        .collect();
    assert_eq!(favorites, vec![VideoId(1)]);
    assert!(store.list_queue_ids().is_empty());
    assert!(store.storage().get(USER_DATA_KEY).unwrap().is_some());
}
