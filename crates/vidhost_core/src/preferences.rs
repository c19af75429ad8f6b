use std::collections::HashSet;
use std::hash::Hash;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::VideoId;
use crate::profile::ProfileData;
use crate::storage::KeyValueStore;

pub const USER_DATA_KEY: &str = "videohost_user_data";
pub const PROFILE_KEY: &str = "videohost_profile";

/// Like count shown for every video before the viewer's own like.
pub const BASELINE_LIKES: u64 = 15_000;

/// Toggle-style preferences, stored together as one blob.
///
/// The sets carry no ordering; only the queue keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPreferenceData {
    #[serde(rename = "likes")]
    pub liked_video_ids: HashSet<VideoId>,
    #[serde(rename = "subscriptions")]
    pub subscribed_authors: HashSet<String>,
    #[serde(rename = "favorites")]
    pub favorite_video_ids: HashSet<VideoId>,
    #[serde(rename = "queue")]
    pub queue_video_ids: Vec<VideoId>,
}

impl UserPreferenceData {
    /// Decodes a stored blob. Each field that is missing or malformed falls
    /// back to empty on its own; a blob that is not JSON yields all defaults.
    pub fn decode(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("discarding unreadable preferences blob: {err}");
                return Self::default();
            }
        };

        let mut queue: Vec<VideoId> = field(&value, "queue");
        let mut seen = HashSet::new();
        queue.retain(|id| seen.insert(*id));

        Self {
            liked_video_ids: field(&value, "likes"),
            subscribed_authors: field(&value, "subscriptions"),
            favorite_video_ids: field(&value, "favorites"),
            queue_video_ids: queue,
        }
    }

    pub fn encode(&self) -> String {
        // Sets of plain ids and strings always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn field<T: DeserializeOwned + Default>(value: &Value, name: &str) -> T {
    match value.get(name) {
        None | Some(Value::Null) => T::default(),
        Some(raw) => T::deserialize(raw).unwrap_or_else(|err| {
            warn!("ignoring malformed preferences field {name:?}: {err}");
            T::default()
        }),
    }
}

fn toggle<T: Eq + Hash>(set: &mut HashSet<T>, value: T) -> bool {
    if set.remove(&value) {
        false
    } else {
        set.insert(value);
        true
    }
}

/// Sole owner of persisted user preferences and the profile.
///
/// Every mutation re-reads the blob, applies the change and writes it back
/// whole. Storage failures are logged and swallowed: reads fall back to
/// defaults and a failed write leaves the previous blob in place.
#[derive(Debug)]
pub struct PreferenceStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    fn read(&self, key: &str) -> Option<String> {
        self.storage.get(key).unwrap_or_else(|err| {
            warn!("failed to read {key}: {err}");
            None
        })
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(err) = self.storage.set(key, value) {
            warn!("failed to write {key}: {err}");
        }
    }

    pub fn user_data(&self) -> UserPreferenceData {
        self.read(USER_DATA_KEY)
            .map(|raw| UserPreferenceData::decode(&raw))
            .unwrap_or_default()
    }

    fn save_user_data(&mut self, data: &UserPreferenceData) {
        let encoded = data.encode();
        self.write(USER_DATA_KEY, &encoded);
    }

    pub fn toggle_like(&mut self, id: VideoId) -> bool {
        let mut data = self.user_data();
        let liked = toggle(&mut data.liked_video_ids, id);
        self.save_user_data(&data);
        debug!("video {id} liked: {liked}");
        liked
    }

    pub fn is_liked(&self, id: VideoId) -> bool {
        self.user_data().liked_video_ids.contains(&id)
    }

    /// Placeholder metric: the baseline plus the viewer's own like.
    pub fn like_count(&self, id: VideoId) -> u64 {
        BASELINE_LIKES + u64::from(self.is_liked(id))
    }

    pub fn toggle_subscription(&mut self, author: &str) -> bool {
        let mut data = self.user_data();
        let subscribed = toggle(&mut data.subscribed_authors, author.to_string());
        self.save_user_data(&data);
        debug!("subscribed to {author:?}: {subscribed}");
        subscribed
    }

    pub fn is_subscribed(&self, author: &str) -> bool {
        self.user_data().subscribed_authors.contains(author)
    }

    pub fn list_subscriptions(&self) -> HashSet<String> {
        self.user_data().subscribed_authors
    }

    pub fn toggle_favorite(&mut self, id: VideoId) -> bool {
        let mut data = self.user_data();
        let favorite = toggle(&mut data.favorite_video_ids, id);
        self.save_user_data(&data);
        debug!("video {id} favorite: {favorite}");
        favorite
    }

    pub fn is_favorite(&self, id: VideoId) -> bool {
        self.user_data().favorite_video_ids.contains(&id)
    }

    pub fn list_favorite_ids(&self) -> HashSet<VideoId> {
        self.user_data().favorite_video_ids
    }

    /// Appends `id` unless it is already queued.
    pub fn add_to_queue(&mut self, id: VideoId) {
        let mut data = self.user_data();
        if data.queue_video_ids.contains(&id) {
            return;
        }
        data.queue_video_ids.push(id);
        self.save_user_data(&data);
    }

    pub fn remove_from_queue(&mut self, id: VideoId) -> bool {
        let mut data = self.user_data();
        let before = data.queue_video_ids.len();
        data.queue_video_ids.retain(|queued| *queued != id);
        if data.queue_video_ids.len() == before {
            return false;
        }
        self.save_user_data(&data);
        true
    }

    pub fn clear_queue(&mut self) {
        let mut data = self.user_data();
        if data.queue_video_ids.is_empty() {
            return;
        }
        data.queue_video_ids.clear();
        self.save_user_data(&data);
    }

    pub fn list_queue_ids(&self) -> Vec<VideoId> {
        self.user_data().queue_video_ids
    }

    /// Drops a deleted video from likes, favorites and the queue in one write.
    pub fn forget_video(&mut self, id: VideoId) {
        let mut data = self.user_data();
        let liked = data.liked_video_ids.remove(&id);
        let favorite = data.favorite_video_ids.remove(&id);
        let before = data.queue_video_ids.len();
        data.queue_video_ids.retain(|queued| *queued != id);

        if liked || favorite || data.queue_video_ids.len() != before {
            self.save_user_data(&data);
        }
    }

    pub fn get_profile(&self) -> ProfileData {
        let Some(raw) = self.read(PROFILE_KEY) else {
            return ProfileData::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!("discarding unreadable profile blob: {err}");
            ProfileData::default()
        })
    }

    /// Replaces the stored profile as a whole. Input is expected to have
    /// passed [`ProfileDraft::validate`](crate::profile::ProfileDraft::validate).
    pub fn save_profile(&mut self, profile: &ProfileData) {
        match serde_json::to_string(profile) {
            Ok(encoded) => self.write(PROFILE_KEY, &encoded),
            Err(err) => warn!("failed to encode profile: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> PreferenceStore<MemoryStore> {
        PreferenceStore::new(MemoryStore::new())
    }

    #[test]
    fn fresh_store_uses_defaults() {
        let store = store();
        assert!(store.list_favorite_ids().is_empty());
        assert!(store.list_queue_ids().is_empty());
        assert_eq!(store.get_profile(), ProfileData::default());
    }

    #[test]
    fn toggle_like_twice() {
        let mut store = store();
        assert!(store.toggle_like(VideoId(7)));
        assert_eq!(store.like_count(VideoId(7)), BASELINE_LIKES + 1);
        assert!(!store.toggle_like(VideoId(7)));
        assert!(!store.is_liked(VideoId(7)));
        assert_eq!(store.like_count(VideoId(7)), BASELINE_LIKES);
    }

    #[test]
    fn subscriptions_are_keyed_by_author() {
        let mut store = store();
        assert!(store.toggle_subscription("Chef Ivan"));
        assert!(store.is_subscribed("Chef Ivan"));
        assert!(!store.is_subscribed("chef ivan"));
        assert_eq!(store.list_subscriptions().len(), 1);
    }

    #[test]
    fn queue_is_idempotent_and_ordered() {
        let mut store = store();
        store.add_to_queue(VideoId(3));
        store.add_to_queue(VideoId(1));
        store.add_to_queue(VideoId(3));

        assert_eq!(store.list_queue_ids(), vec![VideoId(3), VideoId(1)]);

        assert!(store.remove_from_queue(VideoId(3)));
        assert!(!store.remove_from_queue(VideoId(3)));
        assert_eq!(store.list_queue_ids(), vec![VideoId(1)]);

        store.clear_queue();
        assert!(store.list_queue_ids().is_empty());
    }

    #[test]
    fn forget_video_purges_every_collection() {
        let mut store = store();
        store.toggle_like(VideoId(4));
        store.toggle_favorite(VideoId(4));
        store.toggle_favorite(VideoId(5));
        store.add_to_queue(VideoId(4));

        store.forget_video(VideoId(4));

        assert!(!store.is_liked(VideoId(4)));
        assert!(!store.is_favorite(VideoId(4)));
        assert!(store.is_favorite(VideoId(5)));
        assert!(store.list_queue_ids().is_empty());
    }

    #[test]
    fn blob_uses_flat_layout() {
        let mut store = store();
        store.toggle_favorite(VideoId(2));
        store.add_to_queue(VideoId(9));

        let raw = store.storage().get(USER_DATA_KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["likes"], serde_json::json!([]));
        assert_eq!(value["subscriptions"], serde_json::json!([]));
        assert_eq!(value["favorites"], serde_json::json!([2]));
        assert_eq!(value["queue"], serde_json::json!([9]));
    }

    #[test]
    fn malformed_fields_fall_back_individually() {
        let data = UserPreferenceData::decode(
            r#"{"likes":"nope","favorites":[1,2],"queue":[5,5,6]}"#,
        );

        assert!(data.liked_video_ids.is_empty());
        assert!(data.subscribed_authors.is_empty());
        assert_eq!(data.favorite_video_ids.len(), 2);
        assert_eq!(data.queue_video_ids, vec![VideoId(5), VideoId(6)]);
    }

    #[test]
    fn unreadable_blobs_yield_defaults() {
        let mut storage = MemoryStore::new();
        storage.set(USER_DATA_KEY, "{not json").unwrap();
        storage.set(PROFILE_KEY, "42").unwrap();
        let store = PreferenceStore::new(storage);

        assert_eq!(store.user_data(), UserPreferenceData::default());
        assert_eq!(store.get_profile(), ProfileData::default());
    }

    #[test]
    fn profile_round_trip() {
        let mut store = store();
        let profile = ProfileData {
            name: "Ann".into(),
            bio: "Films on weekends".into(),
            avatar: "AN".into(),
        };
        store.save_profile(&profile);
        assert_eq!(store.get_profile(), profile);
    }
}
