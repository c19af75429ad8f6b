use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::playback::pick_quality;
use crate::storage::KeyValueStore;

/// Storage key of the viewer's uploaded videos.
pub const UPLOADS_KEY: &str = "videohost_uploads";

/// Categories a video can be filed under.
pub const CATEGORIES: [&str; 8] = [
    "Travel",
    "Cooking",
    "Technology",
    "Sports",
    "Science",
    "Music",
    "Gaming",
    "Education",
];

/// Badge threshold for the "HD" label on cards.
pub const HD_QUALITY: &str = "1080p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub u64);

impl VideoId {
    /// Id derived from the current wall clock in milliseconds.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        VideoId(elapsed.as_millis() as u64)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub thumbnail: String,
    /// Display label such as `12:34`.
    pub duration: String,
    /// Display label such as `2.5M`.
    pub views: String,
    pub author: String,
    pub author_avatar: String,
    pub upload_date: String,
    pub qualities: Vec<String>,
    pub video_url: Option<String>,
    pub description: String,
    pub category: String,
}

impl Video {
    pub fn is_hd(&self) -> bool {
        self.qualities.iter().any(|q| q == HD_QUALITY)
    }

    /// Quality a fresh player starts at for this video.
    pub fn initial_quality(&self, preferred: &str) -> String {
        pick_quality(&self.qualities, preferred)
    }

    /// Parses the `M:SS` or `H:MM:SS` duration label.
    pub fn duration_seconds(&self) -> Option<f64> {
        let mut total = 0u64;
        for part in self.duration.split(':') {
            let part = part.trim().parse::<u64>().ok()?;
            total = total.checked_mul(60)?.checked_add(part)?;
        }
        Some(total as f64)
    }
}

/// Videos in display order, newest first.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    videos: Vec<Video>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_videos(videos: Vec<Video>) -> Self {
        Self { videos }
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Video> {
        self.videos.iter()
    }

    pub fn get(&self, id: VideoId) -> Option<&Video> {
        self.videos.iter().find(|video| video.id == id)
    }

    /// Adds a freshly uploaded video at the front.
    pub fn publish(&mut self, video: Video) {
        self.videos.insert(0, video);
    }

    pub fn remove(&mut self, id: VideoId) -> Option<Video> {
        let index = self.videos.iter().position(|video| video.id == id)?;
        Some(self.videos.remove(index))
    }

    /// Videos whose id is in `ids`, in catalog order. Unknown ids are skipped.
    pub fn resolve<'i>(&self, ids: impl IntoIterator<Item = &'i VideoId>) -> Vec<&Video> {
        let wanted: HashSet<VideoId> = ids.into_iter().copied().collect();
        self.videos
            .iter()
            .filter(|video| wanted.contains(&video.id))
            .collect()
    }

    pub fn by_author(&self, author: &str) -> Vec<&Video> {
        self.videos
            .iter()
            .filter(|video| video.author == author)
            .collect()
    }

    /// The sample catalog the application ships with.
    pub fn demo() -> Self {
        Self::with_videos(DEMO_VIDEOS.iter().map(DemoVideo::to_video).collect())
    }

    /// The demo catalog with the uploads kept in `storage` in front.
    ///
    /// Unreadable upload records are logged and skipped.
    pub fn open<S: KeyValueStore>(storage: &S) -> Self {
        let mut catalog = Self::demo();
        let raw = match storage.get(UPLOADS_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to read {UPLOADS_KEY}: {err}");
                None
            }
        };
        let Some(raw) = raw else {
            return catalog;
        };

        match serde_json::from_str::<Vec<Video>>(&raw) {
            Ok(uploads) => {
                for video in uploads.into_iter().rev() {
                    catalog.publish(video);
                }
            }
            Err(err) => warn!("discarding unreadable uploads blob: {err}"),
        }
        catalog
    }

    /// Videos the viewer uploaded, newest first. Seeded videos have no local source.
    pub fn uploads(&self) -> impl Iterator<Item = &Video> {
        self.videos.iter().filter(|video| video.video_url.is_some())
    }

    /// Writes [`uploads`](Self::uploads) back to `storage`.
    pub fn save_uploads<S: KeyValueStore>(&self, storage: &mut S) -> Result<(), CatalogError> {
        let uploads: Vec<&Video> = self.uploads().collect();
        let encoded = serde_json::to_string(&uploads)?;
        storage
            .set(UPLOADS_KEY, &encoded)
            .map_err(|err| CatalogError::Storage(Box::new(err)))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to encode uploads")]
    Encode(#[from] serde_json::Error),
    #[error("failed to store uploads")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

struct DemoVideo {
    id: u64,
    title: &'static str,
    duration: &'static str,
    views: &'static str,
    author: &'static str,
    avatar: &'static str,
    uploaded: &'static str,
    qualities: &'static [&'static str],
    category: &'static str,
}

impl DemoVideo {
    fn to_video(&self) -> Video {
        Video {
            id: VideoId(self.id),
            title: self.title.to_string(),
            thumbnail: format!("https://images.example.com/thumbnails/{}.jpg", self.id),
            duration: self.duration.to_string(),
            views: self.views.to_string(),
            author: self.author.to_string(),
            author_avatar: self.avatar.to_string(),
            upload_date: self.uploaded.to_string(),
            qualities: self.qualities.iter().map(|q| q.to_string()).collect(),
            video_url: None,
            description: String::new(),
            category: self.category.to_string(),
        }
    }
}

const DEMO_VIDEOS: &[DemoVideo] = &[
    DemoVideo {
        id: 1,
        title: "Journey to the Altai Mountains",
        duration: "12:34",
        views: "2.5M",
        author: "Traveler",
        avatar: "TR",
        uploaded: "2 days ago",
        qualities: &["360p", "720p", "1080p"],
        category: "Travel",
    },
    DemoVideo {
        id: 2,
        title: "Cooking Pasta Carbonara",
        duration: "8:15",
        views: "1.2M",
        author: "Chef Ivan",
        avatar: "CI",
        uploaded: "1 week ago",
        qualities: &["360p", "720p"],
        category: "Cooking",
    },
    DemoVideo {
        id: 3,
        title: "New Phone Review",
        duration: "15:42",
        views: "3.8M",
        author: "TechReview",
        avatar: "TE",
        uploaded: "3 days ago",
        qualities: &["360p", "720p", "1080p"],
        category: "Technology",
    },
    DemoVideo {
        id: 4,
        title: "Workout for Beginners",
        duration: "20:00",
        views: "890K",
        author: "Fitness Guru",
        avatar: "FG",
        uploaded: "5 days ago",
        qualities: &["720p", "1080p"],
        category: "Sports",
    },
    DemoVideo {
        id: 5,
        title: "Space: Mysteries of the Universe",
        duration: "25:18",
        views: "4.2M",
        author: "Science TV",
        avatar: "ST",
        uploaded: "1 day ago",
        qualities: &["360p", "720p", "1080p"],
        category: "Science",
    },
    DemoVideo {
        id: 6,
        title: "Guitar Lessons for Beginners",
        duration: "18:30",
        views: "650K",
        author: "Musician",
        avatar: "MU",
        uploaded: "1 week ago",
        qualities: &["360p", "720p"],
        category: "Music",
    },
];
