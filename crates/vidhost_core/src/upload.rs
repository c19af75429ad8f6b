use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::{Video, VideoId, CATEGORIES};
use crate::profile::ProfileData;

pub const MAX_VIDEO_BYTES: u64 = 500 * 1024 * 1024;
pub const MAX_THUMBNAIL_BYTES: u64 = 5 * 1024 * 1024;
pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Interval between simulated progress steps.
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);
/// Time after which the simulated upload completes regardless of progress.
pub const COMPLETION_DELAY: Duration = Duration::from_secs(3);
const PROGRESS_STEP: u8 = 5;
const PROGRESS_CAP: u8 = 95;

pub const UPLOAD_QUALITIES: [&str; 3] = ["360p", "720p", "1080p"];
pub const DEFAULT_THUMBNAIL: &str = "https://images.example.com/thumbnails/default.jpg";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("a video file is required")]
    MissingVideo,
    #[error("a title is required")]
    MissingTitle,
    #[error("video is larger than 500 MB ({0} bytes)")]
    VideoTooLarge(u64),
    #[error("thumbnail is larger than 5 MB ({0} bytes)")]
    ThumbnailTooLarge(u64),
    #[error("title is longer than {} characters", TITLE_MAX_CHARS)]
    TitleTooLong,
    #[error("description is longer than {} characters", DESCRIPTION_MAX_CHARS)]
    DescriptionTooLong,
    #[error("unknown category {0:?}")]
    UnknownCategory(String),
}

/// A file picked for upload. Only its name and size matter to the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub size_bytes: u64,
}

impl MediaFile {
    /// Describes a file on disk by name and size.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let size_bytes = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, size_bytes })
    }

    fn object_url(&self) -> String {
        format!("blob:vidhost/{}", self.name)
    }
}

/// Raw form input from the upload dialog.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub video: Option<MediaFile>,
    pub thumbnail: Option<MediaFile>,
}

/// An upload that passed every form check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    title: String,
    description: String,
    category: String,
    video: MediaFile,
    thumbnail: Option<MediaFile>,
}

impl UploadRequest {
    pub fn validate(self) -> Result<ValidatedUpload, UploadError> {
        let video = self.video.ok_or(UploadError::MissingVideo)?;
        if video.size_bytes > MAX_VIDEO_BYTES {
            return Err(UploadError::VideoTooLarge(video.size_bytes));
        }
        if let Some(thumbnail) = &self.thumbnail {
            if thumbnail.size_bytes > MAX_THUMBNAIL_BYTES {
                return Err(UploadError::ThumbnailTooLarge(thumbnail.size_bytes));
            }
        }

        let title = self.title.trim();
        if title.is_empty() {
            return Err(UploadError::MissingTitle);
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(UploadError::TitleTooLong);
        }
        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(UploadError::DescriptionTooLong);
        }
        if !CATEGORIES.contains(&self.category.as_str()) {
            return Err(UploadError::UnknownCategory(self.category));
        }

        Ok(ValidatedUpload {
            title: title.to_string(),
            description: self.description,
            category: self.category,
            video,
            thumbnail: self.thumbnail,
        })
    }
}

impl ValidatedUpload {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn video(&self) -> &MediaFile {
        &self.video
    }

    /// Builds the catalog record, attributed to `author`.
    pub fn into_video(self, id: VideoId, author: &ProfileData) -> Video {
        let thumbnail = self
            .thumbnail
            .as_ref()
            .map(MediaFile::object_url)
            .unwrap_or_else(|| DEFAULT_THUMBNAIL.to_string());

        Video {
            id,
            title: self.title,
            thumbnail,
            duration: "0:00".to_string(),
            views: "0".to_string(),
            author: author.name.clone(),
            author_avatar: author.avatar.clone(),
            upload_date: "just now".to_string(),
            qualities: UPLOAD_QUALITIES.iter().map(|q| q.to_string()).collect(),
            video_url: Some(self.video.object_url()),
            description: self.description,
            category: self.category,
        }
    }
}

/// Fabricated upload progress in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadProgress {
    percent: u8,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Advances one step, holding at 95% until [`finish`](Self::finish).
    pub fn tick(&mut self) -> u8 {
        if self.percent < PROGRESS_CAP {
            self.percent = (self.percent + PROGRESS_STEP).min(PROGRESS_CAP);
        }
        self.percent
    }

    pub fn finish(&mut self) {
        self.percent = 100;
    }

    pub fn is_complete(&self) -> bool {
        self.percent == 100
    }
}

/// Timer-driven upload: the caller sleeps [`TICK_INTERVAL`] between
/// [`tick`](Self::tick)s until [`is_due`](Self::is_due), then completes it.
#[derive(Debug, Clone)]
pub struct UploadSimulation {
    upload: ValidatedUpload,
    progress: UploadProgress,
    elapsed: Duration,
}

impl UploadSimulation {
    pub fn start(upload: ValidatedUpload) -> Self {
        Self {
            upload,
            progress: UploadProgress::default(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn progress(&self) -> UploadProgress {
        self.progress
    }

    pub fn tick(&mut self) -> u8 {
        self.elapsed += TICK_INTERVAL;
        self.progress.tick()
    }

    pub fn is_due(&self) -> bool {
        self.elapsed >= COMPLETION_DELAY
    }

    pub fn complete(mut self, id: VideoId, author: &ProfileData) -> (UploadProgress, Video) {
        self.progress.finish();
        (self.progress, self.upload.into_video(id, author))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UploadRequest {
        UploadRequest {
            title: "  Sunset timelapse ".into(),
            description: "Shot on a hill".into(),
            category: "Travel".into(),
            video: Some(MediaFile {
                name: "sunset.mp4".into(),
                size_bytes: 10 * 1024 * 1024,
            }),
            thumbnail: None,
        }
    }

    #[test]
    fn rejects_missing_and_oversized_inputs() {
        let mut missing = request();
        missing.video = None;
        assert_eq!(missing.validate(), Err(UploadError::MissingVideo));

        let mut untitled = request();
        untitled.title = "   ".into();
        assert_eq!(untitled.validate(), Err(UploadError::MissingTitle));

        let mut huge = request();
        huge.video.as_mut().unwrap().size_bytes = MAX_VIDEO_BYTES + 1;
        assert_eq!(
            huge.validate(),
            Err(UploadError::VideoTooLarge(MAX_VIDEO_BYTES + 1))
        );

        let mut big_thumb = request();
        big_thumb.thumbnail = Some(MediaFile {
            name: "t.png".into(),
            size_bytes: MAX_THUMBNAIL_BYTES + 1,
        });
        assert!(matches!(
            big_thumb.validate(),
            Err(UploadError::ThumbnailTooLarge(_))
        ));

        let mut odd = request();
        odd.category = "Cats".into();
        assert_eq!(odd.validate(), Err(UploadError::UnknownCategory("Cats".into())));
    }

    #[test]
    fn progress_steps_and_caps() {
        let mut progress = UploadProgress::default();
        assert_eq!(progress.tick(), 5);
        for _ in 0..30 {
            progress.tick();
        }
        assert_eq!(progress.percent(), 95);
        assert!(!progress.is_complete());

        progress.finish();
        assert!(progress.is_complete());
    }

    #[test]
    fn simulation_completes_after_delay() {
        let upload = request().validate().unwrap();
        let mut simulation = UploadSimulation::start(upload);

        let mut ticks = 0;
        while !simulation.is_due() {
            simulation.tick();
            ticks += 1;
        }
        assert_eq!(ticks, 15);
        assert_eq!(simulation.progress().percent(), 75);

        let author = ProfileData::default();
        let (progress, video) = simulation.complete(VideoId(1700), &author);
        assert_eq!(progress.percent(), 100);
        assert_eq!(video.title, "Sunset timelapse");
        assert_eq!(video.author, "My Profile");
        assert_eq!(video.author_avatar, "MP");
        assert_eq!(video.thumbnail, DEFAULT_THUMBNAIL);
        assert_eq!(video.video_url.as_deref(), Some("blob:vidhost/sunset.mp4"));
        assert!(video.is_hd());
    }
}
