use std::sync::mpsc::{self, Receiver};

use log::{debug, warn};
use thiserror::Error;

use crate::media::{FullscreenError, FullscreenHost, MediaEvent, MediaHandle, SubscriptionId};

/// Volume restored on unmute when the stored volume is zero.
pub const FALLBACK_VOLUME: f64 = 0.5;

/// Scrubber range used before the duration is known.
pub const DEFAULT_SEEK_RANGE: f64 = 100.0;

/// UI-facing mirror of one media element.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub is_muted: bool,
    pub is_fullscreen: bool,
    pub show_controls: bool,
    pub show_quality_menu: bool,
    pub selected_quality: String,
    pub qualities: Vec<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            duration: f64::NAN,
            volume: 1.0,
            is_muted: false,
            is_fullscreen: false,
            show_controls: true,
            show_quality_menu: false,
            selected_quality: String::new(),
            qualities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeLevel {
    Muted,
    Low,
    High,
}

/// Changes the surrounding view reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged { playing: bool },
    QualityChanged(String),
    FullscreenChanged(bool),
    VolumeChanged { volume: f64, muted: bool },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("quality {0:?} is not offered for this video")]
    UnknownQuality(String),
    #[error(transparent)]
    Fullscreen(#[from] FullscreenError),
}

struct Attachment<H> {
    handle: H,
    subscription: SubscriptionId,
    receiver: Receiver<MediaEvent>,
}

/// Control surface for a single media handle.
///
/// Commands issued while no handle is attached are no-ops, so a view tearing
/// down can keep forwarding input without checking first.
pub struct PlaybackController<H: MediaHandle> {
    media: Option<Attachment<H>>,
    state: PlaybackState,
    events: Vec<PlayerEvent>,
}

impl<H: MediaHandle> PlaybackController<H> {
    pub fn new(qualities: Vec<String>, preferred_quality: &str) -> Self {
        let selected_quality = pick_quality(&qualities, preferred_quality);
        Self {
            media: None,
            state: PlaybackState {
                selected_quality,
                qualities,
                ..PlaybackState::default()
            },
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        self.media.is_some()
    }

    pub fn handle(&self) -> Option<&H> {
        self.media.as_ref().map(|media| &media.handle)
    }

    pub fn handle_mut(&mut self) -> Option<&mut H> {
        self.media.as_mut().map(|media| &mut media.handle)
    }

    /// Binds `handle` and subscribes to its notifications. A previously
    /// attached handle is detached and dropped.
    ///
    /// Everything but the quality list and selection restarts from the new
    /// handle's own state.
    pub fn attach(&mut self, mut handle: H) {
        self.detach();

        let (sender, receiver) = mpsc::channel();
        let subscription = handle.subscribe(sender);

        let volume = handle.volume().clamp(0.0, 1.0);
        self.state = PlaybackState {
            is_playing: !handle.is_paused(),
            current_time: handle.current_time(),
            duration: handle.duration(),
            volume,
            is_muted: volume == 0.0,
            selected_quality: std::mem::take(&mut self.state.selected_quality),
            qualities: std::mem::take(&mut self.state.qualities),
            ..PlaybackState::default()
        };

        self.media = Some(Attachment {
            handle,
            subscription,
            receiver,
        });
        debug!("attached media handle ({:?})", subscription);
    }

    /// Unsubscribes and hands the media handle back to its owner.
    pub fn detach(&mut self) -> Option<H> {
        let Attachment {
            mut handle,
            subscription,
            receiver,
        } = self.media.take()?;

        handle.unsubscribe(subscription);
        drop(receiver);
        debug!("detached media handle ({:?})", subscription);
        Some(handle)
    }

    /// Applies every notification queued by the handle. Returns how many were applied.
    pub fn poll_events(&mut self) -> usize {
        let Some(media) = &self.media else {
            return 0;
        };

        let pending: Vec<MediaEvent> = media.receiver.try_iter().collect();
        let count = pending.len();
        for event in pending {
            self.apply(event);
        }
        count
    }

    fn apply(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate(seconds) => self.state.current_time = seconds,
            MediaEvent::MetadataLoaded { duration } => self.state.duration = duration,
            MediaEvent::Played => self.set_playing(true),
            MediaEvent::Paused => self.set_playing(false),
            MediaEvent::FullscreenChanged(fullscreen) => self.set_fullscreen(fullscreen),
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if self.state.is_playing != playing {
            self.state.is_playing = playing;
            self.events.push(PlayerEvent::StateChanged { playing });
        }
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        if self.state.is_fullscreen != fullscreen {
            self.state.is_fullscreen = fullscreen;
            self.events.push(PlayerEvent::FullscreenChanged(fullscreen));
        }
    }

    /// Drains the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn toggle_play(&mut self) {
        let Some(media) = &mut self.media else {
            return;
        };

        if self.state.is_playing {
            media.handle.pause();
        } else {
            media.handle.play();
        }
        let playing = !self.state.is_playing;
        self.set_playing(playing);
    }

    /// Jumps to `target` seconds. The scrubber already bounds the value, so
    /// no clamping happens here.
    pub fn seek(&mut self, target: f64) {
        let Some(media) = &mut self.media else {
            return;
        };

        media.handle.set_current_time(target);
        self.state.current_time = target;
    }

    /// Moves by `delta` seconds, clamped to `[0, duration]`.
    pub fn skip(&mut self, delta: f64) {
        let Some(media) = &mut self.media else {
            return;
        };

        let upper = if self.state.duration.is_finite() {
            self.state.duration.max(0.0)
        } else {
            0.0
        };
        let target = (media.handle.current_time() + delta).max(0.0).min(upper);

        media.handle.set_current_time(target);
        self.state.current_time = target;
    }

    pub fn set_volume(&mut self, level: f64) {
        let Some(media) = &mut self.media else {
            return;
        };

        let level = level.clamp(0.0, 1.0);
        media.handle.set_volume(level);
        self.state.volume = level;
        self.state.is_muted = level == 0.0;
        self.events.push(PlayerEvent::VolumeChanged {
            volume: level,
            muted: self.state.is_muted,
        });
    }

    /// Mutes without touching the stored volume, so unmuting can restore it.
    pub fn toggle_mute(&mut self) {
        let Some(media) = &mut self.media else {
            return;
        };

        if self.state.is_muted {
            let restored = if self.state.volume > 0.0 {
                self.state.volume
            } else {
                FALLBACK_VOLUME
            };
            media.handle.set_volume(restored);
            self.state.volume = restored;
            self.state.is_muted = false;
        } else {
            media.handle.set_volume(0.0);
            self.state.is_muted = true;
        }

        self.events.push(PlayerEvent::VolumeChanged {
            volume: self.state.volume,
            muted: self.state.is_muted,
        });
    }

    /// Flips `is_fullscreen` unless the host rejects the request outright.
    /// Later [`MediaEvent::FullscreenChanged`] notifications overwrite the flag.
    pub fn toggle_fullscreen(
        &mut self,
        host: &mut impl FullscreenHost,
    ) -> Result<(), PlaybackError> {
        if self.media.is_none() {
            return Ok(());
        }

        let entering = !self.state.is_fullscreen;
        let result = if entering {
            host.request_fullscreen()
        } else {
            host.exit_fullscreen()
        };

        match result {
            Ok(()) => {
                self.set_fullscreen(entering);
                Ok(())
            }
            Err(err) => {
                warn!("fullscreen toggle failed: {err}");
                Err(err.into())
            }
        }
    }

    pub fn toggle_quality_menu(&mut self) {
        self.state.show_quality_menu = !self.state.show_quality_menu;
    }

    /// Switches to `quality` and closes the menu. The view swaps the media
    /// source when it sees [`PlayerEvent::QualityChanged`].
    pub fn select_quality(&mut self, quality: &str) -> Result<(), PlaybackError> {
        if !self.state.qualities.iter().any(|q| q == quality) {
            return Err(PlaybackError::UnknownQuality(quality.to_string()));
        }

        self.state.selected_quality = quality.to_string();
        self.state.show_quality_menu = false;
        self.events.push(PlayerEvent::QualityChanged(quality.to_string()));
        Ok(())
    }

    pub fn pointer_enter(&mut self) {
        self.state.show_controls = true;
    }

    /// A paused video keeps its controls visible.
    pub fn pointer_leave(&mut self) {
        self.state.show_controls = !self.state.is_playing;
    }

    pub fn volume_level(&self) -> VolumeLevel {
        if self.state.is_muted {
            VolumeLevel::Muted
        } else if self.state.volume > 0.5 {
            VolumeLevel::High
        } else {
            VolumeLevel::Low
        }
    }

    pub fn seek_bar_max(&self) -> f64 {
        let duration = self.state.duration;
        if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            DEFAULT_SEEK_RANGE
        }
    }

    pub fn progress(&self) -> f64 {
        let duration = self.state.duration;
        if duration.is_finite() && duration > 0.0 {
            (self.state.current_time / duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.state.current_time),
            format_time(self.state.duration)
        )
    }
}

impl<H: MediaHandle> Drop for PlaybackController<H> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Formats seconds as `M:SS`. Minutes are not rolled into hours; unknown or
/// negative times render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total_seconds = seconds.floor() as u64;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// `preferred` when offered, otherwise the last (highest) quality.
pub fn pick_quality(qualities: &[String], preferred: &str) -> String {
    if qualities.iter().any(|q| q == preferred) {
        return preferred.to_string();
    }
    qualities.last().cloned().unwrap_or_default()
}
