use std::sync::mpsc::Sender;

use thiserror::Error;

/// Notifications a media handle pushes to whoever subscribed to it.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position changed, in seconds.
    TimeUpdate(f64),
    /// Metadata is available; `duration` may still be infinite for live sources.
    MetadataLoaded { duration: f64 },
    Played,
    Paused,
    FullscreenChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A playable video resource owned by the surrounding view.
///
/// Times are in seconds. `duration` reports `NaN` until metadata has loaded.
pub trait MediaHandle {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn duration(&self) -> f64;

    /// Registers `sender` for progress and metadata notifications.
    fn subscribe(&mut self, sender: Sender<MediaEvent>) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FullscreenError {
    #[error("fullscreen request was rejected: {0}")]
    Rejected(String),
    #[error("fullscreen is not supported by this host")]
    Unsupported,
}

/// Fullscreen primitives of the host environment.
pub trait FullscreenHost {
    fn request_fullscreen(&mut self) -> Result<(), FullscreenError>;
    fn exit_fullscreen(&mut self) -> Result<(), FullscreenError>;
}

/// In-process media handle with a manually advanced clock.
///
/// Used by the command-line front end and by tests in place of a real
/// decoder-backed element.
#[derive(Debug)]
pub struct SimulatedMedia {
    position: f64,
    volume: f64,
    duration: f64,
    playing: bool,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Sender<MediaEvent>)>,
}

impl Default for SimulatedMedia {
    fn default() -> Self {
        Self {
            position: 0.0,
            volume: 1.0,
            duration: f64::NAN,
            playing: false,
            next_subscription: 0,
            subscribers: Vec::new(),
        }
    }
}

impl SimulatedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn load_metadata(&mut self, duration: f64) {
        self.duration = duration;
        self.emit(MediaEvent::MetadataLoaded { duration });
    }

    /// Reports a fullscreen change the viewer made outside the player,
    /// such as pressing Esc.
    pub fn notify_fullscreen(&mut self, fullscreen: bool) {
        self.emit(MediaEvent::FullscreenChanged(fullscreen));
    }

    /// Moves the clock forward by `elapsed` seconds if playing, stopping at the end.
    pub fn advance(&mut self, elapsed: f64) {
        if !self.playing {
            return;
        }

        let mut position = self.position + elapsed;
        if self.duration.is_finite() && position >= self.duration {
            position = self.duration;
            self.playing = false;
        }
        self.position = position;
        self.emit(MediaEvent::TimeUpdate(position));

        if !self.playing {
            self.emit(MediaEvent::Paused);
        }
    }

    fn emit(&mut self, event: MediaEvent) {
        // Receivers that went away are pruned on the next send.
        self.subscribers
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }
}

impl MediaHandle for SimulatedMedia {
    fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.emit(MediaEvent::Played);
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            self.emit(MediaEvent::Paused);
        }
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.position = seconds;
        self.emit(MediaEvent::TimeUpdate(seconds));
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn subscribe(&mut self, sender: Sender<MediaEvent>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, sender));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(existing, _)| *existing != id);
    }
}

/// Fullscreen host that grants or denies every request.
#[derive(Debug, Clone, Default)]
pub struct SimulatedScreen {
    pub fullscreen: bool,
    pub deny: bool,
}

impl FullscreenHost for SimulatedScreen {
    fn request_fullscreen(&mut self) -> Result<(), FullscreenError> {
        if self.deny {
            return Err(FullscreenError::Rejected("requires a user gesture".into()));
        }
        self.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), FullscreenError> {
        if self.deny {
            return Err(FullscreenError::Rejected("document is not fullscreen".into()));
        }
        self.fullscreen = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn advance_only_moves_while_playing() {
        let mut media = SimulatedMedia::new();
        media.load_metadata(10.0);
        media.advance(3.0);
        assert_eq!(media.current_time(), 0.0);

        media.play();
        media.advance(3.0);
        assert_eq!(media.current_time(), 3.0);
    }

    #[test]
    fn advance_stops_at_end() {
        let mut media = SimulatedMedia::new();
        media.load_metadata(4.0);
        media.play();
        media.advance(10.0);

        assert_eq!(media.current_time(), 4.0);
        assert!(media.is_paused());
    }

    #[test]
    fn unsubscribed_sender_receives_nothing() {
        let mut media = SimulatedMedia::new();
        let (sender, receiver) = mpsc::channel();
        let id = media.subscribe(sender);
        media.unsubscribe(id);
        media.load_metadata(5.0);

        assert!(receiver.try_recv().is_err());
        assert_eq!(media.subscriber_count(), 0);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut media = SimulatedMedia::new();
        let (sender, receiver) = mpsc::channel();
        media.subscribe(sender);
        drop(receiver);
        media.set_current_time(1.0);

        assert_eq!(media.subscriber_count(), 0);
    }
}
