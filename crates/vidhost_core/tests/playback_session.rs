use vidhost_core::{
    Catalog, MediaHandle, PlaybackController, PlayerEvent, SimulatedMedia, SimulatedScreen,
    VideoId, VolumeLevel,
};

fn controller_for(id: u64) -> PlaybackController<SimulatedMedia> {
    let catalog = Catalog::demo();
    let video = catalog.get(VideoId(id)).unwrap();
    let mut controller =
        PlaybackController::new(video.qualities.clone(), &video.initial_quality("1080p"));

    let mut media = SimulatedMedia::new();
    media.load_metadata(video.duration_seconds().unwrap());
    controller.attach(media);
    controller
}

#[test]
fn watching_a_video_end_to_end() {
    let mut controller = controller_for(2);
    assert_eq!(controller.time_label(), "0:00 / 8:15");
    assert_eq!(controller.state().selected_quality, "720p");

    controller.toggle_play();
    controller.pointer_leave();
    assert!(!controller.state().show_controls);

    controller.handle_mut().unwrap().advance(42.0);
    controller.poll_events();
    assert_eq!(controller.time_label(), "0:42 / 8:15");

    controller.skip(10.0);
    controller.skip(-100.0);
    assert_eq!(controller.state().current_time, 0.0);

    controller.set_volume(0.4);
    assert_eq!(controller.volume_level(), VolumeLevel::Low);
    controller.toggle_mute();
    controller.toggle_mute();
    assert_eq!(controller.handle().unwrap().volume(), 0.4);

    controller.toggle_quality_menu();
    controller.select_quality("360p").unwrap();

    let mut screen = SimulatedScreen::default();
    controller.toggle_fullscreen(&mut screen).unwrap();

    let events = controller.take_events();
    assert!(events.contains(&PlayerEvent::QualityChanged("360p".into())));
    assert!(events.contains(&PlayerEvent::FullscreenChanged(true)));
    assert_eq!(events[0], PlayerEvent::StateChanged { playing: true });
}

#[test]
fn switching_videos_starts_from_scratch() {
    let mut first = controller_for(1);
    first.toggle_play();
    first.seek(300.0);
    let media = first.detach().unwrap();
    assert_eq!(media.subscriber_count(), 0);
    drop(first);

    let second = controller_for(4);
    assert!(!second.state().is_playing);
    assert_eq!(second.state().current_time, 0.0);
    assert_eq!(second.time_label(), "0:00 / 20:00");
}
