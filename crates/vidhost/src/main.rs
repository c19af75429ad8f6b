use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use vidhost_core::{
    data_root, format_time, Catalog, FileStore, MediaFile, PlaybackController, PlayerEvent,
    PreferenceStore, ProfileDraft, SimulatedMedia, SimulatedScreen, UploadRequest,
    UploadSimulation, Video, VideoId, TICK_INTERVAL,
};

#[derive(Parser)]
#[command(name = "vidhost", about = "Local video hosting demo")]
struct Cli {
    /// Directory holding the persisted preferences and profile
    #[arg(long, env = "VIDHOST_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    /// Log state transitions
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog with like counts and markers
    Catalog,
    /// Toggle a like on a video
    Like { id: u64 },
    /// Toggle a subscription to an author
    Subscribe { author: String },
    /// Toggle a video in favorites
    Favorite { id: u64 },
    /// Show favorite videos
    Favorites,
    #[command(subcommand)]
    Queue(QueueCommand),
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Simulate uploading a local file and add it to the catalog
    Upload {
        #[arg(long)]
        title: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "Travel")]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },
    /// Play a scripted session against a simulated media element
    Play {
        id: u64,
        #[arg(long, default_value = "1080p")]
        quality: String,
        /// Seconds of playback to simulate
        #[arg(long, default_value_t = 30.0)]
        watch: f64,
    },
}

#[derive(Subcommand)]
enum QueueCommand {
    /// Append a video to the watch queue
    Add { id: u64 },
    /// Remove a video from the watch queue
    Remove { id: u64 },
    /// Show the watch queue in order
    List,
    /// Empty the watch queue
    Clear,
}

#[derive(Subcommand)]
enum ProfileCommand {
    Show,
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
}

fn open_store(data_dir: Option<PathBuf>) -> Result<PreferenceStore<FileStore>> {
    let root = match data_dir.or_else(data_root) {
        Some(root) => root,
        None => bail!("no data directory available; pass --data-dir"),
    };
    let storage = FileStore::open(&root)
        .with_context(|| format!("failed to open store at {}", root.display()))?;
    Ok(PreferenceStore::new(storage))
}

fn print_video(video: &Video, store: &PreferenceStore<FileStore>) {
    let mut markers = String::new();
    if store.is_liked(video.id) {
        markers.push_str(" [liked]");
    }
    if store.is_favorite(video.id) {
        markers.push_str(" [favorite]");
    }
    if store.is_subscribed(&video.author) {
        markers.push_str(" [subscribed]");
    }
    if video.is_hd() {
        markers.push_str(" [HD]");
    }

    println!(
        "{:>4}  {:<36} {:>6}  {} views  {} likes  by {}{}",
        video.id.0,
        video.title,
        video.duration,
        video.views,
        store.like_count(video.id),
        video.author,
        markers
    );
}

fn print_list(title: &str, videos: &[&Video], store: &PreferenceStore<FileStore>) {
    if videos.is_empty() {
        println!("{title}: nothing here yet");
        return;
    }
    println!("{title}:");
    for video in videos {
        print_video(video, store);
    }
}

fn require_video(catalog: &Catalog, id: u64) -> Result<&Video> {
    catalog
        .get(VideoId(id))
        .with_context(|| format!("no video with id {id}"))
}

fn run_upload(
    store: &mut PreferenceStore<FileStore>,
    catalog: &mut Catalog,
    request: UploadRequest,
) -> Result<()> {
    let upload = request.validate()?;
    info!(
        "uploading {} ({} bytes)",
        upload.video().name,
        upload.video().size_bytes
    );

    let mut simulation = UploadSimulation::start(upload);
    smol::block_on(async {
        while !simulation.is_due() {
            smol::Timer::after(TICK_INTERVAL).await;
            let percent = simulation.tick();
            info!("upload progress {percent}%");
        }
    });

    let author = store.get_profile();
    let (progress, video) = simulation.complete(VideoId::now(), &author);
    info!("upload progress {}%", progress.percent());

    catalog.publish(video);
    catalog
        .save_uploads(store.storage_mut())
        .context("failed to save the upload")?;
    let mine = catalog.by_author(&author.name);
    print_list("Published", &mine, store);
    Ok(())
}

fn run_playback(video: &Video, quality: &str, watch: f64) {
    let mut controller =
        PlaybackController::new(video.qualities.clone(), &video.initial_quality(quality));

    let mut media = SimulatedMedia::new();
    if let Some(duration) = video.duration_seconds() {
        media.load_metadata(duration);
    }
    controller.attach(media);

    println!("{} [{}]", video.title, controller.state().selected_quality);
    controller.toggle_play();

    let mut watched = 0.0;
    while watched < watch {
        let step = (watch - watched).min(10.0);
        if let Some(media) = controller.handle_mut() {
            media.advance(step);
        }
        controller.poll_events();
        watched += step;
        println!("  {}  {:>3.0}%", controller.time_label(), controller.progress() * 100.0);
    }

    controller.skip(-10.0);
    println!("  back 10s -> {}", format_time(controller.state().current_time));

    controller.toggle_mute();
    controller.toggle_mute();

    let mut screen = SimulatedScreen::default();
    if let Err(err) = controller.toggle_fullscreen(&mut screen) {
        warn!("{err}");
    }
    // Viewer presses Esc.
    screen.fullscreen = false;
    if let Some(media) = controller.handle_mut() {
        media.notify_fullscreen(false);
    }
    controller.poll_events();
    println!("  fullscreen: {}", controller.state().is_fullscreen);

    controller.toggle_play();
    for event in controller.take_events() {
        if let PlayerEvent::StateChanged { playing } = event {
            info!("playing: {playing}");
        }
    }

    controller.detach();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut store = open_store(cli.data_dir)?;
    let mut catalog = Catalog::open(store.storage());

    match cli.command {
        Command::Catalog => {
            for video in catalog.iter() {
                print_video(video, &store);
            }
        }
        Command::Like { id } => {
            let video = require_video(&catalog, id)?;
            let liked = store.toggle_like(video.id);
            println!(
                "{} {} ({} likes)",
                if liked { "Liked" } else { "Unliked" },
                video.title,
                store.like_count(video.id)
            );
        }
        Command::Subscribe { author } => {
            let subscribed = store.toggle_subscription(&author);
            println!(
                "{} {author}",
                if subscribed { "Subscribed to" } else { "Unsubscribed from" }
            );
        }
        Command::Favorite { id } => {
            let video = require_video(&catalog, id)?;
            let favorite = store.toggle_favorite(video.id);
            println!(
                "{} {}",
                if favorite { "Added to favorites:" } else { "Removed from favorites:" },
                video.title
            );
        }
        Command::Favorites => {
            let favorites = catalog.resolve(&store.list_favorite_ids());
            print_list("Favorites", &favorites, &store);
        }
        Command::Queue(QueueCommand::Add { id }) => {
            let video = require_video(&catalog, id)?;
            store.add_to_queue(video.id);
            println!("Queued {}", video.title);
        }
        Command::Queue(QueueCommand::Remove { id }) => {
            if !store.remove_from_queue(VideoId(id)) {
                println!("Video {id} was not queued");
            }
        }
        Command::Queue(QueueCommand::List) => {
            // Queue order, not catalog order.
            let queued: Vec<&Video> = store
                .list_queue_ids()
                .into_iter()
                .filter_map(|id| catalog.get(id))
                .collect();
            print_list("Watch queue", &queued, &store);
        }
        Command::Queue(QueueCommand::Clear) => store.clear_queue(),
        Command::Profile(ProfileCommand::Show) => {
            let profile = store.get_profile();
            println!("[{}] {}\n{}", profile.avatar, profile.name, profile.bio);
            let mine = catalog.by_author(&profile.name);
            println!("{} videos, {} subscriptions", mine.len(), store.list_subscriptions().len());
        }
        Command::Profile(ProfileCommand::Set { name, bio, avatar }) => {
            let mut draft = ProfileDraft::from(&store.get_profile());
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(bio) = bio {
                draft.bio = bio;
            }
            if let Some(avatar) = avatar {
                draft.avatar = avatar;
            }
            let profile = draft.validate()?;
            store.save_profile(&profile);
            println!("Profile updated");
        }
        Command::Upload {
            title,
            file,
            category,
            description,
            thumbnail,
        } => {
            let video = MediaFile::from_path(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let thumbnail = thumbnail
                .map(|path| {
                    MediaFile::from_path(&path)
                        .with_context(|| format!("cannot read {}", path.display()))
                })
                .transpose()?;
            let request = UploadRequest {
                title,
                description,
                category,
                video: Some(video),
                thumbnail,
            };
            run_upload(&mut store, &mut catalog, request)?;
        }
        Command::Play { id, quality, watch } => {
            let video = require_video(&catalog, id)?;
            run_playback(video, &quality, watch);
        }
    }

    Ok(())
}
