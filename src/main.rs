//! photo-feed
//!
//! Loads a feed from a Photo Organiser backend and prints it grouped by month.

use clap::{ArgGroup, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use photo_organiser_client::config::LogFormat;
use photo_organiser_client::models::MediaKind;
use photo_organiser_client::{Config, FilterSpec, Library, LoadOutcome};

#[derive(Debug, Parser)]
#[command(name = "photo-feed", version, about = "Browse a Photo Organiser library by month")]
#[command(group(ArgGroup::new("filter").args(["videos", "photos", "tag", "person", "query"])))]
struct Args {
    /// Only videos
    #[arg(long)]
    videos: bool,

    /// Only photos
    #[arg(long)]
    photos: bool,

    /// Photos with this tag id
    #[arg(long, value_name = "ID")]
    tag: Option<i64>,

    /// Photos containing this person id
    #[arg(long, value_name = "ID")]
    person: Option<i64>,

    /// Natural language search
    #[arg(long, short)]
    query: Option<String>,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// List every item under its month heading
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn filter(&self) -> FilterSpec {
        if self.videos {
            FilterSpec::MediaKind(MediaKind::Video)
        } else if self.photos {
            FilterSpec::MediaKind(MediaKind::Photo)
        } else if let Some(tag) = self.tag {
            FilterSpec::Tag(tag)
        } else if let Some(person) = self.person {
            FilterSpec::Person(person)
        } else if let Some(query) = &self.query {
            FilterSpec::query(query)
        } else {
            FilterSpec::All
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting photo-feed");
    tracing::info!("API URL: {}", config.api_base_url);
    if config.api_key.is_none() {
        tracing::debug!("No API key configured (PHOTOS_API_KEY)");
    }

    let library = Library::open(config)?;
    let feed = library.feed(args.filter());

    for _ in 0..args.pages {
        match feed.load_more().await? {
            LoadOutcome::Appended { has_more: true, .. } => continue,
            LoadOutcome::Appended { has_more: false, .. } | LoadOutcome::Skipped(_) => break,
            LoadOutcome::Superseded => break,
        }
    }

    let snapshot = feed.snapshot();
    println!("{} ({} items)", snapshot.filter, snapshot.items.len());
    for group in snapshot.month_groups_now() {
        println!("{:<20} {:>6}", group.label, group.items.len());
        if args.verbose {
            for item in &group.items {
                let place = item.place_label().unwrap_or_default();
                println!("    {:>8}  {:<40} {}", item.id, item.display_name(), place);
            }
        }
    }
    if snapshot.has_more {
        println!("more available");
    }

    library.close();
    Ok(())
}
