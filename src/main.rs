//! Dracin Player - command line front end

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use thiserror::Error;

use dracin_player::models::detail_path;
use dracin_player::{
    ApiClient, AppConfig, Catalog, CatalogError, ConfigError, Film, ProgressStore, Storage,
    StoreError, WatchRoute,
};

#[derive(Parser)]
#[command(name = "dracin", version, about = "Browse and resume dramas from the catalog API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Home rows, or search results with --search
    Home {
        #[arg(long)]
        search: Option<String>,
    },
    /// Film detail with its episode list
    Detail { book_id: String },
    /// Resolve an episode page
    Watch { video_id: String, episode: u32 },
    /// Show the continue-watching record
    Continue,
    /// List saved films
    Watchlist,
    /// Add a film to the watchlist, or remove it if already saved
    WatchlistToggle { book_id: String },
    /// Print the effective configuration
    Config {
        /// Write it back to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Logs go to stderr so command output stays pipeable; `RUST_LOG` raises the level
fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .init();
}

fn main() -> ExitCode {
    init_logger();

    let cli = Cli::parse();
    let config = AppConfig::load();

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &AppConfig) -> Result<(), CliError> {
    match command {
        Command::Home { search } => {
            let catalog = Catalog::new(ApiClient::from_config(config)?);
            let rows = catalog.home(search.as_deref());
            match rows.search_results {
                Some(results) => print_row(&format!("Search: {}", search.unwrap_or_default().trim()), &results),
                None => {
                    print_row("Latest", &rows.latest);
                    print_row("Trending", &rows.trending);
                    print_row("Popular", &rows.popular);
                    print_row("For You", &rows.for_you);
                }
            }
        }
        Command::Detail { book_id } => {
            let catalog = Catalog::new(ApiClient::from_config(config)?);
            let detail = catalog.film_page(&book_id)?;
            let film = &detail.film;
            println!("{}  ({})", film.book_name, detail_path(&film.book_id));
            if let Some(tag) = film.primary_tag() {
                println!("Genre: {}", tag);
            }
            println!("{} episodes", film.chapter_count);
            if !film.introduction.is_empty() {
                println!("\n{}\n", film.introduction);
            }
            for ep in detail.episodes.as_deref().unwrap_or_default() {
                let marker = if ep.url.is_some() { " " } else { "x" };
                println!(" {} {:>4}  {}", marker, ep.chapter_index, ep.chapter_name);
            }
        }
        Command::Watch { video_id, episode } => {
            let catalog = Catalog::new(ApiClient::from_config(config)?);
            let page = catalog.watch_page(&video_id, episode)?;
            println!("{} - {}", page.film.film.book_name, page.episode.label());
            println!("{}", page.episode.chapter_name);
            match &page.episode.url {
                Some(url) => println!("Source: {}", url),
                None => println!("This episode is currently unavailable"),
            }
            if let Some(prev) = page.previous() {
                println!("Previous: {}", WatchRoute::new(&video_id, prev.chapter_index).path());
            }
            if let Some(next) = page.next() {
                println!("Next: {}", WatchRoute::new(&video_id, next.chapter_index).path());
            }
        }
        Command::Continue => {
            let storage = Storage::open_default()?;
            match storage.load_progress() {
                Some(progress) => {
                    println!(
                        "Resume {} at {:.0}s",
                        progress.route().path(),
                        progress.timestamp
                    );
                    if let Some(saved) = progress
                        .saved_at
                        .and_then(|ts| Local.timestamp_opt(ts, 0).single())
                    {
                        println!("Saved {}", saved.format("%Y-%m-%d %H:%M"));
                    }
                }
                None => println!("Nothing to continue"),
            }
        }
        Command::Watchlist => {
            let storage = Storage::open_default()?;
            print_row("Watchlist", &storage.watchlist());
        }
        Command::WatchlistToggle { book_id } => {
            let catalog = Catalog::new(ApiClient::from_config(config)?);
            let film = catalog.detail(&book_id)?.film;
            let mut storage = Storage::open_default()?;
            if storage.toggle_watchlist(&film)? {
                println!("Added '{}' to watchlist", film.book_name);
            } else {
                println!("Removed '{}' from watchlist", film.book_name);
            }
        }
        Command::Config { save } => {
            println!("app_name: {}", config.app_name);
            println!("api_base_url: {}", config.api_base_url);
            println!("request_timeout_secs: {}", config.request_timeout_secs);
            println!("user_agent: {}", config.user_agent);
            println!("controls_hide_ms: {}", config.controls_hide_ms);
            println!("fullscreen_grace_ms: {}", config.fullscreen_grace_ms);
            println!("skip_seconds: {}", config.skip_seconds);
            println!("autoplay: {}", config.autoplay);
            if save {
                config.save();
            }
        }
    }
    Ok(())
}

fn print_row(title: &str, films: &[Film]) {
    println!("== {} ({}) ==", title, films.len());
    for film in films {
        let tag = film.primary_tag().unwrap_or("-");
        println!("  {:<12} {}  [{}]  {} eps", film.book_id, film.book_name, tag, film.chapter_count);
    }
    println!();
}
