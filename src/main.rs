use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use console::{Emoji, Term};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use podgrab::{
    Episode, EpisodeDownloader, FeedRetriever, ItunesSearch, PodcastSearch, PodcastSummary,
    ReqwestClient,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");

/// Search for a podcast and download one of its episodes
#[derive(Parser, Debug)]
#[command(name = "podgrab")]
#[command(about = "Search for a podcast and download one of its episodes")]
#[command(version)]
struct Args {
    /// Podcast name to search for (prompted for when omitted)
    query: Option<String>,

    /// Use this RSS/Atom feed URL directly instead of searching
    #[arg(short, long, conflicts_with = "query")]
    feed: Option<String>,

    /// Directory downloaded episodes are written to
    #[arg(short, long, default_value = "downloads")]
    output_dir: PathBuf,

    /// Number of latest episodes to choose from
    #[arg(short = 'n', long, default_value = "10")]
    count: usize,

    /// Maximum number of search results to request
    #[arg(long, default_value = "10")]
    results: usize,

    /// Quiet mode - no progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so they never tear the progress bar on stdout
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Turn the user's answer into a zero-based index into a list of `len` items
fn parse_selection(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(choice) if (1..=len).contains(&choice) => Some(choice - 1),
        _ => None,
    }
}

fn select_from_list(term: &Term, items: &[String], prompt: &str) -> Result<Option<usize>> {
    if items.is_empty() {
        return Ok(None);
    }

    term.write_line(&format!("\n{}", prompt.bold()))?;
    for (i, item) in items.iter().enumerate() {
        term.write_line(&format!("{:>3}. {}", (i + 1).to_string().cyan(), item))?;
    }

    term.write_str("\nEnter number: ")?;
    let answer = term.read_line()?;

    let selection = parse_selection(&answer, items.len());
    if selection.is_none() {
        term.write_line(&format!("{FAILURE}{}", "Invalid selection".red()))?;
    }
    Ok(selection)
}

fn prompt_line(term: &Term, prompt: &str) -> Result<String> {
    term.write_str(prompt)?;
    Ok(term.read_line()?.trim().to_string())
}

fn describe_podcast(podcast: &PodcastSummary) -> String {
    format!("{} by {}", podcast.name.bold(), podcast.artist)
}

fn describe_episode(episode: &Episode) -> String {
    let title = truncate_title(&episode.title, 70);
    if episode.duration.is_empty() {
        title
    } else {
        format!("{} ({})", title, episode.duration.dimmed())
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Resolve the feed to read, either directly from `--feed` or via search
async fn choose_feed(args: &Args, client: &ReqwestClient, term: &Term) -> Result<Option<String>> {
    if let Some(feed) = &args.feed {
        return Ok(Some(feed.clone()));
    }

    let query = match &args.query {
        Some(query) => query.trim().to_string(),
        None => prompt_line(term, "Enter podcast name to search: ")?,
    };
    if query.is_empty() {
        bail!("Search query cannot be empty");
    }

    println!("\n{SEARCH}Searching for {}...", query.cyan());
    let finder = ItunesSearch::new(client.clone())
        .context("Failed to set up podcast search")?
        .with_limit(args.results);
    let results = finder
        .search_podcasts(&query)
        .await
        .context("Podcast search failed")?;

    if results.is_empty() {
        println!("{FAILURE}No podcasts found!");
        return Ok(None);
    }

    let names: Vec<String> = results.iter().map(describe_podcast).collect();
    let Some(choice) = select_from_list(term, &names, "Found podcasts:")? else {
        return Ok(None);
    };

    let podcast = &results[choice];
    debug!(?podcast, "podcast selected");
    println!(
        "\n{HEADPHONES}Fetching episodes for: {}",
        podcast.name.bold().green()
    );
    Ok(Some(podcast.feed_url.clone()))
}

fn progress_bar() -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(&format!("  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{msg}}"))
        .unwrap()
        .progress_chars("█▓░");

    let bar = ProgressBar::new(100);
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    debug!(?args, "CLI arguments parsed");

    println!(
        "\n{}{} {}\n",
        MICROPHONE,
        "podgrab".bold().magenta(),
        "- Podcast Episode Downloader".dimmed()
    );

    let client = ReqwestClient::new();
    let term = Term::stdout();

    let Some(feed_url) = choose_feed(&args, &client, &term).await? else {
        return Ok(());
    };

    let retriever = FeedRetriever::new(client.clone());
    let episodes = retriever.fetch_or_empty(&feed_url).await;
    if episodes.is_empty() {
        println!("{FAILURE}No episodes found!");
        return Ok(());
    }

    let titles: Vec<String> = episodes
        .iter()
        .take(args.count)
        .map(describe_episode)
        .collect();
    let Some(choice) = select_from_list(&term, &titles, "Latest episodes:")? else {
        return Ok(());
    };

    let episode = &episodes[choice];
    let filename = episode.suggested_filename();
    println!("\n{DOWNLOAD}Downloading: {}", filename.cyan());

    let downloader = EpisodeDownloader::new(client, &args.output_dir)
        .context("Failed to prepare download directory")?;

    let result = if args.quiet {
        downloader
            .download(episode.audio_url.as_str(), &filename, None)
            .await
    } else {
        let bar = progress_bar();
        let mut on_progress = |percent: f64| {
            bar.set_position(percent.min(100.0) as u64);
            bar.set_message(format!("{percent:.1}%"));
        };
        let result = downloader
            .download(episode.audio_url.as_str(), &filename, Some(&mut on_progress))
            .await;
        bar.finish_and_clear();
        result
    };

    match result {
        Ok(path) => {
            println!(
                "{SUCCESS}{} {}\n",
                "Download complete:".bold().green(),
                path.display().to_string().cyan()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{FAILURE}{} {}", "Download failed:".bold().red(), e);
            std::process::exit(1);
        }
    }
}
