use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use repocache::cache::{LoadResult, LoadTrigger};
use repocache::config::Config;
use repocache::github::{CachedGithubClient, ManualProbe, Repository};

#[derive(Parser, Debug)]
#[command(name = "repocache")]
#[command(about = "An offline-first local replica of the GitHub repository catalog")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/repocache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Log at debug level
  #[arg(short, long)]
  verbose: bool,

  /// Append logs to this file instead of stderr
  #[arg(long)]
  log_file: Option<PathBuf>,

  /// Treat the network as unreachable
  #[arg(long)]
  offline: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Fetch the first page of the public repository feed
  Refresh,
  /// Fetch the feed page after the newest cached repository
  Next,
  /// Fetch the full record of a cached repository
  Details { id: i64 },
  /// Fetch the next search page for a language
  Language { language: String },
  /// List cached repositories
  List {
    #[arg(short, long)]
    language: Option<String>,
  },
  /// Show one cached repository
  Show { id: i64 },
  /// Page through repositories, fetching as needed
  Browse {
    #[arg(short, long)]
    language: Option<String>,
    #[arg(short, long, default_value_t = 1)]
    pages: usize,
  },
  /// Print cache statistics
  Status,
}

fn init_logging(verbose: bool, log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
  let default_level = if verbose { "debug" } else { "warn" };
  let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  match log_file {
    Some(path) => {
      let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eyre!("Failed to open log file {:?}: {}", path, e))?;
      let (writer, guard) = tracing_appender::non_blocking(file);
      tracing_subscriber::registry()
        .with(env_filter)
        .with(
          tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false),
        )
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::registry()
        .with(env_filter)
        .with(
          tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr),
        )
        .init();
      Ok(None)
    }
  }
}

fn print_row(repo: &Repository) {
  println!(
    "{:>10}  {:<40}  {:<12}  {}",
    repo.id,
    repo.full_name,
    repo.language.as_deref().unwrap_or("-"),
    repo.description.as_deref().unwrap_or("")
  );
}

fn print_detail(repo: &Repository) {
  println!("{}", repo.full_name);
  println!("  id:          {}", repo.id);
  println!("  url:         {}", repo.html_url);
  if let Some(description) = &repo.description {
    println!("  description: {}", description);
  }
  println!("  language:    {}", repo.language.as_deref().unwrap_or("-"));
  if repo.has_details() {
    println!("  stars:       {}", repo.stargazers_count);
    println!("  forks:       {}", repo.forks_count);
    println!("  open issues: {}", repo.open_issues_count);
    println!("  license:     {}", repo.license.as_deref().unwrap_or("-"));
    if let Some(updated) = repo.last_updated {
      println!("  updated:     {}", updated.to_rfc3339());
    }
  } else {
    println!("  (summary only, run `details {}` to fetch more)", repo.id);
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging(args.verbose, args.log_file.as_ref())?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let online = !(args.offline || config.offline);

  let client = CachedGithubClient::new(&config, Arc::new(ManualProbe::new(online)))?;

  match args.command {
    Command::Refresh => {
      client.refresh().await?;
      client.owner_writes_settled().await;
      println!("{} repositories cached", client.count().await?);
    }
    Command::Next => {
      client.fetch_next_page().await?;
      client.owner_writes_settled().await;
      println!("{} repositories cached", client.count().await?);
    }
    Command::Details { id } => {
      let repo = client.fetch_details(id).await?;
      client.owner_writes_settled().await;
      print_detail(&repo);
    }
    Command::Language { language } => {
      client.fetch_by_language(&language).await?;
      println!("{} repositories cached", client.count().await?);
    }
    Command::List { language } => {
      let mut stream = match language.as_deref() {
        Some(prefix) => client.observe_by_language(prefix),
        None => client.observe_all(),
      };
      let repos = stream
        .next()
        .await
        .ok_or_else(|| eyre!("Cache stream closed"))??;
      for repo in &repos {
        print_row(repo);
      }
    }
    Command::Show { id } => match client.get_by_id(id).await? {
      Some(repo) => print_detail(&repo),
      None => println!("Repository {} is not cached", id),
    },
    Command::Browse { language, pages } => {
      let mut view = client.paginated_view(language.as_deref().unwrap_or(""));
      let mut trigger = LoadTrigger::Initial;
      for _ in 0..pages.max(1) {
        if let LoadResult::Error(e) = view.load(trigger).await {
          eprintln!("Load failed: {}", e);
          break;
        }
        if view.is_end_of_data() {
          break;
        }
        trigger = LoadTrigger::Forward;
      }
      for repo in view.items() {
        print_row(repo);
      }
      if view.is_end_of_data() {
        println!("(end of results)");
      }
    }
    Command::Status => {
      println!("database:      {}", config.database_path()?.display());
      println!("online:        {}", online);
      println!("repositories:  {}", client.count().await?);
    }
  }

  Ok(())
}
