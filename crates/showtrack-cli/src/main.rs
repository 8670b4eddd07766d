use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, context, daemon, ratings, shows, sync};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "showtrack")]
#[command(about = "showtrack - keep a TV watchlist in step with TMDB")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// User whose ratings and watchlist are used
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a show and all its seasons into the local store
    #[command(long_about = "Fetch a show and every season the catalog can deliver and store it locally. Does nothing when the show is already stored; use 'update' to refresh it.")]
    Load {
        /// TMDB show id
        show_id: u64,
    },
    /// Refresh a stored show from its change feed
    #[command(long_about = "Refresh show-level fields of a stored show and refetch the seasons its TMDB change feed reports as changed since the last sync.")]
    Update {
        /// TMDB show id
        show_id: u64,
    },
    /// Run the nightly sync once
    #[command(long_about = "Fetch the list of shows TMDB changed in the last 24 hours and update every one of them that is stored locally.")]
    Nightly,
    /// Run as daemon with internal scheduler
    #[command(long_about = "Run the nightly sync on a cron schedule until interrupted. The schedule is a 6-field cron expression (seconds first).")]
    Daemon {
        /// Cron schedule expression (e.g., '0 0 3 * * *' for 03:00 every day)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip the sync on startup even if the config enables it
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,

        /// Write logs to a daily rotating file instead of stderr
        #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "")]
        log_file: Option<PathBuf>,
    },
    /// Apply a rating change-set (JSON) to the user's ratings
    #[command(long_about = "Apply a JSON change-set such as {\"1399\": {\"rating\": 9, \"seasons\": {\"1\": {\"episodes\": {\"1\": {\"watched\": true}}}}}} to the user's ratings. Omitted and null fields are left untouched.")]
    Rate {
        /// Change-set file, or '-' to read from stdin
        file: PathBuf,
    },
    /// Manage the watchlist
    Watchlist {
        #[command(subcommand)]
        cmd: WatchlistCommands,
    },
    /// Show a stored show with its seasons and episodes
    Show {
        /// TMDB show id
        show_id: u64,

        /// Poster size index to build a poster URL for (0 = smallest)
        #[arg(long)]
        poster_size: Option<usize>,
    },
    /// Search the catalog for shows
    Search {
        /// Title to search for
        query: String,
    },
    /// Clear stored data
    #[command(long_about = "Delete stored data. Use --shows for the show store, --ratings for rating documents, --stats for counters, --credentials for the stored API key, or --all for everything.")]
    Clear {
        /// Clear all stored data and credentials
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear the show store
        #[arg(long, action = ArgAction::SetTrue)]
        shows: bool,

        /// Clear all rating documents
        #[arg(long, action = ArgAction::SetTrue)]
        ratings: bool,

        /// Clear operational counters and the image config cache
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,

        /// Clear stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,
    },
    /// Configure credentials and settings
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum WatchlistCommands {
    /// Load a show if needed and start tracking it
    Add { show_id: u64 },
    /// Stop tracking a show (ratings and watched flags are kept)
    Remove { show_id: u64 },
    /// List tracked shows
    List,
    /// Mark an episode watched
    Watched {
        show_id: u64,
        season: u32,
        episode: u32,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Store the TMDB API key
    ApiKey {
        /// API key (if not provided, will prompt)
        #[arg(long)]
        key: Option<String>,
    },
    /// Write a config file with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // An unreadable config is reported by the command itself
    let settings = context::load_config(&context::resolve_paths())
        .ok()
        .and_then(|config| config.logging);

    let log_file = match &cli.command {
        Commands::Daemon { log_file: Some(path), .. } => Some(daemon::resolve_log_file(path)),
        Commands::Daemon { log_file: None, .. } => settings.as_ref().and_then(|s| s.file.clone()),
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file, settings.as_ref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Load { show_id } => sync::run_load(show_id, &output).await,
        Commands::Update { show_id } => sync::run_update(show_id, &output).await,
        Commands::Nightly => sync::run_nightly(&output).await,
        Commands::Daemon {
            schedule,
            no_startup_sync,
            ..
        } => daemon::run_daemon(schedule, no_startup_sync, &output).await,
        Commands::Rate { file } => ratings::run_rate(&cli.user, &file, &output),
        Commands::Watchlist { cmd } => ratings::run_watchlist(&cli.user, cmd, &output).await,
        Commands::Show { show_id, poster_size } => shows::run_show(show_id, poster_size, &output).await,
        Commands::Search { query } => shows::run_search(&query, &output).await,
        Commands::Clear {
            all,
            shows,
            ratings,
            stats,
            credentials,
        } => clear::run_clear(all, shows, ratings, stats, credentials, &output),
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output)
        }
    }
}
