use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::Context;
use commands::{config, interactive, watched};
use popcorn_config::{Config, PathManager};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "popcorn")]
#[command(about = "Popcorn - Search movies and keep track of what you've watched")]
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

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search and rate movies interactively (default)
    #[command(long_about = "Start the interactive client. Every line you type becomes the search query; lines starting with ':' are commands. Type :help inside the client for the full list.")]
    Interactive,

    /// Configure the access key and show settings
    #[command(long_about = "Manage configuration and credentials for Popcorn. The OMDb access key is read from OMDB_API_KEY, then credentials.toml, then the [provider] section of config.toml.")]
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },

    /// Show or edit the watched list
    #[command(long_about = "Print the watched list together with its summary averages. Use the remove subcommand to delete an entry by its id.")]
    Watched {
        /// Print the list as JSON regardless of --output
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,

        #[command(subcommand)]
        cmd: Option<WatchedCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks the access key)
    Show {
        /// Show the access key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Store the OMDb access key in credentials.toml
    SetKey {
        /// Access key (if not provided, will prompt without echo)
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Subcommand)]
enum WatchedCommands {
    /// Remove an entry by movie id
    Remove {
        /// Provider id, e.g. tt0816692
        id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = PathManager::default();
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .wrap_err_with(|| format!("Failed to load config from {}", config_file.display()))?;

    let log_file = config.logging.file.then(|| paths.log_file());
    logging::init_logging(cli.verbose, cli.quiet, &config.logging.level, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => interactive::run_interactive(&config, &paths, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &config, &paths, &output),
        Commands::Watched { json, cmd } => watched::run_watched(cmd, json, &paths, &output),
    }
}
