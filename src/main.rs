mod commands;
mod installers;
mod libs;
mod logger;
mod schemas;

use clap::{Parser, Subcommand};
use commands::add::AddArgs;
use commands::{add, fetch, version};

#[derive(Parser)]
#[command(name = "toolbox")]
#[command(about = "Fetch prebuilt tool binaries from GitHub releases and download URLs", long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Fetch all tools, or only the named ones
    Fetch {
        /// Tools to fetch (default: all configured tools)
        tools: Vec<String>,
        /// Configuration file (default: ./.toolbox.yaml, ~/.config/toolbox.yaml, ~/.toolbox.yaml)
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Add a tool to the config, or update it
    Add {
        /// Name of the tool
        name: String,
        /// Configuration file
        #[arg(short, long)]
        config: Option<String>,
        /// The tool's github repository (owner/repo)
        #[arg(long)]
        github: Option<String>,
        /// The tool's google download URL
        #[arg(long)]
        google: Option<String>,
        /// The tool's download URL template
        #[arg(long = "download-url")]
        download_url: Option<String>,
        /// The tool's version, or a URL returning the version
        #[arg(long)]
        version: Option<String>,
        /// Additional assets to fetch from the same release
        #[arg(long)]
        additional: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);

    let result = match cli.command {
        Commands::Version => {
            version::run();
            Ok(())
        }
        Commands::Fetch { tools, config } => fetch::run(config, tools),
        Commands::Add {
            name,
            config,
            github,
            google,
            download_url,
            version,
            additional,
        } => add::run(AddArgs {
            name,
            config,
            github,
            google,
            download_url,
            version,
            additional,
        }),
    };

    if let Err(e) = result {
        log_error!("{:#}", e);
        std::process::exit(1);
    }
}
