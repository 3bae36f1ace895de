//! projdock: manage a local project workspace
//!
//! Keeps a few settings in a plain-text file, mounts the project disk image,
//! opens projects in an editor and mirrors project folders to an
//! S3-compatible bucket through rclone.

use anyhow::Result;
use clap::{Parser, Subcommand};
use projdock::process::SystemRunner;
use projdock::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "projdock")]
#[command(about = "Manage a local project workspace: settings, disk image and S3 sync", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read and write settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Mount the disk image, or open a project folder in the editor
    Open {
        /// Project folder, relative to the base path (mounts the disk image if omitted)
        folder: Option<String>,

        /// File inside the project folder
        file: Option<String>,
    },

    /// Unmount the disk image
    Close,

    /// Mirror a project folder to the remote bucket
    Sync {
        /// Only print periodic one-line stats
        #[arg(short, long)]
        quiet: bool,

        /// Project folder, relative to the base path
        folder: String,
    },

    /// Delete a project folder from the remote bucket (no confirmation)
    Unsync {
        /// Project folder, relative to the base path
        folder: String,
    },

    /// Run the configured update command with sudo
    Update,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the value of a setting
    Get { key: String },

    /// Set a setting, replacing any existing value
    Set {
        key: String,

        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// List all settings sorted by key
    List,

    /// Remove a setting
    Delete { key: String },

    /// Remove all settings
    Reset,
}

fn main() -> Result<()> {
    // Usage errors exit with 1 like every other failure; help/version with 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    logging::init(cli.verbose);

    let mut store = commands::utils::open_store()?;
    let runner = SystemRunner;
    let mount_root = config::mount_root();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => {
                println!("{}", commands::config::get(&store, &key)?);
            }
            ConfigAction::Set { key, value } => {
                commands::config::set(&mut store, &key, &value)?;
            }
            ConfigAction::List => {
                let output = commands::config::list(&store);
                if output.is_empty() {
                    eprintln!("No settings. Add one with: projdock config set <key> <value>");
                } else {
                    println!("{}", output);
                }
            }
            ConfigAction::Delete { key } => {
                commands::config::delete(&mut store, &key)?;
            }
            ConfigAction::Reset => {
                commands::config::reset(&mut store)?;
            }
        },

        Commands::Open { folder, file } => match folder {
            Some(folder) => {
                commands::open::open_in_editor(&store, &runner, &folder, file.as_deref())?;
            }
            None => {
                commands::open::mount(&store, &runner, &mount_root)?;
            }
        },

        Commands::Close => {
            commands::close::execute(&store, &runner, &mount_root)?;
        }

        Commands::Sync { quiet, folder } => {
            commands::sync::execute(&store, &runner, &folder, quiet)?;
        }

        Commands::Unsync { folder } => {
            commands::unsync::execute(&store, &runner, &folder)?;
        }

        Commands::Update => {
            commands::update::execute(&store, &runner)?;
        }
    }

    Ok(())
}
