use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use prdops::models::ToolsConfig;
use prdops::Result;
use std::env;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prdops")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Accessibility backlog reports and PRD document maintenance", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ./prdops.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build categorized CSV reports from the accessibility export
    #[command(name = "a11y-report")]
    A11yReport {
        /// Flat-text export
        input: Option<PathBuf>,

        /// Output directory
        output_dir: Option<PathBuf>,

        /// Print the pivot summary as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Merge work item titles with bulk-update attributes into an ADO import CSV
    #[command(name = "merge-ado")]
    MergeAdo {
        /// CSV with ID, Title, Work Item Type
        titles: Option<PathBuf>,

        /// CSV with area/iteration path, priority and story points
        attributes: Option<PathBuf>,

        /// Output CSV
        output: Option<PathBuf>,
    },

    /// PRD document operations
    #[command(subcommand)]
    Prd(prdops::cli::prd::PrdCommands),

    /// Write prdops.toml with the built-in defaults
    #[command(name = "init-config")]
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    prdops::logging::init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let project_root = env::current_dir()?;

    match cli.command {
        Commands::InitConfig { force } => {
            prdops::cli::init_config::run(&project_root, force)?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "prdops", &mut io::stdout());
        }

        command => {
            let config = ToolsConfig::load(cli.config.as_deref(), &project_root)?;

            match command {
                Commands::A11yReport {
                    input,
                    output_dir,
                    json,
                } => {
                    prdops::cli::a11y_report::run(input, output_dir, json, &config.report)?;
                }

                Commands::MergeAdo {
                    titles,
                    attributes,
                    output,
                } => {
                    prdops::cli::merge_ado::run(titles, attributes, output, &config.merge)?;
                }

                Commands::Prd(cmd) => {
                    prdops::cli::prd::run(cmd, &config.prd)?;
                }

                Commands::InitConfig { .. } | Commands::Completions { .. } => {}
            }
        }
    }

    Ok(())
}
