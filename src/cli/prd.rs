//! PRD document commands

use crate::convert::PandocConverter;
use crate::models::PrdConfig;
use crate::pdf::PopplerSource;
use crate::prd::{self, BatchSummary, ALL_PAGES_DIR};
use crate::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum PrdCommands {
    /// Remove quick-prototype appendices, images and boilerplate phrases
    Cleanup {
        /// Folder of .docx PRDs
        prd_dir: Option<PathBuf>,

        /// Also process subfolders
        #[arg(short, long)]
        recursive: bool,
    },

    /// Bold section headers, normalize spacing and add research sentences
    Update {
        /// Folder of .docx PRDs
        prd_dir: Option<PathBuf>,

        /// Also process subfolders
        #[arg(short, long)]
        recursive: bool,
    },

    /// Append matching pages of the reference PDF as a prototype appendix
    Embed {
        /// Reference PDF
        #[arg(env = "PDF_PATH")]
        pdf: Option<PathBuf>,

        /// Folder of .docx PRDs; .rtf PRDs without a .docx are converted first
        #[arg(env = "PRD_DIR")]
        prd_dir: Option<PathBuf>,

        /// Hide the rendering progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

fn finish(summary: BatchSummary, done: &str) -> Result<()> {
    println!(
        "{}",
        format!(
            "✅ {} of {} document(s) {}",
            summary.changed, summary.processed, done
        )
        .green()
    );

    if summary.failed > 0 {
        anyhow::bail!("{} document(s) failed", summary.failed);
    }
    Ok(())
}

pub fn run(cmd: PrdCommands, config: &PrdConfig) -> Result<()> {
    match cmd {
        PrdCommands::Cleanup { prd_dir, recursive } => {
            let dir = prd_dir.unwrap_or_else(|| config.dir.clone());
            let summary = prd::clean_directory(&dir, recursive)?;
            finish(summary, "cleaned")
        }

        PrdCommands::Update { prd_dir, recursive } => {
            let dir = prd_dir.unwrap_or_else(|| config.dir.clone());
            let summary = prd::update_directory(&dir, recursive)?;
            finish(summary, "updated")
        }

        PrdCommands::Embed {
            pdf,
            prd_dir,
            no_progress,
        } => {
            let pdf = pdf.unwrap_or_else(|| config.pdf.clone());
            let dir = prd_dir.unwrap_or_else(|| config.dir.clone());

            if !pdf.exists() {
                anyhow::bail!("PDF not found: {}", pdf.display());
            }

            println!("{}", format!("📄 Rendering {}", pdf.display()).cyan());
            let source = PopplerSource::new(&pdf, dir.join(ALL_PAGES_DIR), config.render_dpi)
                .with_progress(!no_progress);

            let summary = prd::embed_directory(&source, &PandocConverter::default(), &dir, config)?;
            finish(summary, "updated with prototypes")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: PrdCommands,
    }

    #[test]
    fn test_embed_paths_fall_back_to_environment() {
        std::env::set_var("PDF_PATH", "env/prototypes.pdf");
        std::env::set_var("PRD_DIR", "env/PRDs");

        let parsed = Harness::try_parse_from(["prdops", "embed"]).unwrap();
        let PrdCommands::Embed { pdf, prd_dir, no_progress } = parsed.command else {
            panic!("expected embed");
        };
        assert_eq!(pdf, Some(PathBuf::from("env/prototypes.pdf")));
        assert_eq!(prd_dir, Some(PathBuf::from("env/PRDs")));
        assert!(!no_progress);

        let parsed = Harness::try_parse_from(["prdops", "embed", "given.pdf", "given"]).unwrap();
        let PrdCommands::Embed { pdf, prd_dir, .. } = parsed.command else {
            panic!("expected embed");
        };
        assert_eq!(pdf, Some(PathBuf::from("given.pdf")));
        assert_eq!(prd_dir, Some(PathBuf::from("given")));

        std::env::remove_var("PDF_PATH");
        std::env::remove_var("PRD_DIR");
    }
}
