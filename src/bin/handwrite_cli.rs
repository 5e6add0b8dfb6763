//! Handwrite CLI - runs one handwriting project
//!
//! Prints a one-line summary to stdout.
//! Returns non-zero on any pipeline failure.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use handwrite_core::{HandwritingPipeline, Project};

const LONG_ABOUT: &str = r#"Simulate handwriting on a prepared handwriting project.

A handwriting project must contain:
  content.txt              text to write (UTF-8)
  font.[ttf|otf|...]       TrueType or OpenType font used for writing
  background.[png|jpg|...] page background image
  template.yml             remaining parameters (UTF-8)
  out/                     generated images (created automatically)

template.yml example:
================================================================================
margin:  # page margins, pixels
  left: 150
  right: 150
  top: 200
  bottom: 200
line_spacing: 150  # pixels
font_size: 100  # pixels
word_spacing: 0  # pixels, default: 0
color: "black"  # default: "black"

# Randomness: the higher the σ, the stronger the variation
line_spacing_sigma: 3.1  # default: font_size / 32
font_size_sigma: 1.6  # default: font_size / 64
word_spacing_sigma: 3.1  # default: font_size / 32
perturb_x_sigma: 3.1  # stroke x offset, default: font_size / 32
perturb_y_sigma: 3.1  # stroke y offset, default: font_size / 32
perturb_theta_sigma: 0.07  # stroke rotation, default: 0.07
================================================================================"#;

#[derive(Parser)]
#[command(name = "handwrite", version)]
#[command(about = "Handwrite - simulate handwriting on a project directory")]
#[command(long_about = LONG_ABOUT)]
struct Cli {
    /// Path to the handwriting project
    project: PathBuf,

    /// Suppress the summary line
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let project = Project::new(cli.project);
    let pipeline = HandwritingPipeline::default();

    match pipeline.run_and_report(&project, cli.quiet) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
