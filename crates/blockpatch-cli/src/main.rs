use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod core_flows;
mod layout;
mod render;


use core_flows::{run_fix_package, validate_inputs, PipelineOutcome};
use layout::ProjectLayout;
use render::{current_output_style, render_section_header, render_status_line, OutputStyle};

#[derive(Parser, Debug)]
#[command(name = "blockpatch")]
#[command(
    about = "Patch exported package archives with missing block editor labels",
    long_about = None
)]
struct Cli {
    archive: Option<PathBuf>,
    #[arg(long)]
    project_root: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let style = current_output_style();

    match run_cli(cli, style) {
        Ok(PipelineOutcome::Completed { .. }) => ExitCode::SUCCESS,
        Ok(PipelineOutcome::TargetMissing) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{}", render_status_line(style, "err", &format!("{err:?}")));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli, style: OutputStyle) -> Result<PipelineOutcome> {
    let layout = match cli.project_root {
        Some(root) => ProjectLayout::new(root),
        None => ProjectLayout::from_executable()?,
    };
    let archive_path = cli
        .archive
        .unwrap_or_else(|| layout.default_archive_path());

    validate_inputs(&archive_path, &layout)?;

    if let Some(header) = render_section_header(style, "blockpatch") {
        println!("{header}");
    }
    run_fix_package(&archive_path, &layout, style)
}
