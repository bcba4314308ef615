use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use config::generate_examples;

use super::PlatformArg;
use crate::output;

#[derive(Args)]
pub struct GenerateArgs {
    #[arg(long, help = "Directory to write the example tree into")]
    pub destination: PathBuf,

    #[arg(long)]
    pub slug: String,

    #[arg(long)]
    pub vendor: String,

    #[arg(long)]
    pub app: String,

    #[arg(long, value_enum, help = "Layout to generate [default: current]")]
    pub platform: Option<PlatformArg>,

    #[arg(long, help = "Overwrite files that already exist")]
    pub force: bool
}

pub fn run(args: &GenerateArgs) -> Result<()> {
    let written = generate_examples(
        &args.destination,
        &args.slug,
        &args.vendor,
        &args.app,
        args.platform.map(PlatformArg::example_identifier),
        args.force
    )?;
    println!("{}", output::render_json(&written, Some(2))?);
    Ok(())
}
