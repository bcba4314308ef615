use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use config::deploy_config;

use super::PlatformArg;
use crate::output;

#[derive(Args)]
pub struct DeployArgs {
    #[arg(long, help = "Configuration file to copy")]
    pub source: PathBuf,

    #[arg(long)]
    pub vendor: String,

    #[arg(long)]
    pub app: String,

    #[arg(long, help = "Slug used in Linux paths [default: app]")]
    pub slug: Option<String>,

    #[arg(
        long = "target",
        value_delimiter = ',',
        required = true,
        help = "Layer to deploy to: app, host or user (repeatable)"
    )]
    pub targets: Vec<String>,

    #[arg(long, value_enum, help = "Platform layout to deploy into [default: current]")]
    pub platform: Option<PlatformArg>,

    #[arg(long, help = "Overwrite files that already exist")]
    pub force: bool
}

/// Prints the written paths as a JSON array; skipped destinations are absent.
pub fn run(args: &DeployArgs) -> Result<()> {
    let written = deploy_config(
        &args.source,
        &args.vendor,
        &args.app,
        args.targets.as_slice(),
        args.slug.as_deref(),
        args.platform.map(PlatformArg::resolver_identifier),
        args.force
    )?;
    println!("{}", output::render_json(&written, Some(2))?);
    Ok(())
}
