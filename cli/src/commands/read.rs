use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use config::{Config, ConfigReader, Provenance};
use serde::Serialize;
use tracing::debug;

use crate::output;

#[derive(Args)]
pub struct ReadArgs {
    #[arg(long, help = "Vendor name used in macOS and Windows paths")]
    pub vendor: String,

    #[arg(long, help = "Application name used in macOS and Windows paths")]
    pub app: String,

    #[arg(long, help = "Slug used in Linux paths and the env prefix")]
    pub slug: String,

    #[arg(
        long,
        value_delimiter = ',',
        help = "File suffixes to load first within a layer, e.g. toml,json"
    )]
    pub prefer: Vec<String>,

    #[arg(long, help = "Directory where the .env search starts [default: cwd]")]
    pub start_dir: Option<PathBuf>,

    #[arg(long, help = "Pretty-print with this many spaces")]
    pub indent: Option<usize>,

    #[arg(long, help = "Include the origin of every value")]
    pub provenance: bool,

    #[arg(long, env = "LAYERED_CONFIG_TRACE_ID", help = "Trace id attached to log events")]
    pub trace_id: Option<String>
}

#[derive(Serialize)]
struct WithProvenance<'a> {
    config: &'a Config,
    provenance: &'a Provenance
}

pub fn run(args: ReadArgs) -> Result<()> {
    let mut reader = ConfigReader::new(&args.vendor, &args.app, &args.slug).with_prefer(args.prefer);
    if let Some(start_dir) = args.start_dir {
        reader = reader.with_start_dir(start_dir);
    }
    if let Some(trace_id) = args.trace_id {
        reader = reader.with_trace_id(trace_id);
    }

    let config = reader.read()?;
    debug!(keys = config.len(), "read_command_done");

    let rendered = if args.provenance {
        output::render_json(
            &WithProvenance {
                config: &config,
                provenance: config.provenance()
            },
            args.indent
        )?
    } else {
        config.to_json(args.indent)
    };
    println!("{rendered}");
    Ok(())
}
