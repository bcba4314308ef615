use anyhow::Result;
use clap::Args;
use config::default_env_prefix;

#[derive(Args)]
pub struct EnvPrefixArgs {
    #[arg(help = "Application slug, e.g. my-app")]
    pub slug: String
}

pub fn run(args: &EnvPrefixArgs) -> Result<()> {
    println!("{}", default_env_prefix(&args.slug));
    Ok(())
}
