pub mod deploy;
pub mod env_prefix;
pub mod fail;
pub mod generate;
pub mod info;
pub mod read;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "layered-config",
    author,
    version,
    about = "Layered configuration with provenance",
    long_about = "Merges app, host, user, .env and environment layers into one configuration.\n\n\
                  Later layers win. Every value remembers the layer and file it came from."
)]
pub struct Cli {
    #[arg(long, global = true, help = "Print the full error chain on failure")]
    pub traceback: bool,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show package name, version and description")]
    Info,

    #[command(about = "Print the environment variable prefix for a slug")]
    EnvPrefix(env_prefix::EnvPrefixArgs),

    #[command(about = "Read and merge every configuration layer")]
    Read(read::ReadArgs),

    #[command(about = "Copy a configuration file into layer directories")]
    Deploy(deploy::DeployArgs),

    #[command(about = "Write example configuration files for every layer")]
    GenerateExamples(generate::GenerateArgs),

    #[command(about = "Exit with an error, for testing exit codes")]
    Fail
}

/// Platform names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    #[value(alias = "posix")]
    Linux,
    #[value(aliases = ["mac", "macos"])]
    Darwin,
    #[value(aliases = ["win", "windows", "wine"])]
    Win32
}

impl PlatformArg {
    /// Identifier understood by the path resolver.
    pub fn resolver_identifier(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Win32 => "win32"
        }
    }

    /// Identifier selecting an example layout.
    pub fn example_identifier(self) -> &'static str {
        match self {
            Self::Win32 => "windows",
            Self::Linux | Self::Darwin => "posix"
        }
    }
}
