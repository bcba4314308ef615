use anyhow::Result;

use crate::output;

pub fn run() -> Result<()> {
    output::header(env!("CARGO_PKG_NAME"));
    output::field("version", env!("CARGO_PKG_VERSION"));
    output::field("description", env!("CARGO_PKG_DESCRIPTION"));
    Ok(())
}
