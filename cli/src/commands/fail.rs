use anyhow::{Result, bail};

pub fn run() -> Result<()> {
    bail!("i should fail")
}
