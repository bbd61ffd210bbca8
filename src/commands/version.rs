use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("thermwatch version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
