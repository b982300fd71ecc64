use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("win-os-info version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
