use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn run(input: PathBuf) -> Result<()> {
    let content =
        std::fs::read_to_string(&input).with_context(|| format!("Failed to read {:?}", input))?;
    println!("{}", validate_content(&content)?);
    Ok(())
}

fn validate_content(content: &str) -> Result<String> {
    match specdrift::parse(content) {
        Ok(spec) => Ok(format!(
            "Valid: {} paths, {} operations",
            spec.endpoint_count(),
            spec.operation_count()
        )),
        Err(e) => Err(anyhow::anyhow!("Invalid: {}", e)),
    }
}
