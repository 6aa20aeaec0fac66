use crate::inputs::SpecInput;
use anyhow::Result;

pub fn run(input: SpecInput, pretty: bool) -> Result<()> {
    let changes = input.load_changes()?;
    let identifiers = specdrift::extract(&changes);
    println!("{}", crate::to_json(&identifiers, pretty)?);
    Ok(())
}
