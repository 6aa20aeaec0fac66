use crate::inputs::SpecInput;
use anyhow::Result;
use specdrift::ChangeRecord;
use specdrift_report::{ReportOptions, render_changes};

pub fn run(input: SpecInput, markdown: bool, pretty: bool) -> Result<()> {
    let changes = input.load_changes()?;
    println!("{}", render(&changes, markdown, pretty)?.trim_end());
    Ok(())
}

fn render(changes: &[ChangeRecord], markdown: bool, pretty: bool) -> Result<String> {
    if markdown {
        Ok(render_changes(changes, &ReportOptions::default()))
    } else {
        crate::to_json(changes, pretty)
    }
}
