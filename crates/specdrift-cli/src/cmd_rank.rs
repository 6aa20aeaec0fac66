use crate::inputs::{CorpusInput, SpecInput};
use anyhow::Result;
use specdrift::Ranking;
use specdrift_report::render_ranking;

pub fn run(input: SpecInput, corpus: CorpusInput, markdown: bool, pretty: bool) -> Result<()> {
    let ranking = rank(&input, &corpus)?;
    if markdown {
        println!("{}", render_ranking(&ranking).trim_end());
    } else {
        println!("{}", crate::to_json(&ranking, pretty)?);
    }
    Ok(())
}

fn rank(input: &SpecInput, corpus: &CorpusInput) -> Result<Ranking> {
    let changes = input.load_changes()?;
    let identifiers = specdrift::extract(&changes);
    log::info!(
        "{} change(s), {} identifier(s)",
        changes.len(),
        identifiers.len()
    );
    corpus.with_source(input.repo.as_deref(), |handles, source| {
        Ok(specdrift::rank(&identifiers, handles, source))
    })
}
