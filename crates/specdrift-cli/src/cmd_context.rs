use crate::inputs::{CorpusInput, SpecInput};
use anyhow::Result;
use clap::Args;
use specdrift::BudgetConfig;
use specdrift_report::render_prompt;

#[derive(Args, Debug, Default)]
pub struct BudgetArgs {
    /// Token budget for the whole payload [default: 12000]
    #[arg(long)]
    pub total_tokens: Option<usize>,

    /// Characters kept per test file before truncation [default: 6000]
    #[arg(long)]
    pub per_document_chars: Option<usize>,
}

impl BudgetArgs {
    pub fn config(&self) -> BudgetConfig {
        let mut config = BudgetConfig::default();
        if let Some(total) = self.total_tokens {
            config.total_tokens = total;
        }
        if let Some(chars) = self.per_document_chars {
            config.per_document_chars = chars;
        }
        config
    }
}

pub fn run(
    input: SpecInput,
    corpus: CorpusInput,
    budget: BudgetArgs,
    json: bool,
    pretty: bool,
) -> Result<()> {
    println!("{}", build(&input, &corpus, &budget, json, pretty)?.trim_end());
    Ok(())
}

fn build(
    input: &SpecInput,
    corpus: &CorpusInput,
    budget: &BudgetArgs,
    json: bool,
    pretty: bool,
) -> Result<String> {
    let changes = input.load_changes()?;
    let identifiers = specdrift::extract(&changes);
    let config = budget.config();

    let bundle = corpus.with_source(input.repo.as_deref(), |handles, source| {
        let ranking = specdrift::rank(&identifiers, handles, source);
        Ok(specdrift::budget(&ranking.documents, source, &config))
    })?;

    if json {
        crate::to_json(&bundle, pretty)
    } else {
        Ok(render_prompt(&changes, &bundle))
    }
}
