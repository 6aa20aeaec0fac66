mod cmd_context;
mod cmd_diff;
mod cmd_endpoints;
mod cmd_list;
mod cmd_rank;
mod cmd_validate;
mod inputs;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "specdrift")]
#[command(about = "Diff API descriptions and find the tests the changes affect")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log more (repeat for more detail); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Structural diff between two revisions of a description
    Diff {
        #[command(flatten)]
        input: inputs::SpecInput,

        /// Render Markdown instead of JSON
        #[arg(long)]
        markdown: bool,
    },
    /// Identifiers derived from the changes
    Endpoints {
        #[command(flatten)]
        input: inputs::SpecInput,
    },
    /// Rank test files by relevance to the changes
    Rank {
        #[command(flatten)]
        input: inputs::SpecInput,

        #[command(flatten)]
        corpus: inputs::CorpusInput,

        /// Render Markdown instead of JSON
        #[arg(long)]
        markdown: bool,
    },
    /// Build the token-bounded prompt payload for the changes
    Context {
        #[command(flatten)]
        input: inputs::SpecInput,

        #[command(flatten)]
        corpus: inputs::CorpusInput,

        #[command(flatten)]
        budget: cmd_context::BudgetArgs,

        /// Emit the context bundle as JSON instead of the rendered prompt
        #[arg(long)]
        json: bool,
    },
    /// Check that a file parses as an API description
    Validate {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// List changed descriptions or candidate test files
    List {
        #[command(subcommand)]
        source: cmd_list::ListSource,

        /// Output as JSON
        #[arg(long, global = true)]
        json: bool,
    },
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Diff { input, markdown } => cmd_diff::run(input, markdown, cli.pretty),
        Commands::Endpoints { input } => cmd_endpoints::run(input, cli.pretty),
        Commands::Rank {
            input,
            corpus,
            markdown,
        } => cmd_rank::run(input, corpus, markdown, cli.pretty),
        Commands::Context {
            input,
            corpus,
            budget,
            json,
        } => cmd_context::run(input, corpus, budget, json, cli.pretty),
        Commands::Validate { input } => cmd_validate::run(input),
        Commands::List { source, json } => cmd_list::run(source, json),
    }
}
