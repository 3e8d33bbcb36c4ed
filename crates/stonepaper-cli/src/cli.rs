use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stonepaper",
    about = "StonePaper: register documents by content hash on a ledger world state",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// World-state snapshot file (created on first write)
    #[arg(long, global = true, default_value = "stonepaper-state.json")]
    pub state: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a registry operation (createDoc, getDoc, setDatabase, setName)
    Invoke(InvokeArgs),
    /// Print the content hash of a file
    Hash(HashArgs),
    /// Run a raw selector query against the world state
    Query(QueryArgs),
}

#[derive(Args)]
pub struct InvokeArgs {
    /// Registry configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ambient identity of the caller
    #[arg(long, default_value = "anonymous")]
    pub caller: String,

    /// Credential attribute, as name=value (repeatable)
    #[arg(long = "attr", value_parser = parse_attr)]
    pub attrs: Vec<(String, String)>,

    /// Credential attribute payload, as {"attrs":{...}}
    #[arg(long, conflicts_with = "attrs")]
    pub attrs_json: Option<String>,

    /// Operation name
    pub function: String,

    /// Positional operation arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct HashArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Query string, e.g. '{"selector":{"database":1}}'
    pub query: String,
}

fn parse_attr(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got {raw:?}")),
    }
}
