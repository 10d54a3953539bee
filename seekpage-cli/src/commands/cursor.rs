use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::Value;

use seekpage::keyset::{Cursor, SortSpec};

#[derive(Subcommand)]
pub enum CursorCommands {
    /// Turn a cursor JSON object into an opaque token
    Encode {
        /// Sort spec the cursor belongs to
        #[arg(short, long)]
        sort: String,

        /// Cursor object, e.g. '{"updated_at":"2025-04-08T05:54:45Z","id":42}'
        json: String,
    },
    /// Turn an opaque token back into its JSON object
    Decode {
        /// Sort spec the cursor belongs to
        #[arg(short, long)]
        sort: String,

        /// Token from a page's `nextToken`
        token: String,
    },
}

pub fn execute(command: CursorCommands) -> Result<()> {
    let output = match command {
        CursorCommands::Encode { sort, json } => encode(&sort, &json)?,
        CursorCommands::Decode { sort, token } => decode(&sort, &token)?,
    };
    println!("{}", output);
    Ok(())
}

fn encode(sort: &str, json: &str) -> Result<String> {
    let spec = SortSpec::parse(sort)?;
    let value: Value = serde_json::from_str(json).context("Cursor is not valid JSON")?;
    Ok(Cursor::from_json(&spec, &value)?.encode())
}

fn decode(sort: &str, token: &str) -> Result<String> {
    let spec = SortSpec::parse(sort)?;
    Ok(Cursor::decode(&spec, token)?.to_json().to_string())
}
