//! `weave tokens <file>` — show how include tags in a file are parsed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use weave_renderer::token::{self, Token};

/// Arguments for `weave tokens`.
#[derive(Args, Debug)]
pub struct TokensArgs {
    /// Document to scan.
    pub file: PathBuf,

    /// Skip tags of this kind or name (repeatable).
    #[arg(long, short = 'x', value_name = "KIND|NAME")]
    pub exclude: Vec<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct TokenRow {
    #[tabled(rename = "type")]
    kind: String,
    name: String,
    wrap: String,
    attributes: String,
}

impl TokensArgs {
    pub fn run(self) -> Result<()> {
        let document = std::fs::read_to_string(&self.file)
            .with_context(|| format!("cannot read '{}'", self.file.display()))?;
        let tokens = token::parse(&document, &token::exclusion_set(&self.exclude));

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&tokens).context("failed to serialize tokens")?
            );
            return Ok(());
        }

        if tokens.is_empty() {
            println!("No include tags found.");
            return Ok(());
        }
        let mut table = Table::new(tokens.iter().map(to_row));
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn to_row(token: &Token) -> TokenRow {
    TokenRow {
        kind: token.kind.clone(),
        name: token.name.clone(),
        wrap: token.wrap.clone(),
        attributes: token
            .attributes
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}
