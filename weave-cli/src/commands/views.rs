//! `weave views <site>` — list resolvable views.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use weave_core::{config, Parameters, ResourceMap};

/// Arguments for `weave views`.
#[derive(Args, Debug)]
pub struct ViewsArgs {
    /// Site directory containing `views/`.
    pub site: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ViewJson {
    reference: String,
    scheme: String,
    name: String,
    include_path: String,
    parameters: Parameters,
}

#[derive(Tabled)]
struct ViewRow {
    scheme: String,
    name: String,
    #[tabled(rename = "include path")]
    include_path: String,
    parameters: String,
}

impl ViewsArgs {
    pub fn run(self) -> Result<()> {
        let manifest = config::load_manifest_at(&self.site)
            .with_context(|| format!("failed to load manifest for '{}'", self.site.display()))?;
        let resources = ResourceMap::for_site(&self.site, &manifest)
            .with_context(|| format!("failed to index views of '{}'", self.site.display()))?;

        let views: Vec<ViewJson> = resources
            .iter()
            .map(|(reference, view)| ViewJson {
                reference: reference.to_string(),
                scheme: view.scheme.to_string(),
                name: view.name.clone(),
                include_path: view.include_path.to_string_lossy().replace('\\', "/"),
                parameters: view.parameters.clone(),
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&views).context("failed to serialize views")?
            );
            return Ok(());
        }

        println!(
            "Weave v{} | {} views | theme {}",
            env!("CARGO_PKG_VERSION"),
            views.len(),
            manifest.theme.bold()
        );
        let rows: Vec<ViewRow> = views
            .into_iter()
            .map(|v| ViewRow {
                scheme: v.scheme,
                name: v.name,
                include_path: v.include_path,
                parameters: if v.parameters.is_empty() {
                    String::new()
                } else {
                    serde_json::Value::Object(v.parameters).to_string()
                },
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
