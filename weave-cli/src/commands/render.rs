//! `weave render <site>` — compose a site's theme into one document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use weave_core::{config, ResourceMap};
use weave_renderer::{Renderer, TemplateEngine, TracingDispatcher};

/// Arguments for `weave render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Site directory containing `views/` and optionally `weave.yaml`.
    pub site: PathBuf,

    /// Theme to render instead of the manifest's.
    #[arg(long)]
    pub theme: Option<String>,

    /// Runtime context YAML (defaults to `<site>/runtime.yaml` when present).
    #[arg(long, value_name = "FILE")]
    pub runtime: Option<PathBuf>,

    /// Write the document here instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Override the manifest's parse-cycle limit.
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let manifest = config::load_manifest_at(&self.site)
            .with_context(|| format!("failed to load manifest for '{}'", self.site.display()))?;
        let resources = ResourceMap::for_site(&self.site, &manifest)
            .with_context(|| format!("failed to index views of '{}'", self.site.display()))?;

        let mut runtime = match &self.runtime {
            Some(path) => config::load_runtime_file(path),
            None => config::load_runtime_at(&self.site),
        }
        .context("failed to load runtime context")?;

        let theme_name = self.theme.clone().unwrap_or_else(|| manifest.theme.clone());
        let theme = resources.theme(&theme_name)?;
        runtime.route.theme = theme.name.clone();
        tracing::info!(
            site = %self.site.display(),
            theme = %theme.name,
            views = resources.len(),
            "rendering site"
        );

        let mut render_config = manifest.render.clone();
        if let Some(limit) = self.max_iterations {
            render_config.max_iterations = limit;
        }

        let engine = TemplateEngine::new(Some(&config::views_dir_at(&self.site)))
            .context("failed to load view templates")?;
        let mut renderer =
            Renderer::new(resources, engine, TracingDispatcher).with_config(render_config);
        let document = renderer
            .render(&theme, runtime)
            .with_context(|| format!("failed to render theme '{theme_name}'"))?;

        tracing::debug!(bytes = document.len(), "render complete");

        match &self.out {
            Some(path) => {
                write_atomic(path, &document)?;
                tracing::info!(out = %path.display(), "wrote document");
                println!(
                    "{} rendered '{}' to {} ({} bytes)",
                    "✓".green(),
                    theme_name,
                    path.display(),
                    document.len()
                );
            }
            None => print!("{document}"),
        }
        Ok(())
    }
}

/// Write through a sibling `.tmp` file and rename into place.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create '{}'", parent.display()))?;
    }
    let tmp = PathBuf::from(format!("{}.weave.tmp", path.display()));
    std::fs::write(&tmp, content).with_context(|| format!("cannot write '{}'", tmp.display()))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("cannot move output to '{}'", path.display()));
    }
    Ok(())
}
