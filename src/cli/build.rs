//! `sitepipe build`: one full build, then exit.

use std::time::Instant;

use anyhow::Result;

use crate::config::SiteConfig;
use crate::log;
use crate::pipeline::{Context, Pipeline};

/// Run the full build pipeline once.
///
/// The first failing stage aborts the build; its error names the task.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    let started = Instant::now();
    let pipeline = Pipeline::full_build();
    log!("build"; "{}", pipeline);

    pipeline.run(Context::new(config, None))?;

    log!(
        "build";
        "done in {}ms -> {}",
        started.elapsed().as_millis(),
        config.root_relative(&config.serve_root()).display()
    );
    Ok(())
}
