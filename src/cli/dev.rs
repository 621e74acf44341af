//! `sitepipe dev`: full build, serve, reload, watch.
//!
//! ```text
//! build ──► DevServer::start ──► reload ──► watch::run ──(Ctrl+C)──► wait
//! ```

use std::sync::Arc;

use anyhow::Result;

use super::build::build_site;
use super::serve::DevServer;
use crate::config::SiteConfig;
use crate::pipeline::{Context, Pipeline, Task};
use crate::{log, watch};

/// Run the development loop until Ctrl+C.
///
/// A failing initial build is reported but does not stop the server, so
/// fixing the source recovers through the watcher.
pub fn dev_site(config: Arc<SiteConfig>) -> Result<()> {
    if let Err(e) = build_site(&config) {
        log!("error"; "initial build failed: {:#}", e);
    }

    let server = DevServer::start(&config)?;
    let reloader = server.reloader().clone();

    Pipeline::new("dev")
        .then(Task::Reload)
        .run(Context::new(&config, Some(&reloader)))?;

    watch::run(config, reloader, server.shutdown_signal())?;
    server.wait();
    Ok(())
}
