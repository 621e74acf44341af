//! Development server with live reload support.
//!
//! ```text
//! DevServer::start ──┬── HTTP  interface:port        (tiny_http, request pool)
//!                    └── WS    interface:reload_port (Reloader)
//! ```
//!
//! The HTTP loop runs on its own thread until Ctrl+C unblocks it.

mod content;
mod lifecycle;
mod path;
mod response;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Method, Request, Server};

use crate::config::SiteConfig;
use crate::core::register_server;
use crate::embed::serve::HOTRELOAD_URL;
use crate::reload::Reloader;
use crate::{debug, log};

/// Requests handled concurrently.
const REQUEST_THREADS: usize = 4;

/// What the request handlers need to know.
#[derive(Debug, Clone)]
struct ServeState {
    serve_root: PathBuf,
    /// Port of the reload WebSocket; `None` disables client injection.
    ws_port: Option<u16>,
}

/// A running dev server.
pub struct DevServer {
    reloader: Reloader,
    shutdown_rx: channel::Receiver<()>,
    handle: JoinHandle<()>,
}

impl DevServer {
    /// Bind HTTP and reload ports (with retry) and start serving the serve
    /// root in the background.
    pub fn start(config: &SiteConfig) -> Result<Self> {
        let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
        let server = Arc::new(server);

        let reloader = Reloader::start(config.serve.interface, config.serve.reload_port)?;

        let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
        register_server(Arc::clone(&server), shutdown_tx);

        let state = ServeState {
            serve_root: config.serve_root(),
            ws_port: reloader.port(),
        };
        let handle = thread::Builder::new()
            .name("http".into())
            .spawn(move || run_request_loop(&server, &state))?;

        log!("serve"; "http://{}", addr);
        Ok(Self {
            reloader,
            shutdown_rx,
            handle,
        })
    }

    /// Handle to the live reload channel of this server.
    pub fn reloader(&self) -> &Reloader {
        &self.reloader
    }

    /// Fires once when Ctrl+C is pressed.
    pub fn shutdown_signal(&self) -> channel::Receiver<()> {
        self.shutdown_rx.clone()
    }

    /// Block until the request loop has stopped.
    pub fn wait(self) {
        lifecycle::wait_for_shutdown(self.handle);
    }
}

fn run_request_loop(server: &Server, state: &ServeState) {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("http-{i}"))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            log!("error"; "failed to create request pool: {e}");
            return;
        }
    };

    pool.scope(|scope| {
        for request in server.incoming_requests() {
            scope.spawn(move |_| {
                if let Err(e) = handle_request(request, state) {
                    log!("serve"; "request error: {e}");
                }
            });
        }
    });
    debug!("serve"; "request loop stopped");
}

fn handle_request(request: Request, state: &ServeState) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    debug!("serve"; "{} {}", request.method(), request.url());

    if let Some(port) = state.ws_port
        && path::url_path(request.url()) == HOTRELOAD_URL
    {
        return response::respond_hotreload_js(request, port);
    }

    match path::resolve_path(request.url(), &state.serve_root) {
        Some(file) => response::respond_file(request, &file, state.ws_port),
        None => response::respond_not_found(request, &state.serve_root, state.ws_port),
    }
}
