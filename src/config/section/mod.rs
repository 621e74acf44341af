//! Configuration section definitions.
//!
//! | Module  | TOML Section | Purpose                                  |
//! |---------|--------------|------------------------------------------|
//! | `paths` | `[paths]`    | Per-class globs, entries and outputs     |
//! | `build` | `[build]`    | Browser targets, minification, images    |
//! | `serve` | `[serve]`    | Dev server and live-reload ports         |
//! | `watch` | `[watch]`    | Debounce window                          |

mod build;
mod paths;
mod serve;
mod watch;

pub use build::BuildConfig;
pub use paths::{ClassPaths, PathsConfig};
pub use serve::ServeConfig;
pub use watch::WatchConfig;
