//! Core types shared by every stage of the pipeline.

mod class;
mod mode;
mod state;

pub use class::AssetClass;
pub use mode::{BundleTarget, CleanTarget, ImageMode, RenderMode};
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
