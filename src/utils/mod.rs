//! Utility modules shared by the pipeline stages.

pub mod glob;
pub mod hash;
pub mod html;
pub mod mime;
pub mod path;
