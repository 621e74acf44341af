//! Output cleaning and static asset copies.

pub mod clean;
pub mod copy;

pub use clean::clean;
pub use copy::copy_favicons;
