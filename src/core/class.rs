//! Asset classes handled by the pipeline.

use std::fmt;

/// A logical class of site assets.
///
/// Every class owns a source glob, an output location and (for the watched
/// classes) a watch glob in the path registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetClass {
    Templates,
    Styles,
    Scripts,
    Images,
    Favicon,
}

impl AssetClass {
    /// Classes with a watch pass of their own.
    pub const WATCHED: [Self; 4] = [Self::Templates, Self::Styles, Self::Scripts, Self::Images];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Templates => "templates",
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Images => "images",
            Self::Favicon => "favicon",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
