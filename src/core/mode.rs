//! Closed mode selectors for the pipeline steps.
//!
//! Each variant maps to exactly one code path; there is no string dispatch.

use std::fmt;

/// Which output the cleaner removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanTarget {
    /// The whole serve root.
    All,
    Scripts,
    Styles,
    /// Only top-level compiled `*.html` files.
    Html,
    Images,
}

/// Which entries the bundle builder compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleTarget {
    All,
    Scripts,
    Styles,
}

impl BundleTarget {
    pub const fn includes_scripts(self) -> bool {
        matches!(self, Self::All | Self::Scripts)
    }

    pub const fn includes_styles(self) -> bool {
        matches!(self, Self::All | Self::Styles)
    }
}

/// Where the template renderer takes its HTML from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Compile template sources.
    Compile,
    /// Re-read already compiled HTML and only re-inject.
    Refresh,
}

/// Whether images are compressed before they are moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageMode {
    All,
    OnlyMove,
}

impl fmt::Display for CleanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Scripts => "scripts",
            Self::Styles => "styles",
            Self::Html => "html",
            Self::Images => "images",
        })
    }
}

impl fmt::Display for BundleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Scripts => "scripts",
            Self::Styles => "styles",
        })
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compile => "compile",
            Self::Refresh => "refresh",
        })
    }
}

impl fmt::Display for ImageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::OnlyMove => "only-move",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_target_selection() {
        assert!(BundleTarget::All.includes_scripts());
        assert!(BundleTarget::All.includes_styles());
        assert!(BundleTarget::Scripts.includes_scripts());
        assert!(!BundleTarget::Scripts.includes_styles());
        assert!(!BundleTarget::Styles.includes_scripts());
        assert!(BundleTarget::Styles.includes_styles());
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(CleanTarget::Html.to_string(), "html");
        assert_eq!(RenderMode::Refresh.to_string(), "refresh");
        assert_eq!(ImageMode::OnlyMove.to_string(), "only-move");
    }
}
