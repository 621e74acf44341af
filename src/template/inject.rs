//! Reference injection for compiled pages.
//!
//! Every page carries two marked regions that list the current bundles:
//!
//! ```html
//! <!-- inject:css -->
//! <link rel="stylesheet" href="/assets/styles/bundle-style-1a2b3c4d.css">
//! <!-- endinject -->
//! ```
//!
//! Existing regions are rewritten in place. Pages without markers get a
//! region inserted before `</head>` (styles) or `</body>` (scripts), so
//! injecting twice yields the same page.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use super::TemplateError;
use crate::config::SiteConfig;
use crate::core::AssetClass;
use crate::utils::html::escape_attr;
use crate::utils::path::to_slash;

static RE_CSS_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)([ \t]*)<!--\s*inject:css\s*-->.*?<!--\s*endinject\s*-->").unwrap()
});

static RE_JS_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)([ \t]*)<!--\s*inject:js\s*-->.*?<!--\s*endinject\s*-->").unwrap()
});

static RE_ANY_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*inject:(?:css|js)\s*-->(.*?)<!--\s*endinject\s*-->").unwrap()
});

/// Root-relative URLs of the bundles currently in the output directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Injection {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

impl Injection {
    /// Scan the style and script output directories (top level only).
    pub fn collect(config: &SiteConfig) -> Result<Self> {
        let serve_root = config.serve_root();
        Ok(Self {
            styles: scan_urls(&config.output_dir(AssetClass::Styles), "css", &serve_root)?,
            scripts: scan_urls(&config.output_dir(AssetClass::Scripts), "js", &serve_root)?,
        })
    }

    fn style_tags(&self) -> Vec<String> {
        self.styles
            .iter()
            .map(|url| format!(r#"<link rel="stylesheet" href="{}">"#, escape_attr(url)))
            .collect()
    }

    fn script_tags(&self) -> Vec<String> {
        self.scripts
            .iter()
            .map(|url| format!(r#"<script src="{}" type="module" defer></script>"#, escape_attr(url)))
            .collect()
    }
}

/// Sorted `/`-prefixed URLs of the `*.<ext>` files directly in `dir`.
fn scan_urls(dir: &Path, ext: &str, serve_root: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", dir.display())),
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ext) {
            files.push(path);
        }
    }
    files.sort();

    Ok(files
        .iter()
        .filter_map(|path| to_slash(path, serve_root))
        .map(|rel| format!("/{rel}"))
        .collect())
}

/// Rewrite (or insert) both injection regions of `html`.
pub fn inject(html: &str, injection: &Injection) -> String {
    let html = inject_region(html, &RE_CSS_REGION, "css", &injection.style_tags(), "</head>");
    inject_region(&html, &RE_JS_REGION, "js", &injection.script_tags(), "</body>")
}

fn region(kind: &str, tags: &[String], indent: &str) -> String {
    let mut out = format!("{indent}<!-- inject:{kind} -->\n");
    for tag in tags {
        out.push_str(&format!("{indent}{tag}\n"));
    }
    out.push_str(&format!("{indent}<!-- endinject -->"));
    out
}

fn inject_region(html: &str, re: &Regex, kind: &str, tags: &[String], anchor: &str) -> String {
    if re.is_match(html) {
        return re
            .replace_all(html, |caps: &Captures| region(kind, tags, &caps[1]))
            .into_owned();
    }

    let lower = html.to_ascii_lowercase();
    let Some(pos) = lower.rfind(anchor) else {
        let mut out = html.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&region(kind, tags, ""));
        out.push('\n');
        return out;
    };

    let line_start = html[..pos].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &html[line_start..pos];

    let mut out = String::with_capacity(html.len() + 128);
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        // anchor on its own line: indent one level deeper than the anchor
        out.push_str(&html[..line_start]);
        out.push_str(&region(kind, tags, &format!("{prefix}  ")));
        out.push('\n');
        out.push_str(&html[line_start..]);
    } else {
        out.push_str(&html[..pos]);
        out.push_str(&region(kind, tags, ""));
        out.push_str(&html[pos..]);
    }
    out
}

/// Check that every reference inside the injection regions of `html`
/// resolves to a file under `serve_root`.
pub fn verify(page: &Path, html: &str, serve_root: &Path) -> Result<(), TemplateError> {
    for caps in RE_ANY_REGION.captures_iter(html) {
        for url in region_urls(&caps[1]) {
            let rel = url.trim_start_matches('/');
            if rel.is_empty() || !serve_root.join(rel).is_file() {
                return Err(TemplateError::DanglingReference {
                    page: page.to_path_buf(),
                    url,
                });
            }
        }
    }
    Ok(())
}

/// `href` of `<link>` and `src` of `<script>` tags in an HTML fragment.
fn region_urls(fragment: &str) -> Vec<String> {
    let Ok(dom) = tl::parse(fragment, tl::ParserOptions::default()) else {
        return Vec::new();
    };
    dom.nodes()
        .iter()
        .filter_map(|node| node.as_tag())
        .filter_map(|tag| {
            let attr = match tag.name().as_utf8_str().to_ascii_lowercase().as_str() {
                "link" => "href",
                "script" => "src",
                _ => return None,
            };
            tag.attributes()
                .get(attr)
                .flatten()
                .map(|value| value.as_utf8_str().into_owned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn injection() -> Injection {
        Injection {
            styles: vec!["/assets/styles/bundle-style-0a1b2c3d.css".into()],
            scripts: vec!["/assets/scripts/bundle-index-4e5f6a7b.js".into()],
        }
    }

    const PAGE: &str = "\
<html>
  <head>
    <title>Home</title>
  </head>
  <body>
    <h1>Hello</h1>
  </body>
</html>
";

    #[test]
    fn test_inserts_regions_before_anchors() {
        let html = inject(PAGE, &injection());
        let expected = "\
<html>
  <head>
    <title>Home</title>
    <!-- inject:css -->
    <link rel=\"stylesheet\" href=\"/assets/styles/bundle-style-0a1b2c3d.css\">
    <!-- endinject -->
  </head>
  <body>
    <h1>Hello</h1>
    <!-- inject:js -->
    <script src=\"/assets/scripts/bundle-index-4e5f6a7b.js\" type=\"module\" defer></script>
    <!-- endinject -->
  </body>
</html>
";
        assert_eq!(html, expected);
    }

    #[test]
    fn test_injection_is_idempotent() {
        let once = inject(PAGE, &injection());
        let twice = inject(&once, &injection());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrites_existing_region() {
        let page = "<head>\n  <!--inject:css-->\n  <link rel=\"stylesheet\" href=\"/old.css\">\n  <!-- endinject -->\n</head>\n";
        let html = inject(page, &injection());
        assert!(!html.contains("/old.css"));
        assert!(html.contains(
            "  <!-- inject:css -->\n  <link rel=\"stylesheet\" href=\"/assets/styles/bundle-style-0a1b2c3d.css\">\n  <!-- endinject -->\n</head>"
        ));
        // no </body>: the script region is appended
        assert!(html.ends_with("<!-- inject:js -->\n<script src=\"/assets/scripts/bundle-index-4e5f6a7b.js\" type=\"module\" defer></script>\n<!-- endinject -->\n"));
    }

    #[test]
    fn test_empty_injection_keeps_markers() {
        let html = inject(PAGE, &Injection::default());
        assert!(html.contains("    <!-- inject:css -->\n    <!-- endinject -->\n  </head>"));
        assert!(!html.contains("<link"));
        assert_eq!(inject(&html, &Injection::default()), html);
    }

    #[test]
    fn test_inline_anchor() {
        let html = inject("<body><p>x</p></body>", &Injection::default());
        assert!(html.starts_with("<body><p>x</p><!-- inject:js -->\n<!-- endinject --></body>"));
    }

    #[test]
    fn test_collect_sorted_urls() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::with_root(dir.path());
        let styles = config.output_dir(AssetClass::Styles);
        fs::create_dir_all(styles.join("nested")).unwrap();
        fs::write(styles.join("bundle-b-00000000.css"), "").unwrap();
        fs::write(styles.join("bundle-a-00000000.css"), "").unwrap();
        fs::write(styles.join("notes.txt"), "").unwrap();
        fs::write(styles.join("nested/bundle-c-00000000.css"), "").unwrap();

        let injection = Injection::collect(&config).unwrap();
        assert_eq!(
            injection.styles,
            vec![
                "/assets/styles/bundle-a-00000000.css",
                "/assets/styles/bundle-b-00000000.css",
            ]
        );
        assert!(injection.scripts.is_empty());
    }

    #[test]
    fn test_verify_detects_dangling_reference() {
        let dir = TempDir::new().unwrap();
        let serve_root = dir.path();
        let html = inject(PAGE, &injection());

        let err = verify(Path::new("index.html"), &html, serve_root).unwrap_err();
        assert!(matches!(err, TemplateError::DanglingReference { .. }));

        fs::create_dir_all(serve_root.join("assets/styles")).unwrap();
        fs::create_dir_all(serve_root.join("assets/scripts")).unwrap();
        fs::write(serve_root.join("assets/styles/bundle-style-0a1b2c3d.css"), "").unwrap();
        fs::write(serve_root.join("assets/scripts/bundle-index-4e5f6a7b.js"), "").unwrap();
        verify(Path::new("index.html"), &html, serve_root).unwrap();
    }

    #[test]
    fn test_region_urls() {
        let urls = region_urls("<link rel=\"stylesheet\" href=\"/a.css\">\n<script src=\"/b.js\" defer></script>");
        assert_eq!(urls, vec!["/a.css", "/b.js"]);
    }
}
