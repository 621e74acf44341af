//! Maps filesystem events to the asset classes they affect.

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::EventKind;
use notify::event::ModifyKind;

use crate::config::SiteConfig;
use crate::core::AssetClass;
use crate::debug;
use crate::utils::glob::GlobPattern;
use crate::utils::path::is_temp_file;

pub(super) struct Router {
    root: PathBuf,
    serve_root: PathBuf,
    globs: Vec<(AssetClass, GlobPattern)>,
}

impl Router {
    /// One watch glob per watched class that has one configured.
    pub(super) fn from_config(config: &SiteConfig) -> Result<Self> {
        let mut globs = Vec::new();
        for class in AssetClass::WATCHED {
            if let Some(pattern) = &config.paths.class(class).watch {
                globs.push((class, GlobPattern::new(pattern)?));
            }
        }
        Ok(Self {
            root: config.get_root().to_path_buf(),
            serve_root: config.serve_root(),
            globs,
        })
    }

    /// Directories to watch recursively: the literal base of every glob.
    pub(super) fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self
            .globs
            .iter()
            .map(|(_, glob)| self.root.join(glob.base()))
            .collect();
        roots.sort();
        roots.dedup();
        // a root inside another root is already covered
        let all = roots.clone();
        roots.retain(|r| !all.iter().any(|other| other != r && r.starts_with(other)));
        roots
    }

    /// Classes affected by `event`, deduplicated.
    pub(super) fn route(&self, event: &notify::Event) -> Vec<AssetClass> {
        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // mtime/chmod noise would retrigger passes forever
            EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
            EventKind::Modify(_) => {}
            _ => return Vec::new(),
        }

        let mut classes = Vec::new();
        for path in &event.paths {
            for class in self.classes_for(path) {
                if !classes.contains(&class) {
                    classes.push(class);
                }
            }
        }
        classes
    }

    fn classes_for(&self, path: &Path) -> Vec<AssetClass> {
        if is_temp_file(path) || path.starts_with(&self.serve_root) {
            return Vec::new();
        }
        let classes: Vec<AssetClass> = self
            .globs
            .iter()
            .filter(|(_, glob)| glob.matches_path(path, &self.root))
            .map(|(class, _)| *class)
            .collect();
        if !classes.is_empty() {
            debug!("watch"; "{} -> {:?}", path.display(), classes);
        }
        classes
    }
}
