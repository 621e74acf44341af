//! Pipeline descriptions: ordered stages and parallel groups of tasks.

use std::fmt;

use crate::core::{AssetClass, BundleTarget, CleanTarget, ImageMode, RenderMode};

/// One step of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Clean(CleanTarget),
    Bundle(BundleTarget),
    Render(RenderMode),
    Favicons,
    Images(ImageMode),
    /// Broadcast a reload to connected browsers.
    Reload,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean(target) => write!(f, "clean({target})"),
            Self::Bundle(target) => write!(f, "bundle({target})"),
            Self::Render(mode) => write!(f, "render({mode})"),
            Self::Favicons => f.write_str("favicon"),
            Self::Images(mode) => write!(f, "images({mode})"),
            Self::Reload => f.write_str("reload"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Task(Task),
    /// Tasks run concurrently; the stage fails if any member fails.
    Parallel(Vec<Task>),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(task) => task.fmt(f),
            Self::Parallel(tasks) => {
                let names: Vec<String> = tasks.iter().map(Task::to_string).collect();
                write!(f, "[{}]", names.join(" | "))
            }
        }
    }
}

/// A named sequence of stages.
///
/// ```text
/// clean(all) → bundle(all) → render(compile) → [favicon | images(all)]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    name: &'static str,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: Vec::new(),
        }
    }

    /// Append a sequential stage.
    pub fn then(mut self, task: Task) -> Self {
        self.stages.push(Stage::Task(task));
        self
    }

    /// Append a parallel group.
    pub fn parallel(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.stages.push(Stage::Parallel(tasks.into_iter().collect()));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Every task in execution order, parallel groups flattened.
    pub fn tasks(&self) -> impl Iterator<Item = Task> + '_ {
        self.stages.iter().flat_map(|stage| match stage {
            Stage::Task(task) => std::slice::from_ref(task).iter().copied(),
            Stage::Parallel(tasks) => tasks.iter().copied(),
        })
    }

    /// Full build of every asset class.
    pub fn full_build() -> Self {
        Self::new("build")
            .then(Task::Clean(CleanTarget::All))
            .then(Task::Bundle(BundleTarget::All))
            .then(Task::Render(RenderMode::Compile))
            .parallel([Task::Favicons, Task::Images(ImageMode::All)])
    }

    /// Minimal pass after a change to `class`. `None` for unwatched classes.
    pub fn for_class(class: AssetClass) -> Option<Self> {
        let pipeline = match class {
            AssetClass::Styles => Self::new("styles")
                .then(Task::Clean(CleanTarget::Styles))
                .then(Task::Bundle(BundleTarget::Styles))
                .then(Task::Render(RenderMode::Refresh)),
            AssetClass::Scripts => Self::new("scripts")
                .then(Task::Clean(CleanTarget::Scripts))
                .then(Task::Bundle(BundleTarget::Scripts))
                .then(Task::Render(RenderMode::Refresh)),
            AssetClass::Templates => Self::new("templates")
                .then(Task::Clean(CleanTarget::Html))
                .then(Task::Render(RenderMode::Compile)),
            AssetClass::Images => Self::new("images")
                .then(Task::Clean(CleanTarget::Images))
                .then(Task::Images(ImageMode::OnlyMove)),
            AssetClass::Favicon => return None,
        };
        Some(pipeline.then(Task::Reload))
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<String> = self.stages.iter().map(Stage::to_string).collect();
        f.write_str(&stages.join(" → "))
    }
}
