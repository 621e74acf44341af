//! Task composer: runs [`Pipeline`] descriptions.
//!
//! Sequential stages run strictly in order on the calling thread; a parallel
//! group runs its members on the rayon pool. The first failing stage aborts
//! the rest of the pipeline.

mod plan;

pub use plan::{Pipeline, Stage, Task};

use rayon::prelude::*;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::reload::Reloader;
use crate::{asset, bundle, debug, image, template};

/// Everything a task may touch.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub config: &'a SiteConfig,
    /// `None` for one-shot builds; `Task::Reload` is then a no-op.
    pub reloader: Option<&'a Reloader>,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a SiteConfig, reloader: Option<&'a Reloader>) -> Self {
        Self { config, reloader }
    }
}

#[derive(Debug, Error)]
#[error("{task} failed")]
pub struct PipelineError {
    pub task: Task,
    #[source]
    pub source: anyhow::Error,
}

impl Pipeline {
    pub fn run(&self, ctx: Context<'_>) -> Result<(), PipelineError> {
        self.run_observed(ctx, &|_| {})
    }

    /// Like [`Pipeline::run`], calling `on_task` as each task starts.
    pub fn run_observed(
        &self,
        ctx: Context<'_>,
        on_task: &(dyn Fn(Task) + Sync),
    ) -> Result<(), PipelineError> {
        debug!("pipeline"; "{}: {}", self.name(), self);
        for stage in self.stages() {
            match stage {
                Stage::Task(task) => {
                    on_task(*task);
                    run_task(*task, ctx, self.name())?;
                }
                Stage::Parallel(tasks) => {
                    let results: Vec<Result<(), PipelineError>> = tasks
                        .par_iter()
                        .map(|task| {
                            on_task(*task);
                            run_task(*task, ctx, self.name())
                        })
                        .collect();
                    // first failure in declared order
                    results.into_iter().collect::<Result<(), _>>()?;
                }
            }
        }
        Ok(())
    }
}

fn run_task(task: Task, ctx: Context<'_>, pipeline: &str) -> Result<(), PipelineError> {
    debug!("pipeline"; "→ {}", task);
    let config = ctx.config;
    let result = match task {
        Task::Clean(target) => asset::clean(config, target),
        Task::Bundle(target) => bundle::build_bundles(config, target).map(drop),
        Task::Render(mode) => template::render(config, mode).map(drop),
        Task::Favicons => asset::copy_favicons(config).map(drop),
        Task::Images(mode) => image::move_images(config, mode).map(drop),
        Task::Reload => {
            if let Some(reloader) = ctx.reloader {
                reloader.reload(pipeline);
            }
            Ok(())
        }
    };
    result.map_err(|source| PipelineError { task, source })
}
