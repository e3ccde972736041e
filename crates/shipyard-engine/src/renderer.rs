//! Concurrent rendering of value files
//!
//! Every file is rendered in place by its own task. The operation waits for
//! all of them and fails if any failed; files rendered before the failure are
//! left rendered, nothing is rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use minijinja::Value;
use shipyard_core::TemplateContext;
use tracing::debug;

use crate::engine::Engine;
use crate::error::{EngineError, Result};

/// Renders a list of value files against one shared context
#[derive(Clone)]
pub struct ValueFileRenderer {
    engine: Arc<Engine>,
}

impl ValueFileRenderer {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Renderer with the default engine configuration
    pub fn lenient() -> Result<Self> {
        Ok(Self::new(Engine::lenient()?))
    }

    /// Render every file in place
    ///
    /// On failure, the error of the first failing file in list order is
    /// returned, regardless of which task finished first.
    pub async fn render_files(&self, files: &[PathBuf], context: &TemplateContext) -> Result<()> {
        debug!(
            files = ?files,
            "rendering value files"
        );

        let ctx = Arc::new(Engine::context_value(context));

        let tasks = files.iter().cloned().map(|path| {
            let engine = Arc::clone(&self.engine);
            let ctx = Arc::clone(&ctx);
            let task_path = path.clone();
            let handle = tokio::spawn(async move { render_file(&engine, &task_path, &ctx).await });

            async move {
                match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(EngineError::Join {
                        path,
                        message: e.to_string(),
                    }),
                }
            }
        });

        join_all(tasks).await.into_iter().collect::<Result<Vec<()>>>()?;
        Ok(())
    }
}

async fn render_file(engine: &Engine, path: &Path, ctx: &Value) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| EngineError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let name = path.to_string_lossy();
    let rendered = engine
        .render_string(&content, ctx, &name)
        .map_err(|source| EngineError::Template {
            path: path.to_path_buf(),
            source,
        })?;

    tokio::fs::write(path, rendered)
        .await
        .map_err(|source| EngineError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), "rendered value file");
    Ok(())
}
