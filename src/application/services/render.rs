//! Render service: load formula documents, render them, write the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::application::loader::{parse_source, SourceFormat};
use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{Evaluator, Node, Rendering};
use crate::infrastructure::traits::FileSystem;

/// Outcome of rendering one file of a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub result: ApplicationResult<Rendering>,
}

/// Formula rendering service.
pub struct RenderService {
    fs: Arc<dyn FileSystem>,
    evaluator: Evaluator,
}

impl RenderService {
    pub fn new(fs: Arc<dyn FileSystem>, evaluator: Evaluator) -> Self {
        Self { fs, evaluator }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Read and parse a formula file.
    ///
    /// The format is taken from `format` or, when `None`, from the extension.
    pub fn load(&self, path: &Path, format: Option<SourceFormat>) -> ApplicationResult<Node> {
        let format = format.unwrap_or_else(|| SourceFormat::from_path(path));
        debug!("load: path={}, format={}", path.display(), format.label());
        let source = self
            .fs
            .read_to_string(path)
            .with_path_context("read formula", path)?;
        parse_source(&source, format, &path.display().to_string())
    }

    pub fn render_node(&self, node: &Node) -> ApplicationResult<Rendering> {
        Ok(self.evaluator.render(node)?)
    }

    pub fn render_source(
        &self,
        source: &str,
        format: SourceFormat,
        origin: &str,
    ) -> ApplicationResult<Rendering> {
        let node = parse_source(source, format, origin)?;
        self.render_node(&node)
    }

    pub fn render_file(
        &self,
        path: &Path,
        format: Option<SourceFormat>,
    ) -> ApplicationResult<Rendering> {
        let node = self.load(path, format)?;
        let rendering = self.render_node(&node)?;
        info!("rendered {}", path.display());
        Ok(rendering)
    }

    /// Render all `paths` in parallel.
    ///
    /// Every file gets an entry, in input order; one failure does not stop
    /// the others.
    pub fn render_many(&self, paths: &[PathBuf], format: Option<SourceFormat>) -> Vec<BatchEntry> {
        debug!("render_many: {} files", paths.len());
        let entries: Vec<BatchEntry> = paths
            .par_iter()
            .map(|path| BatchEntry {
                path: path.clone(),
                result: self.render_file(path, format),
            })
            .collect();

        let failed = entries.iter().filter(|e| e.result.is_err()).count();
        debug!("render_many: {} ok, {} failed", entries.len() - failed, failed);
        entries
    }

    /// Write `content` to `path`, creating parent directories.
    pub fn write(&self, path: &Path, content: &str) -> ApplicationResult<()> {
        debug!("write: path={}", path.display());
        self.fs
            .ensure_parent(path)
            .with_path_context("create parent directory", path)?;
        self.fs
            .write(path, content)
            .with_path_context("write formula", path)
    }
}
