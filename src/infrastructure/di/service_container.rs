//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::RenderService;
use crate::config::Settings;
use crate::domain::Evaluator;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    render: RenderService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let evaluator = Evaluator::new(settings.evaluation.to_options());
        let render = RenderService::new(Arc::clone(&fs), evaluator);
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            render,
        }
    }

    pub fn render_service(&self) -> &RenderService {
        &self.render
    }
}
