//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use lesson_planner_core::ports::{LessonGenerationService, LessonPlannerRepository};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn LessonPlannerRepository>,
    /// `None` when no model is configured.
    pub generator: Option<Arc<dyn LessonGenerationService>>,
    pub config: Arc<Config>,
}
