/// Editing operations over a persisted model
pub mod model_service;
