// Orchestration around the pure matching engine: the model collaborator seam,
// its cache, the batch worker pool and the HTTP handlers.
pub mod batch;
pub mod cache;
pub mod handlers;
pub mod model_assessor;
pub mod prompts;
