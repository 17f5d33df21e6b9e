//! Document conversion backends and the background processing pipeline.

pub mod backend;
pub mod mock;
pub mod pipeline;

pub use backend::HttpConvertBackend;
pub use mock::MockConvertBackend;
pub use pipeline::ProcessingPipeline;
