mod handle;
mod messages;
mod runner;

pub use handle::PipelineHandle;
pub use messages::{PipelineError, PipelineStatus};
pub use runner::PipelineActor;
