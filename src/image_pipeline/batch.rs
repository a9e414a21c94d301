mod pipeline;
mod report;
mod staging;

pub use pipeline::AnnotationPipeline;
pub use report::{BatchReport, UnitOutcome};
pub use staging::{promote, promote_all, StagingDir};
