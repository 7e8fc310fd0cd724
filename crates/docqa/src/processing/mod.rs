//! Document submission and the stage-by-stage pipeline

mod pipeline;
mod submitter;

pub use pipeline::Pipeline;
pub use submitter::{DocumentSubmitter, Submission, UploadLease};
