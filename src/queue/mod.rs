// Background job processing

pub mod jobs;
pub mod workers;

pub use jobs::SplitJob;
pub use workers::Worker;
