//! The correlation pipeline: window processing, public entry points, and
//! the scheduled-driver plan.

pub mod facade;
pub mod processor;
pub mod schedule;

pub use facade::{PearsonPipeline, RunSummary};
pub use processor::{Assessor, WindowProcessor};
pub use schedule::{PlannedRun, plan_for};
