pub mod audio;
pub mod chart;
pub mod config;
pub mod patient;
pub mod plan;
pub mod session;
pub mod speech;

// Re-export specific items for convenient access
pub use chart::{ChartCommand, ChartState, Condition, Surface, SurfaceTarget, ToothId};
pub use config::Config;
pub use plan::TreatmentPlan;
pub use session::ExamSession;
