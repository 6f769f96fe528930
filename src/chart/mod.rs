//! Tooth/surface state model and the selection protocol that mutates it.

pub mod catalog;
pub mod command;
pub mod layout;
pub mod state;
pub mod tooth;

pub use catalog::{Condition, Surface, SurfaceTarget, TreatmentInfo};
pub use command::ChartCommand;
pub use layout::ChartLayout;
pub use state::ChartState;
pub use tooth::{ChartError, Quadrant, Tooth, ToothId, ToothKind};
