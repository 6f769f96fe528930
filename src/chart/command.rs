use std::str::FromStr;

use super::catalog::{Condition, SurfaceTarget};
use super::tooth::{ChartError, ToothId};

/// A user action on the chart. This is the ONLY way chart state mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartCommand {
    SelectTooth(ToothId),
    SelectSurface(SurfaceTarget),
    SelectCondition(Condition),
    /// Commit the selected condition to the selected surface (or whole tooth).
    MarkCondition,
    /// Commit the selected condition to every surface of the selected tooth.
    ApplyToWholeTooth,
    ClearSelection,
}

/// Console syntax: `tooth 8`, `surface occlusal`, `condition decay`, `mark`, `whole`, `clear`.
impl FromStr for ChartCommand {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();

        match (verb.as_str(), arg) {
            ("tooth", Some(id)) => Ok(ChartCommand::SelectTooth(id.parse()?)),
            ("surface", Some(target)) => Ok(ChartCommand::SelectSurface(target.parse()?)),
            ("condition", Some(condition)) => Ok(ChartCommand::SelectCondition(condition.parse()?)),
            ("mark" | "apply", None) => Ok(ChartCommand::MarkCondition),
            ("whole", None) => Ok(ChartCommand::ApplyToWholeTooth),
            ("clear", None) => Ok(ChartCommand::ClearSelection),
            _ => Err(ChartError::UnknownCommand(s.trim().to_string())),
        }
    }
}
