use serde::Serialize;
use tracing::debug;

use super::catalog::{Condition, Surface, SurfaceTarget};
use super::command::ChartCommand;
use super::tooth::{Tooth, ToothId};

/// The chart of one exam session: 32 teeth plus the current selection.
///
/// Selection is a single `selected_tooth` slot, so at most one tooth
/// reads as selected at any time.
#[derive(Debug, Clone, Serialize)]
pub struct ChartState {
    teeth: Vec<Tooth>,
    selected_tooth: Option<ToothId>,
    selected_surface: Option<SurfaceTarget>,
    selected_condition: Condition,
    /// Monotonic, bumped on every observable change.
    pub version: u64,
}

impl Default for ChartState {
    fn default() -> Self {
        Self {
            teeth: ToothId::all().map(Tooth::new).collect(),
            selected_tooth: None,
            selected_surface: None,
            selected_condition: Condition::default(),
            version: 0,
        }
    }
}

impl ChartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one command. Returns whether anything changed.
    pub fn reduce(&mut self, command: ChartCommand) -> bool {
        let changed = match command {
            ChartCommand::SelectTooth(id) => {
                let changed = self.selected_tooth != Some(id);
                self.selected_tooth = Some(id);
                changed
            }
            ChartCommand::SelectSurface(target) => {
                let changed = self.selected_surface != Some(target);
                self.selected_surface = Some(target);
                changed
            }
            ChartCommand::SelectCondition(condition) => {
                let changed = self.selected_condition != condition;
                self.selected_condition = condition;
                changed
            }
            ChartCommand::MarkCondition => match (self.selected_tooth, self.selected_surface) {
                (Some(id), Some(SurfaceTarget::WholeTooth)) => self.fill_tooth(id),
                (Some(id), Some(SurfaceTarget::Surface(surface))) => {
                    let condition = self.selected_condition;
                    self.tooth_mut(id).set(surface, condition)
                }
                _ => {
                    debug!("Mark ignored: tooth={:?} surface={:?}", self.selected_tooth, self.selected_surface);
                    false
                }
            },
            ChartCommand::ApplyToWholeTooth => match self.selected_tooth {
                Some(id) => self.fill_tooth(id),
                None => false,
            },
            ChartCommand::ClearSelection => {
                let changed = self.selected_tooth.is_some() || self.selected_surface.is_some();
                self.selected_tooth = None;
                self.selected_surface = None;
                changed
            }
        };

        if changed {
            self.version += 1;
        }
        changed
    }

    // Fan-out covers all seven surfaces regardless of tooth kind.
    fn fill_tooth(&mut self, id: ToothId) -> bool {
        let condition = self.selected_condition;
        let tooth = self.tooth_mut(id);
        Surface::ALL
            .iter()
            .fold(false, |changed, surface| tooth.set(*surface, condition) || changed)
    }

    fn tooth_mut(&mut self, id: ToothId) -> &mut Tooth {
        &mut self.teeth[id.index()]
    }

    pub fn select_tooth(&mut self, id: ToothId) -> bool {
        self.reduce(ChartCommand::SelectTooth(id))
    }

    pub fn select_surface(&mut self, target: impl Into<SurfaceTarget>) -> bool {
        self.reduce(ChartCommand::SelectSurface(target.into()))
    }

    pub fn select_condition(&mut self, condition: Condition) -> bool {
        self.reduce(ChartCommand::SelectCondition(condition))
    }

    pub fn mark_condition(&mut self) -> bool {
        self.reduce(ChartCommand::MarkCondition)
    }

    pub fn apply_to_whole_tooth(&mut self) -> bool {
        self.reduce(ChartCommand::ApplyToWholeTooth)
    }

    pub fn clear_selection(&mut self) -> bool {
        self.reduce(ChartCommand::ClearSelection)
    }

    // Read-only accessors for renderers and the plan deriver
    pub fn tooth(&self, id: ToothId) -> &Tooth {
        &self.teeth[id.index()]
    }

    /// Teeth in ascending id order.
    pub fn teeth(&self) -> &[Tooth] {
        &self.teeth
    }

    pub fn selected_tooth(&self) -> Option<ToothId> {
        self.selected_tooth
    }

    pub fn selected_surface(&self) -> Option<SurfaceTarget> {
        self.selected_surface
    }

    pub fn selected_condition(&self) -> Condition {
        self.selected_condition
    }

    pub fn is_selected(&self, id: ToothId) -> bool {
        self.selected_tooth == Some(id)
    }

    pub fn selected_teeth(&self) -> impl Iterator<Item = &Tooth> + '_ {
        self.teeth.iter().filter(|tooth| self.is_selected(tooth.id))
    }
}
