/// Assembles the three read-only views a host needs to render and inspect a
/// built system into a single serializable snapshot (engine design §4.6).
use serde::Serialize;

use crate::core::sequential_model::SequentialModel;
use crate::error::SystemError;
use crate::views::components::{components_view, Component};
use crate::views::cutaway::CutawayView;
use crate::views::paraxial::{ParaxialView, ParaxialViewDescription};

/// A complete, serializable snapshot of a built system: its components,
/// its geometric cutaway, and its paraxial first-order properties.
#[derive(Debug, Serialize)]
pub struct Description {
    pub components: Vec<Component>,
    pub cutaway: CutawayView,
    pub paraxial: ParaxialViewDescription,
}

impl Description {
    pub(crate) fn new(
        sequential_model: &SequentialModel,
        paraxial_view: &ParaxialView,
    ) -> Result<Self, SystemError> {
        let components = components_view(sequential_model).map_err(|e| {
            SystemError::shape_invalid(format!("could not group components: {e}"))
        })?;
        let cutaway = CutawayView::new(sequential_model);
        let paraxial = paraxial_view.describe();

        Ok(Self {
            components,
            cutaway,
            paraxial,
        })
    }
}
