//! Command dispatch and the selectable action surface.
//!
//! Derives the slot/look choice lists from the cached catalog on demand
//! (never cached separately, so they are always in step with the latest
//! fetch) and translates a selected `(slot, look)` pair into the ordered
//! changeDevice → applyGrade frame sequence.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::debug;

use crate::adapter::Adapter;
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::protocol::message::Outbound;

// ============================================================================
// Constants
// ============================================================================

/// Pause after the command pair, giving the server time to settle before
/// the caller issues anything else. No protocol action follows it.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Identifier of the single exposed action.
pub const APPLY_GRADE_ACTION: &str = "apply_grade";

// ============================================================================
// Choice Types
// ============================================================================

/// One selectable entry in an action option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Stable identifier (slot index as string, or look uid).
    pub id: String,
    /// Operator-facing label.
    pub label: String,
}

/// One dropdown of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOption {
    /// Option identifier within the action.
    pub id: String,
    /// Operator-facing label.
    pub label: String,
    /// Current selectable values.
    pub choices: Vec<Choice>,
}

/// One action exposed to the host boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    /// Action identifier.
    pub id: String,
    /// Operator-facing label.
    pub label: String,
    /// Selectable options.
    pub options: Vec<ActionOption>,
}

// ============================================================================
// Choice Derivation
// ============================================================================

pub(crate) fn build_slot_choices(catalog: &Catalog) -> Vec<Choice> {
    catalog
        .slots
        .iter()
        .map(|slot| Choice {
            id: slot.index.to_string(),
            label: slot.display_label(),
        })
        .collect()
}

pub(crate) fn build_look_choices(catalog: &Catalog) -> Vec<Choice> {
    catalog
        .looks
        .iter()
        .map(|look| Choice {
            id: look.uid.clone(),
            label: look.name.clone(),
        })
        .collect()
}

pub(crate) fn build_action_definitions(catalog: &Catalog) -> Vec<ActionDefinition> {
    vec![ActionDefinition {
        id: APPLY_GRADE_ACTION.to_string(),
        label: "Apply grade to slot".to_string(),
        options: vec![
            ActionOption {
                id: "slot".to_string(),
                label: "Slot".to_string(),
                choices: build_slot_choices(catalog),
            },
            ActionOption {
                id: "look".to_string(),
                label: "Look".to_string(),
                choices: build_look_choices(catalog),
            },
        ],
    }]
}

// ============================================================================
// Adapter - Dispatch API
// ============================================================================

impl Adapter {
    /// Slot choices derived from the current catalog, in server order.
    #[must_use]
    pub fn slot_choices(&self) -> Vec<Choice> {
        self.inner.with_catalog(build_slot_choices)
    }

    /// Look choices derived from the current catalog, in server order.
    #[must_use]
    pub fn look_choices(&self) -> Vec<Choice> {
        self.inner.with_catalog(build_look_choices)
    }

    /// The exposed action list, rebuilt from the current catalog.
    #[must_use]
    pub fn action_definitions(&self) -> Vec<ActionDefinition> {
        self.inner.with_catalog(build_action_definitions)
    }

    /// Applies a stored look to a device slot.
    ///
    /// Sends, strictly ordered, a change-active-slot command then an
    /// apply-grade command, and resolves after the settling delay. The pair
    /// is forwarded as-is; the server is responsible for rejecting unknown
    /// indexes or uids.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no channel is currently open
    /// - [`Error::ConnectionClosed`] if the channel went away mid-dispatch
    pub async fn apply_grade(&self, slot_index: i64, look_uid: &str) -> Result<()> {
        let link = self.inner.link().ok_or(Error::NotConnected)?;

        link.send(Outbound::change_device(slot_index))
            .map_err(|_| Error::ConnectionClosed)?;
        link.send(Outbound::apply_grade(look_uid))
            .map_err(|_| Error::ConnectionClosed)?;

        debug!(slot = slot_index, uid = look_uid, "grade apply dispatched");
        sleep(SETTLE_DELAY).await;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
