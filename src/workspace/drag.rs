use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::tree::NodeId;

/// The single in-flight tab drag. Drop targets anywhere in the tree read this
/// to decide what a drop would mean; `tab_count` is a snapshot of the source
/// pane's tab count taken at drag start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragSession {
    pub source_pane: NodeId,
    pub tab_index: usize,
    pub tab_count: usize,
}

impl DragSession {
    /// True when dropping on `target`'s split zone would split a pane using
    /// its own only tab, which would leave that pane empty while also being
    /// its own destination.
    pub fn is_sole_tab_of(&self, target: NodeId) -> bool {
        self.source_pane == target && self.tab_count <= 1
    }
}

/// Owns the one allowed drag session. Created at drag start, destroyed at
/// drop or drag end; consumers must check liveness through [`session`] before
/// acting.
///
/// [`session`]: DragCoordinator::session
#[derive(Default)]
pub struct DragCoordinator {
    session: Option<DragSession>,
}

impl DragCoordinator {
    /// Starts a drag, replacing any stale leftover session.
    pub fn begin(&mut self, source_pane: NodeId, tab_index: usize, tab_count: usize) {
        if let Some(stale) = self.session.take() {
            warn!(?stale, "drag started while another session was live; replacing");
        }
        self.session = Some(DragSession {
            source_pane,
            tab_index,
            tab_count,
        });
    }

    /// Ends the drag, returning the session if one was live.
    pub fn end(&mut self) -> Option<DragSession> {
        self.session.take()
    }

    pub fn session(&self) -> Option<DragSession> {
        self.session
    }
}

#[derive(Debug, Error)]
pub enum DragPayloadError {
    #[error("malformed drag payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The structured transfer type carried by the host drag-and-drop system.
/// Absence or parse failure means "no drag in progress", never an error to
/// the gesture handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPayload {
    pub pane_id: NodeId,
    pub tab_index: usize,
    pub tab_count: usize,
}

impl From<DragSession> for DragPayload {
    fn from(session: DragSession) -> Self {
        DragPayload {
            pane_id: session.source_pane,
            tab_index: session.tab_index,
            tab_count: session.tab_count,
        }
    }
}

impl From<DragPayload> for DragSession {
    fn from(payload: DragPayload) -> Self {
        DragSession {
            source_pane: payload.pane_id,
            tab_index: payload.tab_index,
            tab_count: payload.tab_count,
        }
    }
}

impl DragPayload {
    pub fn to_json(&self) -> Result<String, DragPayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a payload, treating malformed input as a cancelled drop.
    pub fn from_json(raw: &str) -> Option<DragPayload> {
        match serde_json::from_str(raw) {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!(%err, "dropping malformed drag payload");
                None
            }
        }
    }
}

impl Drop for DragCoordinator {
    fn drop(&mut self) {
        if let Some(session) = self.session {
            debug!(?session, "drag coordinator dropped with a live session");
        }
    }
}
