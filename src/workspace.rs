pub mod drag;
pub(crate) mod effects;
pub mod engine;
pub mod navigation;
pub mod panes;

pub use drag::{DragCoordinator, DragPayload, DragPayloadError, DragSession};
pub(crate) use effects::{Effect, EffectQueue};
pub use engine::{WorkspaceCommand, WorkspaceEngine};
pub use navigation::{NavigationBridge, Navigator};
pub use panes::{PaneResponse, PaneState, PaneStateStore};
