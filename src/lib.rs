pub mod common;
pub mod model;
pub mod workspace;

pub use common::config::{ConfigError, WorkspaceSettings};
pub use model::tab::{DefaultPathDisplay, PathDisplay, Tab, TabDisplay, TabFactory, TabId};
pub use model::tree::{
    CloseOutcome, LayoutTree, NodeId, Orientation, Placement, SplitOutcome,
};
pub use workspace::{
    DragCoordinator, DragPayload, DragSession, NavigationBridge, Navigator, PaneResponse,
    PaneState, PaneStateStore, WorkspaceCommand, WorkspaceEngine,
};
