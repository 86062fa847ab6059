use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::config::WorkspaceSettings;
use crate::model::tab::TabFactory;
use crate::model::tree::{
    CloseOutcome, LayoutTree, NodeId, Orientation, Placement, SplitOutcome,
};
use crate::workspace::drag::{DragCoordinator, DragPayload, DragSession};
use crate::workspace::effects::{Effect, EffectQueue};
use crate::workspace::navigation::{NavigationBridge, Navigator};
use crate::workspace::panes::{PaneResponse, PaneState, PaneStateStore};

/// User-gesture-level operations, one variant per renderer callback.
#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceCommand {
    OpenTab { pane: NodeId, path: String },
    CloseTab { pane: NodeId, index: usize },
    SwitchToTab { pane: NodeId, index: usize },
    CloseOtherTabs { pane: NodeId, index: usize },
    CloseTabsToRight { pane: NodeId, index: usize },
    ReorderTabs { pane: NodeId, from: usize, to: usize },
    MoveTab {
        from_pane: NodeId,
        from_index: usize,
        to_pane: NodeId,
        to_index: isize,
    },
    FocusPane { pane: NodeId },
    SplitPane {
        pane: NodeId,
        orientation: Orientation,
        placement: Placement,
    },
    ClosePane { pane: NodeId },
    MergePanes { from: NodeId, to: NodeId },
    ResizeSplit { split: NodeId, sizes: [f64; 2] },
    BeginTabDrag { pane: NodeId, index: usize },
    CancelDrag,
    DropOnTabBar { pane: NodeId, to_index: isize },
    DropOnSplitZone {
        pane: NodeId,
        orientation: Orientation,
        placement: Placement,
    },
}

/// Owns the layout tree, the per-pane tab lists, the drag session, and the
/// navigation bridge, and keeps them consistent across every gesture.
///
/// Everything runs synchronously inside one dispatch; mutations that must not
/// run mid-dispatch (closing a pane that may still be rendering) go through
/// the effect queue, which is drained at the end of each public operation.
#[derive(Serialize, Deserialize)]
pub struct WorkspaceEngine {
    tree: LayoutTree,
    panes: PaneStateStore,
    #[serde(skip)]
    drag: DragCoordinator,
    #[serde(skip)]
    bridge: NavigationBridge,
    #[serde(skip)]
    effects: EffectQueue,
    active_pane: NodeId,
    settings: WorkspaceSettings,
}

impl Default for WorkspaceEngine {
    fn default() -> Self {
        Self::new(WorkspaceSettings::default())
    }
}

impl WorkspaceEngine {
    pub fn new(settings: WorkspaceSettings) -> Self {
        Self::with_factory(settings, TabFactory::new())
    }

    /// Builds an engine whose tabs derive their display data from a custom
    /// [`PathDisplay`](crate::model::tab::PathDisplay).
    pub fn with_factory(settings: WorkspaceSettings, factory: TabFactory) -> Self {
        let tree = LayoutTree::new();
        let active_pane = tree.first_pane();
        let mut panes = PaneStateStore::new(factory);
        panes.set_settings(&settings);
        if !settings.default_path.is_empty() {
            let _ = panes.open_tab(active_pane, &settings.default_path);
        }
        WorkspaceEngine {
            tree,
            panes,
            drag: DragCoordinator::default(),
            bridge: NavigationBridge::default(),
            effects: EffectQueue::default(),
            active_pane,
            settings,
        }
    }

    pub fn set_settings(&mut self, settings: &WorkspaceSettings) {
        self.settings = settings.clone();
        self.panes.set_settings(settings);
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn active_pane(&self) -> NodeId {
        self.active_pane
    }

    pub fn pane_state(&self, pane: NodeId) -> PaneState {
        self.panes.pane_state(pane)
    }

    pub fn drag_session(&self) -> Option<DragSession> {
        self.drag.session()
    }

    pub fn handle_command(&mut self, command: WorkspaceCommand, nav: &mut dyn Navigator) {
        use WorkspaceCommand::*;
        match command {
            OpenTab { pane, path } => self.open_tab(pane, &path, nav),
            CloseTab { pane, index } => self.close_tab(pane, index, nav),
            SwitchToTab { pane, index } => self.switch_to_tab(pane, index, nav),
            CloseOtherTabs { pane, index } => self.close_other_tabs(pane, index, nav),
            CloseTabsToRight { pane, index } => self.close_tabs_to_right(pane, index, nav),
            ReorderTabs { pane, from, to } => self.reorder_tabs(pane, from, to, nav),
            MoveTab {
                from_pane,
                from_index,
                to_pane,
                to_index,
            } => self.move_tab(from_pane, from_index, to_pane, to_index, nav),
            FocusPane { pane } => self.focus_pane(pane, nav),
            SplitPane {
                pane,
                orientation,
                placement,
            } => {
                let _ = self.split_pane(pane, orientation, placement);
            }
            ClosePane { pane } => self.close_pane(pane, nav),
            MergePanes { from, to } => self.merge_panes(from, to, nav),
            ResizeSplit { split, sizes } => self.update_split_sizes(split, sizes),
            BeginTabDrag { pane, index } => self.begin_tab_drag(pane, index),
            CancelDrag => self.cancel_drag(),
            DropOnTabBar { pane, to_index } => self.drop_on_tab_bar(pane, to_index, nav),
            DropOnSplitZone {
                pane,
                orientation,
                placement,
            } => self.drop_on_split_zone(pane, orientation, placement, nav),
        }
    }

    pub fn open_tab(&mut self, pane: NodeId, path: &str, nav: &mut dyn Navigator) {
        if !self.tree.is_pane(pane) {
            debug!(?pane, "open_tab: unknown pane");
            return;
        }
        let response = self.panes.open_tab(pane, path);
        self.apply(pane, response, nav);
    }

    pub fn close_tab(&mut self, pane: NodeId, index: usize, nav: &mut dyn Navigator) {
        let response = self.panes.close_tab(pane, index, self.tree.pane_count());
        self.apply(pane, response, nav);
    }

    pub fn switch_to_tab(&mut self, pane: NodeId, index: usize, nav: &mut dyn Navigator) {
        let response = self.panes.switch_to_tab(pane, index);
        self.apply(pane, response, nav);
    }

    pub fn close_other_tabs(&mut self, pane: NodeId, index: usize, nav: &mut dyn Navigator) {
        let response = self.panes.close_other_tabs(pane, index);
        self.apply(pane, response, nav);
    }

    pub fn close_tabs_to_right(&mut self, pane: NodeId, index: usize, nav: &mut dyn Navigator) {
        let response = self.panes.close_tabs_to_right(pane, index);
        self.apply(pane, response, nav);
    }

    pub fn reorder_tabs(&mut self, pane: NodeId, from: usize, to: usize, nav: &mut dyn Navigator) {
        let response = self.panes.reorder_tabs(pane, from, to);
        self.apply(pane, response, nav);
    }

    pub fn move_tab(
        &mut self,
        from_pane: NodeId,
        from_index: usize,
        to_pane: NodeId,
        to_index: isize,
        nav: &mut dyn Navigator,
    ) {
        if !self.tree.is_pane(to_pane) {
            debug!(?to_pane, "move_tab: unknown destination pane");
            return;
        }
        let response = self.panes.move_tab_between_panes(
            from_pane,
            from_index,
            to_pane,
            to_index,
            self.tree.pane_count(),
        );
        self.apply(to_pane, response, nav);
    }

    pub fn focus_pane(&mut self, pane: NodeId, nav: &mut dyn Navigator) {
        self.set_active_pane(pane, nav);
    }

    /// Splits a pane in two. The split pane's tabs follow the
    /// geometry-stable child, which also inherits active-pane status when the
    /// split pane was active.
    pub fn split_pane(
        &mut self,
        pane: NodeId,
        orientation: Orientation,
        placement: Placement,
    ) -> Option<SplitOutcome> {
        let outcome = self.tree.split_pane(pane, orientation, placement)?;
        self.panes.rekey_pane(pane, outcome.original);
        if self.active_pane == pane {
            // same logical pane, not a focus transition
            self.active_pane = outcome.original;
        }
        Some(outcome)
    }

    pub fn close_pane(&mut self, pane: NodeId, nav: &mut dyn Navigator) {
        match self.tree.close_pane(pane) {
            CloseOutcome::Removed => {
                self.panes.remove_pane(pane);
                if !self.tree.is_pane(self.active_pane) {
                    self.set_active_pane(self.tree.first_pane(), nav);
                }
            }
            CloseOutcome::Reset(fresh) => {
                self.panes.remove_pane(pane);
                self.set_active_pane(fresh, nav);
            }
            CloseOutcome::NotFound => {}
        }
        self.drain_effects(nav);
    }

    /// Merges `from` into `to`: every tab moves over, then the emptied pane
    /// is closed.
    pub fn merge_panes(&mut self, from: NodeId, to: NodeId, nav: &mut dyn Navigator) {
        if from == to || !self.tree.is_pane(from) || !self.tree.is_pane(to) {
            debug!(?from, ?to, "merge_panes: invalid pane pair");
            return;
        }
        self.panes.transfer_tabs(from, to, true);
        self.close_pane(from, nav);
    }

    pub fn update_split_sizes(&mut self, split: NodeId, sizes: [f64; 2]) {
        self.tree.update_split_sizes(split, sizes);
    }

    pub fn begin_tab_drag(&mut self, pane: NodeId, index: usize) {
        let count = self.panes.tab_count(pane);
        if index >= count {
            debug!(?pane, index, "begin_tab_drag: no such tab");
            return;
        }
        self.drag.begin(pane, index, count);
    }

    /// Serialized payload for the host drag-and-drop system, if a drag is
    /// live.
    pub fn drag_payload(&self) -> Option<String> {
        self.drag.session().and_then(|session| DragPayload::from(session).to_json().ok())
    }

    /// Restores a drag session from a payload carried by the host
    /// drag-and-drop system. Malformed input means no drag in progress.
    pub fn accept_drag_payload(&mut self, raw: &str) {
        if let Some(payload) = DragPayload::from_json(raw) {
            self.drag.begin(payload.pane_id, payload.tab_index, payload.tab_count);
        }
    }

    pub fn cancel_drag(&mut self) {
        let _ = self.drag.end();
    }

    /// Drops the dragged tab into another pane's tab bar at `to_index`
    /// (negative appends).
    pub fn drop_on_tab_bar(&mut self, pane: NodeId, to_index: isize, nav: &mut dyn Navigator) {
        let Some(session) = self.drag.end() else {
            debug!(?pane, "drop without a live drag session");
            return;
        };
        if !self.tree.is_pane(pane) {
            debug!(?pane, "drop_on_tab_bar: unknown pane");
            return;
        }
        let response = self.panes.move_tab_between_panes(
            session.source_pane,
            session.tab_index,
            pane,
            to_index,
            self.tree.pane_count(),
        );
        self.apply(pane, response, nav);
    }

    /// Drops the dragged tab into a split zone of `pane`, creating a new
    /// sibling pane that holds just that tab and becomes active. Dragging a
    /// pane's only tab onto its own split zone is rejected before any
    /// mutation.
    pub fn drop_on_split_zone(
        &mut self,
        pane: NodeId,
        orientation: Orientation,
        placement: Placement,
        nav: &mut dyn Navigator,
    ) {
        let Some(session) = self.drag.end() else {
            debug!(?pane, "drop without a live drag session");
            return;
        };
        if session.is_sole_tab_of(pane) {
            debug!(?pane, "rejecting split: pane's only tab dragged onto its own split zone");
            return;
        }
        if !self.tree.is_pane(pane) {
            debug!(?pane, "drop_on_split_zone: unknown pane");
            return;
        }
        if session.tab_index >= self.panes.tab_count(session.source_pane) {
            debug!(?session, "drop_on_split_zone: stale drag session");
            return;
        }
        let Some(SplitOutcome { original, new }) =
            self.tree.split_pane(pane, orientation, placement)
        else {
            return;
        };
        let response = self.panes.handle_split_with_tab(
            pane,
            original,
            new,
            session.source_pane,
            session.tab_index,
            self.tree.pane_count(),
        );
        if self.active_pane == pane {
            self.active_pane = original;
        }
        for id in response.close_panes {
            self.effects.push(Effect::ClosePane(id));
        }
        self.set_active_pane(new, nav);
        self.drain_effects(nav);
    }

    /// Feed of host location changes; reads the new location back from the
    /// navigator.
    pub fn location_changed(&mut self, nav: &dyn Navigator) {
        let path = nav.current_path();
        self.bridge.location_changed(&mut self.panes, self.active_pane, &path);
    }

    fn apply(&mut self, pane: NodeId, response: PaneResponse, nav: &mut dyn Navigator) {
        if let Some(path) = response.activated_path
            && pane == self.active_pane
        {
            self.bridge.navigate(nav, &path);
        }
        for id in response.close_panes {
            self.effects.push(Effect::ClosePane(id));
        }
        self.drain_effects(nav);
    }

    fn set_active_pane(&mut self, pane: NodeId, nav: &mut dyn Navigator) {
        if !self.tree.is_pane(pane) {
            debug!(?pane, "cannot focus: not a pane");
            return;
        }
        if self.active_pane == pane {
            return;
        }
        self.active_pane = pane;
        self.bridge.pane_activated(&self.panes, pane, nav);
    }

    fn drain_effects(&mut self, nav: &mut dyn Navigator) {
        while let Some(effect) = self.effects.pop() {
            match effect {
                Effect::ClosePane(pane) => self.run_deferred_close(pane),
                Effect::ActivatePane(pane) => {
                    let target = if self.tree.is_pane(pane) {
                        pane
                    } else {
                        self.tree.first_pane()
                    };
                    self.set_active_pane(target, nav);
                }
            }
        }
    }

    fn run_deferred_close(&mut self, pane: NodeId) {
        if !self.tree.is_pane(pane) {
            debug!(?pane, "deferred close: pane already gone");
            return;
        }
        // a pane re-seeded with tabs since scheduling stays alive
        if !self.panes.pane_state(pane).tabs.is_empty() {
            debug!(?pane, "deferred close: pane holds tabs again, skipping");
            return;
        }
        match self.tree.close_pane(pane) {
            CloseOutcome::Removed => {
                self.panes.remove_pane(pane);
                if !self.tree.is_pane(self.active_pane) {
                    self.effects.push(Effect::ActivatePane(self.tree.first_pane()));
                }
            }
            CloseOutcome::Reset(fresh) => {
                self.panes.remove_pane(pane);
                self.effects.push(Effect::ActivatePane(fresh));
            }
            CloseOutcome::NotFound => {}
        }
        self.panes.retain_panes(&self.tree.pane_ids());
    }
}
