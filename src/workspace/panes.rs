use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::collections::{HashMap, HashSet};
use crate::common::config::WorkspaceSettings;
use crate::model::tab::{Tab, TabFactory};
use crate::model::tree::NodeId;

/// Ordered tabs of one pane plus the active-tab pointer. `active` is only
/// meaningful while `tabs` is non-empty; an empty pane is legal transiently,
/// until it is closed or re-seeded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaneState {
    pub tabs: Vec<Tab>,
    pub active: usize,
}

impl PaneState {
    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }
}

/// What a store operation asks of the engine. `activated_path` means the
/// pane's active tab changed to this path (the engine navigates when the pane
/// is the globally active one); `close_panes` are panes that must be closed
/// once the current dispatch completes.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaneResponse {
    pub activated_path: Option<String>,
    pub close_panes: Vec<NodeId>,
}

/// Per-pane tab lists, keyed by pane id. Kept eventually consistent with the
/// layout tree: orphaned entries are pruned, missing entries are created on
/// first write access. Every operation validates its target and degrades to a
/// logged no-op on unknown or invalid state.
#[derive(Serialize, Deserialize)]
pub struct PaneStateStore {
    states: HashMap<NodeId, PaneState>,
    factory: TabFactory,
    max_tabs_per_pane: usize,
}

impl Default for PaneStateStore {
    fn default() -> Self {
        Self::new(TabFactory::new())
    }
}

impl PaneStateStore {
    pub fn new(factory: TabFactory) -> Self {
        PaneStateStore {
            states: HashMap::default(),
            factory,
            max_tabs_per_pane: 0,
        }
    }

    pub fn set_settings(&mut self, settings: &WorkspaceSettings) {
        self.max_tabs_per_pane = settings.max_tabs_per_pane;
    }

    fn valid_mut(&mut self, pane: NodeId) -> Option<&mut PaneState> {
        match self.states.get_mut(&pane) {
            Some(state) if state.tabs.is_empty() || state.active < state.tabs.len() => Some(state),
            Some(state) => {
                warn!(?pane, active = state.active, tabs = state.tabs.len(),
                    "active index out of range; refusing to mutate");
                None
            }
            None => {
                debug!(?pane, "no state for pane; ignoring");
                None
            }
        }
    }

    /// Read accessor. Unknown ids yield an empty state rather than failing.
    pub fn pane_state(&self, pane: NodeId) -> PaneState {
        self.states.get(&pane).cloned().unwrap_or_default()
    }

    pub fn tab_count(&self, pane: NodeId) -> usize {
        self.states.get(&pane).map_or(0, |state| state.tabs.len())
    }

    pub fn ensure_pane(&mut self, pane: NodeId) {
        self.states.entry(pane).or_default();
    }

    pub fn remove_pane(&mut self, pane: NodeId) {
        self.states.remove(&pane);
    }

    /// Prunes entries whose pane no longer exists in the layout tree.
    pub fn retain_panes(&mut self, live: &[NodeId]) {
        let live: HashSet<NodeId> = live.iter().copied().collect();
        self.states.retain(|pane, _| live.contains(pane));
    }

    /// Moves a pane's state to a new id, e.g. when a split retires the old
    /// pane id in favor of the geometry-stable child.
    pub fn rekey_pane(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        if let Some(state) = self.states.remove(&old) {
            self.states.insert(new, state);
        }
    }

    /// Appends a tab built from `path` and makes it active. Creates the
    /// pane's state if absent.
    pub fn open_tab(&mut self, pane: NodeId, path: &str) -> PaneResponse {
        let max = self.max_tabs_per_pane;
        self.ensure_pane(pane);
        let Some(state) = self.valid_mut(pane) else {
            return PaneResponse::default();
        };
        if max > 0 && state.tabs.len() >= max {
            warn!(?pane, max, "pane is at its tab limit; not opening {path}");
            return PaneResponse::default();
        }
        let tab = self.factory.make(path);
        let state = self.states.get_mut(&pane).expect("ensured above");
        state.tabs.push(tab);
        state.active = state.tabs.len() - 1;
        PaneResponse {
            activated_path: Some(path.to_owned()),
            ..Default::default()
        }
    }

    /// Closes the tab at `index`. Closing a pane's last tab closes the pane
    /// itself (deferred) when other panes exist; the only pane in the layout
    /// is allowed to end up tab-less instead.
    pub fn close_tab(&mut self, pane: NodeId, index: usize, pane_count: usize) -> PaneResponse {
        let Some(state) = self.valid_mut(pane) else {
            return PaneResponse::default();
        };
        if index >= state.tabs.len() {
            debug!(?pane, index, "close_tab: index out of range");
            return PaneResponse::default();
        }

        if state.tabs.len() == 1 {
            state.tabs.clear();
            state.active = 0;
            if pane_count > 1 {
                return PaneResponse {
                    close_panes: vec![pane],
                    ..Default::default()
                };
            }
            return PaneResponse::default();
        }

        let was_active = state.active;
        state.tabs.remove(index);
        if index == was_active {
            state.active = index.saturating_sub(1);
            PaneResponse {
                activated_path: state.tabs.get(state.active).map(|tab| tab.path.clone()),
                ..Default::default()
            }
        } else {
            if index < was_active {
                state.active = was_active - 1;
            }
            PaneResponse::default()
        }
    }

    pub fn switch_to_tab(&mut self, pane: NodeId, index: usize) -> PaneResponse {
        let Some(state) = self.valid_mut(pane) else {
            return PaneResponse::default();
        };
        let Some(tab) = state.tabs.get(index) else {
            debug!(?pane, index, "switch_to_tab: index out of range");
            return PaneResponse::default();
        };
        let path = tab.path.clone();
        state.active = index;
        PaneResponse {
            activated_path: Some(path),
            ..Default::default()
        }
    }

    /// Keeps only the tab at `index`.
    pub fn close_other_tabs(&mut self, pane: NodeId, index: usize) -> PaneResponse {
        let Some(state) = self.valid_mut(pane) else {
            return PaneResponse::default();
        };
        if index >= state.tabs.len() {
            debug!(?pane, index, "close_other_tabs: index out of range");
            return PaneResponse::default();
        }
        let active_changed = state.active != index;
        let kept = state.tabs.swap_remove(index);
        let path = kept.path.clone();
        state.tabs = vec![kept];
        state.active = 0;
        PaneResponse {
            activated_path: active_changed.then_some(path),
            ..Default::default()
        }
    }

    /// Drops every tab after `index`.
    pub fn close_tabs_to_right(&mut self, pane: NodeId, index: usize) -> PaneResponse {
        let Some(state) = self.valid_mut(pane) else {
            return PaneResponse::default();
        };
        if index >= state.tabs.len() {
            debug!(?pane, index, "close_tabs_to_right: index out of range");
            return PaneResponse::default();
        }
        state.tabs.truncate(index + 1);
        if state.active > index {
            state.active = index;
            return PaneResponse {
                activated_path: state.tabs.get(index).map(|tab| tab.path.clone()),
                ..Default::default()
            };
        }
        PaneResponse::default()
    }

    /// Splice semantics: removes the tab at `from` and reinserts it at `to`.
    /// The active index is remapped so the active tab's identity never
    /// changes.
    pub fn reorder_tabs(&mut self, pane: NodeId, from: usize, to: usize) -> PaneResponse {
        let Some(state) = self.valid_mut(pane) else {
            return PaneResponse::default();
        };
        if from >= state.tabs.len() {
            debug!(?pane, from, "reorder_tabs: index out of range");
            return PaneResponse::default();
        }
        if from == to {
            return PaneResponse::default();
        }
        let tab = state.tabs.remove(from);
        let to = to.min(state.tabs.len());
        state.tabs.insert(to, tab);

        if state.active == from {
            state.active = to;
        } else if from < state.active && to >= state.active {
            state.active -= 1;
        } else if from > state.active && to <= state.active {
            state.active += 1;
        }
        PaneResponse::default()
    }

    /// Moves a tab across panes; the moved tab becomes the destination's
    /// active tab. A negative `to_index` appends. A source pane left empty is
    /// scheduled for closing when other panes exist.
    pub fn move_tab_between_panes(
        &mut self,
        from_pane: NodeId,
        from_index: usize,
        to_pane: NodeId,
        to_index: isize,
        pane_count: usize,
    ) -> PaneResponse {
        if from_pane == to_pane {
            let to = if to_index < 0 {
                self.tab_count(to_pane).saturating_sub(1)
            } else {
                to_index as usize
            };
            return self.reorder_tabs(from_pane, from_index, to);
        }

        let Some(source) = self.valid_mut(from_pane) else {
            return PaneResponse::default();
        };
        if from_index >= source.tabs.len() {
            debug!(?from_pane, from_index, "move_tab_between_panes: index out of range");
            return PaneResponse::default();
        }

        let tab = source.tabs.remove(from_index);
        if from_index == source.active {
            source.active = from_index.saturating_sub(1);
        } else if from_index < source.active {
            source.active -= 1;
        }
        let source_emptied = source.tabs.is_empty();

        let path = tab.path.clone();
        let dest = self.states.entry(to_pane).or_default();
        let insert_at = if to_index < 0 {
            dest.tabs.len()
        } else {
            (to_index as usize).min(dest.tabs.len())
        };
        dest.tabs.insert(insert_at, tab);
        dest.active = insert_at;

        PaneResponse {
            activated_path: Some(path),
            close_panes: if source_emptied && pane_count > 1 {
                vec![from_pane]
            } else {
                vec![]
            },
        }
    }

    /// Reconciles pane state right after a split. The split pane's state
    /// follows the geometry-stable child (`original_pane`); the dragged tab
    /// leaves the effective source and becomes the sole tab of `new_pane`.
    /// When the split pane was itself the drag source, the effective source
    /// is its post-split identity.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_split_with_tab(
        &mut self,
        old_pane: NodeId,
        original_pane: NodeId,
        new_pane: NodeId,
        source_pane: NodeId,
        source_index: usize,
        pane_count: usize,
    ) -> PaneResponse {
        self.rekey_pane(old_pane, original_pane);
        let effective_source = if source_pane == old_pane {
            original_pane
        } else {
            source_pane
        };

        let Some(source) = self.valid_mut(effective_source) else {
            return PaneResponse::default();
        };
        if source_index >= source.tabs.len() {
            debug!(
                ?effective_source,
                source_index, "handle_split_with_tab: index out of range"
            );
            return PaneResponse::default();
        }

        let tab = source.tabs.remove(source_index);
        if source_index == source.active {
            source.active = source_index.saturating_sub(1);
        } else if source_index < source.active {
            source.active -= 1;
        }
        let source_emptied = source.tabs.is_empty();

        let path = tab.path.clone();
        self.states.insert(
            new_pane,
            PaneState {
                tabs: vec![tab],
                active: 0,
            },
        );

        PaneResponse {
            activated_path: Some(path),
            close_panes: if source_emptied && pane_count > 1 {
                vec![effective_source]
            } else {
                vec![]
            },
        }
    }

    /// Bulk-appends every tab of `from` onto `to`; used when panes are
    /// permanently merged. With `remove_source` the source state is deleted,
    /// otherwise it is left empty.
    pub fn transfer_tabs(&mut self, from: NodeId, to: NodeId, remove_source: bool) {
        if from == to {
            return;
        }
        let Some(source) = self.states.get_mut(&from) else {
            debug!(?from, "transfer_tabs: no state for source pane");
            return;
        };
        let moved = std::mem::take(&mut source.tabs);
        source.active = 0;
        if remove_source {
            self.states.remove(&from);
        }
        let dest = self.states.entry(to).or_default();
        dest.tabs.extend(moved);
        if !dest.tabs.is_empty() {
            dest.active = dest.active.min(dest.tabs.len() - 1);
        }
    }

    /// Write-back from the navigation side: the active tab of `pane` now
    /// points at `path`. A tab-less pane gets a brand-new tab seeded instead;
    /// a stale out-of-range active index falls back to the last tab.
    pub fn absorb_location(&mut self, pane: NodeId, path: &str) {
        self.ensure_pane(pane);
        let state = self.states.get_mut(&pane).expect("ensured above");
        if state.tabs.is_empty() {
            let tab = self.factory.make(path);
            let state = self.states.get_mut(&pane).expect("ensured above");
            state.tabs.push(tab);
            state.active = 0;
            return;
        }
        let index = state.active.min(state.tabs.len() - 1);
        let mut tab = state.tabs[index].clone();
        self.factory.relocate(&mut tab, path);
        let state = self.states.get_mut(&pane).expect("ensured above");
        state.tabs[index] = tab;
        state.active = index;
    }
}
