use tracing::debug;

use crate::model::tree::NodeId;
use crate::workspace::panes::PaneStateStore;

/// The only surface the engine has into the host's navigation system.
pub trait Navigator {
    fn navigate_to(&mut self, path: &str);
    fn current_path(&self) -> String;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum NavState {
    #[default]
    Idle,
    /// The store just asked the host to navigate; the next observed location
    /// change is the echo of that call and must not be written back.
    ProgrammaticNavigationPending,
}

/// Reconciles the active pane's active tab with the host navigation system.
///
/// Two inputs: "active pane changed" (navigate to the pane's remembered path)
/// and "location changed" (write the new path back into the active tab). The
/// explicit state machine breaks the feedback loop between the two.
#[derive(Default)]
pub struct NavigationBridge {
    state: NavState,
}

impl NavigationBridge {
    /// Store-originated navigation. Arms the latch so the echoing location
    /// change is swallowed instead of being written back into the store.
    pub fn navigate(&mut self, nav: &mut dyn Navigator, path: &str) {
        self.state = NavState::ProgrammaticNavigationPending;
        nav.navigate_to(path);
    }

    /// Called on a genuine active-pane transition: navigates to the newly
    /// active pane's active tab. A stale out-of-range index falls back to the
    /// last tab; a tab-less pane navigates nowhere.
    pub fn pane_activated(
        &mut self,
        store: &PaneStateStore,
        pane: NodeId,
        nav: &mut dyn Navigator,
    ) {
        let state = store.pane_state(pane);
        if state.tabs.is_empty() {
            debug!(?pane, "activated pane has no tabs; skipping navigation");
            return;
        }
        let index = state.active.min(state.tabs.len() - 1);
        let path = state.tabs[index].path.clone();
        self.navigate(nav, &path);
    }

    /// Called whenever the host location changes while the active pane is
    /// unchanged. Covers in-page navigation within the same tab.
    pub fn location_changed(&mut self, store: &mut PaneStateStore, active_pane: NodeId, path: &str) {
        if self.state == NavState::ProgrammaticNavigationPending {
            self.state = NavState::Idle;
            return;
        }
        store.absorb_location(active_pane, path);
    }
}
