use std::collections::VecDeque;

use tracing::debug;

use crate::model::tree::NodeId;

/// Mutations that must not run synchronously inside the dispatch that
/// requested them, e.g. closing a pane while that pane is still being
/// rendered. The engine drains the queue once the current dispatch completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    ClosePane(NodeId),
    ActivatePane(NodeId),
}

#[derive(Default)]
pub struct EffectQueue {
    queue: VecDeque<Effect>,
}

impl EffectQueue {
    pub fn push(&mut self, effect: Effect) {
        debug!(?effect, "deferring effect");
        self.queue.push_back(effect);
    }

    pub fn pop(&mut self) -> Option<Effect> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
