//! Selection-set management for the node panel.
//!
//! The selection manager is the single source of truth for which backing
//! objects are selected, independent of widget lifetime. It also owns the
//! click-then-maybe-drag state machine: a left-press on an already-selected
//! node in a multi-selection must not collapse the selection until mouse-up,
//! so the whole selection can be dragged together.

use crate::constants;
use crate::types::NodeId;
use eframe::egui;
use std::collections::HashSet;

/// A change notification drained by editor chrome once per frame.
///
/// Plain data rather than bound callbacks: consumers pull the queue when they
/// want to react to selection changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// The selection set changed; carries a snapshot of the new membership.
    Changed(Vec<NodeId>),
}

/// Phase of the click-then-maybe-drag sequence on a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickState {
    /// No press in flight.
    Idle,
    /// Primary button is down on a node; not yet moved past the threshold.
    PendingClickOrDrag {
        /// The pressed node.
        node: NodeId,
        /// Panel-space press position, for the movement threshold.
        press_pos: egui::Pos2,
        /// Whether releasing without movement should collapse the selection
        /// to just the pressed node (press landed on a multi-selection).
        collapse_on_release: bool,
    },
    /// Movement exceeded the threshold; the selection is being dragged.
    Dragging {
        /// The node the drag started from.
        node: NodeId,
    },
}

/// Tracks the selected-node set and emits change events.
#[derive(Debug, Default)]
pub struct SelectionManager {
    selected: HashSet<NodeId>,
    events: Vec<SelectionEvent>,
    click_state: ClickState,
}

impl Default for ClickState {
    fn default() -> Self {
        ClickState::Idle
    }
}

impl SelectionManager {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current selection set.
    pub fn selected(&self) -> &HashSet<NodeId> {
        &self.selected
    }

    /// Whether the given node is selected.
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    /// Number of selected nodes.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Current click/drag phase.
    pub fn click_state(&self) -> ClickState {
        self.click_state
    }

    /// Whether a node drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.click_state, ClickState::Dragging { .. })
    }

    fn notify(&mut self) {
        let mut snapshot: Vec<NodeId> = self.selected.iter().copied().collect();
        snapshot.sort();
        self.events.push(SelectionEvent::Changed(snapshot));
    }

    /// Drains the pending change events, oldest first.
    pub fn drain_events(&mut self) -> Vec<SelectionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clears the set and selects exactly `id`, firing at most one change
    /// event. Re-selecting the sole selected node is a silent no-op.
    pub fn select_single_node(&mut self, id: NodeId) {
        if self.selected.len() == 1 && self.selected.contains(&id) {
            return;
        }
        self.selected.clear();
        self.selected.insert(id);
        self.notify();
    }

    /// Idempotent add/remove of one node. Fires a change event only when the
    /// membership actually changed.
    pub fn set_node_selection(&mut self, id: NodeId, select: bool) {
        let changed = if select {
            self.selected.insert(id)
        } else {
            self.selected.remove(&id)
        };
        if changed {
            self.notify();
        }
    }

    /// Toggles membership of one node.
    pub fn toggle_node(&mut self, id: NodeId) {
        let select = !self.is_selected(id);
        self.set_node_selection(id, select);
    }

    /// Empties the selection.
    pub fn clear_selection(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.notify();
        }
    }

    /// Replaces the whole selection set, firing one event if it differs.
    pub fn replace_selection(&mut self, new: HashSet<NodeId>) {
        if new != self.selected {
            self.selected = new;
            self.notify();
        }
    }

    /// Drops entries the predicate rejects (stale backing objects), firing
    /// one event if anything was pruned.
    pub fn prune(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        let before = self.selected.len();
        self.selected.retain(|&id| keep(id));
        if self.selected.len() != before {
            self.notify();
        }
    }

    /// The canonical click-selection policy: a plain click replaces the set
    /// with the clicked node; a ctrl-click toggles its membership. Shift is
    /// handled by the caller's drag-start, not here.
    pub fn clicked_on_node(&mut self, id: NodeId, modifiers: &egui::Modifiers) {
        if modifiers.command {
            self.toggle_node(id);
        } else {
            self.select_single_node(id);
        }
    }

    /// Primary-button press on a node: mutates the selection where that is
    /// unambiguous and arms the click-or-drag state machine otherwise.
    ///
    /// A plain press on a node already inside a multi-selection defers the
    /// collapse to [`Self::release`] so the whole selection can be dragged.
    pub fn press_on_node(&mut self, id: NodeId, modifiers: &egui::Modifiers, pos: egui::Pos2) {
        let mut collapse_on_release = false;
        if modifiers.command {
            self.toggle_node(id);
        } else if self.is_selected(id) && self.selected.len() > 1 {
            collapse_on_release = true;
        } else {
            self.select_single_node(id);
        }
        self.click_state = ClickState::PendingClickOrDrag {
            node: id,
            press_pos: pos,
            collapse_on_release,
        };
    }

    /// Pointer movement while the button is down. Returns `true` on the
    /// transition into `Dragging`.
    pub fn pointer_moved(&mut self, pos: egui::Pos2) -> bool {
        if let ClickState::PendingClickOrDrag {
            node, press_pos, ..
        } = self.click_state
        {
            if (pos - press_pos).length() > constants::CLICK_DRAG_THRESHOLD {
                self.click_state = ClickState::Dragging { node };
                return true;
            }
        }
        false
    }

    /// Button release: completes the state machine. A pending press that
    /// never moved collapses the selection if it was armed to; a drag just
    /// ends. Returns the node a drag was released from, if any.
    pub fn release(&mut self) -> Option<NodeId> {
        match self.click_state {
            ClickState::PendingClickOrDrag {
                node,
                collapse_on_release,
                ..
            } => {
                if collapse_on_release {
                    self.select_single_node(node);
                }
                self.click_state = ClickState::Idle;
                None
            }
            ClickState::Dragging { node } => {
                self.click_state = ClickState::Idle;
                Some(node)
            }
            ClickState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ctrl() -> egui::Modifiers {
        egui::Modifiers {
            command: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_select_single_fires_exactly_once() {
        let mut sel = SelectionManager::new();
        let a = Uuid::new_v4();
        sel.select_single_node(a);
        assert_eq!(sel.drain_events(), vec![SelectionEvent::Changed(vec![a])]);
        // Re-selecting the same sole node is silent.
        sel.select_single_node(a);
        assert!(sel.drain_events().is_empty());
    }

    #[test]
    fn test_set_node_selection_notifies_only_on_change() {
        let mut sel = SelectionManager::new();
        let a = Uuid::new_v4();
        sel.set_node_selection(a, true);
        assert_eq!(sel.drain_events().len(), 1);
        sel.set_node_selection(a, true);
        assert!(sel.drain_events().is_empty());
        sel.set_node_selection(a, false);
        assert_eq!(sel.drain_events().len(), 1);
        sel.set_node_selection(a, false);
        assert!(sel.drain_events().is_empty());
    }

    #[test]
    fn test_ctrl_click_toggle_add_then_remove() {
        // Two nodes selected; ctrl-click a third adds it, ctrl-click again
        // removes it.
        let mut sel = SelectionManager::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        sel.set_node_selection(a, true);
        sel.set_node_selection(b, true);
        assert_eq!(sel.len(), 2);

        sel.clicked_on_node(c, &ctrl());
        assert_eq!(sel.len(), 3);
        assert!(sel.is_selected(c));

        sel.clicked_on_node(c, &ctrl());
        assert_eq!(sel.len(), 2);
        assert!(!sel.is_selected(c));
    }

    #[test]
    fn test_plain_click_replaces() {
        let mut sel = SelectionManager::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        sel.set_node_selection(a, true);
        sel.clicked_on_node(b, &egui::Modifiers::NONE);
        assert!(sel.is_selected(b));
        assert!(!sel.is_selected(a));
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn test_press_on_multiselected_node_defers_collapse() {
        let mut sel = SelectionManager::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        sel.set_node_selection(a, true);
        sel.set_node_selection(b, true);
        sel.drain_events();

        // Press on a node already inside the multi-selection: nothing
        // collapses yet.
        sel.press_on_node(a, &egui::Modifiers::NONE, egui::pos2(10.0, 10.0));
        assert_eq!(sel.len(), 2);
        assert!(sel.drain_events().is_empty());

        // Releasing without movement collapses to the pressed node.
        sel.release();
        assert_eq!(sel.len(), 1);
        assert!(sel.is_selected(a));
    }

    #[test]
    fn test_press_then_drag_preserves_multiselection() {
        let mut sel = SelectionManager::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        sel.set_node_selection(a, true);
        sel.set_node_selection(b, true);

        sel.press_on_node(a, &egui::Modifiers::NONE, egui::pos2(10.0, 10.0));
        // Tiny jitter stays pending.
        assert!(!sel.pointer_moved(egui::pos2(11.0, 10.0)));
        // Crossing the threshold starts the drag.
        assert!(sel.pointer_moved(egui::pos2(30.0, 10.0)));
        assert!(sel.is_dragging());

        // Releasing after a drag keeps both nodes selected.
        assert_eq!(sel.release(), Some(a));
        assert_eq!(sel.len(), 2);
        assert_eq!(sel.click_state(), ClickState::Idle);
    }

    #[test]
    fn test_press_on_unselected_node_selects_immediately() {
        let mut sel = SelectionManager::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        sel.set_node_selection(a, true);
        sel.press_on_node(b, &egui::Modifiers::NONE, egui::pos2(0.0, 0.0));
        assert!(sel.is_selected(b));
        assert!(!sel.is_selected(a));
    }

    #[test]
    fn test_prune_drops_stale_entries() {
        let mut sel = SelectionManager::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        sel.set_node_selection(a, true);
        sel.set_node_selection(b, true);
        sel.drain_events();

        sel.prune(|id| id == a);
        assert_eq!(sel.len(), 1);
        assert!(sel.is_selected(a));
        assert_eq!(sel.drain_events().len(), 1);

        // Pruning nothing is silent.
        sel.prune(|_| true);
        assert!(sel.drain_events().is_empty());
    }

    #[test]
    fn test_replace_selection_fires_once_if_different() {
        let mut sel = SelectionManager::new();
        let a = Uuid::new_v4();
        let mut set = HashSet::new();
        set.insert(a);
        sel.replace_selection(set.clone());
        assert_eq!(sel.drain_events().len(), 1);
        sel.replace_selection(set);
        assert!(sel.drain_events().is_empty());
    }
}
