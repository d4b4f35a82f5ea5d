//! The node panel: owns the node widgets, keeps them reconciled against the
//! backing graph, and arranges them in panel space.
//!
//! Layout happens in two passes: primary nodes are placed from their own
//! graph positions first, then nodes whose placement depends on sibling
//! positions (the `Edge` kind) are placed relative to the nodes they link.
//! Widgets whose panel-space bounds miss the visible rect are culled unless
//! they opt out.

use crate::constants;
use crate::types::{Graph, GraphNode, NodeId, NodeKind, PinDirection, PinId};
use eframe::egui;
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

use super::camera::Camera;
use super::selection::SelectionManager;

/// How [`NodePanel::add_node`] records the node in the recent-user-action
/// history (consumed by "jump to newly created node").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddNodeBehavior {
    /// Record only if the node was flagged by [`NodePanel::mark_user_action`]
    /// before the panel synchronized. Used by the reconcile pass, which cannot
    /// tell user creations from programmatic ones on its own.
    CheckUserAddedNodesList,
    /// The node is known to come from a user action; always record it.
    WasUserAdded,
    /// Programmatic addition; never recorded.
    NotUserAdded,
}

/// The panel-owned visual for one backing node.
#[derive(Debug, Clone)]
pub struct NodeWidget {
    /// Identity of the backing node.
    pub id: NodeId,
    /// Cached graph-space position (top-left).
    pub position: egui::Pos2,
    /// Size computed from the node's content, in graph units.
    pub desired_size: egui::Vec2,
    /// Visual kind, copied from the backing node at construction.
    pub kind: NodeKind,
    /// Draw/sort depth; lower values render behind.
    pub sort_depth: i32,
    /// Widgets that opt out of culling are arranged even when off-screen.
    pub cull_exempt: bool,
    /// Bumped every time [`Self::update_graph_node`] rebuilds the visual.
    pub update_count: u64,
    input_count: usize,
    output_count: usize,
}

impl NodeWidget {
    /// Builds a widget for a backing node, computing its desired size from
    /// the node's content.
    pub fn from_backing(node: &GraphNode) -> Self {
        let mut widget = Self {
            id: node.id,
            position: egui::pos2(node.position.0, node.position.1),
            desired_size: egui::Vec2::ZERO,
            kind: node.kind,
            sort_depth: match node.kind {
                NodeKind::Comment => -20,
                NodeKind::Edge => -10,
                NodeKind::Standard => 0,
            },
            cull_exempt: false,
            update_count: 0,
            input_count: 0,
            output_count: 0,
        };
        widget.refresh_content(node);
        widget
    }

    fn refresh_content(&mut self, node: &GraphNode) {
        self.position = egui::pos2(node.position.0, node.position.1);
        self.input_count = node.inputs().count();
        self.output_count = node.outputs().count();
        self.desired_size = match node.kind {
            NodeKind::Comment => egui::vec2(constants::COMMENT_SIZE.0, constants::COMMENT_SIZE.1),
            NodeKind::Edge => egui::vec2(64.0, 28.0),
            NodeKind::Standard => {
                let rows = self.input_count.max(self.output_count) as f32;
                let height = constants::COMMENT_TITLE_HEIGHT + rows * constants::PIN_SPACING;
                egui::vec2(
                    constants::NODE_WIDTH,
                    height.max(constants::NODE_MIN_HEIGHT),
                )
            }
        };
    }

    /// Rebuilds the widget's visual state in place from its backing node.
    /// Called by the panel's reconcile pass for surviving nodes.
    pub fn update_graph_node(&mut self, node: &GraphNode) {
        self.refresh_content(node);
        self.update_count += 1;
    }

    /// Full graph-space bounds of the widget.
    pub fn graph_rect(&self) -> egui::Rect {
        egui::Rect::from_min_size(self.position, self.desired_size)
    }

    /// The graph-space region the marquee tests against. Differs from the
    /// full bounds for comments, which are grabbed by their title strip only.
    pub fn marquee_rect(&self) -> egui::Rect {
        match self.kind {
            NodeKind::Comment => egui::Rect::from_min_size(
                self.position,
                egui::vec2(self.desired_size.x, constants::COMMENT_TITLE_HEIGHT),
            ),
            _ => self.graph_rect(),
        }
    }

    /// Whether this widget is placed in the second layout pass.
    pub fn needs_second_pass(&self) -> bool {
        self.kind == NodeKind::Edge
    }

    /// Graph-space anchor of one of this node's pins: inputs stack down the
    /// left edge, outputs down the right edge.
    pub fn pin_anchor(&self, backing: &GraphNode, pin: PinId) -> Option<egui::Pos2> {
        let target = backing.pin(pin)?;
        let index = backing
            .pins
            .iter()
            .filter(|p| p.direction == target.direction)
            .position(|p| p.id == pin)?;
        let rect = self.graph_rect();
        let y = rect.min.y
            + constants::COMMENT_TITLE_HEIGHT
            + (index as f32 + 0.5) * constants::PIN_SPACING;
        let x = match target.direction {
            PinDirection::Input => rect.min.x,
            PinDirection::Output => rect.max.x,
        };
        Some(egui::pos2(x, y.min(rect.max.y)))
    }
}

/// One widget's placement for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrangedNode {
    /// The arranged widget's backing identity.
    pub id: NodeId,
    /// Panel-space bounds.
    pub panel_rect: egui::Rect,
    /// True when the widget is off-screen and not exempt; culled widgets are
    /// skipped by painting and hit-testing.
    pub culled: bool,
}

/// Container for the panel's node widgets.
///
/// Invariant: the id-to-widget lookup map always agrees with the widget list;
/// no entry survives a [`Self::remove_node`] or a reconcile pass.
#[derive(Debug, Default)]
pub struct NodePanel {
    widgets: Vec<NodeWidget>,
    node_map: HashMap<NodeId, usize>,
    user_added_recent: VecDeque<NodeId>,
    pending_user_actions: HashSet<NodeId>,
}

impl NodePanel {
    /// Creates an empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live widgets.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Whether the panel has no widgets.
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Iterates the widgets in insertion order.
    pub fn widgets(&self) -> impl Iterator<Item = &NodeWidget> {
        self.widgets.iter()
    }

    /// Yields each widget's graph-space marquee bounds.
    pub fn marquee_bounds(&self) -> impl Iterator<Item = (NodeId, egui::Rect)> + '_ {
        self.widgets.iter().map(|w| (w.id, w.marquee_rect()))
    }

    fn rebuild_map(&mut self) {
        self.node_map = self
            .widgets
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id, i))
            .collect();
    }

    /// Flags a backing node as created by a user action, so the next
    /// reconcile records it in the recent-user-added history.
    pub fn mark_user_action(&mut self, id: NodeId) {
        self.pending_user_actions.insert(id);
    }

    /// The most recently user-added node, if any.
    pub fn last_user_added(&self) -> Option<NodeId> {
        self.user_added_recent.back().copied()
    }

    fn record_user_added(&mut self, id: NodeId) {
        self.user_added_recent.push_back(id);
        while self.user_added_recent.len() > constants::USER_ADDED_HISTORY_MAX {
            self.user_added_recent.pop_front();
        }
    }

    /// Adds a widget to the panel. `behavior` controls whether the node lands
    /// in the recent-user-added history.
    pub fn add_node(&mut self, widget: NodeWidget, behavior: AddNodeBehavior) {
        let id = widget.id;
        match behavior {
            AddNodeBehavior::WasUserAdded => self.record_user_added(id),
            AddNodeBehavior::CheckUserAddedNodesList => {
                if self.pending_user_actions.remove(&id) {
                    self.record_user_added(id);
                }
            }
            AddNodeBehavior::NotUserAdded => {}
        }
        self.node_map.insert(id, self.widgets.len());
        self.widgets.push(widget);
    }

    /// Removes a widget from both the list and the lookup map, and prunes it
    /// from the selection set. Returns `true` if it existed.
    pub fn remove_node(&mut self, id: NodeId, selection: &mut SelectionManager) -> bool {
        let Some(index) = self.node_map.remove(&id) else {
            return false;
        };
        self.widgets.remove(index);
        self.rebuild_map();
        self.user_added_recent.retain(|&n| n != id);
        selection.set_node_selection(id, false);
        true
    }

    /// Looks up a widget by its backing node's GUID. Misses return `None`.
    pub fn get_node_widget_from_guid(&self, id: NodeId) -> Option<&NodeWidget> {
        self.node_map.get(&id).map(|&i| &self.widgets[i])
    }

    /// Reconciles the widgets against the current backing graph: new backing
    /// nodes get widgets, vanished ones get their widgets destroyed (and the
    /// selection pruned), survivors are rebuilt in place.
    pub fn update(&mut self, graph: &Graph, selection: &mut SelectionManager) {
        let live: HashSet<NodeId> = graph.nodes.iter().map(|n| n.id).collect();

        let stale: Vec<NodeId> = self
            .widgets
            .iter()
            .map(|w| w.id)
            .filter(|id| !live.contains(id))
            .collect();
        for id in &stale {
            self.remove_node(*id, selection);
        }

        let mut added = 0usize;
        for node in &graph.nodes {
            match self.node_map.get(&node.id) {
                Some(&index) => self.widgets[index].update_graph_node(node),
                None => {
                    self.add_node(
                        NodeWidget::from_backing(node),
                        AddNodeBehavior::CheckUserAddedNodesList,
                    );
                    added += 1;
                }
            }
        }

        if added > 0 || !stale.is_empty() {
            debug!(
                "panel reconciled: {} added, {} removed, {} live",
                added,
                stale.len(),
                self.widgets.len()
            );
        }
    }

    /// Arranges every widget for the current frame in two passes and computes
    /// its cull verdict against `viewport` (panel space).
    pub fn arrange(&self, graph: &Graph, camera: &Camera, viewport: egui::Rect) -> Vec<ArrangedNode> {
        let mut arranged: HashMap<NodeId, egui::Rect> = HashMap::new();

        // First pass: nodes placed from their own graph position.
        for widget in self.widgets.iter().filter(|w| !w.needs_second_pass()) {
            arranged.insert(widget.id, camera.graph_rect_to_panel_rect(widget.graph_rect()));
        }

        // Second pass: edge-like nodes centered between the two nodes their
        // pins link, now that those have panel rects.
        for widget in self.widgets.iter().filter(|w| w.needs_second_pass()) {
            let rect = self
                .second_pass_center(widget, graph, &arranged)
                .map(|center| {
                    egui::Rect::from_center_size(
                        center,
                        widget.desired_size * camera.zoom_amount(),
                    )
                })
                .unwrap_or_else(|| camera.graph_rect_to_panel_rect(widget.graph_rect()));
            arranged.insert(widget.id, rect);
        }

        self.widgets
            .iter()
            .map(|w| {
                let panel_rect = arranged[&w.id];
                ArrangedNode {
                    id: w.id,
                    panel_rect,
                    culled: !w.cull_exempt && !panel_rect.intersects(viewport),
                }
            })
            .collect()
    }

    /// Midpoint of the panel rects of the two distinct nodes an edge-kind
    /// widget links to, or `None` if they cannot be resolved.
    fn second_pass_center(
        &self,
        widget: &NodeWidget,
        graph: &Graph,
        arranged: &HashMap<NodeId, egui::Rect>,
    ) -> Option<egui::Pos2> {
        let backing = graph.node(widget.id)?;
        let mut linked = backing
            .pins
            .iter()
            .flat_map(|p| p.links.iter())
            .map(|l| l.node)
            .filter(|id| *id != widget.id);
        let first = linked.next()?;
        let second = linked.find(|id| *id != first)?;
        let a = arranged.get(&first)?.center();
        let b = arranged.get(&second)?.center();
        Some(a + (b - a) * 0.5)
    }

    /// Topmost widget under a panel-space point, using the current frame's
    /// arrangement. Culled widgets are not hit; comments are hit by their
    /// title strip only.
    pub fn node_at_panel_pos(
        &self,
        arranged: &[ArrangedNode],
        camera: &Camera,
        panel_pos: egui::Pos2,
    ) -> Option<NodeId> {
        arranged
            .iter()
            .filter(|a| !a.culled)
            .filter_map(|a| {
                let widget = self.get_node_widget_from_guid(a.id)?;
                let hit_rect = match widget.kind {
                    NodeKind::Comment => camera.graph_rect_to_panel_rect(widget.marquee_rect()),
                    _ => a.panel_rect,
                };
                hit_rect
                    .contains(panel_pos)
                    .then_some((widget.sort_depth, a.id))
            })
            .max_by_key(|&(depth, _)| depth)
            .map(|(_, id)| id)
    }

    /// Union of the graph-space bounds of the given nodes, for centering and
    /// zoom-to-fit. `None` when no id resolves.
    pub fn bounds_of(&self, ids: impl Iterator<Item = NodeId>) -> Option<egui::Rect> {
        let mut bounds: Option<egui::Rect> = None;
        for id in ids {
            if let Some(widget) = self.get_node_widget_from_guid(id) {
                let rect = widget.graph_rect();
                bounds = Some(match bounds {
                    Some(b) => b.union(rect),
                    None => rect,
                });
            }
        }
        bounds
    }

    /// Union of the graph-space bounds of every widget.
    pub fn bounds_all(&self) -> Option<egui::Rect> {
        self.bounds_of(self.widgets.iter().map(|w| w.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphNode, PinRef};

    fn graph_with_two_linked_nodes() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let mut a = GraphNode::new("A", (0.0, 0.0), NodeKind::Standard);
        let a_out = a.add_output("out");
        let mut b = GraphNode::new("B", (300.0, 0.0), NodeKind::Standard);
        let b_in = b.add_input("in");
        let a_id = graph.add_node(a);
        let b_id = graph.add_node(b);
        graph
            .add_link(
                PinRef { node: a_id, pin: a_out },
                PinRef { node: b_id, pin: b_in },
            )
            .unwrap();
        (graph, a_id, b_id)
    }

    #[test]
    fn test_update_creates_and_destroys_widgets() {
        let (mut graph, a_id, b_id) = graph_with_two_linked_nodes();
        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();

        panel.update(&graph, &mut selection);
        assert_eq!(panel.len(), 2);
        assert!(panel.get_node_widget_from_guid(a_id).is_some());

        graph.remove_node(a_id);
        panel.update(&graph, &mut selection);
        assert_eq!(panel.len(), 1);
        assert!(panel.get_node_widget_from_guid(a_id).is_none());
        assert!(panel.get_node_widget_from_guid(b_id).is_some());
    }

    #[test]
    fn test_update_rebuilds_survivors_in_place() {
        let (mut graph, a_id, _) = graph_with_two_linked_nodes();
        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();
        panel.update(&graph, &mut selection);

        graph.move_node_to(a_id, (50.0, 60.0));
        panel.update(&graph, &mut selection);

        let widget = panel.get_node_widget_from_guid(a_id).unwrap();
        assert_eq!(widget.position, egui::pos2(50.0, 60.0));
        assert_eq!(widget.update_count, 1);
    }

    #[test]
    fn test_remove_node_prunes_selection_and_map() {
        let (graph, a_id, _) = graph_with_two_linked_nodes();
        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();
        panel.update(&graph, &mut selection);
        selection.set_node_selection(a_id, true);

        assert!(panel.remove_node(a_id, &mut selection));
        assert!(!selection.is_selected(a_id));
        assert!(panel.get_node_widget_from_guid(a_id).is_none());
        // Removing again is a no-op.
        assert!(!panel.remove_node(a_id, &mut selection));
    }

    #[test]
    fn test_update_prunes_selection_of_vanished_nodes() {
        let (mut graph, a_id, _) = graph_with_two_linked_nodes();
        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();
        panel.update(&graph, &mut selection);
        selection.set_node_selection(a_id, true);

        graph.remove_node(a_id);
        panel.update(&graph, &mut selection);
        assert!(!selection.is_selected(a_id));
    }

    #[test]
    fn test_user_added_history() {
        let (graph, a_id, b_id) = graph_with_two_linked_nodes();
        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();

        // Only the node flagged as a user action lands in the history.
        panel.mark_user_action(b_id);
        panel.update(&graph, &mut selection);
        assert_eq!(panel.last_user_added(), Some(b_id));
        assert_ne!(panel.last_user_added(), Some(a_id));
    }

    #[test]
    fn test_comment_marquee_rect_is_title_strip() {
        let comment = GraphNode::new("Note", (10.0, 20.0), NodeKind::Comment);
        let widget = NodeWidget::from_backing(&comment);
        let marquee = widget.marquee_rect();
        assert_eq!(marquee.min, egui::pos2(10.0, 20.0));
        assert_eq!(marquee.height(), constants::COMMENT_TITLE_HEIGHT);
        assert!(widget.graph_rect().height() > marquee.height());
        assert_eq!(widget.sort_depth, -20);
    }

    #[test]
    fn test_arrange_culls_offscreen_widgets() {
        let mut graph = Graph::new();
        let visible = graph.add_node(GraphNode::new("V", (10.0, 10.0), NodeKind::Standard));
        let offscreen = graph.add_node(GraphNode::new("O", (5000.0, 5000.0), NodeKind::Standard));
        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();
        panel.update(&graph, &mut selection);

        let camera = Camera::new();
        let viewport = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));
        let arranged = panel.arrange(&graph, &camera, viewport);

        let verdict = |id: NodeId| arranged.iter().find(|a| a.id == id).unwrap().culled;
        assert!(!verdict(visible));
        assert!(verdict(offscreen));
    }

    #[test]
    fn test_cull_exempt_widget_is_never_culled() {
        let mut graph = Graph::new();
        let id = graph.add_node(GraphNode::new("O", (5000.0, 5000.0), NodeKind::Standard));
        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();
        panel.update(&graph, &mut selection);

        // Flip the exemption through the map-consistent path.
        let index = *panel.node_map.get(&id).unwrap();
        panel.widgets[index].cull_exempt = true;

        let camera = Camera::new();
        let viewport = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));
        let arranged = panel.arrange(&graph, &camera, viewport);
        assert!(!arranged.iter().find(|a| a.id == id).unwrap().culled);
    }

    #[test]
    fn test_second_pass_places_edge_between_linked_nodes() {
        let mut graph = Graph::new();
        let mut a = GraphNode::new("A", (0.0, 0.0), NodeKind::Standard);
        let a_out = a.add_output("out");
        let mut b = GraphNode::new("B", (400.0, 0.0), NodeKind::Standard);
        let b_in = b.add_input("in");
        let mut edge = GraphNode::new("T", (0.0, 500.0), NodeKind::Edge);
        let e_in = edge.add_input("from");
        let e_out = edge.add_output("to");
        let a_id = graph.add_node(a);
        let b_id = graph.add_node(b);
        let e_id = graph.add_node(edge);
        graph
            .add_link(
                PinRef { node: a_id, pin: a_out },
                PinRef { node: e_id, pin: e_in },
            )
            .unwrap();
        graph
            .add_link(
                PinRef { node: e_id, pin: e_out },
                PinRef { node: b_id, pin: b_in },
            )
            .unwrap();

        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();
        panel.update(&graph, &mut selection);

        let camera = Camera::new();
        let viewport = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));
        let arranged = panel.arrange(&graph, &camera, viewport);

        let rect_of = |id: NodeId| arranged.iter().find(|n| n.id == id).unwrap().panel_rect;
        let expected = rect_of(a_id).center() + (rect_of(b_id).center() - rect_of(a_id).center()) * 0.5;
        let actual = rect_of(e_id).center();
        assert!((actual - expected).length() < 0.5, "{actual:?} vs {expected:?}");
    }

    #[test]
    fn test_pin_anchor_sides() {
        let mut node = GraphNode::new("A", (0.0, 0.0), NodeKind::Standard);
        let input = node.add_input("in");
        let output = node.add_output("out");
        let widget = NodeWidget::from_backing(&node);

        let in_pos = widget.pin_anchor(&node, input).unwrap();
        let out_pos = widget.pin_anchor(&node, output).unwrap();
        let rect = widget.graph_rect();
        assert_eq!(in_pos.x, rect.min.x);
        assert_eq!(out_pos.x, rect.max.x);
        assert_eq!(in_pos.y, out_pos.y);

        // Unknown pin misses cleanly.
        assert!(widget.pin_anchor(&node, uuid::Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_bounds_of_union() {
        let (graph, a_id, b_id) = graph_with_two_linked_nodes();
        let mut panel = NodePanel::new();
        let mut selection = SelectionManager::new();
        panel.update(&graph, &mut selection);

        let bounds = panel.bounds_of([a_id, b_id].into_iter()).unwrap();
        assert_eq!(bounds.min, egui::pos2(0.0, 0.0));
        assert!(bounds.max.x >= 300.0 + constants::NODE_WIDTH);

        assert!(panel.bounds_of(std::iter::empty()).is_none());
    }
}
