//! In-progress drag of one or more nodes across the panel.
//!
//! The operation owns the floating decorator that follows the cursor, asks
//! the camera for auto-pan when dragging near a viewport edge, and queries
//! the graph schema whenever the hovered drop target changes. A multi-node
//! drop is valid only when every dragged node gets a non-disallow response;
//! a single disallow vetoes the whole drop.

use crate::types::{Graph, GraphSchema, MergeResponse, NodeId, PinRef};
use eframe::egui;
use log::debug;

use super::camera::Camera;

/// Icon shown next to one line of drop feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackIcon {
    /// The pairing is allowed (green check).
    Ok,
    /// The pairing is disallowed (red cross).
    Error,
}

/// One line of the decorator's feedback list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropFeedback {
    /// Allow/disallow icon.
    pub icon: FeedbackIcon,
    /// The schema's message for this pairing.
    pub message: String,
}

/// What a drop resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropResult {
    /// The drop was applied (links created on a node target).
    Merged,
    /// The drop completed without graph changes (empty canvas, or an invalid
    /// or unhandled combination — swallowed rather than propagated).
    Handled,
}

/// An in-flight drag of one or more nodes.
#[derive(Debug, Clone)]
pub struct DragNodeOperation {
    dragged: Vec<NodeId>,
    decorator_pos: egui::Pos2,
    hovered_target: Option<NodeId>,
    responses: Vec<MergeResponse>,
}

impl DragNodeOperation {
    /// Starts a drag of the given nodes; `cursor` seeds the decorator.
    pub fn new(dragged: Vec<NodeId>, cursor: egui::Pos2) -> Self {
        Self {
            dragged,
            decorator_pos: cursor,
            hovered_target: None,
            responses: Vec::new(),
        }
    }

    /// The nodes being dragged.
    pub fn dragged_nodes(&self) -> &[NodeId] {
        &self.dragged
    }

    /// Whether `id` is part of this drag.
    pub fn is_dragging(&self, id: NodeId) -> bool {
        self.dragged.contains(&id)
    }

    /// Panel-space position of the floating decorator.
    pub fn decorator_pos(&self) -> egui::Pos2 {
        self.decorator_pos
    }

    /// The node currently hovered as a drop target, if any.
    pub fn hovered_target(&self) -> Option<NodeId> {
        self.hovered_target
    }

    /// Per-frame drag update: the decorator follows the cursor, and the
    /// returned vector is the edge auto-pan the panel should apply (zero away
    /// from the edges).
    pub fn on_drag_update(&mut self, cursor: egui::Pos2, viewport: egui::Rect) -> egui::Vec2 {
        self.decorator_pos = cursor;
        Camera::compute_edge_pan_amount(viewport, cursor)
    }

    /// Re-queries the schema when the node under the cursor changes. One
    /// response is collected per dragged node; hovering nothing clears them.
    pub fn hover_target_changed(
        &mut self,
        graph: &Graph,
        schema: &dyn GraphSchema,
        target: Option<NodeId>,
    ) {
        if target == self.hovered_target {
            return;
        }
        self.hovered_target = target;
        self.responses = match target {
            Some(target_id) => self
                .dragged
                .iter()
                .map(|&dragged_id| schema.can_merge_nodes(graph, dragged_id, target_id))
                .collect(),
            None => Vec::new(),
        };
    }

    /// Whether dropping here is legal: there is a target and every dragged
    /// node's response is non-disallow.
    pub fn is_valid_operation(&self) -> bool {
        self.hovered_target.is_some()
            && !self.responses.is_empty()
            && self.responses.iter().all(|r| !r.is_disallow())
    }

    /// The decorator's feedback lines, one per schema response.
    pub fn feedback(&self) -> Vec<DropFeedback> {
        self.responses
            .iter()
            .map(|r| DropFeedback {
                icon: if r.is_disallow() {
                    FeedbackIcon::Error
                } else {
                    FeedbackIcon::Ok
                },
                message: r.message.clone(),
            })
            .collect()
    }

    /// Drop onto a node: when the operation is valid, each dragged node's
    /// first output is linked to the target's first input. Always handled;
    /// an invalid drop changes nothing.
    pub fn dropped_on_node(&self, graph: &mut Graph, target: NodeId) -> DropResult {
        if self.hovered_target != Some(target) || !self.is_valid_operation() {
            return DropResult::Handled;
        }
        let mut merged = false;
        for &dragged_id in &self.dragged {
            let Some(pair) = Self::connectable_pair(graph, dragged_id, target) else {
                continue;
            };
            match graph.add_link(pair.0, pair.1) {
                Ok(()) => merged = true,
                Err(reason) => debug!("merge link skipped: {reason}"),
            }
        }
        if merged {
            DropResult::Merged
        } else {
            DropResult::Handled
        }
    }

    /// Drop onto empty canvas: the nodes already moved live during the drag,
    /// so there is nothing left to apply. Swallowed as handled.
    pub fn dropped_on_panel(&self) -> DropResult {
        DropResult::Handled
    }

    fn connectable_pair(graph: &Graph, dragged: NodeId, target: NodeId) -> Option<(PinRef, PinRef)> {
        let out_pin = graph.node(dragged)?.outputs().next()?.id;
        let in_pin = graph.node(target)?.inputs().next()?.id;
        Some((
            PinRef {
                node: dragged,
                pin: out_pin,
            },
            PinRef {
                node: target,
                pin: in_pin,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BasicSchema, GraphNode, NodeKind};

    fn standard_node(graph: &mut Graph, title: &str, pos: (f32, f32)) -> NodeId {
        let mut node = GraphNode::new(title, pos, NodeKind::Standard);
        node.add_input("in");
        node.add_output("out");
        graph.add_node(node)
    }

    #[test]
    fn test_single_disallow_invalidates_multi_drag() {
        let mut graph = Graph::new();
        let a = standard_node(&mut graph, "A", (0.0, 0.0));
        let b = standard_node(&mut graph, "B", (0.0, 200.0));
        let target = standard_node(&mut graph, "T", (400.0, 100.0));

        // Dragging the target itself along with A and B: the self-drop
        // response is Disallow and vetoes the whole drop.
        let mut op = DragNodeOperation::new(vec![a, b, target], egui::pos2(0.0, 0.0));
        op.hover_target_changed(&graph, &BasicSchema, Some(target));
        assert!(!op.is_valid_operation());

        let feedback = op.feedback();
        assert_eq!(feedback.len(), 3);
        assert_eq!(
            feedback.iter().filter(|f| f.icon == FeedbackIcon::Error).count(),
            1
        );
    }

    #[test]
    fn test_all_allow_makes_operation_valid() {
        let mut graph = Graph::new();
        let a = standard_node(&mut graph, "A", (0.0, 0.0));
        let b = standard_node(&mut graph, "B", (0.0, 200.0));
        let target = standard_node(&mut graph, "T", (400.0, 100.0));

        let mut op = DragNodeOperation::new(vec![a, b], egui::pos2(0.0, 0.0));
        op.hover_target_changed(&graph, &BasicSchema, Some(target));
        assert!(op.is_valid_operation());
        assert!(op.feedback().iter().all(|f| f.icon == FeedbackIcon::Ok));
    }

    #[test]
    fn test_no_target_is_never_valid() {
        let mut graph = Graph::new();
        let a = standard_node(&mut graph, "A", (0.0, 0.0));
        let mut op = DragNodeOperation::new(vec![a], egui::pos2(0.0, 0.0));
        assert!(!op.is_valid_operation());
        op.hover_target_changed(&graph, &BasicSchema, None);
        assert!(!op.is_valid_operation());
        assert!(op.feedback().is_empty());
    }

    #[test]
    fn test_hover_target_changed_requeries_only_on_change() {
        struct CountingSchema(std::cell::Cell<usize>);
        impl GraphSchema for CountingSchema {
            fn can_merge_nodes(&self, _: &Graph, _: NodeId, _: NodeId) -> MergeResponse {
                self.0.set(self.0.get() + 1);
                MergeResponse::allow("ok")
            }
        }

        let mut graph = Graph::new();
        let a = standard_node(&mut graph, "A", (0.0, 0.0));
        let target = standard_node(&mut graph, "T", (400.0, 0.0));

        let schema = CountingSchema(std::cell::Cell::new(0));
        let mut op = DragNodeOperation::new(vec![a], egui::pos2(0.0, 0.0));
        op.hover_target_changed(&graph, &schema, Some(target));
        op.hover_target_changed(&graph, &schema, Some(target));
        assert_eq!(schema.0.get(), 1);

        op.hover_target_changed(&graph, &schema, None);
        op.hover_target_changed(&graph, &schema, Some(target));
        assert_eq!(schema.0.get(), 2);
    }

    #[test]
    fn test_dropped_on_node_links_when_valid() {
        let mut graph = Graph::new();
        let a = standard_node(&mut graph, "A", (0.0, 0.0));
        let target = standard_node(&mut graph, "T", (400.0, 0.0));

        let mut op = DragNodeOperation::new(vec![a], egui::pos2(0.0, 0.0));
        op.hover_target_changed(&graph, &BasicSchema, Some(target));
        assert!(op.is_valid_operation());

        assert_eq!(op.dropped_on_node(&mut graph, target), DropResult::Merged);
        assert_eq!(graph.wires().len(), 1);
    }

    #[test]
    fn test_invalid_drop_is_swallowed() {
        let mut graph = Graph::new();
        let a = standard_node(&mut graph, "A", (0.0, 0.0));
        let comment = graph.add_node(GraphNode::new("Note", (400.0, 0.0), NodeKind::Comment));

        let mut op = DragNodeOperation::new(vec![a], egui::pos2(0.0, 0.0));
        op.hover_target_changed(&graph, &BasicSchema, Some(comment));
        assert!(!op.is_valid_operation());

        // Handled but no graph change, and empty-canvas drops are no-ops too.
        assert_eq!(op.dropped_on_node(&mut graph, comment), DropResult::Handled);
        assert!(graph.wires().is_empty());
        assert_eq!(op.dropped_on_panel(), DropResult::Handled);
    }

    #[test]
    fn test_on_drag_update_moves_decorator_and_requests_pan() {
        let mut graph = Graph::new();
        let a = standard_node(&mut graph, "A", (0.0, 0.0));
        let mut op = DragNodeOperation::new(vec![a], egui::pos2(0.0, 0.0));
        let viewport = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0));

        let pan = op.on_drag_update(egui::pos2(400.0, 300.0), viewport);
        assert_eq!(pan, egui::Vec2::ZERO);
        assert_eq!(op.decorator_pos(), egui::pos2(400.0, 300.0));

        let pan = op.on_drag_update(egui::pos2(795.0, 300.0), viewport);
        assert!(pan.x > 0.0);
    }
}
