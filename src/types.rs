//! Core data types for the node-graph canvas.
//!
//! This module defines the backing graph data model the panel renders and
//! reconciles against: nodes, pins, links between pins, and the schema policy
//! consulted during drag-and-drop. The visual layer never owns this data; it
//! reads positions and pin links and writes back user-driven position changes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for graph nodes (the backing-object identity used as the
/// selection-set key).
pub type NodeId = Uuid;

/// Unique identifier for pins.
pub type PinId = Uuid;

/// Visual kind of a node, fixed at construction.
///
/// A closed set of kinds dispatched by `match` replaces what would otherwise
/// be a widget-class hierarchy: layout, marquee hit-area, and draw style all
/// switch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A regular node with a title bar and pin rows.
    Standard,
    /// A large background comment box. Its marquee hit-area is only the title
    /// strip, and it sorts behind other nodes.
    Comment,
    /// A node whose placement depends on sibling positions (e.g. a transition
    /// between two states). Laid out in the panel's second pass.
    Edge,
}

/// Direction of a pin relative to its owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    /// Receives connections; rendered on the node's left edge.
    Input,
    /// Originates connections; rendered on the node's right edge.
    Output,
}

/// A reference to a pin on some node.
///
/// Links are stored as plain references rather than indices so that a stale
/// entry (node removed from the graph) is detectable and skippable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    /// The node owning the referenced pin.
    pub node: NodeId,
    /// The referenced pin.
    pub pin: PinId,
}

/// A connection point on a node. Pins are exclusively owned by their node and
/// never shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// Unique identifier for this pin.
    pub id: PinId,
    /// Display label.
    pub name: String,
    /// Whether this pin receives or originates connections.
    pub direction: PinDirection,
    /// Pins this pin is linked to. For `Output` pins these are the wires the
    /// panel draws; `Input` pins mirror the link for quick lookup.
    pub links: Vec<PinRef>,
}

impl Pin {
    /// Creates an unlinked pin with a fresh identity.
    pub fn new(name: impl Into<String>, direction: PinDirection) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            direction,
            links: Vec::new(),
        }
    }
}

/// A single node in the backing graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier for this node.
    pub id: NodeId,
    /// User-displayable title.
    pub title: String,
    /// Graph-space position of the node's top-left corner as (x, y).
    pub position: (f32, f32),
    /// Visual kind, fixed at construction.
    pub kind: NodeKind,
    /// The node's pins, in display order.
    pub pins: Vec<Pin>,
}

impl GraphNode {
    /// Creates a new node with no pins.
    pub fn new(title: impl Into<String>, position: (f32, f32), kind: NodeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            position,
            kind,
            pins: Vec::new(),
        }
    }

    /// Adds an input pin and returns its id.
    pub fn add_input(&mut self, name: impl Into<String>) -> PinId {
        let pin = Pin::new(name, PinDirection::Input);
        let id = pin.id;
        self.pins.push(pin);
        id
    }

    /// Adds an output pin and returns its id.
    pub fn add_output(&mut self, name: impl Into<String>) -> PinId {
        let pin = Pin::new(name, PinDirection::Output);
        let id = pin.id;
        self.pins.push(pin);
        id
    }

    /// Looks up a pin on this node by id.
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    /// Iterates this node's input pins in display order.
    pub fn inputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins
            .iter()
            .filter(|p| p.direction == PinDirection::Input)
    }

    /// Iterates this node's output pins in display order.
    pub fn outputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins
            .iter()
            .filter(|p| p.direction == PinDirection::Output)
    }
}

/// The backing graph: an ordered list of nodes with linked pins.
///
/// The canvas reconciles its widgets against this structure every frame and is
/// tolerant of malformed data: a link whose target node or pin is missing is
/// skipped rather than drawn or followed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    /// All nodes, in creation order.
    pub nodes: Vec<GraphNode>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the graph to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a graph from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a node by id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Resolves a pin reference, or `None` if the node or pin is gone.
    pub fn resolve_pin(&self, pin_ref: PinRef) -> Option<&Pin> {
        self.node(pin_ref.node)?.pin(pin_ref.pin)
    }

    /// Adds a node to the graph and returns its id.
    pub fn add_node(&mut self, node: GraphNode) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Removes a node and strips every link that referenced it from the
    /// remaining nodes' pins.
    ///
    /// Returns `true` if the node existed.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        for node in &mut self.nodes {
            for pin in &mut node.pins {
                pin.links.retain(|l| l.node != id);
            }
        }
        true
    }

    /// Moves a node to a new graph-space position. This is the write-back used
    /// by user drags; returns `false` if the node is gone.
    pub fn move_node_to(&mut self, id: NodeId, position: (f32, f32)) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Whether a link between the two pins already exists (either direction).
    pub fn link_exists(&self, a: PinRef, b: PinRef) -> bool {
        self.resolve_pin(a)
            .map(|pin| pin.links.contains(&b))
            .unwrap_or(false)
            || self
                .resolve_pin(b)
                .map(|pin| pin.links.contains(&a))
                .unwrap_or(false)
    }

    /// Links an output pin to an input pin, recording the link on both ends.
    ///
    /// The arguments may be given in either order; the output side is found
    /// from the pin directions. Fails on missing endpoints, same-direction
    /// pairs, self-node links, and duplicates.
    pub fn add_link(&mut self, a: PinRef, b: PinRef) -> Result<(), String> {
        let dir_a = self
            .resolve_pin(a)
            .map(|p| p.direction)
            .ok_or("First pin does not exist")?;
        let dir_b = self
            .resolve_pin(b)
            .map(|p| p.direction)
            .ok_or("Second pin does not exist")?;

        let (from, to) = match (dir_a, dir_b) {
            (PinDirection::Output, PinDirection::Input) => (a, b),
            (PinDirection::Input, PinDirection::Output) => (b, a),
            _ => return Err("Pins have the same direction".to_string()),
        };
        if from.node == to.node {
            return Err("Cannot link a node to itself".to_string());
        }
        if self.link_exists(from, to) {
            return Err("Link already exists".to_string());
        }

        // Endpoints were just resolved, but hold the borrows one at a time.
        if let Some(node) = self.node_mut(from.node) {
            if let Some(pin) = node.pins.iter_mut().find(|p| p.id == from.pin) {
                pin.links.push(to);
            }
        }
        if let Some(node) = self.node_mut(to.node) {
            if let Some(pin) = node.pins.iter_mut().find(|p| p.id == to.pin) {
                pin.links.push(from);
            }
        }
        Ok(())
    }

    /// Enumerates drawable wires as (output pin, input pin) pairs.
    ///
    /// Only links recorded on output pins are walked (each wire once), and
    /// links whose far end no longer resolves are silently skipped.
    pub fn wires(&self) -> Vec<(PinRef, PinRef)> {
        let mut out = Vec::new();
        for node in &self.nodes {
            for pin in node.outputs() {
                let from = PinRef {
                    node: node.id,
                    pin: pin.id,
                };
                for &to in &pin.links {
                    if self.resolve_pin(to).is_some() {
                        out.push((from, to));
                    }
                }
            }
        }
        out
    }
}

/// Verdict of a schema query about merging dragged nodes onto a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeVerdict {
    /// The merge is legal.
    Allow,
    /// The merge is not legal; the whole drop is invalidated.
    Disallow,
}

/// A single schema response for one dragged node against one drop target,
/// surfaced to the user via the drag decorator.
#[derive(Debug, Clone)]
pub struct MergeResponse {
    /// Whether this particular pairing is allowed.
    pub verdict: MergeVerdict,
    /// Human-readable feedback shown next to the verdict icon.
    pub message: String,
}

impl MergeResponse {
    /// Builds an allowing response.
    pub fn allow(message: impl Into<String>) -> Self {
        Self {
            verdict: MergeVerdict::Allow,
            message: message.into(),
        }
    }

    /// Builds a disallowing response.
    pub fn disallow(message: impl Into<String>) -> Self {
        Self {
            verdict: MergeVerdict::Disallow,
            message: message.into(),
        }
    }

    /// Whether this response vetoes the drop.
    pub fn is_disallow(&self) -> bool {
        self.verdict == MergeVerdict::Disallow
    }
}

/// Policy collaborator queried during drag-and-drop hover: may two nodes be
/// merged/connected?
pub trait GraphSchema {
    /// Whether dropping `dragged` onto `target` is a legal merge.
    fn can_merge_nodes(&self, graph: &Graph, dragged: NodeId, target: NodeId) -> MergeResponse;
}

/// Default schema: disallows self-drops, drops onto comments, merges with no
/// connectable pin pair, and duplicate links.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSchema;

impl GraphSchema for BasicSchema {
    fn can_merge_nodes(&self, graph: &Graph, dragged: NodeId, target: NodeId) -> MergeResponse {
        if dragged == target {
            return MergeResponse::disallow("Cannot drop a node onto itself");
        }
        let (Some(dragged_node), Some(target_node)) = (graph.node(dragged), graph.node(target))
        else {
            return MergeResponse::disallow("Node no longer exists");
        };
        if target_node.kind == NodeKind::Comment {
            return MergeResponse::disallow("Cannot merge into a comment");
        }
        let Some(out_pin) = dragged_node.outputs().next() else {
            return MergeResponse::disallow(format!("{} has no output pin", dragged_node.title));
        };
        let Some(in_pin) = target_node.inputs().next() else {
            return MergeResponse::disallow(format!("{} has no input pin", target_node.title));
        };
        let from = PinRef {
            node: dragged,
            pin: out_pin.id,
        };
        let to = PinRef {
            node: target,
            pin: in_pin.id,
        };
        if graph.link_exists(from, to) {
            return MergeResponse::disallow("Already connected");
        }
        MergeResponse::allow(format!(
            "Connect {} to {}",
            dragged_node.title, target_node.title
        ))
    }
}
