//! Spline (wire) overlap detection.
//!
//! Wires between pins are cubic beziers with horizontal tangents. Hovering
//! near a wire — without being over a pin glyph — should behave like hovering
//! the nearer endpoint pin, so contextual actions (drag-from-wire) work from
//! anywhere along the curve. Distance to a wire is measured by uniform
//! sampling; the best result is cached per frame and only recomputed when the
//! cursor actually moved.

use crate::constants;
use crate::types::{Graph, PinRef};
use eframe::egui;

use super::camera::Camera;
use super::panel::NodePanel;

/// A cubic bezier wire between two pin anchors, in panel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    /// Curve start (the output pin's anchor).
    pub start: egui::Pos2,
    /// First control point.
    pub control1: egui::Pos2,
    /// Second control point.
    pub control2: egui::Pos2,
    /// Curve end (the input pin's anchor).
    pub end: egui::Pos2,
}

impl CubicBezier {
    /// Builds the wire curve between an output anchor and an input anchor,
    /// with control points pushed horizontally so the wire leaves and enters
    /// its pins flat.
    pub fn between_pins(start: egui::Pos2, end: egui::Pos2) -> Self {
        let reach = ((end.x - start.x).abs() * 0.5).max(30.0);
        Self {
            start,
            control1: egui::pos2(start.x + reach, start.y),
            control2: egui::pos2(end.x - reach, end.y),
            end,
        }
    }

    /// Evaluates the curve at parameter `t` in [0, 1].
    pub fn sample(&self, t: f32) -> egui::Pos2 {
        let u = 1.0 - t;
        let w0 = u * u * u;
        let w1 = 3.0 * u * u * t;
        let w2 = 3.0 * u * t * t;
        let w3 = t * t * t;
        egui::pos2(
            w0 * self.start.x + w1 * self.control1.x + w2 * self.control2.x + w3 * self.end.x,
            w0 * self.start.y + w1 * self.control1.y + w2 * self.control2.y + w3 * self.end.y,
        )
    }

    /// Squared distance from `point` to the curve, measured over `samples`
    /// uniform steps.
    pub fn distance_sq(&self, point: egui::Pos2, samples: usize) -> f32 {
        let samples = samples.max(2);
        let mut best = f32::INFINITY;
        for i in 0..=samples {
            let t = i as f32 / samples as f32;
            let d = (self.sample(t) - point).length_sq();
            if d < best {
                best = d;
            }
        }
        best
    }
}

/// The wire nearest the cursor, with enough distance data to pick the better
/// endpoint pin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineOverlapResult {
    /// The output-side pin of the wire.
    pub pin1: PinRef,
    /// The input-side pin of the wire.
    pub pin2: PinRef,
    /// Squared panel-space distance from the cursor to the curve.
    pub distance_sq: f32,
    /// Squared distance from the cursor to `pin1`'s anchor.
    pub dist_sq_to_pin1: f32,
    /// Squared distance from the cursor to `pin2`'s anchor.
    pub dist_sq_to_pin2: f32,
}

impl SplineOverlapResult {
    /// Whether the cursor is close enough to the wire to treat it as hovered.
    pub fn is_valid(&self) -> bool {
        self.distance_sq.is_finite()
            && self.distance_sq
                < constants::SPLINE_HOVER_TOLERANCE * constants::SPLINE_HOVER_TOLERANCE
    }

    /// The endpoint pin nearer to the cursor; hovering near one end of a long
    /// wire acts like hovering that pin.
    pub fn compute_best_pin(&self) -> PinRef {
        if self.dist_sq_to_pin1 <= self.dist_sq_to_pin2 {
            self.pin1
        } else {
            self.pin2
        }
    }
}

/// Panel-space anchor of a pin, or `None` when the node, widget, or pin is
/// missing (malformed links are skipped, not drawn).
pub fn pin_panel_anchor(
    pin_ref: PinRef,
    graph: &Graph,
    panel: &NodePanel,
    camera: &Camera,
) -> Option<egui::Pos2> {
    let backing = graph.node(pin_ref.node)?;
    let widget = panel.get_node_widget_from_guid(pin_ref.node)?;
    let anchor = widget.pin_anchor(backing, pin_ref.pin)?;
    Some(camera.graph_coord_to_panel_coord(anchor))
}

/// Scans every drawable wire and returns the overlap result for the one
/// nearest `cursor` (panel space). `None` when there are no resolvable wires;
/// check [`SplineOverlapResult::is_valid`] before treating it as a hover.
pub fn compute_spline_overlap(
    cursor: egui::Pos2,
    graph: &Graph,
    panel: &NodePanel,
    camera: &Camera,
) -> Option<SplineOverlapResult> {
    let mut best: Option<SplineOverlapResult> = None;
    for (from, to) in graph.wires() {
        let (Some(start), Some(end)) = (
            pin_panel_anchor(from, graph, panel, camera),
            pin_panel_anchor(to, graph, panel, camera),
        ) else {
            continue;
        };
        let curve = CubicBezier::between_pins(start, end);
        let distance_sq = curve.distance_sq(cursor, constants::SPLINE_SAMPLES);
        if best.map(|b| distance_sq < b.distance_sq).unwrap_or(true) {
            best = Some(SplineOverlapResult {
                pin1: from,
                pin2: to,
                distance_sq,
                dist_sq_to_pin1: (start - cursor).length_sq(),
                dist_sq_to_pin2: (end - cursor).length_sq(),
            });
        }
    }
    best
}

/// Previous-frame overlap cache. Recomputing distance against every wire on
/// every paint is wasted work while the cursor is idle.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplineHoverCache {
    last_cursor: Option<egui::Pos2>,
    result: Option<SplineOverlapResult>,
}

impl SplineHoverCache {
    /// Returns the cached result when the cursor has not moved since the last
    /// query, otherwise recomputes via `compute` and stores the new result.
    pub fn query(
        &mut self,
        cursor: egui::Pos2,
        compute: impl FnOnce(egui::Pos2) -> Option<SplineOverlapResult>,
    ) -> Option<SplineOverlapResult> {
        if self.last_cursor != Some(cursor) {
            self.result = compute(cursor);
            self.last_cursor = Some(cursor);
        }
        self.result
    }

    /// The most recent result without recomputing (for painting after the
    /// input pass already queried this frame).
    pub fn current(&self) -> Option<SplineOverlapResult> {
        self.result
    }

    /// Drops the cached result (e.g. when the graph changed under the cursor).
    pub fn invalidate(&mut self) {
        self.last_cursor = None;
        self.result = None;
    }
}
