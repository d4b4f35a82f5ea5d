//! # Graph Canvas
//!
//! A pannable, zoomable node-graph editor canvas. Nodes carry typed input and
//! output pins, wires between pins are drawn as cubic splines, and a schema
//! policy decides which node-onto-node drops may merge.
//!
//! ## Features
//! - Discrete zoom levels with cursor-anchored scroll zoom
//! - Click, ctrl-click, and rubber-band selection with add/remove/invert modes
//! - Multi-node dragging with edge auto-pan and drop-target feedback
//! - Two-pass node layout and off-screen culling
//! - Wire hover detection anywhere along the spline

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod constants;
mod types;
mod ui;

// Re-export the public surface.
pub use types::*;
pub use ui::{
    apply_marquee_selection, compute_spline_overlap, find_nodes_affected_by_marquee,
    pin_panel_anchor,
    AddNodeBehavior, ArrangedNode, Camera, ClickState, CubicBezier, DragNodeOperation,
    DropFeedback, DropResult, FeedbackIcon, GraphEditorApp, InteractionState, JumpRequest,
    MarqueeMode, MarqueeOperation, NodePanel, NodeWidget, SelectionEvent, SelectionManager,
    SplineHoverCache, SplineOverlapResult, ViewState, ZoomRounding, DEFAULT_ZOOM_LEVEL,
    ZOOM_LEVELS,
};

/// Runs the graph editor application with default settings.
///
/// Initializes the egui application window and starts the main event loop.
/// State persisted by a previous session is restored through eframe storage.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), eframe::Error> {
///     graph_canvas::run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Graph Canvas",
        options,
        Box::new(|cc| Ok(Box::new(GraphEditorApp::new(cc)))),
    )
}
