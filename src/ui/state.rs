//! Application state: what persists across sessions and what lives only for
//! the duration of an interaction.

use crate::types::{BasicSchema, Graph, GraphSchema, NodeId, PinRef};
use eframe::egui;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::drag_drop::DragNodeOperation;
use super::marquee::MarqueeOperation;
use super::panel::NodePanel;
use super::selection::SelectionManager;
use super::splines::SplineHoverCache;

/// Persisted view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewState {
    /// Camera pan/zoom.
    #[serde(default)]
    pub camera: Camera,
    /// Whether the background grid is drawn.
    #[serde(default = "default_show_grid")]
    pub show_grid: bool,
}

fn default_show_grid() -> bool {
    true
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            show_grid: true,
        }
    }
}

/// A camera change requested this frame that needs the viewport size, which
/// is only known once the panel has been allocated. Resolved at the start of
/// the next paint.
#[derive(Debug, Clone, PartialEq)]
pub enum JumpRequest {
    /// Center the viewport on one node.
    ToNode(NodeId),
    /// Center the viewport on one pin's anchor.
    ToPin(PinRef),
    /// Pan and zoom so the given nodes (all nodes when empty) fit.
    FitNodes(Vec<NodeId>),
}

/// Per-interaction scratch state; none of it survives a restart.
#[derive(Debug, Default)]
pub struct InteractionState {
    /// Middle/secondary-button canvas pan in progress.
    pub is_panning: bool,
    /// Previous panel-space pointer position during a pan.
    pub last_pan_pos: Option<egui::Pos2>,
    /// Rubber-band selection in progress.
    pub marquee: Option<MarqueeOperation>,
    /// Node drag in progress.
    pub drag: Option<DragNodeOperation>,
    /// Graph-space cursor position from the previous drag frame, for the
    /// per-frame movement delta applied to the dragged nodes.
    pub drag_last_graph_pos: Option<egui::Pos2>,
    /// Wire drag in progress: the source pin and the cursor's panel position.
    pub wire_drag: Option<(PinRef, egui::Pos2)>,
    /// Wire-hover cache, recomputed only when the cursor moves.
    pub spline_cache: SplineHoverCache,
}

/// The graph editor application.
#[derive(Serialize, Deserialize)]
pub struct GraphEditorApp {
    /// The backing graph document.
    pub graph: Graph,
    /// Persisted view settings.
    #[serde(default)]
    pub view: ViewState,
    /// Widget container for the graph's nodes.
    #[serde(skip)]
    pub panel: NodePanel,
    /// Selection set and click/drag state machine.
    #[serde(skip)]
    pub selection: SelectionManager,
    /// In-flight interaction state.
    #[serde(skip)]
    pub interaction: InteractionState,
    /// Drop policy for node-onto-node merges.
    #[serde(skip, default = "default_schema")]
    pub schema: Box<dyn GraphSchema>,
    /// Camera request deferred until the viewport size is known.
    #[serde(skip)]
    pub pending_jump: Option<JumpRequest>,
    /// Panel rect from the previous frame, used to resolve deferred jumps.
    #[serde(skip)]
    pub last_viewport: Option<egui::Rect>,
    /// Frames left before the zoom-percentage overlay fully fades.
    #[serde(skip)]
    pub zoom_text_frames: u64,
}

fn default_schema() -> Box<dyn GraphSchema> {
    Box::new(BasicSchema)
}

impl Default for GraphEditorApp {
    fn default() -> Self {
        Self {
            graph: Graph::new(),
            view: ViewState::default(),
            panel: NodePanel::new(),
            selection: SelectionManager::new(),
            interaction: InteractionState::default(),
            schema: default_schema(),
            pending_jump: None,
            last_viewport: None,
            zoom_text_frames: 0,
        }
    }
}

impl GraphEditorApp {
    /// Restores the persisted state if any, otherwise starts empty.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        if let Some(storage) = cc.storage {
            if let Some(app) = eframe::get_value(storage, eframe::APP_KEY) {
                return app;
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_state_defaults() {
        let view = ViewState::default();
        assert!(view.show_grid);
        assert_eq!(view.camera.zoom_amount(), 1.0);
    }

    #[test]
    fn test_view_state_roundtrip_and_missing_fields() {
        let mut view = ViewState::default();
        view.camera.view_offset = (12.0, -4.0);
        view.show_grid = false;
        let json = serde_json::to_string(&view).unwrap();
        let back: ViewState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.camera.view_offset, (12.0, -4.0));
        assert!(!back.show_grid);

        // Older persisted blobs without the fields fall back to defaults.
        let sparse: ViewState = serde_json::from_str("{}").unwrap();
        assert!(sparse.show_grid);
    }

    #[test]
    fn test_app_roundtrip_skips_transient_state() {
        let mut app = GraphEditorApp::default();
        app.interaction.is_panning = true;
        app.zoom_text_frames = 30;
        let json = serde_json::to_string(&app).unwrap();
        let back: GraphEditorApp = serde_json::from_str(&json).unwrap();
        assert!(!back.interaction.is_panning);
        assert_eq!(back.zoom_text_frames, 0);
        assert!(back.selection.is_empty());
    }
}
