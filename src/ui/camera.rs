//! Viewport/camera transform between graph space and panel space.
//!
//! Graph space is the logical coordinate system nodes are positioned in; panel
//! space is pixels relative to the canvas top-left after applying pan and zoom.
//! Zoom is not a free float: it is an index into a fixed ascending table of
//! scale factors, so zoom steps land on the same levels every time.

use crate::constants;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Fixed ascending table of zoom scale factors. `DEFAULT_ZOOM_LEVEL` indexes
/// the 1:1 entry.
pub const ZOOM_LEVELS: [f32; 12] = [
    0.25, 0.33, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 2.5, 3.0, 4.0, 5.0,
];

/// Index of the 1:1 zoom level in [`ZOOM_LEVELS`].
pub const DEFAULT_ZOOM_LEVEL: usize = 4;

/// Which way [`Camera::find_nearest_zoom_level`] rounds when the requested
/// amount falls between two table entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomRounding {
    /// Pick the largest level whose amount does not exceed the target.
    /// Used when the result must fit within a bound (e.g. zoom-to-fit).
    Down,
    /// Pick the smallest level whose amount is at least the target.
    Up,
}

/// Pan offset and zoom level for the canvas.
///
/// `view_offset` is the graph-space point visible at the panel's top-left
/// corner. Both fields persist across sessions; everything else about the view
/// is derived per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Graph-space point at the top-left of the viewport, as (x, y).
    pub view_offset: (f32, f32),
    /// Index into [`ZOOM_LEVELS`]. Always kept within table bounds.
    pub zoom_level: usize,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view_offset: (0.0, 0.0),
            zoom_level: DEFAULT_ZOOM_LEVEL,
        }
    }
}

impl Camera {
    /// Creates a camera at the origin with 1:1 zoom.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current scale factor. Out-of-range persisted levels clamp to the
    /// table bounds rather than indexing out of bounds.
    pub fn zoom_amount(&self) -> f32 {
        ZOOM_LEVELS[self.zoom_level.min(ZOOM_LEVELS.len() - 1)]
    }

    /// The current zoom as a display percentage (e.g. "150%").
    pub fn zoom_percent_text(&self) -> String {
        format!("{:.0}%", self.zoom_amount() * 100.0)
    }

    /// Sets the zoom level, clamped to the table bounds.
    pub fn set_zoom_level(&mut self, level: usize) {
        self.zoom_level = level.min(ZOOM_LEVELS.len() - 1);
    }

    /// Steps the zoom level by a signed number of table entries.
    pub fn step_zoom(&mut self, steps: i32) {
        let level = (self.zoom_level as i32 + steps).clamp(0, ZOOM_LEVELS.len() as i32 - 1);
        self.zoom_level = level as usize;
    }

    /// Converts a graph-space point to panel-space pixels.
    pub fn graph_coord_to_panel_coord(&self, graph_pos: egui::Pos2) -> egui::Pos2 {
        let offset = egui::vec2(self.view_offset.0, self.view_offset.1);
        (graph_pos - offset) * self.zoom_amount()
    }

    /// Converts a panel-space pixel position back to graph space.
    pub fn panel_coord_to_graph_coord(&self, panel_pos: egui::Pos2) -> egui::Pos2 {
        let offset = egui::vec2(self.view_offset.0, self.view_offset.1);
        panel_pos / self.zoom_amount() + offset
    }

    /// Converts a graph-space rectangle to panel space.
    pub fn graph_rect_to_panel_rect(&self, graph_rect: egui::Rect) -> egui::Rect {
        egui::Rect::from_min_max(
            self.graph_coord_to_panel_coord(graph_rect.min),
            self.graph_coord_to_panel_coord(graph_rect.max),
        )
    }

    /// Pans so the view centers on `graph_point` within a viewport of the
    /// given panel-space size.
    pub fn center_on(&mut self, graph_point: egui::Pos2, viewport_size: egui::Vec2) {
        let half = viewport_size / (2.0 * self.zoom_amount());
        self.view_offset = (graph_point.x - half.x, graph_point.y - half.y);
    }

    /// Finds the zoom level whose amount best matches `amount`, rounding in
    /// the requested direction when it falls between entries. Amounts outside
    /// the table clamp to the first/last level.
    pub fn find_nearest_zoom_level(amount: f32, rounding: ZoomRounding) -> usize {
        match rounding {
            ZoomRounding::Down => ZOOM_LEVELS
                .iter()
                .rposition(|&z| z <= amount)
                .unwrap_or(0),
            ZoomRounding::Up => ZOOM_LEVELS
                .iter()
                .position(|&z| z >= amount)
                .unwrap_or(ZOOM_LEVELS.len() - 1),
        }
    }

    /// Picks the zoom level for fitting `bounds` (graph space) inside
    /// `viewport` (panel space), never exceeding 1:1.
    ///
    /// Degenerate bounds or viewport yield the default level.
    pub fn zoom_level_for_rect(bounds: egui::Rect, viewport: egui::Rect) -> usize {
        if bounds.width() <= f32::EPSILON
            || bounds.height() <= f32::EPSILON
            || viewport.width() <= f32::EPSILON
            || viewport.height() <= f32::EPSILON
        {
            return DEFAULT_ZOOM_LEVEL;
        }
        let required = (viewport.width() / bounds.width())
            .min(viewport.height() / bounds.height());
        Self::find_nearest_zoom_level(required, ZoomRounding::Down).min(DEFAULT_ZOOM_LEVEL)
    }

    /// Auto-pan amount while dragging near or past a viewport edge.
    ///
    /// Returns zero while the cursor is comfortably inside `viewport`, and a
    /// vector proportional to how far the cursor has crossed into the edge
    /// band (or beyond the edge) otherwise, capped per axis. Degenerate
    /// viewports produce no pan.
    pub fn compute_edge_pan_amount(viewport: egui::Rect, cursor: egui::Pos2) -> egui::Vec2 {
        let margin = constants::EDGE_PAN_MARGIN;
        if viewport.width() <= 2.0 * margin || viewport.height() <= 2.0 * margin {
            return egui::Vec2::ZERO;
        }

        let mut pan = egui::Vec2::ZERO;
        if cursor.x < viewport.min.x + margin {
            pan.x = cursor.x - (viewport.min.x + margin);
        } else if cursor.x > viewport.max.x - margin {
            pan.x = cursor.x - (viewport.max.x - margin);
        }
        if cursor.y < viewport.min.y + margin {
            pan.y = cursor.y - (viewport.min.y + margin);
        } else if cursor.y > viewport.max.y - margin {
            pan.y = cursor.y - (viewport.max.y - margin);
        }

        pan.x = (pan.x * constants::EDGE_PAN_SCALE)
            .clamp(-constants::EDGE_PAN_MAX, constants::EDGE_PAN_MAX);
        pan.y = (pan.y * constants::EDGE_PAN_SCALE)
            .clamp(-constants::EDGE_PAN_MAX, constants::EDGE_PAN_MAX);
        pan
    }
}
