//! Canvas rendering for the grid, wires, nodes, pins, and overlays.
//!
//! Elements are drawn in layers: grid first, then comment backdrops and
//! wires, then node bodies, then the marquee rectangle and the drag
//! decorator on top.

use crate::constants;
use crate::types::{GraphNode, NodeKind, PinDirection};
use eframe::egui;
use eframe::epaint::StrokeKind;

use super::drag_drop::FeedbackIcon;
use super::panel::ArrangedNode;
use super::splines::{pin_panel_anchor, CubicBezier};
use super::state::GraphEditorApp;

const WIRE_COLOR: egui::Color32 = egui::Color32::from_gray(150);
const WIRE_HOVER_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 200, 80);
const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 165, 0);

impl GraphEditorApp {
    /// Converts a panel-space point to absolute screen space.
    pub fn panel_to_screen(&self, canvas_rect: egui::Rect, panel_pos: egui::Pos2) -> egui::Pos2 {
        canvas_rect.min + panel_pos.to_vec2()
    }

    /// Converts an absolute screen point to panel space.
    pub fn screen_to_panel(&self, canvas_rect: egui::Rect, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - canvas_rect.min).to_pos2()
    }

    /// Renders every graph element onto the canvas.
    pub fn render_graph_elements(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        arranged: &[ArrangedNode],
    ) {
        if self.view.show_grid {
            self.draw_grid(painter, canvas_rect);
        }

        self.draw_wires(painter, canvas_rect);

        if let Some((from, pos)) = self.interaction.wire_drag {
            if let Some(start) =
                pin_panel_anchor(from, &self.graph, &self.panel, &self.view.camera)
            {
                let curve = CubicBezier::between_pins(
                    self.panel_to_screen(canvas_rect, start),
                    self.panel_to_screen(canvas_rect, pos),
                );
                self.draw_bezier(painter, &curve, egui::Stroke::new(2.0, WIRE_HOVER_COLOR));
            }
        }

        for entry in arranged {
            if entry.culled {
                continue;
            }
            if let Some(node) = self.graph.node(entry.id) {
                self.draw_node(painter, canvas_rect, node, entry.panel_rect);
            }
        }

        if let Some(marquee) = &self.interaction.marquee {
            if marquee.is_valid() {
                let rect = marquee.rect().translate(canvas_rect.min.to_vec2());
                let fill = egui::Color32::from_rgba_unmultiplied(100, 150, 255, 40);
                let stroke = egui::Stroke::new(1.5, egui::Color32::from_rgb(100, 150, 255));
                painter.rect_filled(rect, 0.0, fill);
                painter.rect_stroke(rect, 0.0, stroke, StrokeKind::Inside);
            }
        }

        if let Some(drag) = &self.interaction.drag {
            self.draw_drag_decorator(painter, canvas_rect, drag);
        }

        self.draw_zoom_overlay(painter, canvas_rect);
    }

    /// Draws the background grid in graph units, skipping it when the zoom
    /// makes the spacing too dense to read.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let grid_size = constants::GRID_SIZE;
        let zoom = self.view.camera.zoom_amount();
        let screen_grid_size = grid_size * zoom;
        if screen_grid_size < 2.0 {
            return;
        }

        let grid_color = egui::Color32::from_rgba_unmultiplied(128, 128, 128, 32);
        let stroke = egui::Stroke::new(1.0, grid_color);

        let top_left = self
            .view
            .camera
            .panel_coord_to_graph_coord(self.screen_to_panel(canvas_rect, canvas_rect.min));
        let bottom_right = self
            .view
            .camera
            .panel_coord_to_graph_coord(self.screen_to_panel(canvas_rect, canvas_rect.max));

        let mut x = (top_left.x / grid_size).floor() * grid_size;
        while x <= bottom_right.x {
            let panel_x = self.view.camera.graph_coord_to_panel_coord(egui::pos2(x, 0.0)).x;
            let screen_x = canvas_rect.min.x + panel_x;
            if screen_x >= canvas_rect.min.x && screen_x <= canvas_rect.max.x {
                painter.line_segment(
                    [
                        egui::pos2(screen_x, canvas_rect.min.y),
                        egui::pos2(screen_x, canvas_rect.max.y),
                    ],
                    stroke,
                );
            }
            x += grid_size;
        }

        let mut y = (top_left.y / grid_size).floor() * grid_size;
        while y <= bottom_right.y {
            let panel_y = self.view.camera.graph_coord_to_panel_coord(egui::pos2(0.0, y)).y;
            let screen_y = canvas_rect.min.y + panel_y;
            if screen_y >= canvas_rect.min.y && screen_y <= canvas_rect.max.y {
                painter.line_segment(
                    [
                        egui::pos2(canvas_rect.min.x, screen_y),
                        egui::pos2(canvas_rect.max.x, screen_y),
                    ],
                    stroke,
                );
            }
            y += grid_size;
        }
    }

    /// Draws every resolvable wire; the wire the cursor is hovering gets the
    /// highlight stroke.
    fn draw_wires(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let hovered = self
            .interaction
            .spline_cache
            .current()
            .filter(|r| r.is_valid());
        for (from, to) in self.graph.wires() {
            let (Some(start), Some(end)) = (
                pin_panel_anchor(from, &self.graph, &self.panel, &self.view.camera),
                pin_panel_anchor(to, &self.graph, &self.panel, &self.view.camera),
            ) else {
                continue;
            };
            let is_hovered = hovered
                .map(|r| r.pin1 == from && r.pin2 == to)
                .unwrap_or(false);
            let stroke = if is_hovered {
                egui::Stroke::new(3.0, WIRE_HOVER_COLOR)
            } else {
                egui::Stroke::new(2.0, WIRE_COLOR)
            };
            let curve = CubicBezier::between_pins(
                self.panel_to_screen(canvas_rect, start),
                self.panel_to_screen(canvas_rect, end),
            );
            self.draw_bezier(painter, &curve, stroke);
        }
    }

    fn draw_bezier(&self, painter: &egui::Painter, curve: &CubicBezier, stroke: egui::Stroke) {
        let mut prev = curve.sample(0.0);
        for i in 1..=constants::SPLINE_SAMPLES {
            let next = curve.sample(i as f32 / constants::SPLINE_SAMPLES as f32);
            painter.line_segment([prev, next], stroke);
            prev = next;
        }
    }

    /// Renders one node body, its title, and its pin glyphs.
    ///
    /// `panel_rect` comes from the arrangement pass, so Edge-kind nodes are
    /// drawn at their midpoint position without re-deriving it here.
    fn draw_node(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        node: &GraphNode,
        panel_rect: egui::Rect,
    ) {
        let rect = panel_rect.translate(canvas_rect.min.to_vec2());
        let zoom = self.view.camera.zoom_amount();

        let fill = match node.kind {
            NodeKind::Standard => egui::Color32::from_rgb(60, 66, 82),
            NodeKind::Comment => egui::Color32::from_rgba_unmultiplied(200, 200, 120, 40),
            NodeKind::Edge => egui::Color32::from_rgb(82, 66, 60),
        };
        painter.rect_filled(rect, 5.0, fill);

        let is_dragging = self
            .interaction
            .drag
            .as_ref()
            .map(|d| d.is_dragging(node.id))
            .unwrap_or(false);
        let (stroke_color, stroke_width) = if is_dragging {
            (SELECTION_COLOR, 3.0)
        } else if self.selection.is_selected(node.id) {
            (egui::Color32::YELLOW, 2.5)
        } else {
            (egui::Color32::from_gray(30), 1.5)
        };
        painter.rect_stroke(
            rect,
            5.0,
            egui::Stroke::new(stroke_width, stroke_color),
            StrokeKind::Outside,
        );

        let font_size = (12.0 * zoom).clamp(6.0, 48.0);
        let font = egui::FontId::proportional(font_size);
        let title_pos = match node.kind {
            NodeKind::Comment => egui::pos2(
                rect.min.x + 6.0 * zoom,
                rect.min.y + constants::COMMENT_TITLE_HEIGHT * zoom * 0.5,
            ),
            _ => egui::pos2(rect.center().x, rect.min.y + 12.0 * zoom),
        };
        let align = match node.kind {
            NodeKind::Comment => egui::Align2::LEFT_CENTER,
            _ => egui::Align2::CENTER_CENTER,
        };
        painter.text(title_pos, align, &node.title, font, egui::Color32::WHITE);

        for pin in &node.pins {
            let Some(anchor) = self
                .panel
                .get_node_widget_from_guid(node.id)
                .and_then(|w| w.pin_anchor(node, pin.id))
            else {
                continue;
            };
            let screen = self.panel_to_screen(
                canvas_rect,
                self.view.camera.graph_coord_to_panel_coord(anchor),
            );
            let color = match pin.direction {
                PinDirection::Input => egui::Color32::from_rgb(120, 200, 120),
                PinDirection::Output => egui::Color32::from_rgb(120, 160, 230),
            };
            painter.circle_filled(screen, constants::PIN_RADIUS * zoom, color);
        }
    }

    /// Draws the floating decorator that follows the cursor during a node
    /// drag: one icon-and-message row per dragged node.
    fn draw_drag_decorator(
        &self,
        painter: &egui::Painter,
        canvas_rect: egui::Rect,
        drag: &super::drag_drop::DragNodeOperation,
    ) {
        let feedback = drag.feedback();
        if feedback.is_empty() {
            return;
        }

        let font = egui::FontId::proportional(12.0);
        let line_height = 18.0;
        let origin = self.panel_to_screen(canvas_rect, drag.decorator_pos()) + egui::vec2(16.0, 16.0);

        let width = feedback
            .iter()
            .map(|f| {
                painter
                    .layout_no_wrap(f.message.clone(), font.clone(), egui::Color32::WHITE)
                    .size()
                    .x
            })
            .fold(0.0f32, f32::max);
        let bg = egui::Rect::from_min_size(
            origin,
            egui::vec2(width + 28.0, line_height * feedback.len() as f32 + 8.0),
        );
        painter.rect_filled(bg, 4.0, egui::Color32::from_rgba_unmultiplied(20, 20, 20, 220));

        for (i, line) in feedback.iter().enumerate() {
            let row_y = bg.min.y + 4.0 + line_height * i as f32 + line_height * 0.5;
            let icon_color = match line.icon {
                FeedbackIcon::Ok => egui::Color32::from_rgb(110, 210, 110),
                FeedbackIcon::Error => egui::Color32::from_rgb(230, 80, 80),
            };
            painter.circle_filled(egui::pos2(bg.min.x + 10.0, row_y), 4.0, icon_color);
            painter.text(
                egui::pos2(bg.min.x + 20.0, row_y),
                egui::Align2::LEFT_CENTER,
                &line.message,
                font.clone(),
                egui::Color32::WHITE,
            );
        }
    }

    /// Draws the zoom-percentage readout in the top-left corner, fading out
    /// over the frames after the last zoom change.
    fn draw_zoom_overlay(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        if self.zoom_text_frames == 0 {
            return;
        }
        let alpha = ((self.zoom_text_frames as f32 / constants::ZOOM_TEXT_FADE_FRAMES as f32)
            * 255.0)
            .clamp(0.0, 255.0) as u8;
        painter.text(
            canvas_rect.min + egui::vec2(12.0, 12.0),
            egui::Align2::LEFT_TOP,
            self.view.camera.zoom_percent_text(),
            egui::FontId::proportional(14.0),
            egui::Color32::from_rgba_unmultiplied(255, 255, 255, alpha),
        );
    }
}
