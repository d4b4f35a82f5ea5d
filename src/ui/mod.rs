//! User interface for the node graph editor.
//!
//! # Module Organization
//!
//! - `camera` - Pan/zoom transform with the fixed zoom-level table
//! - `state` - Application state structures and the main GraphEditorApp
//! - `selection` - Selection set and the click-then-maybe-drag state machine
//! - `marquee` - Rubber-band selection
//! - `panel` - Node widget container, reconcile, two-pass layout, culling
//! - `splines` - Wire curves and hover detection
//! - `drag_drop` - Node drag operations and drop policy
//! - `rendering` - Drawing the grid, wires, nodes, and overlays

pub mod camera;
pub mod drag_drop;
pub mod marquee;
pub mod panel;
pub mod rendering;
pub mod selection;
pub mod splines;
pub mod state;


pub use camera::{Camera, ZoomRounding, DEFAULT_ZOOM_LEVEL, ZOOM_LEVELS};
pub use drag_drop::{DragNodeOperation, DropFeedback, DropResult, FeedbackIcon};
pub use marquee::{
    apply_marquee_selection, find_nodes_affected_by_marquee, MarqueeMode, MarqueeOperation,
};
pub use panel::{AddNodeBehavior, ArrangedNode, NodePanel, NodeWidget};
pub use selection::{ClickState, SelectionEvent, SelectionManager};
pub use splines::{
    compute_spline_overlap, pin_panel_anchor, CubicBezier, SplineHoverCache, SplineOverlapResult,
};
pub use state::{GraphEditorApp, InteractionState, JumpRequest, ViewState};

use crate::constants;
use crate::types::{NodeId, PinRef};
use eframe::egui;
use log::debug;

impl eframe::App for GraphEditorApp {
    /// Persist graph and view state between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.resolve_pending_jump();
        self.handle_delete_key(ctx);
        self.handle_view_shortcuts(ctx);

        egui::TopBottomPanel::top("graph_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        for event in self.take_selection_events() {
            match event {
                SelectionEvent::Changed(ids) => debug!("selection changed: {} node(s)", ids.len()),
            }
        }

        if self.zoom_text_frames > 0 {
            self.zoom_text_frames -= 1;
            ctx.request_repaint();
        }
    }
}

impl GraphEditorApp {
    /// Drains the selection-change events accumulated since the last call.
    pub fn take_selection_events(&mut self) -> Vec<SelectionEvent> {
        self.selection.drain_events()
    }

    /// Requests centering the view on one node. Applied at the start of the
    /// next frame, when the viewport size is known.
    pub fn jump_to_node(&mut self, id: NodeId) {
        self.pending_jump = Some(JumpRequest::ToNode(id));
    }

    /// Requests centering the view on one pin's anchor. Applied at the start
    /// of the next frame, when the viewport size is known.
    pub fn jump_to_pin(&mut self, pin: PinRef) {
        self.pending_jump = Some(JumpRequest::ToPin(pin));
    }

    /// Requests panning and zooming so the selected nodes (or everything,
    /// when nothing is selected) fit the viewport.
    pub fn zoom_to_fit_selection(&mut self) {
        let mut ids: Vec<NodeId> = self.selection.selected().iter().copied().collect();
        ids.sort();
        self.pending_jump = Some(JumpRequest::FitNodes(ids));
    }

    /// The current zoom as display text.
    pub fn zoom_percentage_text(&self) -> String {
        self.view.camera.zoom_percent_text()
    }

    fn resolve_pending_jump(&mut self) {
        let Some(viewport) = self.last_viewport else {
            return;
        };
        let Some(request) = self.pending_jump.take() else {
            return;
        };
        match request {
            JumpRequest::ToNode(id) => {
                if let Some(bounds) = self.panel.bounds_of(std::iter::once(id)) {
                    self.view.camera.center_on(bounds.center(), viewport.size());
                }
            }
            JumpRequest::ToPin(pin) => {
                let anchor = self
                    .graph
                    .node(pin.node)
                    .zip(self.panel.get_node_widget_from_guid(pin.node))
                    .and_then(|(backing, widget)| widget.pin_anchor(backing, pin.pin));
                if let Some(anchor) = anchor {
                    self.view.camera.center_on(anchor, viewport.size());
                }
            }
            JumpRequest::FitNodes(ids) => {
                let bounds = if ids.is_empty() {
                    self.panel.bounds_all()
                } else {
                    self.panel.bounds_of(ids.into_iter())
                };
                if let Some(bounds) = bounds {
                    let level = Camera::zoom_level_for_rect(bounds, viewport);
                    self.view.camera.set_zoom_level(level);
                    self.view.camera.center_on(bounds.center(), viewport.size());
                    self.zoom_text_frames = constants::ZOOM_TEXT_FADE_FRAMES;
                }
            }
        }
    }

    /// Delete removes every selected node (and, via the backing graph, any
    /// link that referenced them).
    fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        if !ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
            return;
        }
        let mut doomed: Vec<NodeId> = self.selection.selected().iter().copied().collect();
        doomed.sort();
        for id in doomed {
            self.graph.remove_node(id);
        }
        self.interaction.spline_cache.invalidate();
    }

    /// Home fits everything; F fits the current selection.
    fn handle_view_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Home)) {
            self.pending_jump = Some(JumpRequest::FitNodes(Vec::new()));
        } else if ctx.input(|i| i.key_pressed(egui::Key::F)) && !self.selection.is_empty() {
            self.zoom_to_fit_selection();
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Fit All").clicked() {
                self.pending_jump = Some(JumpRequest::FitNodes(Vec::new()));
            }
            ui.add_enabled_ui(!self.selection.is_empty(), |ui| {
                if ui.button("Fit Selection").clicked() {
                    self.zoom_to_fit_selection();
                }
            });

            ui.separator();
            ui.checkbox(&mut self.view.show_grid, "Show Grid");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("Zoom: {}", self.zoom_percentage_text()));
                ui.separator();
                ui.label(format!("Selected: {}", self.selection.len()));
            });
        });
    }

    /// Renders the canvas and routes pointer input through, in priority
    /// order: panning, zooming, marquee, then node and wire interactions.
    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        let viewport = egui::Rect::from_min_size(egui::Pos2::ZERO, canvas_rect.size());
        self.last_viewport = Some(viewport);

        self.panel.update(&self.graph, &mut self.selection);

        self.handle_canvas_panning(ui, &response, canvas_rect);
        self.handle_canvas_zoom(ui, &response, canvas_rect);
        self.update_spline_hover(ui, canvas_rect);

        let arranged = self.panel.arrange(&self.graph, &self.view.camera, viewport);
        let marquee_finished = self.handle_marquee(ui, &response, canvas_rect, &arranged);
        self.handle_node_and_wire_interactions(
            ui,
            &response,
            canvas_rect,
            viewport,
            &arranged,
            marquee_finished,
        );

        // Interactions may have moved nodes or the camera this frame.
        let arranged = self.panel.arrange(&self.graph, &self.view.camera, viewport);
        self.render_graph_elements(&painter, canvas_rect, &arranged);
    }

    /// Middle- or right-button drag pans the canvas.
    fn handle_canvas_panning(
        &mut self,
        ui: &mut egui::Ui,
        response: &egui::Response,
        canvas_rect: egui::Rect,
    ) {
        let should_pan =
            ui.input(|i| i.pointer.middle_down() || i.pointer.secondary_down());
        if should_pan {
            if let Some(pos) = response.interact_pointer_pos() {
                let panel_pos = self.screen_to_panel(canvas_rect, pos);
                if !self.interaction.is_panning {
                    self.interaction.is_panning = true;
                    self.interaction.last_pan_pos = Some(panel_pos);
                } else if let Some(last) = self.interaction.last_pan_pos {
                    let delta = panel_pos - last;
                    if delta != egui::Vec2::ZERO {
                        let zoom = self.view.camera.zoom_amount();
                        self.view.camera.view_offset.0 -= delta.x / zoom;
                        self.view.camera.view_offset.1 -= delta.y / zoom;
                        // Wires moved under the cursor.
                        self.interaction.spline_cache.invalidate();
                    }
                    self.interaction.last_pan_pos = Some(panel_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Scroll wheel steps through the zoom table, keeping the graph point
    /// under the cursor fixed in place.
    fn handle_canvas_zoom(
        &mut self,
        ui: &mut egui::Ui,
        response: &egui::Response,
        canvas_rect: egui::Rect,
    ) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }
        let Some(mouse_pos) = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos())
        else {
            return;
        };
        if !canvas_rect.contains(mouse_pos) {
            return;
        }

        let panel_pos = self.screen_to_panel(canvas_rect, mouse_pos);
        self.apply_zoom_step(panel_pos, if scroll_delta > 0.0 { 1 } else { -1 });
    }

    /// Steps through the zoom table, keeping the graph point under
    /// `panel_pos` fixed in place.
    fn apply_zoom_step(&mut self, panel_pos: egui::Pos2, steps: i32) {
        let world_before = self.view.camera.panel_coord_to_graph_coord(panel_pos);
        let old_level = self.view.camera.zoom_level;
        self.view.camera.step_zoom(steps);

        if self.view.camera.zoom_level != old_level {
            // Re-derive the pan so world_before stays under the cursor.
            let amount = self.view.camera.zoom_amount();
            self.view.camera.view_offset = (
                world_before.x - panel_pos.x / amount,
                world_before.y - panel_pos.y / amount,
            );
            // Panel-space wire distances changed even though the cursor
            // did not move.
            self.interaction.spline_cache.invalidate();
            self.zoom_text_frames = constants::ZOOM_TEXT_FADE_FRAMES;
        }
    }

    /// Keeps the wire-hover cache current while the cursor is over the canvas.
    fn update_spline_hover(&mut self, ui: &egui::Ui, canvas_rect: egui::Rect) {
        let Some(hover) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };
        if !canvas_rect.contains(hover) {
            return;
        }
        let panel_pos = (hover - canvas_rect.min).to_pos2();
        let graph = &self.graph;
        let panel = &self.panel;
        let camera = &self.view.camera;
        self.interaction
            .spline_cache
            .query(panel_pos, |cursor| {
                compute_spline_overlap(cursor, graph, panel, camera)
            });
    }

    /// Marquee lifecycle. Returns `true` on the frame a valid marquee was
    /// applied, so the click handler does not also clear the selection.
    fn handle_marquee(
        &mut self,
        ui: &mut egui::Ui,
        response: &egui::Response,
        canvas_rect: egui::Rect,
        arranged: &[ArrangedNode],
    ) -> bool {
        let primary_down = ui.input(|i| i.pointer.primary_down());
        let can_interact = !self.interaction.is_panning
            && self.interaction.drag.is_none()
            && self.interaction.wire_drag.is_none()
            && matches!(self.selection.click_state(), ClickState::Idle);

        if primary_down && can_interact {
            if let Some(pos) = response.interact_pointer_pos() {
                let panel_pos = self.screen_to_panel(canvas_rect, pos);
                if let Some(marquee) = &mut self.interaction.marquee {
                    marquee.update(panel_pos);
                } else if ui.input(|i| i.pointer.primary_pressed()) {
                    // Only a press that lands on empty space arms a marquee.
                    let over_node = self
                        .panel
                        .node_at_panel_pos(arranged, &self.view.camera, panel_pos)
                        .is_some();
                    let over_pin = self.find_pin_at(panel_pos).is_some();
                    let over_wire = self
                        .interaction
                        .spline_cache
                        .current()
                        .map(|r| r.is_valid())
                        .unwrap_or(false);
                    if !over_node && !over_pin && !over_wire {
                        let modifiers = ui.input(|i| i.modifiers);
                        self.interaction.marquee =
                            Some(MarqueeOperation::new(panel_pos, &modifiers));
                    }
                }
            }
            false
        } else if let Some(marquee) = self.interaction.marquee.take() {
            // A degenerate marquee never touches the selection.
            if marquee.is_valid() {
                let affected = find_nodes_affected_by_marquee(
                    &marquee,
                    &self.view.camera,
                    self.panel.marquee_bounds(),
                );
                let new_selection =
                    apply_marquee_selection(marquee.mode, self.selection.selected(), &affected);
                self.selection.replace_selection(new_selection);
                true
            } else {
                false
            }
        } else {
            false
        }
    }

    /// Press, drag, and release handling for nodes, pins, and wires.
    fn handle_node_and_wire_interactions(
        &mut self,
        ui: &mut egui::Ui,
        response: &egui::Response,
        canvas_rect: egui::Rect,
        viewport: egui::Rect,
        arranged: &[ArrangedNode],
        marquee_finished: bool,
    ) {
        let primary_down = ui.input(|i| i.pointer.primary_down());
        let pointer_panel = response
            .interact_pointer_pos()
            .map(|pos| self.screen_to_panel(canvas_rect, pos));

        if primary_down && !self.interaction.is_panning && self.interaction.marquee.is_none() {
            let Some(panel_pos) = pointer_panel else {
                return;
            };

            if ui.input(|i| i.pointer.primary_pressed()) {
                let modifiers = ui.input(|i| i.modifiers);
                if let Some(pin) = self.find_pin_at(panel_pos) {
                    self.interaction.wire_drag = Some((pin, panel_pos));
                } else if let Some(node) =
                    self.panel
                        .node_at_panel_pos(arranged, &self.view.camera, panel_pos)
                {
                    self.selection.press_on_node(node, &modifiers, panel_pos);
                } else if let Some(overlap) = self
                    .interaction
                    .spline_cache
                    .current()
                    .filter(|r| r.is_valid())
                {
                    // Grabbing a wire acts like grabbing its nearer pin.
                    self.interaction.wire_drag = Some((overlap.compute_best_pin(), panel_pos));
                }
                return;
            }

            if let Some((_, pos)) = &mut self.interaction.wire_drag {
                *pos = panel_pos;
                return;
            }

            if self.selection.pointer_moved(panel_pos) {
                let mut dragged: Vec<NodeId> =
                    self.selection.selected().iter().copied().collect();
                dragged.sort();
                self.interaction.drag = Some(DragNodeOperation::new(dragged, panel_pos));
                self.interaction.drag_last_graph_pos =
                    Some(self.view.camera.panel_coord_to_graph_coord(panel_pos));
            }

            if let Some(mut drag) = self.interaction.drag.take() {
                let pan = drag.on_drag_update(panel_pos, viewport);
                if pan != egui::Vec2::ZERO {
                    let zoom = self.view.camera.zoom_amount();
                    self.view.camera.view_offset.0 += pan.x / zoom;
                    self.view.camera.view_offset.1 += pan.y / zoom;
                }

                let cursor_graph = self.view.camera.panel_coord_to_graph_coord(panel_pos);
                if let Some(last) = self.interaction.drag_last_graph_pos {
                    let delta = cursor_graph - last;
                    if delta != egui::Vec2::ZERO {
                        for id in drag.dragged_nodes().to_vec() {
                            if let Some(node) = self.graph.node(id) {
                                let (x, y) = node.position;
                                self.graph.move_node_to(id, (x + delta.x, y + delta.y));
                            }
                        }
                        self.interaction.spline_cache.invalidate();
                    }
                }
                self.interaction.drag_last_graph_pos = Some(cursor_graph);

                // The dragged nodes ride under the cursor; hit-test past them
                // so the node beneath is found as the drop target.
                let candidates: Vec<ArrangedNode> = arranged
                    .iter()
                    .filter(|a| !drag.is_dragging(a.id))
                    .copied()
                    .collect();
                let target =
                    self.panel
                        .node_at_panel_pos(&candidates, &self.view.camera, panel_pos);
                drag.hover_target_changed(&self.graph, self.schema.as_ref(), target);

                self.interaction.drag = Some(drag);
            }
        } else {
            if let Some((from, pos)) = self.interaction.wire_drag.take() {
                if let Some(to) = self.find_pin_at(pos) {
                    match self.graph.add_link(from, to) {
                        Ok(()) => self.interaction.spline_cache.invalidate(),
                        Err(reason) => debug!("wire drop rejected: {reason}"),
                    }
                }
            }

            self.selection.release();

            if let Some(drag) = self.interaction.drag.take() {
                match drag.hovered_target() {
                    Some(target) => {
                        drag.dropped_on_node(&mut self.graph, target);
                    }
                    None => {
                        drag.dropped_on_panel();
                    }
                }
                self.interaction.drag_last_graph_pos = None;
                self.interaction.spline_cache.invalidate();
            }

            // A plain click on empty space clears the selection; a modifier
            // click leaves it alone so marquee modes compose predictably.
            if response.clicked() && !marquee_finished {
                if let Some(panel_pos) = pointer_panel {
                    let over_anything = self
                        .panel
                        .node_at_panel_pos(arranged, &self.view.camera, panel_pos)
                        .is_some()
                        || self.find_pin_at(panel_pos).is_some()
                        || self
                            .interaction
                            .spline_cache
                            .current()
                            .map(|r| r.is_valid())
                            .unwrap_or(false);
                    let modifiers = ui.input(|i| i.modifiers);
                    if !over_anything && !modifiers.any() {
                        self.selection.clear_selection();
                    }
                }
            }
        }
    }

    /// The pin whose anchor glyph is under a panel-space point, if any.
    fn find_pin_at(&self, panel_pos: egui::Pos2) -> Option<PinRef> {
        let radius = constants::PIN_RADIUS * self.view.camera.zoom_amount() * 2.0;
        for node in &self.graph.nodes {
            for pin in &node.pins {
                let pin_ref = PinRef {
                    node: node.id,
                    pin: pin.id,
                };
                if let Some(anchor) =
                    pin_panel_anchor(pin_ref, &self.graph, &self.panel, &self.view.camera)
                {
                    if (anchor - panel_pos).length() <= radius {
                        return Some(pin_ref);
                    }
                }
            }
        }
        None
    }
}
