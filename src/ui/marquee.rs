//! Rubber-band (marquee) selection.
//!
//! A marquee is an ephemeral value: start point, current end point, and a
//! combination mode fixed from the modifier keys at drag-start. It is only
//! meaningful while non-degenerate; a click that never grows past the epsilon
//! is not a marquee and must not touch the selection.

use crate::constants;
use crate::types::NodeId;
use eframe::egui;
use std::collections::HashSet;

use super::camera::Camera;

/// How the marquee result combines with the current selection. Fixed at
/// drag-start from the modifier keys held at that instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarqueeMode {
    /// No modifier: the result replaces the selection.
    Replace,
    /// Shift: the result is unioned into the selection.
    Add,
    /// Alt: the result is subtracted from the selection.
    Remove,
    /// Ctrl/Cmd: membership of affected nodes is inverted (XOR).
    Invert,
}

impl MarqueeMode {
    /// Derives the mode from the modifiers held when the drag started.
    /// Ctrl wins over Shift wins over Alt, matching the standard panel policy.
    pub fn from_modifiers(modifiers: &egui::Modifiers) -> Self {
        if modifiers.command {
            MarqueeMode::Invert
        } else if modifiers.shift {
            MarqueeMode::Add
        } else if modifiers.alt {
            MarqueeMode::Remove
        } else {
            MarqueeMode::Replace
        }
    }
}

/// An in-flight rubber-band selection, in panel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarqueeOperation {
    /// Panel-space point where the drag started.
    pub start: egui::Pos2,
    /// Current panel-space end point; tracks the cursor.
    pub end: egui::Pos2,
    /// Combination mode, fixed at drag-start.
    pub mode: MarqueeMode,
}

impl MarqueeOperation {
    /// Starts a marquee at `start` with the mode taken from `modifiers`.
    pub fn new(start: egui::Pos2, modifiers: &egui::Modifiers) -> Self {
        Self {
            start,
            end: start,
            mode: MarqueeMode::from_modifiers(modifiers),
        }
    }

    /// Moves the end point to follow the cursor.
    pub fn update(&mut self, end: egui::Pos2) {
        self.end = end;
    }

    /// The panel-space rectangle spanned so far.
    pub fn rect(&self) -> egui::Rect {
        egui::Rect::from_two_pos(self.start, self.end)
    }

    /// The marquee rectangle converted to graph space.
    pub fn graph_rect(&self, camera: &Camera) -> egui::Rect {
        egui::Rect::from_two_pos(
            camera.panel_coord_to_graph_coord(self.start),
            camera.panel_coord_to_graph_coord(self.end),
        )
    }

    /// True only once the rectangle has a non-trivial extent on some axis;
    /// guards against a click being misread as a marquee.
    pub fn is_valid(&self) -> bool {
        let rect = self.rect();
        rect.width() > constants::MARQUEE_EPSILON || rect.height() > constants::MARQUEE_EPSILON
    }
}

/// Combines the marquee-affected nodes with the current selection according
/// to the marquee mode, returning the new selection set.
pub fn apply_marquee_selection(
    mode: MarqueeMode,
    current: &HashSet<NodeId>,
    affected: &HashSet<NodeId>,
) -> HashSet<NodeId> {
    match mode {
        MarqueeMode::Replace => affected.clone(),
        MarqueeMode::Add => current.union(affected).copied().collect(),
        MarqueeMode::Remove => current.difference(affected).copied().collect(),
        MarqueeMode::Invert => current.symmetric_difference(affected).copied().collect(),
    }
}

/// Collects the nodes whose marquee bounds intersect the marquee rectangle.
///
/// `marquee_bounds` yields each node's graph-space *marquee* rect, which may
/// differ from its full bounds (a comment node is hit by its title bar only).
/// An invalid (degenerate) marquee affects nothing.
pub fn find_nodes_affected_by_marquee(
    marquee: &MarqueeOperation,
    camera: &Camera,
    marquee_bounds: impl Iterator<Item = (NodeId, egui::Rect)>,
) -> HashSet<NodeId> {
    let mut affected = HashSet::new();
    if !marquee.is_valid() {
        return affected;
    }
    let rect = marquee.graph_rect(camera);
    for (id, bounds) in marquee_bounds {
        if rect.intersects(bounds) {
            affected.insert(id);
        }
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn set(ids: &[NodeId]) -> HashSet<NodeId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_mode_from_modifiers() {
        let none = egui::Modifiers::NONE;
        assert_eq!(MarqueeMode::from_modifiers(&none), MarqueeMode::Replace);

        let shift = egui::Modifiers {
            shift: true,
            ..Default::default()
        };
        assert_eq!(MarqueeMode::from_modifiers(&shift), MarqueeMode::Add);

        let alt = egui::Modifiers {
            alt: true,
            ..Default::default()
        };
        assert_eq!(MarqueeMode::from_modifiers(&alt), MarqueeMode::Remove);

        let ctrl = egui::Modifiers {
            command: true,
            ..Default::default()
        };
        assert_eq!(MarqueeMode::from_modifiers(&ctrl), MarqueeMode::Invert);

        // Ctrl wins when combined.
        let ctrl_shift = egui::Modifiers {
            command: true,
            shift: true,
            ..Default::default()
        };
        assert_eq!(MarqueeMode::from_modifiers(&ctrl_shift), MarqueeMode::Invert);
    }

    #[test]
    fn test_degenerate_marquee_is_never_valid() {
        let mut marquee = MarqueeOperation::new(egui::pos2(10.0, 10.0), &egui::Modifiers::NONE);
        assert!(!marquee.is_valid());
        // A jitter inside the epsilon still does not validate it.
        marquee.update(egui::pos2(11.0, 11.0));
        assert!(!marquee.is_valid());
        // Crossing the epsilon on one axis is enough.
        marquee.update(egui::pos2(10.0, 40.0));
        assert!(marquee.is_valid());
    }

    #[test]
    fn test_apply_replace() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let result =
            apply_marquee_selection(MarqueeMode::Replace, &set(&[a, b]), &set(&[b, c]));
        assert_eq!(result, set(&[b, c]));
    }

    #[test]
    fn test_apply_add() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let result = apply_marquee_selection(MarqueeMode::Add, &set(&[a]), &set(&[b, c]));
        assert_eq!(result, set(&[a, b, c]));
    }

    #[test]
    fn test_apply_remove() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let result = apply_marquee_selection(MarqueeMode::Remove, &set(&[a, b, c]), &set(&[b]));
        assert_eq!(result, set(&[a, c]));
    }

    #[test]
    fn test_apply_invert_is_xor() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let result =
            apply_marquee_selection(MarqueeMode::Invert, &set(&[a, b]), &set(&[b, c]));
        assert_eq!(result, set(&[a, c]));
    }

    #[test]
    fn test_find_affected_intersects_marquee_bounds() {
        // Marquee from (0,0) to (50,50) in panel space at identity zoom.
        let camera = Camera::new();
        let mut marquee = MarqueeOperation::new(egui::pos2(0.0, 0.0), &egui::Modifiers::NONE);
        marquee.update(egui::pos2(50.0, 50.0));

        let inside = Uuid::new_v4();
        let touching = Uuid::new_v4();
        let outside = Uuid::new_v4();
        let bounds = vec![
            (inside, egui::Rect::from_min_size(egui::pos2(10.0, 10.0), egui::vec2(20.0, 20.0))),
            (touching, egui::Rect::from_min_size(egui::pos2(40.0, 40.0), egui::vec2(40.0, 40.0))),
            (outside, egui::Rect::from_min_size(egui::pos2(200.0, 0.0), egui::vec2(20.0, 20.0))),
        ];

        let affected = find_nodes_affected_by_marquee(&marquee, &camera, bounds.into_iter());
        assert_eq!(affected, set(&[inside, touching]));
    }

    #[test]
    fn test_find_affected_respects_camera_transform() {
        // At 0.5x zoom a panel rect (0,0)-(50,50) covers graph (0,0)-(100,100).
        let camera = Camera {
            view_offset: (0.0, 0.0),
            zoom_level: 2, // amount 0.5
        };
        let mut marquee = MarqueeOperation::new(egui::pos2(0.0, 0.0), &egui::Modifiers::NONE);
        marquee.update(egui::pos2(50.0, 50.0));

        let far = Uuid::new_v4();
        let bounds = vec![(
            far,
            egui::Rect::from_min_size(egui::pos2(80.0, 80.0), egui::vec2(10.0, 10.0)),
        )];
        let affected = find_nodes_affected_by_marquee(&marquee, &camera, bounds.into_iter());
        assert!(affected.contains(&far));
    }

    #[test]
    fn test_invalid_marquee_affects_nothing() {
        let camera = Camera::new();
        let marquee = MarqueeOperation::new(egui::pos2(25.0, 25.0), &egui::Modifiers::NONE);
        let id = Uuid::new_v4();
        let bounds = vec![(
            id,
            egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(100.0, 100.0)),
        )];
        let affected = find_nodes_affected_by_marquee(&marquee, &camera, bounds.into_iter());
        assert!(affected.is_empty());
    }
}
