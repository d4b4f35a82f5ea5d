//! Shared application-wide constants.
//! Centralizes tweakable values used across UI rendering and interactions.

// Node dimensions
/// Default node body width in graph units.
pub const NODE_WIDTH: f32 = 120.0;
/// Minimum node body height in graph units; grows with pin count.
pub const NODE_MIN_HEIGHT: f32 = 56.0;
/// Vertical spacing between stacked pins on a node edge (graph units).
pub const PIN_SPACING: f32 = 18.0;
/// Pin glyph radius in graph units.
pub const PIN_RADIUS: f32 = 5.0;
/// Height of a comment node's title strip (graph units). Comments are
/// marquee-selected by their title bar only.
pub const COMMENT_TITLE_HEIGHT: f32 = 24.0;
/// Default size of a comment node body in graph units.
pub const COMMENT_SIZE: (f32, f32) = (240.0, 160.0);

// Grid/drawing
/// Grid cell size in graph units.
pub const GRID_SIZE: f32 = 20.0;

// Canvas interactions
/// Panel-space distance the pointer must travel before a press on a node
/// becomes a drag rather than a click.
pub const CLICK_DRAG_THRESHOLD: f32 = 4.0;
/// Marquee rectangles with both extents at or below this (panel pixels) are
/// treated as degenerate clicks, never as selections.
pub const MARQUEE_EPSILON: f32 = 2.0;
/// Maximum panel-space distance from a wire for it to count as hovered.
pub const SPLINE_HOVER_TOLERANCE: f32 = 8.0;
/// Number of uniform samples taken along a wire when measuring cursor distance.
pub const SPLINE_SAMPLES: usize = 32;

// Edge auto-pan while dragging
/// Width of the band inside the viewport edge that triggers auto-pan.
pub const EDGE_PAN_MARGIN: f32 = 24.0;
/// Scale applied to the cursor's overshoot past the pan band.
pub const EDGE_PAN_SCALE: f32 = 0.35;
/// Per-frame cap on the auto-pan amount (panel pixels, per axis).
pub const EDGE_PAN_MAX: f32 = 32.0;

// Chrome
/// Number of frames the zoom-percentage overlay stays visible after a zoom
/// change before it has fully faded out.
pub const ZOOM_TEXT_FADE_FRAMES: u64 = 90;
/// Maximum number of recently user-added nodes remembered by the panel.
pub const USER_ADDED_HISTORY_MAX: usize = 16;
