//! Shared constants for the frame renderer (all in SVG user units = pixels).

// ── Fingerboard ─────────────────────────────────────────────────────
pub(super) const BOARD_WIDTH: f64 = 800.0;
pub(super) const BOARD_HEIGHT: f64 = 300.0;
pub(super) const STRING_SPACING: f64 = BOARD_HEIGHT / 5.0;
pub(super) const FRET_SPACING: f64 = BOARD_WIDTH / 16.0;
pub(super) const STRING_WIDTH: f64 = 3.0;
pub(super) const FRET_WIDTH: f64 = 1.0;
pub(super) const STRING_LABEL_OFFSET_X: f64 = -30.0;
pub(super) const STRING_LABEL_OFFSET_Y: f64 = -10.0;
pub(super) const FRET_LABEL_OFFSET_X: f64 = -5.0;
pub(super) const FRET_LABEL_OFFSET_Y: f64 = -20.0;
pub(super) const SCAFFOLD_LABEL_SIZE: f64 = 12.0;

// ── Note markers ────────────────────────────────────────────────────
pub(super) const MARKER_RADIUS: f64 = 10.0;
pub(super) const MARKER_OUTLINE_WIDTH: f64 = 1.0;
pub(super) const NOTE_LABEL_OFFSET_X: f64 = -10.0;
pub(super) const NOTE_LABEL_OFFSET_Y: f64 = -30.0;
pub(super) const NOTE_LABEL_SIZE: f64 = 16.0;

// ── Title bar ───────────────────────────────────────────────────────
pub(super) const TITLE_TOP: f64 = 30.0;
pub(super) const TITLE_SIZE: f64 = 24.0;

// ── Colors ──────────────────────────────────────────────────────────
pub(super) const BACKGROUND_COLOR: &str = "#000000";
pub(super) const BOARD_COLOR: &str = "#323232";
pub(super) const BOARD_OUTLINE_COLOR: &str = "#646464";
pub(super) const FRET_COLOR: &str = "#646464";
pub(super) const FRET_LABEL_COLOR: &str = "#969696";
/// G, D, A, E strings, in shades of brown
pub(super) const STRING_COLORS: [&str; 4] = ["#8b4513", "#a52a2a", "#cd853f", "#d2b48c"];
pub(super) const NOTE_COLOR: &str = "#00bfff";
pub(super) const HIGHLIGHT_COLOR: &str = "#ff0000";
pub(super) const MARKER_OUTLINE_COLOR: &str = "#ffffff";
pub(super) const TEXT_COLOR: &str = "#ffffff";
