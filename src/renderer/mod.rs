//! Frame renderer: draws the fingerboard for one instant of a timeline.
//!
//! Each frame is built as an SVG scene and rasterized with resvg. Output
//! depends only on the timeline, the query time and the renderer's fixed
//! settings, so identical inputs always give identical pixels.

mod constants;
mod raster;
mod svg_builder;
mod text;

use std::sync::Arc;

use log::trace;
use resvg::tiny_skia::Pixmap;
use resvg::usvg::fontdb::Database;

use crate::config::VideoConfig;
use crate::error::{FingerboardError, Result};
use crate::model::{NoteEvent, Timeline};
use crate::positions::{finger_label, Position, PositionTable, FRETS_PER_STRING, STRINGS};
use constants::*;
use svg_builder::SvgBuilder;
use text::Anchor;

pub use text::FontAsset;

// ═══════════════════════════════════════════════════════════════════════
// Frame
// ═══════════════════════════════════════════════════════════════════════

/// An RGBA8 raster image, row-major, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Opaque black frame.
    pub fn blank(width: u32, height: u32) -> Self {
        let pixels = [0u8, 0, 0, 255].repeat(width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// RGBA value at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4)?.try_into().ok()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Renders fingerboard frames at a fixed canvas size.
#[derive(Clone)]
pub struct FrameRenderer {
    width: u32,
    height: u32,
    font: FontAsset,
    fontdb: Arc<Database>,
    table: &'static PositionTable,
}

impl FrameRenderer {
    pub fn new(width: u32, height: u32, font: FontAsset) -> Result<Self> {
        if Pixmap::new(width, height).is_none() {
            return Err(FingerboardError::Config(format!(
                "cannot render frames of size {width}x{height}"
            )));
        }
        let fontdb = font.database();
        Ok(Self {
            width,
            height,
            font,
            fontdb,
            table: PositionTable::shared(),
        })
    }

    /// Canvas size from the configuration; the configured font is resolved once here.
    pub fn from_config(config: &VideoConfig) -> Result<Self> {
        let font = FontAsset::resolve(config.font_path.as_deref());
        Self::new(config.width, config.height, font)
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn font(&self) -> &FontAsset {
        &self.font
    }

    /// Rasterized frame for `time` seconds into the timeline.
    pub fn render(&self, timeline: &Timeline, time: f64) -> Frame {
        let svg = self.render_svg(timeline, time);
        raster::rasterize(&svg, self.width, self.height, &self.fontdb)
    }

    /// The SVG scene behind `render`.
    pub fn render_svg(&self, timeline: &Timeline, time: f64) -> String {
        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let board = Board::centered(width, height);

        let mut svg = SvgBuilder::new(width, height);
        svg.rect(0.0, 0.0, width, height, BACKGROUND_COLOR, "none", 0.0);
        self.draw_scaffold(&mut svg, &board);

        // Markers for every placeable note, in list order; later markers
        // cover earlier ones at the same coordinate.
        let mut labels = Vec::new();
        for event in &timeline.events {
            let Some(position) = self.table.resolve(&event.pitch) else {
                trace!("No fingerboard position for {} at {time:.2}s", event.pitch);
                continue;
            };
            let (x, y) = board.coordinate(position);
            let active = event.is_active_at(time);
            let fill = if active { HIGHLIGHT_COLOR } else { NOTE_COLOR };
            svg.marker(x, y, MARKER_RADIUS, fill, MARKER_OUTLINE_COLOR, MARKER_OUTLINE_WIDTH);
            if active {
                labels.push((x, y, marker_label(event, position)));
            }
        }
        for (x, y, label) in &labels {
            self.font.draw(
                &mut svg,
                x + NOTE_LABEL_OFFSET_X,
                y + NOTE_LABEL_OFFSET_Y,
                label,
                NOTE_LABEL_SIZE,
                TEXT_COLOR,
                Anchor::Start,
            );
        }

        let title = title_text(timeline, time);
        self.font.draw(&mut svg, width / 2.0, TITLE_TOP, &title, TITLE_SIZE, TEXT_COLOR, Anchor::Middle);

        svg.build()
    }

    fn draw_scaffold(&self, svg: &mut SvgBuilder, board: &Board) {
        svg.rect(board.x, board.y, BOARD_WIDTH, BOARD_HEIGHT, BOARD_COLOR, BOARD_OUTLINE_COLOR, 1.0);

        for (i, open) in STRINGS.iter().enumerate() {
            let y = board.string_y(i);
            svg.line(board.x, y, board.x + BOARD_WIDTH, y, STRING_COLORS[i], STRING_WIDTH);
            self.font.draw(
                svg,
                board.x + STRING_LABEL_OFFSET_X,
                y + STRING_LABEL_OFFSET_Y,
                &open.step.letter().to_string(),
                SCAFFOLD_LABEL_SIZE,
                TEXT_COLOR,
                Anchor::Start,
            );
        }

        self.font.draw(
            svg,
            board.x + FRET_LABEL_OFFSET_X,
            board.y + FRET_LABEL_OFFSET_Y,
            &finger_label(0),
            SCAFFOLD_LABEL_SIZE,
            FRET_LABEL_COLOR,
            Anchor::Start,
        );
        for fret in 1..FRETS_PER_STRING {
            let x = board.fret_x(fret);
            svg.line(x, board.y, x, board.y + BOARD_HEIGHT, FRET_COLOR, FRET_WIDTH);
            self.font.draw(
                svg,
                x + FRET_LABEL_OFFSET_X,
                board.y + FRET_LABEL_OFFSET_Y,
                &finger_label(fret),
                SCAFFOLD_LABEL_SIZE,
                FRET_LABEL_COLOR,
                Anchor::Start,
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Layout and labels
// ═══════════════════════════════════════════════════════════════════════

/// Top-left corner of the fingerboard on the canvas.
struct Board {
    x: f64,
    y: f64,
}

impl Board {
    fn centered(width: f64, height: f64) -> Self {
        Self {
            x: ((width - BOARD_WIDTH) / 2.0).floor(),
            y: ((height - BOARD_HEIGHT) / 2.0).floor(),
        }
    }

    fn string_y(&self, string: usize) -> f64 {
        self.y + (string + 1) as f64 * STRING_SPACING
    }

    fn fret_x(&self, fret: usize) -> f64 {
        self.x + fret as f64 * FRET_SPACING
    }

    fn coordinate(&self, position: Position) -> (f64, f64) {
        (self.fret_x(position.fret), self.string_y(position.string))
    }
}

/// Lyric, else the step letter followed by the finger position.
fn marker_label(event: &NoteEvent, position: Position) -> String {
    event
        .annotation
        .clone()
        .unwrap_or_else(|| format!("{}{}", event.pitch.step.letter(), finger_label(position.fret)))
}

/// `Time: 1.50s - Playing: A4, la`
fn title_text(timeline: &Timeline, time: f64) -> String {
    let playing: Vec<String> = timeline.active_at(time).map(NoteEvent::display_name).collect();
    let mut title = format!("Time: {time:.2}s");
    if !playing.is_empty() {
        title.push_str(" - Playing: ");
        title.push_str(&playing.join(", "));
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Accidental, Pitch, Step};
    use pretty_assertions::assert_eq;

    fn event(label: &str, start: f64, duration: f64, annotation: Option<&str>) -> NoteEvent {
        NoteEvent {
            pitch: label.parse().unwrap(),
            start_time: start,
            duration,
            voice: 1,
            annotation: annotation.map(String::from),
        }
    }

    fn timeline(events: Vec<NoteEvent>) -> Timeline {
        let mut timeline = Timeline::new(1.0, 120.0);
        timeline.events = events;
        timeline
    }

    fn renderer() -> FrameRenderer {
        FrameRenderer::new(1280, 720, FontAsset::Builtin).unwrap()
    }

    fn markers(svg: &str, color: &str) -> usize {
        svg.lines()
            .filter(|l| l.contains(r#"class="marker""#) && l.contains(&format!(r#"fill="{color}""#)))
            .count()
    }

    #[test]
    fn highlights_only_active_notes() {
        let tl = timeline(vec![
            event("G3", 0.0, 1.0, None),
            event("A4", 1.0, 1.0, None),
            event("E5", 2.0, 1.0, None),
        ]);
        let svg = renderer().render_svg(&tl, 1.0);
        assert_eq!(markers(&svg, HIGHLIGHT_COLOR), 1);
        assert_eq!(markers(&svg, NOTE_COLOR), 2);
        // A4 resolves to the open A string: fret 0, third string
        let board = Board::centered(1280.0, 720.0);
        let expected = format!(
            r#"cx="{:.1}" cy="{:.1}" r="10.0" fill="{HIGHLIGHT_COLOR}""#,
            board.fret_x(0),
            board.string_y(2)
        );
        assert!(svg.contains(&expected), "missing {expected}");
    }

    #[test]
    fn end_instant_is_inactive() {
        let tl = timeline(vec![event("D4", 0.0, 0.5, None)]);
        let r = renderer();
        assert_eq!(markers(&r.render_svg(&tl, 0.0), HIGHLIGHT_COLOR), 1);
        assert_eq!(markers(&r.render_svg(&tl, 0.5), HIGHLIGHT_COLOR), 0);
        assert_eq!(title_text(&tl, 0.5), "Time: 0.50s");
    }

    #[test]
    fn title_lists_active_notes() {
        let tl = timeline(vec![
            event("A4", 0.0, 2.0, Some("la")),
            event("C#5", 0.0, 2.0, None),
            event("C3", 0.0, 2.0, None),
        ]);
        assert_eq!(title_text(&tl, 1.0), "Time: 1.00s - Playing: la, C#5, C3");
    }

    #[test]
    fn unplaceable_note_has_no_marker_but_is_listed() {
        let tl = timeline(vec![event("C3", 0.0, 1.0, None)]);
        let svg = renderer().render_svg(&tl, 0.5);
        assert_eq!(markers(&svg, HIGHLIGHT_COLOR) + markers(&svg, NOTE_COLOR), 0);
        assert!(title_text(&tl, 0.5).ends_with("Playing: C3"));
    }

    #[test]
    fn marker_labels() {
        let position = Position { fret: 5, string: 1 };
        assert_eq!(marker_label(&event("G4", 0.0, 1.0, None), position), "G3");
        assert_eq!(marker_label(&event("G4", 0.0, 1.0, Some("sol")), position), "sol");
        let sharp = NoteEvent {
            pitch: Pitch::new(Step::F, Accidental::Sharp, 4),
            ..event("F4", 0.0, 1.0, None)
        };
        assert_eq!(marker_label(&sharp, Position { fret: 4, string: 1 }), "F2+");
    }

    #[test]
    fn silence_draws_scaffold_only() {
        let tl = timeline(Vec::new());
        let svg = renderer().render_svg(&tl, 3.0);
        assert_eq!(svg.matches("<line").count(), STRINGS.len() + FRETS_PER_STRING - 1);
        assert_eq!(markers(&svg, NOTE_COLOR), 0);
    }

    #[test]
    fn rendering_is_pure() {
        let tl = timeline(vec![event("A4", 0.0, 1.0, Some("la")), event("E5", 1.0, 1.0, None)]);
        let r = renderer();
        let first = r.render(&tl, 0.25);
        let second = r.render(&tl, 0.25);
        assert_eq!(first.pixels.len(), 1280 * 720 * 4);
        assert!(first == second);
    }

    #[test]
    fn raster_shows_highlight_marker() {
        let tl = timeline(vec![event("A4", 0.0, 1.0, None)]);
        let board = Board::centered(1280.0, 720.0);
        let (x, y) = board.coordinate(Position { fret: 0, string: 2 });
        let frame = renderer().render(&tl, 0.5);
        assert_eq!(frame.pixel(x as u32 + 3, y as u32 + 3), Some([255, 0, 0, 255]));
        assert_eq!(frame.pixel(5, frame.height - 5), Some([0, 0, 0, 255]));
        assert_eq!(frame.pixel(frame.width, 0), None);
    }

    #[test]
    fn rejects_empty_canvas() {
        assert!(FrameRenderer::new(0, 720, FontAsset::Builtin).is_err());
    }
}
