//! Text drawing with two-tier font resolution.
//!
//! A font file named in the configuration is loaded into a `fontdb`
//! database and drawn as SVG text. When no file is configured, or it cannot
//! be loaded, text falls back to the built-in 8×8 bitmap font, emitted as
//! pixel rectangles so it needs no font at rasterization time.

use std::path::Path;
use std::sync::Arc;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use log::{info, warn};
use resvg::usvg::fontdb::Database;

use super::svg_builder::SvgBuilder;
use crate::error::{FingerboardError, Result};

/// Bitmap glyph cell size in font units.
const GLYPH_CELL: usize = 8;

/// Baseline position of outline text, as a fraction of the font size below its top.
const BASELINE_RATIO: f64 = 0.8;

/// Horizontal text alignment relative to the anchor x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Anchor {
    Start,
    Middle,
}

impl Anchor {
    const fn svg_name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
        }
    }
}

/// Font used for every label in a frame.
#[derive(Clone)]
pub enum FontAsset {
    /// A TrueType/OpenType face loaded from disk
    File {
        family: String,
        fontdb: Arc<Database>,
    },
    /// The built-in 8×8 bitmap font; always available
    Builtin,
}

impl std::fmt::Debug for FontAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { family, .. } => f.debug_struct("File").field("family", family).finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

impl FontAsset {
    /// The named font if it loads, else the built-in font.
    pub fn resolve(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::Builtin;
        };
        match Self::load(path) {
            Ok(font) => {
                info!("Using font {font:?} from {}", path.display());
                font
            }
            Err(err) => {
                warn!("Font {} unavailable ({err}), using built-in font", path.display());
                Self::Builtin
            }
        }
    }

    /// Load a font file, failing if it is unreadable or holds no usable face.
    pub fn load(path: &Path) -> Result<Self> {
        let mut db = Database::new();
        db.load_font_file(path)?;
        let family = db
            .faces()
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| {
                FingerboardError::Config(format!("no font face found in {}", path.display()))
            })?;
        Ok(Self::File {
            family,
            fontdb: Arc::new(db),
        })
    }

    pub const fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Font database handed to the rasterizer. Empty for the built-in font.
    pub(super) fn database(&self) -> Arc<Database> {
        match self {
            Self::File { fontdb, .. } => Arc::clone(fontdb),
            Self::Builtin => Arc::new(Database::new()),
        }
    }

    /// Draw `content` with its top edge at `top`.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn draw(
        &self,
        svg: &mut SvgBuilder,
        x: f64,
        top: f64,
        content: &str,
        size: f64,
        fill: &str,
        anchor: Anchor,
    ) {
        match self {
            Self::File { family, .. } => {
                svg.text(x, top + size * BASELINE_RATIO, content, family, size, fill, anchor.svg_name());
            }
            Self::Builtin => draw_bitmap(svg, x, top, content, size, fill, anchor),
        }
    }
}

/// Integer scale keeps glyph pixels crisp.
fn bitmap_scale(size: f64) -> f64 {
    (size / GLYPH_CELL as f64).round().max(1.0)
}

fn bitmap_width(content: &str, size: f64) -> f64 {
    (content.chars().count() * GLYPH_CELL) as f64 * bitmap_scale(size)
}

fn glyph(c: char) -> [u8; GLYPH_CELL] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; GLYPH_CELL])
}

fn draw_bitmap(svg: &mut SvgBuilder, x: f64, top: f64, content: &str, size: f64, fill: &str, anchor: Anchor) {
    if content.is_empty() {
        return;
    }
    let scale = bitmap_scale(size);
    let left = match anchor {
        Anchor::Start => x,
        Anchor::Middle => x - bitmap_width(content, size) / 2.0,
    };

    svg.begin_group("bitmap-text", fill);
    for (i, c) in content.chars().enumerate() {
        let cell_x = left + (i * GLYPH_CELL) as f64 * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            let y = top + row as f64 * scale;
            // bit 0 is the leftmost pixel; merge horizontal runs into one rect
            let mut col = 0;
            while col < GLYPH_CELL {
                if bits & (1 << col) == 0 {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < GLYPH_CELL && bits & (1 << col) != 0 {
                    col += 1;
                }
                svg.pixel_run(
                    cell_x + start as f64 * scale,
                    y,
                    (col - start) as f64 * scale,
                    scale,
                );
            }
        }
    }
    svg.end_group();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_file_falls_back_to_builtin() {
        let font = FontAsset::resolve(Some(Path::new("/nonexistent/fonts/arial.ttf")));
        assert!(font.is_builtin());
        assert!(FontAsset::load(Path::new("/nonexistent/fonts/arial.ttf")).is_err());
    }

    #[test]
    fn non_font_file_falls_back_to_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        assert!(FontAsset::resolve(Some(&path)).is_builtin());
    }

    #[test]
    fn no_font_configured_is_builtin() {
        assert!(FontAsset::resolve(None).is_builtin());
        assert_eq!(FontAsset::Builtin.database().len(), 0);
    }

    /// Any TrueType/OpenType file installed on the host.
    fn system_font_file() -> Option<std::path::PathBuf> {
        let mut db = Database::new();
        db.load_system_fonts();
        let found = db.faces().find_map(|face| match &face.source {
            resvg::usvg::fontdb::Source::File(path)
                if path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf")) =>
            {
                Some(path.clone())
            }
            _ => None,
        });
        found
    }

    #[test]
    fn named_font_file_renders_outline_text() {
        let Some(path) = system_font_file() else {
            eprintln!("no system font installed, skipping");
            return;
        };
        let font = FontAsset::resolve(Some(&path));
        let FontAsset::File { family, fontdb } = &font else {
            panic!("{} should load as a font file", path.display());
        };
        assert!(!family.is_empty());
        assert!(fontdb.len() > 0);

        let mut svg = SvgBuilder::new(200.0, 60.0);
        svg.rect(0.0, 0.0, 200.0, 60.0, "#000000", "none", 0.0);
        font.draw(&mut svg, 10.0, 10.0, "A4 (0)", 32.0, "#ffffff", Anchor::Start);
        let scene = svg.build();
        assert!(scene.contains("<text"), "{scene}");
        assert!(!scene.contains("bitmap-text"));

        let frame = super::super::raster::rasterize(&scene, 200, 60, &font.database());
        let lit = frame.pixels.chunks_exact(4).filter(|px| px[0] > 128).count();
        assert!(lit > 0, "outline text left no pixels");
    }

    #[test]
    fn bitmap_text_draws_pixel_runs() {
        let mut svg = SvgBuilder::new(100.0, 100.0);
        FontAsset::Builtin.draw(&mut svg, 50.0, 10.0, "-", 16.0, "#ffffff", Anchor::Middle);
        let out = svg.build();
        // '-' is a single horizontal bar in the 8×8 font
        assert_eq!(out.matches("<rect").count(), 1);
        assert!(out.contains(r##"<g class="bitmap-text" fill="#ffffff">"##));
        assert_eq!(bitmap_width("-", 16.0), 16.0);
    }

    #[test]
    fn unknown_characters_use_placeholder_glyph() {
        assert_eq!(glyph('童'), glyph('?'));
        assert_ne!(glyph('é'), glyph('?'));
        assert_eq!(glyph(' '), [0; GLYPH_CELL]);
    }

    #[test]
    fn bitmap_scale_is_integral() {
        assert_eq!(bitmap_scale(24.0), 3.0);
        assert_eq!(bitmap_scale(12.0), 2.0);
        assert_eq!(bitmap_scale(4.0), 1.0);
    }
}
