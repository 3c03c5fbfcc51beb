//! SVG scene → RGBA pixels via resvg.

use std::sync::Arc;

use log::error;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb::Database};

use super::Frame;

pub(super) fn rasterize(svg: &str, width: u32, height: u32, fontdb: &Arc<Database>) -> Frame {
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        error!("Cannot allocate a {width}x{height} pixmap");
        return Frame::blank(width, height);
    };

    let options = usvg::Options {
        fontdb: Arc::clone(fontdb),
        ..usvg::Options::default()
    };
    match usvg::Tree::from_str(svg, &options) {
        Ok(tree) => resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut()),
        Err(e) => {
            error!("Frame scene could not be parsed, emitting a blank frame: {e}");
            return Frame::blank(width, height);
        }
    }

    Frame {
        width,
        height,
        pixels: pixmap.take(),
    }
}
