//! SVG builder: accumulates SVG elements and produces the final string.

// ═══════════════════════════════════════════════════════════════════════
// SvgBuilder
// ═══════════════════════════════════════════════════════════════════════

pub(super) struct SvgBuilder {
    pub(super) elements: Vec<String>,
    width: f64,
    height: f64,
}

impl SvgBuilder {
    pub(super) fn new(width: f64, height: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
        }
    }

    pub(super) fn build(self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
            self.width, self.height, self.width, self.height
        );
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    pub(super) fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
        self.elements.push(format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.1}"/>"#,
            x1, y1, x2, y2, color, width
        ));
    }

    pub(super) fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, stroke: &str, stroke_width: f64) {
        if stroke_width > 0.0 {
            self.elements.push(format!(
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" stroke="{}" stroke-width="{:.1}"/>"#,
                x, y, w, h, fill, stroke, stroke_width
            ));
        } else {
            self.elements.push(format!(
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                x, y, w, h, fill
            ));
        }
    }

    /// Filled circle with an outline, used for note markers.
    pub(super) fn marker(&mut self, cx: f64, cy: f64, r: f64, fill: &str, outline: &str, outline_width: f64) {
        self.elements.push(format!(
            r#"<circle class="marker" cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}" stroke="{}" stroke-width="{:.1}"/>"#,
            cx, cy, r, fill, outline, outline_width
        ));
    }

    /// Text drawn with a named font face. `y` is the baseline.
    pub(super) fn text(&mut self, x: f64, y: f64, content: &str, family: &str, size: f64, fill: &str, anchor: &str) {
        self.elements.push(format!(
            r#"<text x="{:.1}" y="{:.1}" font-family="{}" font-size="{:.0}" fill="{}" text-anchor="{}">{}</text>"#,
            x,
            y,
            escape(family),
            size,
            fill,
            anchor,
            escape(content)
        ));
    }

    /// Open a group; everything pushed until `end_group` belongs to it.
    pub(super) fn begin_group(&mut self, class: &str, fill: &str) {
        self.elements
            .push(format!(r#"<g class="{}" fill="{}">"#, class, fill));
    }

    pub(super) fn end_group(&mut self) {
        self.elements.push("</g>".to_string());
    }

    /// Rectangle taking its fill from the enclosing group, used for bitmap glyph runs.
    pub(super) fn pixel_run(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.elements.push(format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}"/>"#,
            x, y, w, h
        ));
    }
}

fn escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_escaped_document() {
        let mut svg = SvgBuilder::new(100.0, 50.0);
        svg.rect(0.0, 0.0, 100.0, 50.0, "#000000", "none", 0.0);
        svg.text(50.0, 20.0, "a < b & \"c\"", "Sans", 12.0, "#ffffff", "middle");
        let out = svg.build();

        assert!(out.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 50""#));
        assert!(out.contains(r##"<rect x="0.0" y="0.0" width="100.0" height="50.0" fill="#000000"/>"##));
        assert!(out.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(out.trim_end().ends_with("</svg>"));
    }
}
