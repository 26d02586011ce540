//! Per-square SVG card.
//!
//! The 10×10 pixel grid is rendered as unit rects scaled up inside a
//! gradient card frame, with the zero-padded square id as a caption.

use pixelgrid_core::SQUARE_PIXEL_BYTES;

use crate::padded_id;

const CARD_W: u32 = 500;
const CARD_H: u32 = 600;
const GRID_ORIGIN: u32 = 50;
const CELL: u32 = 40;

/// Render one square's SVG card from its 300-byte pixel buffer.
pub fn render(square: u64, rgb: &[u8]) -> String {
    debug_assert_eq!(rgb.len(), SQUARE_PIXEL_BYTES);

    let mut out = String::with_capacity(16 * 1024);
    out.push_str(&format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}">"#,
            "\n",
            r##"<defs><linearGradient id="frame" x1="0" y1="0" x2="1" y2="1">"##,
            r##"<stop offset="0%" stop-color="#4a4a52"/>"##,
            r##"<stop offset="100%" stop-color="#17171c"/>"##,
            "</linearGradient></defs>\n",
            r##"<rect width="{w}" height="{h}" rx="16" fill="url(#frame)"/>"##,
            "\n"
        ),
        w = CARD_W,
        h = CARD_H,
    ));

    for py in 0..10u32 {
        for px in 0..10u32 {
            let i = ((py * 10 + px) * 3) as usize;
            let (r, g, b) = (rgb[i], rgb[i + 1], rgb[i + 2]);
            out.push_str(&format!(
                r##"<rect x="{}" y="{}" width="{CELL}" height="{CELL}" fill="#{r:02x}{g:02x}{b:02x}"/>"##,
                GRID_ORIGIN + px * CELL,
                GRID_ORIGIN + py * CELL,
            ));
            out.push('\n');
        }
    }

    out.push_str(&format!(
        concat!(
            r##"<text x="{x}" y="540" text-anchor="middle" "##,
            r##"font-family="monospace" font-size="48" fill="#e8e8e8">#{id}</text>"##,
            "\n</svg>\n"
        ),
        x = CARD_W / 2,
        id = padded_id(square),
    ));
    out
}
