mod crest;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::assets::ResolvedAssets;
use crate::error::Error;
use crate::fonts::{RegisteredFonts, Weight, register_fonts};
use crate::layout::{DrawOp, Layout, Page};
use crate::model::PageGeometry;

const PT_PER_MM: f32 = 72.0 / 25.4;
/// Control-point distance for a quarter circle drawn as one cubic Bézier.
const KAPPA: f32 = 0.552_284_8;
const CREST_NAME: &[u8] = b"Im1";

/// Page coordinates: millimetres from the top-left become points from the
/// bottom-left.
#[derive(Clone, Copy)]
struct PageSpace {
    height_mm: f32,
}

impl PageSpace {
    fn x(self, mm: f32) -> f32 {
        mm * PT_PER_MM
    }

    fn y(self, mm: f32) -> f32 {
        (self.height_mm - mm) * PT_PER_MM
    }
}

/// Characters drawn in each weight, so fonts are subset to exactly those.
fn used_chars(layout: &Layout) -> BTreeMap<Weight, BTreeSet<char>> {
    let mut used: BTreeMap<Weight, BTreeSet<char>> = BTreeMap::new();
    for placed in layout.ops() {
        if let DrawOp::Text { text, weight, .. } = &placed.op {
            used.entry(*weight).or_default().extend(text.chars());
        }
    }
    used
}

fn circle(content: &mut Content, cx: f32, cy: f32, r: f32) {
    let k = r * KAPPA;
    content.move_to(cx + r, cy);
    content.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
    content.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
    content.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
    content.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
    content.close_path();
}

fn draw_page(page: &Page, fonts: &RegisteredFonts, crest: Option<Ref>, space: PageSpace) -> Content {
    let mut content = Content::new();
    content.set_fill_gray(0.0);
    content.set_stroke_gray(0.0);

    for placed in &page.ops {
        match &placed.op {
            DrawOp::Text {
                x,
                y,
                text,
                size,
                weight,
            } => {
                let font = fonts.get(*weight);
                let bytes = font.encode(text);
                if bytes.is_empty() {
                    continue;
                }
                content.begin_text();
                content.set_font(Name(font.pdf_name.as_bytes()), *size);
                content.next_line(space.x(*x), space.y(*y));
                content.show(Str(&bytes));
                content.end_text();
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
            } => {
                content.set_line_width(width * PT_PER_MM);
                content.move_to(space.x(*x1), space.y(*y1));
                content.line_to(space.x(*x2), space.y(*y2));
                content.stroke();
            }
            DrawOp::Circle {
                cx,
                cy,
                radius,
                width,
            } => {
                content.set_line_width(width * PT_PER_MM);
                circle(
                    &mut content,
                    space.x(*cx),
                    space.y(*cy),
                    radius * PT_PER_MM,
                );
                content.stroke();
            }
            DrawOp::Image {
                x,
                y,
                width,
                height,
            } => {
                if crest.is_none() {
                    log::warn!("image placed without an embedded crest, skipping");
                    continue;
                }
                content.save_state();
                content.transform([
                    width * PT_PER_MM,
                    0.0,
                    0.0,
                    height * PT_PER_MM,
                    space.x(*x),
                    space.y(y + height),
                ]);
                content.x_object(Name(CREST_NAME));
                content.restore_state();
            }
        }
    }
    content
}

/// Serialize a laid-out form to PDF bytes.
///
/// Output depends only on the arguments: no timestamps or random IDs are
/// written, so identical inputs give identical bytes.
pub fn render(
    layout: &Layout,
    assets: &ResolvedAssets,
    geometry: &PageGeometry,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let used = used_chars(layout);
    let fonts = register_fonts(&mut pdf, &assets.font, &used, &mut alloc)?;
    let t_fonts = t0.elapsed();

    let wants_image = layout
        .ops()
        .any(|p| matches!(p.op, DrawOp::Image { .. }));
    // The crest is decorative: a face that fails to decode costs the image,
    // not the document.
    let crest_ref = match &assets.crest {
        Some(image) if wants_image => match crest::embed_crest(&mut pdf, image, &mut alloc) {
            Ok(r) => Some(r),
            Err(e) => {
                log::warn!("{e}; rendering without crest");
                None
            }
        },
        _ => None,
    };
    let t_images = t0.elapsed();

    let space = PageSpace {
        height_mm: geometry.page_height,
    };
    let n = layout.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (page, &content_id) in layout.pages.iter().zip(&content_ids) {
        let raw = draw_page(page, &fonts, crest_ref, space).finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_id, &compressed)
            .filter(Filter::FlateDecode);
    }
    let t_content = t0.elapsed();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let font_pairs = fonts.resources();
    let media_box = Rect::new(
        0.0,
        0.0,
        geometry.page_width * PT_PER_MM,
        geometry.page_height * PT_PER_MM,
    );
    for (&page_id, &content_id) in page_ids.iter().zip(&content_ids) {
        let mut page = pdf.page(page_id);
        page.media_box(media_box)
            .parent(pages_id)
            .contents(content_id);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if let Some(xobj_ref) = crest_ref {
            resources.x_objects().pair(Name(CREST_NAME), xobj_ref);
        }
    }

    let bytes = pdf.finish();
    log::info!(
        "Render phases: fonts={:.1}ms, images={:.1}ms, content={:.1}ms, assembly={:.1}ms ({} page(s), {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_content - t_images).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_content).as_secs_f64() * 1000.0,
        n,
        bytes.len(),
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::assets::CrestImage;
    use crate::form::FieldId;
    use crate::layout::Placed;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn text(text: &str, weight: Weight) -> Placed {
        Placed {
            field: FieldId::Title,
            op: DrawOp::Text {
                x: 20.0,
                y: 40.0,
                text: text.into(),
                size: 14.0,
                weight,
            },
        }
    }

    fn one_page(ops: Vec<Placed>) -> Layout {
        Layout {
            pages: vec![Page { ops }],
        }
    }

    fn png(alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 6, image::Rgba([200, 10, 10, alpha]));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn crest_assets(data: Vec<u8>) -> ResolvedAssets {
        ResolvedAssets {
            font: crate::assets::FontAsset::Default,
            crest: Some(CrestImage {
                path: PathBuf::from("garuda.png"),
                data,
                pixel_width: 4,
                pixel_height: 6,
            }),
        }
    }

    fn image_op() -> Placed {
        Placed {
            field: FieldId::Crest,
            op: DrawOp::Image {
                x: 92.5,
                y: 11.0,
                width: 25.0,
                height: 37.5,
            },
        }
    }

    #[test]
    fn helvetica_fallback_declares_both_weights() {
        let layout = one_page(vec![text("Hello", Weight::Regular), text("Bold", Weight::Bold)]);
        let bytes = render(&layout, &ResolvedAssets::fallback(), &PageGeometry::A4_FORM).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(count(&bytes, b"/Helvetica-Bold"), 1);
        assert_eq!(count(&bytes, b"/BaseFont /Helvetica"), 2);
    }

    #[test]
    fn one_page_object_per_layout_page() {
        let layout = Layout {
            pages: vec![
                Page { ops: vec![text("a", Weight::Regular)] },
                Page { ops: vec![text("b", Weight::Regular)] },
                Page::default(),
            ],
        };
        let bytes = render(&layout, &ResolvedAssets::fallback(), &PageGeometry::A4_FORM).unwrap();
        let pages = count(&bytes, b"/Type /Page") - count(&bytes, b"/Type /Pages");
        assert_eq!(pages, 3);
        assert_eq!(count(&bytes, b"/Count 3"), 1);
    }

    #[test]
    fn rendering_is_deterministic() {
        let layout = one_page(vec![
            text("ข้าพเจ้า a", Weight::Regular),
            Placed {
                field: FieldId::Choices,
                op: DrawOp::Circle {
                    cx: 45.0,
                    cy: 239.0,
                    radius: 2.5,
                    width: 0.3,
                },
            },
            Placed {
                field: FieldId::SignatureRule,
                op: DrawOp::Line {
                    x1: 18.0,
                    y1: 223.0,
                    x2: 192.0,
                    y2: 223.0,
                    width: 0.2,
                },
            },
        ]);
        let a = render(&layout, &ResolvedAssets::fallback(), &PageGeometry::A4_FORM).unwrap();
        let b = render(&layout, &ResolvedAssets::fallback(), &PageGeometry::A4_FORM).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn opaque_crest_has_no_soft_mask() {
        let bytes = render(
            &one_page(vec![image_op()]),
            &crest_assets(png(255)),
            &PageGeometry::A4_FORM,
        )
        .unwrap();
        assert_eq!(count(&bytes, b"/Subtype /Image"), 1);
        assert_eq!(count(&bytes, b"/SMask"), 0);
        assert_eq!(count(&bytes, b"/Im1"), 1);
    }

    #[test]
    fn transparent_crest_gets_soft_mask() {
        let bytes = render(
            &one_page(vec![image_op()]),
            &crest_assets(png(128)),
            &PageGeometry::A4_FORM,
        )
        .unwrap();
        assert_eq!(count(&bytes, b"/Subtype /Image"), 2);
        assert_eq!(count(&bytes, b"/SMask"), 1);
    }

    #[test]
    fn truncated_crest_renders_without_image() {
        let mut data = png(255);
        // Signature and IHDR intact, image data cut short.
        data.truncate(8 + 25 + 10);
        let bytes = render(
            &one_page(vec![image_op(), text("x", Weight::Regular)]),
            &crest_assets(data),
            &PageGeometry::A4_FORM,
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(count(&bytes, b"/Subtype /Image"), 0);
        assert_eq!(count(&bytes, b"/Im1"), 0);
    }

    #[test]
    fn garbage_crest_renders_without_image() {
        let bytes = render(
            &one_page(vec![image_op()]),
            &crest_assets(b"not a png".to_vec()),
            &PageGeometry::A4_FORM,
        )
        .unwrap();
        assert_eq!(count(&bytes, b"/Subtype /Image"), 0);
    }

    #[test]
    fn crest_not_embedded_when_not_placed() {
        let bytes = render(
            &one_page(vec![text("x", Weight::Regular)]),
            &crest_assets(b"not a png".to_vec()),
            &PageGeometry::A4_FORM,
        )
        .unwrap();
        assert_eq!(count(&bytes, b"/Subtype /Image"), 0);
    }

    #[test]
    fn page_space_flips_y() {
        let space = PageSpace { height_mm: 297.0 };
        assert!((space.y(0.0) - 297.0 * PT_PER_MM).abs() < 1e-3);
        assert!(space.y(297.0).abs() < 1e-3);
        assert!((space.x(25.4) - 72.0).abs() < 1e-3);
    }

    #[test]
    fn used_chars_split_by_weight() {
        let layout = one_page(vec![text("ab", Weight::Regular), text("bc", Weight::Bold)]);
        let used = used_chars(&layout);
        assert_eq!(used[&Weight::Regular], BTreeSet::from(['a', 'b']));
        assert_eq!(used[&Weight::Bold], BTreeSet::from(['b', 'c']));
    }
}
