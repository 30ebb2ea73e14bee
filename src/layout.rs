//! Places the form onto pages.
//!
//! Layout runs in two passes. The first turns every [`FormBlock`] into a
//! band: draw operations relative to the band's top edge, with conditional
//! cells already dropped and the purpose text already wrapped. The second
//! stacks bands on pages at their fixed offsets, pushing later bands down by
//! however many extra lines wrapping produced, and starting a new page when
//! a band would cross the bottom margin.
//!
//! All coordinates are millimetres from the top-left corner of the page. A
//! text operation's `y` is its baseline.

use crate::assets::CrestImage;
use crate::fonts::{FontMetrics, Weight};
use crate::form::{Align, Cell, Content, FORM, FieldId, FormBlock, FormContext, Row, Span};
use crate::model::PageGeometry;

/// Horizontal padding inside a left-aligned cell.
pub(crate) const CELL_MARGIN: f32 = 1.0;
pub(crate) const CHOICE_RADIUS: f32 = 2.5;
pub(crate) const CHOICE_LINE_WIDTH: f32 = 0.3;

const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        weight: Weight,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        width: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl DrawOp {
    fn shifted_down(self, dy: f32) -> Self {
        match self {
            DrawOp::Text { x, y, text, size, weight } => DrawOp::Text {
                x,
                y: y + dy,
                text,
                size,
                weight,
            },
            DrawOp::Line { x1, y1, x2, y2, width } => DrawOp::Line {
                x1,
                y1: y1 + dy,
                x2,
                y2: y2 + dy,
                width,
            },
            DrawOp::Circle { cx, cy, radius, width } => DrawOp::Circle {
                cx,
                cy: cy + dy,
                radius,
                width,
            },
            DrawOp::Image { x, y, width, height } => DrawOp::Image {
                x,
                y: y + dy,
                width,
                height,
            },
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DrawOp::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placed {
    pub field: FieldId,
    pub op: DrawOp,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<Placed>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn ops(&self) -> impl Iterator<Item = &Placed> {
        self.pages.iter().flat_map(|p| p.ops.iter())
    }

    pub fn has_field(&self, field: FieldId) -> bool {
        self.ops().any(|p| p.field == field)
    }

    /// Every string drawn for `field`, in draw order.
    pub fn texts(&self, field: FieldId) -> Vec<&str> {
        self.ops()
            .filter(|p| p.field == field)
            .filter_map(|p| p.op.text())
            .collect()
    }
}

/// One block's operations, positioned relative to the block's top edge.
#[derive(Debug)]
struct Band {
    top: f32,
    height: f32,
    /// Extra vertical space this band adds for every later band.
    push_after: f32,
    ops: Vec<Placed>,
}

/// Baseline of text vertically centred in a cell of height `h`.
fn baseline(h: f32, size_pt: f32) -> f32 {
    h / 2.0 + 0.3 * size_pt * MM_PER_PT
}

fn span_mm(span: Span, geometry: &PageGeometry, x: f32) -> f32 {
    match span {
        Span::Mm(mm) => mm,
        Span::Printable(fraction) => geometry.printable_width() * fraction,
        Span::ToMargin => (geometry.page_width - geometry.margin_right - x).max(0.0),
    }
}

fn is_thai_combining(ch: char) -> bool {
    matches!(ch, '\u{0E31}' | '\u{0E34}'..='\u{0E3A}' | '\u{0E47}'..='\u{0E4E}')
}

/// Break `text` into lines no wider than `max_width` millimetres.
///
/// Breaks at whitespace where possible; tabs and newlines count as spaces. A word wider than the line (Thai is
/// written without spaces between words) is broken between characters,
/// never in front of a combining vowel or tone mark.
pub(crate) fn wrap_text(
    text: &str,
    max_width: f32,
    size: f32,
    weight: Weight,
    metrics: &FontMetrics,
) -> Vec<String> {
    let width = |s: &str| metrics.text_width(s, size, weight);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if width(&candidate) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            current.push(ch);
            if width(&current) > max_width && !is_thai_combining(ch) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct Walker<'a> {
    ctx: &'a FormContext,
    metrics: &'a FontMetrics<'a>,
    geometry: &'a PageGeometry,
    crest: Option<&'a CrestImage>,
}

impl Walker<'_> {
    fn text_op(&self, field: FieldId, cell_x: f32, cell_w: f32, row: &Row, align: Align, text: String) -> Placed {
        let x = match align {
            Align::Left => cell_x + CELL_MARGIN,
            Align::Center => {
                cell_x + (cell_w - self.metrics.text_width(&text, row.size, row.weight)) / 2.0
            }
        };
        Placed {
            field,
            op: DrawOp::Text {
                x,
                y: baseline(row.height, row.size),
                text,
                size: row.size,
                weight: row.weight,
            },
        }
    }

    /// The band for `row`, plus continuation bands for wrapped text.
    fn row_bands(&self, row: &Row) -> Vec<Band> {
        let g = self.geometry;
        let mut x = g.margin_left + span_mm(row.indent, g, g.margin_left);
        let mut ops = Vec::new();
        let mut continuations: Vec<(FieldId, f32, Vec<String>)> = Vec::new();

        for cell in row.cells {
            let Cell {
                field,
                width,
                content,
                align,
                when,
            } = *cell;
            let w = span_mm(width, g, x);
            let shown = when.is_none_or(|c| self.ctx.holds(c));
            if shown {
                match content {
                    Content::Literal(text) => {
                        ops.push(self.text_op(field, x, w, row, align, text.to_string()));
                    }
                    Content::Slot(slot) => {
                        let text = self.ctx.slot(slot);
                        if !text.is_empty() {
                            ops.push(self.text_op(field, x, w, row, align, text));
                        }
                    }
                    Content::Flowing(slot) => {
                        let text = self.ctx.slot(slot);
                        let mut lines = wrap_text(
                            &text,
                            w - 2.0 * CELL_MARGIN,
                            row.size,
                            row.weight,
                            self.metrics,
                        )
                        .into_iter();
                        if let Some(first) = lines.next() {
                            ops.push(self.text_op(field, x, w, row, align, first));
                        }
                        let rest: Vec<String> = lines.collect();
                        if !rest.is_empty() {
                            continuations.push((field, x, rest));
                        }
                    }
                    Content::ChoiceMark => ops.push(Placed {
                        field,
                        op: DrawOp::Circle {
                            cx: x,
                            cy: row.height / 2.0,
                            radius: CHOICE_RADIUS,
                            width: CHOICE_LINE_WIDTH,
                        },
                    }),
                }
            }
            x += w;
        }

        let mut bands = vec![Band {
            top: row.top,
            height: row.height,
            push_after: 0.0,
            ops,
        }];

        let extra_lines = continuations.iter().map(|(_, _, l)| l.len()).max().unwrap_or(0);
        for k in 1..=extra_lines {
            let ops = continuations
                .iter()
                .filter_map(|(field, cell_x, lines)| {
                    let text = lines.get(k - 1)?.clone();
                    Some(self.text_op(*field, *cell_x, 0.0, row, Align::Left, text))
                })
                .collect();
            bands.push(Band {
                top: row.top + k as f32 * row.height,
                height: row.height,
                push_after: 0.0,
                ops,
            });
        }
        if let Some(last) = bands.last_mut() {
            last.push_after = extra_lines as f32 * row.height;
        }
        bands
    }

    fn bands(&self) -> Vec<Band> {
        let g = self.geometry;
        let mut bands = Vec::new();
        for block in FORM {
            match block {
                FormBlock::Crest { top, width } => {
                    let Some(crest) = self.crest else { continue };
                    let height = crest.height_for_width(*width);
                    bands.push(Band {
                        top: *top,
                        height,
                        push_after: 0.0,
                        ops: vec![Placed {
                            field: FieldId::Crest,
                            op: DrawOp::Image {
                                x: g.margin_left + (g.printable_width() - width) / 2.0,
                                y: 0.0,
                                width: *width,
                                height,
                            },
                        }],
                    });
                }
                FormBlock::Row(row) => bands.extend(self.row_bands(row)),
                FormBlock::Rule { field, top, width } => bands.push(Band {
                    top: *top,
                    height: *width,
                    push_after: 0.0,
                    ops: vec![Placed {
                        field: *field,
                        op: DrawOp::Line {
                            x1: g.margin_left,
                            y1: 0.0,
                            x2: g.margin_left + g.printable_width(),
                            y2: 0.0,
                            width: *width,
                        },
                    }],
                }),
            }
        }
        bands
    }
}

/// Stack bands onto pages.
fn paginate(bands: Vec<Band>, geometry: &PageGeometry) -> Layout {
    let mut pages = vec![Page::default()];
    let mut shift = 0.0;

    for band in bands {
        if band.ops.is_empty() {
            shift += band.push_after;
            continue;
        }
        let mut y = geometry.margin_top + band.top + shift;
        let page_used = pages.last().is_some_and(|p| !p.ops.is_empty());
        if page_used && y + band.height > geometry.bottom_limit() {
            log::debug!(
                "band at {:.1}mm crosses {:.1}mm, starting page {}",
                y,
                geometry.bottom_limit(),
                pages.len() + 1
            );
            pages.push(Page::default());
            shift = -band.top;
            y = geometry.margin_top;
        }
        if let Some(page) = pages.last_mut() {
            page.ops.extend(band.ops.into_iter().map(|p| Placed {
                field: p.field,
                op: p.op.shifted_down(y),
            }));
        }
        shift += band.push_after;
    }

    Layout { pages }
}

/// Lay the form out for one request.
///
/// Deterministic: the same context, metrics and crest always give the same
/// operations in the same order.
pub fn layout_form(
    ctx: &FormContext,
    metrics: &FontMetrics,
    geometry: &PageGeometry,
    crest: Option<&CrestImage>,
) -> Layout {
    let walker = Walker {
        ctx,
        metrics,
        geometry,
        crest,
    };
    let layout = paginate(walker.bands(), geometry);
    log::debug!(
        "layout: {} ops on {} page(s)",
        layout.ops().count(),
        layout.pages.len()
    );
    layout
}
