pub mod assets;
mod error;
pub mod fonts;
pub mod form;
pub mod layout;
pub mod locale;
pub mod model;
pub mod pdf;
pub mod validate;

pub use assets::{AssetSearch, FontAsset, ResolvedAssets};
pub use error::Error;
pub use form::{FieldId, FormContext};
pub use layout::{DrawOp, Layout, Page, Placed};
pub use model::{DocumentVariant, Officials, PageGeometry, RequestRecord};
pub use validate::{ValidationError, ValidationErrors, validate_request};

use std::time::Instant;

use fonts::FontMetrics;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A finished form, ready to be written to disk or sent as a download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
}

impl RenderedDocument {
    pub fn media_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }
}

/// Download name for a request. Characters outside `[A-Za-z0-9_-]` are
/// dropped, so the result is safe as a path component and inside a
/// `Content-Disposition` header even for ids that failed validation.
pub fn download_filename(id: &str) -> String {
    let safe: String = id.chars().filter(|&c| validate::is_filename_safe(c)).collect();
    if safe.is_empty() {
        "request.pdf".to_string()
    } else {
        format!("request-{safe}.pdf")
    }
}

/// Lay out the form for `record` without serializing it.
pub fn layout_request(
    record: &RequestRecord,
    officials: &Officials,
    assets: &ResolvedAssets,
    geometry: &PageGeometry,
) -> Layout {
    let ctx = FormContext::new(record, officials);
    let metrics = FontMetrics::new(&assets.font);
    layout::layout_form(&ctx, &metrics, geometry, assets.crest.as_ref())
}

/// Render `record` with assets that were already resolved.
pub fn render_with_assets(
    record: &RequestRecord,
    officials: &Officials,
    assets: &ResolvedAssets,
) -> Result<RenderedDocument, Error> {
    let t0 = Instant::now();
    let geometry = PageGeometry::A4_FORM;

    let layout = layout_request(record, officials, assets, &geometry);
    let t_layout = t0.elapsed();

    let pdf = pdf::render(&layout, assets, &geometry)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: layout={:.1}ms, render={:.1}ms, total={:.1}ms (request {}, output {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        record.id,
        pdf.len(),
    );

    Ok(RenderedDocument {
        filename: download_filename(&record.id),
        pdf,
    })
}

/// Resolve assets through `search` and render `record` onto the form.
pub fn render_request(
    record: &RequestRecord,
    officials: &Officials,
    search: &AssetSearch,
) -> Result<RenderedDocument, Error> {
    let assets = assets::resolve(search);
    render_with_assets(record, officials, &assets)
}
