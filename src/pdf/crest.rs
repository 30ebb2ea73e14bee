use std::io::{BufReader, Cursor};

use pdf_writer::{Filter, Pdf, Ref};

use crate::assets::CrestImage;
use crate::error::Error;

/// Write the crest as an RGB image XObject, with a soft mask when the PNG
/// carries any transparency. Returns the image's object reference.
pub(super) fn embed_crest(
    pdf: &mut Pdf,
    crest: &CrestImage,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<Ref, Error> {
    let image_err = |msg: String| Error::Image(format!("{}: {msg}", crest.path.display()));

    let reader = image::ImageReader::with_format(
        BufReader::new(Cursor::new(&crest.data)),
        image::ImageFormat::Png,
    );
    let decoded = reader.decode().map_err(|e| image_err(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let w = i32::try_from(rgba.width()).map_err(|_| image_err("too wide".into()))?;
    let h = i32::try_from(rgba.height()).map_err(|_| image_err("too tall".into()))?;
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

    let rgb_data: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

    let smask_ref = if has_alpha {
        let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
        let mask_ref = alloc();
        let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(w);
        mask.height(h);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        Some(mask_ref)
    } else {
        None
    };

    let xobj_ref = alloc();
    let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
    xobj.filter(Filter::FlateDecode);
    xobj.width(w);
    xobj.height(h);
    xobj.color_space().device_rgb();
    xobj.bits_per_component(8);
    if let Some(mask_ref) = smask_ref {
        xobj.s_mask(mask_ref);
    }

    log::debug!(
        "crest {}: {w}x{h}px, alpha={has_alpha}",
        crest.path.display()
    );
    Ok(xobj_ref)
}
