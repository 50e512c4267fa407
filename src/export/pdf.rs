//! Photos PDF: the collection laid out three per row on A4 pages.

use crate::cli::PdfQuality;
use crate::error::{ProtokolError, Result};
use crate::photos::Photo;
use printpdf::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const CELL_GAP_MM: f32 = 5.0;
const COLUMNS: usize = 3;
const ROWS_PER_PAGE: usize = 4;

// (210 - 2*10 - 2*5) / 3
const CELL_MM: f32 = 60.0;

pub fn generate_photo_pdf(photos: &[Photo], output_path: &Path, quality: PdfQuality) -> Result<()> {
    if photos.is_empty() {
        return Err(ProtokolError::NoPhotos);
    }

    let (doc, page1, layer1) = PdfDocument::new(
        "Fotodokumentace",
        Mm(A4_WIDTH_MM),
        Mm(A4_HEIGHT_MM),
        "Layer 1",
    );

    let mut layer = doc.get_page(page1).get_layer(layer1);
    let per_page = COLUMNS * ROWS_PER_PAGE;

    for (index, photo) in photos.iter().enumerate() {
        if index > 0 && index % per_page == 0 {
            let (page, new_layer) = doc.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1");
            layer = doc.get_page(page).get_layer(new_layer);
        }

        let slot = index % per_page;
        let col = slot % COLUMNS;
        let row = slot / COLUMNS;
        let cell_x = MARGIN_MM + col as f32 * (CELL_MM + CELL_GAP_MM);
        let cell_top = A4_HEIGHT_MM - MARGIN_MM - row as f32 * (CELL_MM + CELL_GAP_MM);

        place_photo(&layer, photo, cell_x, cell_top, quality)?;
    }

    let file = File::create(output_path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ProtokolError::PdfGeneration(format!("uložení selhalo: {:?}", e)))?;

    Ok(())
}

/// Decode, downscale to the quality cap and embed one photo, contain-fit
/// inside its square cell.
fn place_photo(
    layer: &PdfLayerReference,
    photo: &Photo,
    cell_x: f32,
    cell_top: f32,
    quality: PdfQuality,
) -> Result<()> {
    let decoded = ::image::load_from_memory(&photo.data)
        .map_err(|e| ProtokolError::ImageLoad(format!("{}: {}", photo.file_name, e)))?;

    let cap = quality.max_width();
    let decoded = if decoded.width() > cap || decoded.height() > cap {
        decoded.thumbnail(cap, cap)
    } else {
        decoded
    };

    let rgb = decoded.to_rgb8();
    let (width_px, height_px) = rgb.dimensions();

    let aspect = width_px as f32 / height_px as f32;
    let (width_mm, height_mm) = if aspect >= 1.0 {
        (CELL_MM, CELL_MM / aspect)
    } else {
        (CELL_MM * aspect, CELL_MM)
    };
    let x = cell_x + (CELL_MM - width_mm) / 2.0;
    let y = cell_top - CELL_MM + (CELL_MM - height_mm) / 2.0;

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4) so the bitmap lands at the computed size.
    let dpi = width_px as f32 / (width_mm / 25.4);

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    Ok(())
}
