use std::path::{Path, PathBuf};

use eframe::egui::{ColorImage, Rect};
use image::{DynamicImage, ImageFormat, RgbaImage};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Plot image export
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ImageExportError {
    #[error("Unsupported image type for {}: use .png, .jpg or .jpeg", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("The plot area is not part of the captured frame")]
    EmptyRegion,

    #[error("Could not save image to {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Image format chosen by the destination's extension.
pub fn format_for(path: &Path) -> Result<ImageFormat, ImageExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        _ => Err(ImageExportError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn to_rgba(image: &ColorImage) -> RgbaImage {
    let [w, h] = image.size;
    let mut out = RgbaImage::new(w as u32, h as u32);
    for (i, pixel) in image.pixels.iter().enumerate() {
        let (x, y) = (i % w, i / w);
        out.put_pixel(x as u32, y as u32, image::Rgba(pixel.to_srgba_unmultiplied()));
    }
    out
}

/// Cut `region` (in points) out of a screenshot taken at `pixels_per_point`.
pub fn crop(image: &ColorImage, region: Rect, pixels_per_point: f32) -> Option<RgbaImage> {
    let [w, h] = image.size;
    let x0 = (region.min.x * pixels_per_point).floor().max(0.0) as u32;
    let y0 = (region.min.y * pixels_per_point).floor().max(0.0) as u32;
    let x1 = ((region.max.x * pixels_per_point).ceil().max(0.0) as u32).min(w as u32);
    let y1 = ((region.max.y * pixels_per_point).ceil().max(0.0) as u32).min(h as u32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let full = to_rgba(image);
    Some(image::imageops::crop_imm(&full, x0, y0, x1 - x0, y1 - y0).to_image())
}

/// Save the plot part of a screenshot as PNG or JPEG.
pub fn save_plot_image(
    image: &ColorImage,
    region: Rect,
    pixels_per_point: f32,
    path: &Path,
) -> Result<(), ImageExportError> {
    let format = format_for(path)?;
    let cropped = crop(image, region, pixels_per_point).ok_or(ImageExportError::EmptyRegion)?;

    let result = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(cropped)
            .to_rgb8()
            .save_with_format(path, format),
        _ => cropped.save_with_format(path, format),
    };
    result.map_err(|source| ImageExportError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("Plot saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, Color32};

    fn screenshot() -> ColorImage {
        let mut img = ColorImage::new([40, 30], Color32::WHITE);
        img[(10, 5)] = Color32::RED;
        img
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(format_for(Path::new("a.PNG")).unwrap(), ImageFormat::Png);
        assert_eq!(format_for(Path::new("a.jpeg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(format_for(Path::new("a.jpg")).unwrap(), ImageFormat::Jpeg);
        assert!(matches!(
            format_for(Path::new("a.bmp")),
            Err(ImageExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn crop_scales_by_pixels_per_point() {
        let region = Rect::from_min_max(pos2(5.0, 2.5), pos2(15.0, 10.0));
        let out = crop(&screenshot(), region, 2.0).unwrap();
        assert_eq!(out.dimensions(), (20, 15));
        assert_eq!(out.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn crop_outside_image_is_none() {
        let region = Rect::from_min_max(pos2(100.0, 100.0), pos2(120.0, 120.0));
        assert!(crop(&screenshot(), region, 1.0).is_none());
    }

    #[test]
    fn saves_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let region = Rect::from_min_max(pos2(0.0, 0.0), pos2(20.0, 10.0));

        let png = dir.path().join("plot.png");
        save_plot_image(&screenshot(), region, 1.0, &png).unwrap();
        let back = image::open(&png).unwrap();
        assert_eq!((back.width(), back.height()), (20, 10));

        let jpg = dir.path().join("plot.jpg");
        save_plot_image(&screenshot(), region, 1.0, &jpg).unwrap();
        assert!(std::fs::metadata(&jpg).unwrap().len() > 0);
    }

    #[test]
    fn unwritable_destination_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let region = Rect::from_min_max(pos2(0.0, 0.0), pos2(20.0, 10.0));
        let path = dir.path().join("missing").join("plot.png");
        assert!(matches!(
            save_plot_image(&screenshot(), region, 1.0, &path),
            Err(ImageExportError::Encode { .. })
        ));
    }
}
