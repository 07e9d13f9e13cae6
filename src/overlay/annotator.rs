/// Composite the analyzed image and its mapped abnormality boxes into a
/// container-sized PNG: the image is drawn under the same contain layout the
/// mapper computes, each box gets an outline, and a filled bar marks the
/// label anchor above it. Label text itself is carried by the textual report.
use crate::analysis::types::AnalysisResponse;
use crate::errors::{LeafLensError, LeafLensResult};
use crate::overlay::mapper::{map_abnormalities_with_label_height, ContainLayout, DisplayRect};
use crate::upload::ImageUpload;

const BOX_COLOR: [u8; 4] = [220, 38, 38, 230];
const LABEL_COLOR: [u8; 4] = [220, 38, 38, 255];
const LETTERBOX_COLOR: [u8; 4] = [24, 24, 24, 255];
const BOX_THICKNESS: i32 = 2;

/// Render `upload` plus its overlay into a `container_width` x
/// `container_height` PNG. `None` when the overlay is not ready: unmeasured
/// container or a payload without usable image dimensions.
pub fn render_overlay(
    upload: &ImageUpload,
    response: &AnalysisResponse,
    container_width: u32,
    container_height: u32,
    label_height: f64,
) -> LeafLensResult<Option<Vec<u8>>> {
    let Some(layout) = ContainLayout::with_label_height(
        response.image_width as f64,
        response.image_height as f64,
        container_width as f64,
        container_height as f64,
        label_height,
    ) else {
        return Ok(None);
    };

    let img = image::load_from_memory(upload.bytes())
        .map_err(|e| LeafLensError::Overlay(format!("overlay load: {e}")))?;

    let mut canvas = image::RgbaImage::from_pixel(
        container_width,
        container_height,
        image::Rgba(LETTERBOX_COLOR),
    );
    let scaled = img.resize_exact(
        (layout.scaled_width.round() as u32).max(1),
        (layout.scaled_height.round() as u32).max(1),
        image::imageops::FilterType::Triangle,
    );
    image::imageops::overlay(
        &mut canvas,
        &scaled.to_rgba8(),
        layout.offset_x.round() as i64,
        layout.offset_y.round() as i64,
    );

    let rects = map_abnormalities_with_label_height(
        response,
        container_width as f64,
        container_height as f64,
        label_height,
    );
    for rect in &rects {
        draw_box(&mut canvas, rect, BOX_THICKNESS);
        draw_label_bar(&mut canvas, rect, label_height);
    }
    tracing::debug!(boxes = rects.len(), container_width, container_height, "overlay composited");

    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| LeafLensError::Overlay(format!("overlay PNG encode: {e}")))?;
    Ok(Some(out))
}

fn draw_box(canvas: &mut image::RgbaImage, rect: &DisplayRect, thickness: i32) {
    let x1 = rect.left.round() as i32;
    let y1 = rect.top.round() as i32;
    let x2 = (rect.left + rect.width).round() as i32;
    let y2 = (rect.top + rect.height).round() as i32;

    for t in 0..thickness {
        hline(canvas, x1, x2, y1 + t, BOX_COLOR);
        hline(canvas, x1, x2, y2 - t, BOX_COLOR);
        vline(canvas, y1, y2, x1 + t, BOX_COLOR);
        vline(canvas, y1, y2, x2 - t, BOX_COLOR);
    }
}

/// Filled bar at the label anchor, the footprint the front end reserves for
/// the label text.
fn draw_label_bar(canvas: &mut image::RgbaImage, rect: &DisplayRect, label_height: f64) {
    let x1 = rect.label_anchor.left.round() as i32;
    let y1 = rect.label_anchor.top.round() as i32;
    let bar_width = (rect.width.round() as i32).max(24);
    let bar_height = ((label_height - 2.0).round() as i32).max(1);

    for y in y1..y1 + bar_height {
        hline(canvas, x1, x1 + bar_width - 1, y, LABEL_COLOR);
    }
}

fn hline(canvas: &mut image::RgbaImage, x1: i32, x2: i32, y: i32, color: [u8; 4]) {
    let (width, height) = canvas.dimensions();
    if y < 0 || y >= height as i32 {
        return;
    }
    for x in x1.max(0)..=x2.min(width as i32 - 1) {
        blend_pixel(canvas, x as u32, y as u32, color);
    }
}

fn vline(canvas: &mut image::RgbaImage, y1: i32, y2: i32, x: i32, color: [u8; 4]) {
    let (width, height) = canvas.dimensions();
    if x < 0 || x >= width as i32 {
        return;
    }
    for y in y1.max(0)..=y2.min(height as i32 - 1) {
        blend_pixel(canvas, x as u32, y as u32, color);
    }
}

fn blend_pixel(canvas: &mut image::RgbaImage, x: u32, y: u32, color: [u8; 4]) {
    let pixel = canvas.get_pixel_mut(x, y);
    let alpha = color[3] as f32 / 255.0;
    for channel in 0..3 {
        pixel[channel] = (pixel[channel] as f32 * (1.0 - alpha) + color[channel] as f32 * alpha)
            .round() as u8;
    }
    pixel[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{Abnormality, PlantAnalysis, SourceRect};

    fn upload() -> ImageUpload {
        let img = image::RgbaImage::from_pixel(40, 30, image::Rgba([40, 160, 60, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        ImageUpload::from_bytes("leaf.png", out).unwrap()
    }

    fn response(image_width: u32, image_height: u32) -> AnalysisResponse {
        AnalysisResponse {
            plant_analysis: PlantAnalysis {
                abnormalities: vec![Abnormality {
                    kind: "Bacterial Spot".into(),
                    description: "lesion".into(),
                    coordinates: SourceRect {
                        x: 8.0,
                        y: 10.0,
                        width: 12.0,
                        height: 9.0,
                    },
                    confidence_score_abnormality: 0.9,
                }],
                ..Default::default()
            },
            image_width,
            image_height,
            ..Default::default()
        }
    }

    #[test]
    fn test_overlay_png_matches_container_size() {
        let png = render_overlay(&upload(), &response(40, 30), 200, 150, 18.0)
            .unwrap()
            .expect("overlay should render");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 200);
        assert_eq!(decoded.height(), 150);
    }

    #[test]
    fn test_unready_container_renders_nothing() {
        assert!(render_overlay(&upload(), &response(40, 30), 0, 150, 18.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_zero_dimension_payload_renders_nothing() {
        assert!(render_overlay(&upload(), &response(0, 0), 200, 150, 18.0)
            .unwrap()
            .is_none());
    }
}
