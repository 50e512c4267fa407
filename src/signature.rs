//! Freehand signature surfaces.
//!
//! Strokes are captured in display coordinates (CSS pixels). The backing
//! store is scaled by the device pixel ratio so exported images stay crisp,
//! matching the 400x150 surface of the paper form.

use crate::error::{ProtokolError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Pen color of the pad: rgb(75, 83, 161).
const PEN_COLOR: Rgba<u8> = Rgba([75, 83, 161, 255]);

/// Height/width ratio of the surface (150 / 400).
const ASPECT_RATIO: f32 = 0.375;

/// Pen stroke width in display pixels (the pad draws between 1 and 3).
const PEN_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

pub type Stroke = Vec<Point>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignaturePad {
    strokes: Vec<Stroke>,
    display_width: f32,
    pixel_ratio: f32,
}

impl Default for SignaturePad {
    fn default() -> Self {
        Self::new(400.0, 1.0)
    }
}

impl SignaturePad {
    pub fn new(display_width: f32, pixel_ratio: f32) -> Self {
        Self {
            strokes: Vec::new(),
            display_width: display_width.max(1.0),
            pixel_ratio: pixel_ratio.max(1.0),
        }
    }

    /// Load a pad (strokes included) from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProtokolError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let pad: SignaturePad = serde_json::from_str(&content)?;
        Ok(pad)
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.iter().all(|s| s.is_empty())
    }

    pub fn add_stroke(&mut self, stroke: Stroke) {
        if !stroke.is_empty() {
            self.strokes.push(stroke);
        }
    }

    pub fn display_width(&self) -> f32 {
        self.display_width
    }

    pub fn display_height(&self) -> f32 {
        self.display_width * ASPECT_RATIO
    }

    /// Backing-store resolution: display size times device pixel ratio.
    pub fn backing_size(&self) -> (u32, u32) {
        let w = (self.display_width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.display_height() * self.pixel_ratio).round().max(1.0) as u32;
        (w, h)
    }

    /// Re-fit the surface to a new container width. Existing strokes are
    /// dropped (accepted limitation of the form).
    pub fn resize(&mut self, display_width: f32, pixel_ratio: f32) {
        self.display_width = display_width.max(1.0);
        self.pixel_ratio = pixel_ratio.max(1.0);
        self.strokes.clear();
    }

    /// Rasterize the strokes into a PNG data URI. Returns `None` when no
    /// strokes were drawn.
    pub fn to_image(&self) -> Result<Option<String>> {
        if self.is_empty() {
            return Ok(None);
        }

        let (width, height) = self.backing_size();
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));

        let radius = (PEN_WIDTH / 2.0 * self.pixel_ratio).max(0.5);
        for stroke in &self.strokes {
            if stroke.len() == 1 {
                self.stamp(&mut canvas, stroke[0], radius);
                continue;
            }
            for pair in stroke.windows(2) {
                self.draw_segment(&mut canvas, pair[0], pair[1], radius);
            }
        }

        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|e| ProtokolError::ImageLoad(e.to_string()))?;

        Ok(Some(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(&buffer)
        )))
    }

    fn draw_segment(&self, canvas: &mut RgbaImage, from: Point, to: Point, radius: f32) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let steps = (dx.abs().max(dy.abs()) * self.pixel_ratio).ceil().max(1.0) as u32;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let p = Point {
                x: from.x + dx * t,
                y: from.y + dy * t,
            };
            self.stamp(canvas, p, radius);
        }
    }

    fn stamp(&self, canvas: &mut RgbaImage, point: Point, radius: f32) {
        let cx = point.x * self.pixel_ratio;
        let cy = point.y * self.pixel_ratio;
        let r = radius.ceil() as i64;

        for oy in -r..=r {
            for ox in -r..=r {
                if (ox * ox + oy * oy) as f32 > radius * radius {
                    continue;
                }
                let x = cx.round() as i64 + ox;
                let y = cy.round() as i64 + oy;
                if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
                    continue;
                }
                canvas.put_pixel(x as u32, y as u32, PEN_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: &[(f32, f32)]) -> Stroke {
        points.iter().map(|&(x, y)| Point { x, y }).collect()
    }

    #[test]
    fn test_empty_pad_has_no_image() {
        let pad = SignaturePad::new(400.0, 1.0);
        assert!(pad.is_empty());
        assert!(pad.to_image().unwrap().is_none());
    }

    #[test]
    fn test_drawn_pad_exports_data_uri() {
        let mut pad = SignaturePad::new(400.0, 2.0);
        pad.add_stroke(stroke(&[(10.0, 10.0), (120.0, 60.0), (200.0, 30.0)]));

        assert!(!pad.is_empty());
        let uri = pad.to_image().unwrap().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_clear_resets_to_empty() {
        let mut pad = SignaturePad::new(400.0, 1.0);
        pad.add_stroke(stroke(&[(0.0, 0.0), (5.0, 5.0)]));
        pad.clear();
        assert!(pad.is_empty());
        assert!(pad.to_image().unwrap().is_none());
    }

    #[test]
    fn test_backing_store_scales_with_pixel_ratio() {
        let pad = SignaturePad::new(400.0, 2.0);
        assert_eq!(pad.backing_size(), (800, 300));
        assert_eq!(pad.display_height(), 150.0);
    }

    #[test]
    fn test_pixel_ratio_clamped_to_one() {
        let pad = SignaturePad::new(400.0, 0.5);
        assert_eq!(pad.backing_size(), (400, 150));
    }

    #[test]
    fn test_resize_clears_strokes() {
        let mut pad = SignaturePad::new(400.0, 1.0);
        pad.add_stroke(stroke(&[(1.0, 1.0), (2.0, 2.0)]));

        pad.resize(320.0, 3.0);
        assert!(pad.is_empty());
        assert_eq!(pad.backing_size(), (960, 360));
    }

    #[test]
    fn test_points_outside_canvas_are_ignored() {
        let mut pad = SignaturePad::new(100.0, 1.0);
        pad.add_stroke(stroke(&[(-50.0, -50.0), (500.0, 500.0)]));
        // Must not panic; clipping happens per pixel.
        assert!(pad.to_image().unwrap().is_some());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut pad = SignaturePad::new(400.0, 2.0);
        pad.add_stroke(stroke(&[(10.0, 20.0), (30.0, 40.0)]));

        let json = serde_json::to_string(&pad).unwrap();
        let back: SignaturePad = serde_json::from_str(&json).unwrap();
        assert!(!back.is_empty());
        assert_eq!(back.backing_size(), pad.backing_size());
    }
}
