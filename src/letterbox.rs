//! Mapping between source frames and a letterboxed network input.
//!
//! The source frame is scaled by `min(W / src_w, H / src_h)` and centered on
//! the network canvas, padding the remaining axis. Detections come back in
//! canvas pixels; `Letterbox::to_source` undoes the padding and scale and
//! clamps the result to the source frame.

use crate::candidate::Detection;
use crate::layer::NetworkInfo;
use crate::util::{YoloBoxError, YoloBoxResult};

/// Scale and padding of one source-to-network letterbox resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub source_width: u32,
    pub source_height: u32,
    /// Source-to-network scale factor.
    pub scale: f32,
    /// Horizontal padding on the left of the canvas.
    pub pad_x: f32,
    /// Vertical padding at the top of the canvas.
    pub pad_y: f32,
}

impl Letterbox {
    /// Computes the aspect-preserving fit of a source frame into the network input.
    pub fn fit(
        source_width: u32,
        source_height: u32,
        network: &NetworkInfo,
    ) -> YoloBoxResult<Self> {
        if source_width == 0 || source_height == 0 {
            return Err(YoloBoxError::InvalidInput("source frame must be non-empty"));
        }
        if network.width == 0 || network.height == 0 {
            return Err(YoloBoxError::InvalidInput("network resolution must be non-zero"));
        }
        let net_w = network.width as f32;
        let net_h = network.height as f32;
        let scale = (net_w / source_width as f32).min(net_h / source_height as f32);
        Ok(Self {
            source_width,
            source_height,
            scale,
            pad_x: (net_w - scale * source_width as f32) * 0.5,
            pad_y: (net_h - scale * source_height as f32) * 0.5,
        })
    }

    /// Maps a source-frame point onto the network canvas.
    pub fn to_network(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.pad_x, y * self.scale + self.pad_y)
    }

    /// Maps a network-canvas point back into the source frame (unclamped).
    pub fn to_source_point(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }

    /// Maps a detection back into source-frame pixels.
    ///
    /// Returns `None` when the box falls entirely inside the padding.
    pub fn to_source(&self, det: &Detection) -> Option<Detection> {
        let src_w = self.source_width as f32;
        let src_h = self.source_height as f32;
        let (x0, y0) = self.to_source_point(det.left, det.top);
        let (x1, y1) = self.to_source_point(det.left + det.width, det.top + det.height);
        let (x0, x1) = (x0.clamp(0.0, src_w), x1.clamp(0.0, src_w));
        let (y0, y1) = (y0.clamp(0.0, src_h), y1.clamp(0.0, src_h));
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(Detection {
            left: x0,
            top: y0,
            width: x1 - x0,
            height: y1 - y0,
            ..*det
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_frame_pads_vertically() {
        let lb = Letterbox::fit(1280, 720, &NetworkInfo::new(640, 640)).unwrap();
        assert!((lb.scale - 0.5).abs() < 1e-6);
        assert_eq!(lb.pad_x, 0.0);
        assert!((lb.pad_y - 140.0).abs() < 1e-4);
    }

    #[test]
    fn detection_maps_back_to_source_pixels() {
        let lb = Letterbox::fit(1280, 720, &NetworkInfo::new(640, 640)).unwrap();
        let det = Detection {
            class_id: 2,
            left: 100.0,
            top: 190.0,
            width: 50.0,
            height: 25.0,
            confidence: 0.7,
        };
        let src = lb.to_source(&det).unwrap();
        assert!((src.left - 200.0).abs() < 1e-3);
        assert!((src.top - 100.0).abs() < 1e-3);
        assert!((src.width - 100.0).abs() < 1e-3);
        assert!((src.height - 50.0).abs() < 1e-3);
        assert_eq!(src.class_id, 2);
    }

    #[test]
    fn box_inside_padding_is_dropped() {
        let lb = Letterbox::fit(1280, 720, &NetworkInfo::new(640, 640)).unwrap();
        let det = Detection {
            class_id: 0,
            left: 10.0,
            top: 10.0,
            width: 20.0,
            height: 20.0,
            confidence: 0.9,
        };
        assert!(lb.to_source(&det).is_none());
    }

    #[test]
    fn fit_rejects_empty_frames() {
        assert!(Letterbox::fit(0, 10, &NetworkInfo::new(64, 64)).is_err());
    }
}
