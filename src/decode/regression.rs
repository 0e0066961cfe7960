//! Decoding for packed pre-NMS detection tensors (YOLOv4/v5 style).
//!
//! The single output layer holds a leading count followed by fixed-size
//! tuples `cx, cy, w, h, confidence, class_id`, all as floats. Suppression is
//! part of decoding: survivors of the confidence gate run through class-wise
//! NMS before boxes are converted to left/top form.

use crate::candidate::nms::nms_per_class;
use crate::candidate::{Candidate, CenterBox};
use crate::decode::{expect_layer_count, expect_len, span_len};
use crate::layer::{LayerView, NetworkInfo};
use crate::trace::trace_event;
use crate::util::math::unit_confidence;
use crate::util::YoloBoxResult;

/// Floats per packed detection tuple.
pub const TUPLE_LEN: usize = 6;

/// Limits and thresholds compiled into the regression head.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegressionConfig {
    /// Upper bound on the leading count.
    pub max_detections: usize,
    /// Tuples at or below this confidence are dropped.
    pub confidence_threshold: f32,
    /// IoU above which same-class boxes are suppressed.
    pub nms_threshold: f32,
    pub num_classes: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            max_detections: 1000,
            confidence_threshold: 0.4,
            nms_threshold: 0.5,
            num_classes: 80,
        }
    }
}

/// Decodes and suppresses one packed detection layer.
pub fn decode_direct_regression(
    layers: &[LayerView<'_>],
    network: &NetworkInfo,
    cfg: &RegressionConfig,
) -> YoloBoxResult<Vec<Candidate>> {
    expect_layer_count(layers, 1)?;
    let layer = &layers[0];
    let data = layer.as_f32()?;

    let count = layer.leading_count().min(cfg.max_detections);
    let needed = span_len(layer, 1, count, TUPLE_LEN)?;
    expect_len(layer, data, needed)?;

    let mut raw = Vec::with_capacity(count);
    for tuple in data[1..needed].chunks_exact(TUPLE_LEN) {
        let &[cx, cy, w, h, conf, class] = tuple else {
            continue;
        };
        if conf <= cfg.confidence_threshold {
            continue;
        }
        if let Some(cand) = parse_tuple(CenterBox::new(cx, cy, w, h), conf, class) {
            raw.push(cand);
        }
    }

    let kept = nms_per_class(&raw, cfg.nms_threshold, cfg.confidence_threshold);
    let out: Vec<Candidate> = kept
        .into_iter()
        .filter_map(|cand| clamp_origin(cand, network))
        .collect();

    trace_event!("regression", count = count, gated = raw.len(), kept = out.len());
    Ok(out)
}

fn parse_tuple(bbox: CenterBox, conf: f32, class: f32) -> Option<Candidate> {
    let finite = [bbox.cx, bbox.cy, bbox.w, bbox.h].iter().all(|v| v.is_finite());
    if !finite || bbox.w <= 0.0 || bbox.h <= 0.0 {
        return None;
    }
    if !(class >= 0.0 && class.fract() == 0.0 && class <= u32::MAX as f32) {
        return None;
    }
    let confidence = unit_confidence(conf)?;
    Some(Candidate::from_center(bbox, class as u32, confidence))
}

/// Clamps negative origins to zero; width and height are kept as decoded.
fn clamp_origin(cand: Candidate, network: &NetworkInfo) -> Option<Candidate> {
    if cand.right() <= 0.0 || cand.bottom() <= 0.0 {
        return None;
    }
    let left = cand.left.max(0.0);
    let top = cand.top.max(0.0);
    if left >= network.width as f32 || top >= network.height as f32 {
        return None;
    }
    Some(Candidate { left, top, ..cand })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tuple_rejects_malformed_values() {
        let bbox = CenterBox::new(10.0, 10.0, 4.0, 4.0);
        assert!(parse_tuple(bbox, 0.9, 2.0).is_some());
        assert!(parse_tuple(bbox, 0.9, -1.0).is_none());
        assert!(parse_tuple(bbox, 0.9, 1.5).is_none());
        assert!(parse_tuple(bbox, f32::NAN, 1.0).is_none());
        assert!(parse_tuple(CenterBox::new(10.0, 10.0, 0.0, 4.0), 0.9, 1.0).is_none());
        assert!(parse_tuple(CenterBox::new(f32::INFINITY, 10.0, 4.0, 4.0), 0.9, 1.0).is_none());
    }

    #[test]
    fn clamp_origin_keeps_size_and_drops_outside() {
        let net = NetworkInfo::new(64, 64);
        let cand = Candidate::new(-3.0, 2.0, 10.0, 10.0, 0, 0.5);
        let clamped = clamp_origin(cand, &net).unwrap();
        assert_eq!((clamped.left, clamped.top, clamped.width), (0.0, 2.0, 10.0));

        assert!(clamp_origin(Candidate::new(-20.0, 0.0, 10.0, 10.0, 0, 0.5), &net).is_none());
        assert!(clamp_origin(Candidate::new(64.0, 0.0, 10.0, 10.0, 0, 0.5), &net).is_none());
    }
}
