//! Anchor-grid decoding for YOLOv2/v3-style heads.
//!
//! Each output layer is a `(C, H, W)` tensor with
//! `C = anchors_in_mask * (5 + num_classes)`. Per anchor the channels are
//! `x, y, w, h, objectness, class scores...`, stored plane by plane so the
//! value of channel `k` for anchor `b` at cell `(x, y)` sits at
//! `y * W + x + H * W * (b * (5 + num_classes) + k)`.
//!
//! Offsets are used as-is: any logistic activation must already be part of
//! the producing graph.

use crate::candidate::{Candidate, CenterBox};
use crate::decode::expect_layer_count;
use crate::layer::{LayerView, NetworkInfo};
use crate::trace::trace_event;
use crate::util::math::{argmax_positive, div_up, unit_confidence};
use crate::util::{YoloBoxError, YoloBoxResult};

/// How raw width/height channels scale the anchor box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeEncoding {
    /// `w = anchor_w * raw` (YOLOv3 family, activation applied in-graph).
    Linear,
    /// `w = anchor_w * exp(raw)` (YOLOv2 family).
    Exp,
}

/// Units of the anchor table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorUnits {
    /// Anchors are in network-input pixels.
    Pixels,
    /// Anchors are in grid cells and get multiplied by the layer stride.
    GridCells,
}

/// Anchor table, mask groups, and encoding for one grid-anchor network.
#[derive(Clone, Debug, PartialEq)]
pub struct GridAnchorConfig {
    /// Anchor `[width, height]` pairs.
    pub anchors: Vec<[f32; 2]>,
    /// Anchor indices used by each output layer, coarsest grid first.
    pub masks: Vec<Vec<usize>>,
    /// Classes the network was trained on.
    pub num_classes: usize,
    pub size_encoding: SizeEncoding,
    pub anchor_units: AnchorUnits,
}

impl GridAnchorConfig {
    /// Single-layer config that uses every anchor.
    pub fn single_layer(
        anchors: Vec<[f32; 2]>,
        num_classes: usize,
        size_encoding: SizeEncoding,
        anchor_units: AnchorUnits,
    ) -> Self {
        let masks = vec![(0..anchors.len()).collect()];
        Self {
            anchors,
            masks,
            num_classes,
            size_encoding,
            anchor_units,
        }
    }

    /// Channels per anchor: box (4) + objectness (1) + class scores.
    pub fn channels_per_anchor(&self) -> usize {
        5 + self.num_classes
    }

    /// Checks that masks reference existing anchors and classes are set.
    pub fn validate(&self) -> YoloBoxResult<()> {
        if self.num_classes == 0 {
            return Err(YoloBoxError::InvalidInput("num_classes must be positive"));
        }
        if self.masks.is_empty() || self.masks.iter().any(|m| m.is_empty()) {
            return Err(YoloBoxError::InvalidInput("anchor masks must be non-empty"));
        }
        if self.masks.iter().flatten().any(|&idx| idx >= self.anchors.len()) {
            return Err(YoloBoxError::InvalidInput("anchor mask index out of range"));
        }
        Ok(())
    }
}

/// Orders layers by ascending grid height (dimension 1), keeping input order on ties.
pub fn sort_layers<'l, 'a>(layers: &'l [LayerView<'a>]) -> Vec<&'l LayerView<'a>> {
    let mut sorted: Vec<&LayerView<'a>> = layers.iter().collect();
    sorted.sort_by_key(|layer| layer.dims().get(1).copied().unwrap_or(0));
    sorted
}

/// Decodes every grid layer, matching sorted layers to mask groups in order.
pub fn decode_grid_anchor(
    layers: &[LayerView<'_>],
    network: &NetworkInfo,
    cfg: &GridAnchorConfig,
) -> YoloBoxResult<Vec<Candidate>> {
    cfg.validate()?;
    expect_layer_count(layers, cfg.masks.len())?;

    let sorted = sort_layers(layers);
    let mut out = Vec::new();
    for (layer, mask) in sorted.into_iter().zip(&cfg.masks) {
        let geometry = GridGeometry::for_layer(layer, mask.len(), network, cfg)?;
        let data = layer.as_f32()?;
        let before = out.len();
        decode_layer(data, &geometry, mask, network, cfg, &mut out);
        trace_event!(
            "grid_layer",
            grid_w = geometry.grid_w,
            grid_h = geometry.grid_h,
            stride = geometry.stride,
            candidates = out.len() - before,
        );
    }
    Ok(out)
}

#[derive(Clone, Copy, Debug)]
struct GridGeometry {
    grid_w: usize,
    grid_h: usize,
    stride: usize,
}

impl GridGeometry {
    fn for_layer(
        layer: &LayerView<'_>,
        num_anchors: usize,
        network: &NetworkInfo,
        cfg: &GridAnchorConfig,
    ) -> YoloBoxResult<Self> {
        let shape_err = |reason: String| YoloBoxError::ShapeMismatch {
            layer: layer.name().to_owned(),
            reason,
        };

        let &[channels, grid_h, grid_w] = layer.dims() else {
            return Err(shape_err(format!(
                "expected 3 dims (C, H, W), got {:?}",
                layer.dims()
            )));
        };
        let expected = num_anchors * cfg.channels_per_anchor();
        if channels != expected {
            return Err(shape_err(format!(
                "expected {expected} channels ({num_anchors} anchors x {}), got {channels}",
                cfg.channels_per_anchor()
            )));
        }

        let stride_w = div_up(network.width as usize, grid_w);
        let stride_h = div_up(network.height as usize, grid_h);
        if stride_w != stride_h {
            return Err(YoloBoxError::StrideMismatch {
                layer: layer.name().to_owned(),
                stride_w,
                stride_h,
            });
        }

        Ok(Self {
            grid_w,
            grid_h,
            stride: stride_w,
        })
    }
}

fn decode_layer(
    data: &[f32],
    geometry: &GridGeometry,
    mask: &[usize],
    network: &NetworkInfo,
    cfg: &GridAnchorConfig,
    out: &mut Vec<Candidate>,
) {
    let cells = geometry.grid_w * geometry.grid_h;
    let per_anchor = cfg.channels_per_anchor();
    let stride = geometry.stride as f32;
    let anchor_scale = match cfg.anchor_units {
        AnchorUnits::Pixels => 1.0,
        AnchorUnits::GridCells => stride,
    };

    for y in 0..geometry.grid_h {
        for x in 0..geometry.grid_w {
            let cell = y * geometry.grid_w + x;
            for (b, &anchor_idx) in mask.iter().enumerate() {
                let at = |k: usize| data[cell + cells * (b * per_anchor + k)];
                let [anchor_w, anchor_h] = cfg.anchors[anchor_idx];

                let Some((class_id, class_score)) =
                    argmax_positive((0..cfg.num_classes).map(|i| at(5 + i)))
                else {
                    continue;
                };
                let Some(confidence) = unit_confidence(at(4) * class_score) else {
                    continue;
                };

                let (bw, bh) = match cfg.size_encoding {
                    SizeEncoding::Linear => (at(2), at(3)),
                    SizeEncoding::Exp => (at(2).exp(), at(3).exp()),
                };
                let bbox = CenterBox::new(
                    (x as f32 + at(0)) * stride,
                    (y as f32 + at(1)) * stride,
                    anchor_w * anchor_scale * bw,
                    anchor_h * anchor_scale * bh,
                );
                if let Some(cand) = clamp_to_network(bbox, network, class_id as u32, confidence) {
                    out.push(cand);
                }
            }
        }
    }
}

/// Clamps box edges into the network frame, dropping boxes under one pixel.
fn clamp_to_network(
    bbox: CenterBox,
    network: &NetworkInfo,
    class_id: u32,
    confidence: f32,
) -> Option<Candidate> {
    let net_w = network.width as f32;
    let net_h = network.height as f32;
    let x0 = bbox.cx - bbox.w * 0.5;
    let y0 = bbox.cy - bbox.h * 0.5;
    let x1 = (x0 + bbox.w).clamp(0.0, net_w);
    let y1 = (y0 + bbox.h).clamp(0.0, net_h);
    let x0 = x0.clamp(0.0, net_w);
    let y0 = y0.clamp(0.0, net_h);

    let width = x1 - x0;
    let height = y1 - y0;
    // Negated comparison also rejects NaN from overflowing exp().
    if !(width >= 1.0 && height >= 1.0) {
        return None;
    }
    Some(Candidate::new(x0, y0, width, height, class_id, confidence))
}
