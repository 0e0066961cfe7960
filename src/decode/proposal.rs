//! Pass-through decoding for two-stage region-proposal heads.
//!
//! The network emits four buffers: a keep count, `x1, y1, x2, y2` boxes,
//! scores, and class ids. Entries are validated against the network frame but
//! not thresholded; the producing model already applied its own cut-off.

use crate::candidate::Candidate;
use crate::decode::{expect_layer_count, expect_len, span_len};
use crate::layer::{DataType, LayerView, NetworkInfo};
use crate::trace::trace_event;
use crate::util::YoloBoxResult;

/// Scores above this are treated as malformed output.
pub const SCORE_LIMIT: f32 = 1.001;

/// Proposal head limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProposalConfig {
    /// Maximum number of entries read from the head.
    pub top_k: usize,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self { top_k: 200 }
    }
}

/// Decodes the four proposal buffers into candidates.
pub fn decode_proposals(
    layers: &[LayerView<'_>],
    network: &NetworkInfo,
    cfg: &ProposalConfig,
) -> YoloBoxResult<Vec<Candidate>> {
    expect_layer_count(layers, 4)?;
    let (count_layer, box_layer, score_layer, class_layer) =
        (&layers[0], &layers[1], &layers[2], &layers[3]);

    let n = count_layer.leading_count().min(cfg.top_k);
    let boxes = box_layer.as_f32()?;
    let scores = score_layer.as_f32()?;
    expect_len(box_layer, boxes, span_len(box_layer, 0, n, 4)?)?;
    expect_len(score_layer, scores, n)?;
    let classes = ClassIds::new(class_layer, n)?;

    let net_w = network.width as f32;
    let net_h = network.height as f32;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let score = scores[i];
        if !score.is_finite() || score > SCORE_LIMIT || score < 0.0 {
            continue;
        }
        let Some(class_id) = classes.get(i) else {
            continue;
        };
        let [x1, y1, x2, y2] = [boxes[i * 4], boxes[i * 4 + 1], boxes[i * 4 + 2], boxes[i * 4 + 3]];
        if !valid_box(x1, y1, x2, y2, net_w, net_h) {
            continue;
        }
        out.push(Candidate::new(x1, y1, x2 - x1, y2 - y1, class_id, score.min(1.0)));
    }

    trace_event!("proposals", read = n, kept = out.len());
    Ok(out)
}

fn valid_box(x1: f32, y1: f32, x2: f32, y2: f32, net_w: f32, net_h: f32) -> bool {
    let coords = [x1, y1, x2, y2];
    if coords.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return false;
    }
    if x1 > net_w || x2 > net_w || y1 > net_h || y2 > net_h {
        return false;
    }
    // Zero-area boxes are rejected along with inverted ones.
    if x2 <= x1 || y2 <= y1 {
        return false;
    }
    (x2 - x1) <= net_w && (y2 - y1) <= net_h
}

/// Class ids stored as either floats or integers.
enum ClassIds<'a> {
    Float(&'a [f32]),
    Int(&'a [i32]),
}

impl<'a> ClassIds<'a> {
    fn new(layer: &LayerView<'a>, n: usize) -> YoloBoxResult<Self> {
        let ids = match layer.data_type() {
            DataType::Float32 => {
                let data = layer.as_f32()?;
                expect_len(layer, data, n)?;
                ClassIds::Float(data)
            }
            DataType::Int32 => {
                let data = layer.as_i32()?;
                expect_len(layer, data, n)?;
                ClassIds::Int(data)
            }
        };
        Ok(ids)
    }

    fn get(&self, i: usize) -> Option<u32> {
        match self {
            ClassIds::Float(data) => {
                let v = data[i];
                (v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f32).then_some(v as u32)
            }
            ClassIds::Int(data) => u32::try_from(data[i]).ok(),
        }
    }
}
