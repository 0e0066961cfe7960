//! Class-wise greedy non-maximum suppression.
//!
//! Candidates are grouped with a single stable sort over an index array
//! (class ascending, confidence descending) and each class range is walked
//! greedily. Ties in confidence keep their source order.

use crate::candidate::{Candidate, CenterBox};
use crate::trace::trace_event;

/// Intersection over union of two center-form boxes.
///
/// Returns 0 when the boxes do not overlap or the union is not positive.
pub fn iou(a: &CenterBox, b: &CenterBox) -> f32 {
    let left = (a.cx - a.w * 0.5).max(b.cx - b.w * 0.5);
    let right = (a.cx + a.w * 0.5).min(b.cx + b.w * 0.5);
    let top = (a.cy - a.h * 0.5).max(b.cy - b.h * 0.5);
    let bottom = (a.cy + a.h * 0.5).min(b.cy + b.h * 0.5);

    if top > bottom || left > right {
        return 0.0;
    }

    let inter = (right - left) * (bottom - top);
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}

/// Runs class-wise greedy NMS.
///
/// Candidates with confidence at or below `conf_threshold` are discarded
/// first. Within each class the highest-confidence remaining box is kept and
/// every other box whose IoU with it exceeds `iou_threshold` is removed.
/// Output is grouped by ascending class id, descending confidence within a
/// class.
pub fn nms_per_class(
    candidates: &[Candidate],
    iou_threshold: f32,
    conf_threshold: f32,
) -> Vec<Candidate> {
    nms_per_class_top_k(candidates, iou_threshold, conf_threshold, usize::MAX)
}

/// Class-wise greedy NMS keeping at most `top_k` boxes per class.
pub fn nms_per_class_top_k(
    candidates: &[Candidate],
    iou_threshold: f32,
    conf_threshold: f32,
    top_k: usize,
) -> Vec<Candidate> {
    let mut order: Vec<usize> = (0..candidates.len())
        .filter(|&idx| candidates[idx].confidence > conf_threshold)
        .collect();
    if order.is_empty() || top_k == 0 {
        return Vec::new();
    }

    order.sort_by(|&a, &b| {
        let (ca, cb) = (&candidates[a], &candidates[b]);
        ca.class_id
            .cmp(&cb.class_id)
            .then_with(|| cb.confidence.total_cmp(&ca.confidence))
    });

    let mut suppressed = vec![false; order.len()];
    let mut kept = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let class_id = candidates[order[start]].class_id;
        let len = order[start..]
            .iter()
            .position(|&idx| candidates[idx].class_id != class_id)
            .unwrap_or(order.len() - start);
        let end = start + len;
        suppress_group(
            candidates,
            &order[start..end],
            &mut suppressed[start..end],
            iou_threshold,
            top_k,
            &mut kept,
        );
        start = end;
    }

    trace_event!("nms", input = candidates.len(), kept = kept.len());
    kept
}

fn suppress_group(
    candidates: &[Candidate],
    group: &[usize],
    suppressed: &mut [bool],
    iou_threshold: f32,
    top_k: usize,
    kept: &mut Vec<Candidate>,
) {
    let mut emitted = 0usize;
    for i in 0..group.len() {
        if suppressed[i] {
            continue;
        }
        if emitted == top_k {
            break;
        }
        let best = candidates[group[i]];
        kept.push(best);
        emitted += 1;

        let best_box = best.center_box();
        for j in (i + 1)..group.len() {
            if !suppressed[j] && iou(&best_box, &candidates[group[j]].center_box()) > iou_threshold
            {
                suppressed[j] = true;
            }
        }
    }
}
