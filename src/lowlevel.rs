//! Low-level building blocks for custom parsing pipelines.
//!
//! These expose the individual decoders and the suppression routine for
//! callers that assemble their own flow. Most users should prefer
//! `FrameParser` with a `Decoder` from `decode::presets`.

pub use crate::candidate::nms::{iou, nms_per_class, nms_per_class_top_k};
pub use crate::decode::grid::{decode_grid_anchor, sort_layers};
pub use crate::decode::proposal::{decode_proposals, SCORE_LIMIT};
pub use crate::decode::regression::{decode_direct_regression, TUPLE_LEN};
