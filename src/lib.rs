//! yolobox turns raw YOLO-family detector output tensors into bounding boxes.
//!
//! The crate decodes one or more output layers (anchor-grid heads, packed
//! pre-NMS tensors, or region-proposal buffers) into candidates, then runs
//! class-wise greedy non-maximum suppression and per-class thresholds to
//! produce final detections. Everything operates on borrowed buffers and is
//! free of global state; optional parallel batch parsing is available via the
//! `rayon` feature and structured logging via the `tracing` feature.

mod candidate;
pub mod decode;
pub mod layer;
pub mod letterbox;
pub mod lowlevel;
pub mod parser;
mod trace;
pub mod util;

pub use candidate::threshold::DetectionParams;
pub use candidate::{Candidate, CenterBox, Detection};
pub use decode::{
    AnchorUnits, Decoder, GridAnchorConfig, ProposalConfig, RegressionConfig, SizeEncoding,
};
pub use layer::{DataType, LayerData, LayerView, NetworkInfo};
pub use letterbox::Letterbox;
pub use parser::{ClusterMode, FrameParser, ParseConfig};
pub use util::{YoloBoxError, YoloBoxResult};

pub use candidate::nms::{iou, nms_per_class};
