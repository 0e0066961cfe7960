//! Decoder configurations for common YOLO releases.
//!
//! Anchor tables and mask groups are the values shipped with the reference
//! Darknet configs; every preset decodes the 80 COCO classes.

use crate::decode::grid::{AnchorUnits, GridAnchorConfig, SizeEncoding};
use crate::decode::proposal::ProposalConfig;
use crate::decode::regression::RegressionConfig;
use crate::decode::Decoder;
use crate::util::{YoloBoxError, YoloBoxResult};

/// Class count of the COCO-trained presets.
pub const COCO_NUM_CLASSES: usize = 80;

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &[
    "yolov2",
    "yolov2-tiny",
    "yolov3",
    "yolov3-tiny",
    "yolov4",
    "yolov5",
    "tlt",
];

const YOLO_V2_ANCHORS: [[f32; 2]; 5] = [
    [0.57273, 0.677385],
    [1.87446, 2.06253],
    [3.33843, 5.47434],
    [7.88282, 3.52778],
    [9.77052, 9.16828],
];

const YOLO_V3_ANCHORS: [[f32; 2]; 9] = [
    [10.0, 13.0],
    [16.0, 30.0],
    [33.0, 23.0],
    [30.0, 61.0],
    [62.0, 45.0],
    [59.0, 119.0],
    [116.0, 90.0],
    [156.0, 198.0],
    [373.0, 326.0],
];

const YOLO_V3_TINY_ANCHORS: [[f32; 2]; 6] = [
    [10.0, 14.0],
    [23.0, 27.0],
    [37.0, 58.0],
    [81.0, 82.0],
    [135.0, 169.0],
    [344.0, 319.0],
];

/// YOLOv2: one 13x13 head, five grid-unit anchors, exponential sizes.
pub fn yolo_v2() -> Decoder {
    Decoder::GridAnchor(GridAnchorConfig::single_layer(
        YOLO_V2_ANCHORS.to_vec(),
        COCO_NUM_CLASSES,
        SizeEncoding::Exp,
        AnchorUnits::GridCells,
    ))
}

/// YOLOv2-tiny ships with the YOLOv2 anchor table.
pub fn yolo_v2_tiny() -> Decoder {
    yolo_v2()
}

/// YOLOv3: three heads, pixel anchors, sizes already activated in-graph.
pub fn yolo_v3() -> Decoder {
    Decoder::GridAnchor(GridAnchorConfig {
        anchors: YOLO_V3_ANCHORS.to_vec(),
        masks: vec![vec![6, 7, 8], vec![3, 4, 5], vec![0, 1, 2]],
        num_classes: COCO_NUM_CLASSES,
        size_encoding: SizeEncoding::Linear,
        anchor_units: AnchorUnits::Pixels,
    })
}

/// YOLOv3-tiny: two heads; the fine head uses anchors 1..=3.
pub fn yolo_v3_tiny() -> Decoder {
    Decoder::GridAnchor(GridAnchorConfig {
        anchors: YOLO_V3_TINY_ANCHORS.to_vec(),
        masks: vec![vec![3, 4, 5], vec![1, 2, 3]],
        num_classes: COCO_NUM_CLASSES,
        size_encoding: SizeEncoding::Linear,
        anchor_units: AnchorUnits::Pixels,
    })
}

/// YOLOv4 with an in-graph detection layer.
pub fn yolo_v4() -> Decoder {
    Decoder::DirectRegression(RegressionConfig::default())
}

/// YOLOv5 with an in-graph detection layer.
pub fn yolo_v5() -> Decoder {
    Decoder::DirectRegression(RegressionConfig::default())
}

/// TLT-exported YOLO with a batched-NMS output head.
pub fn tlt() -> Decoder {
    Decoder::ProposalPassthrough(ProposalConfig::default())
}

/// Looks up a preset by name (case-insensitive, `_` accepted for `-`).
pub fn preset(name: &str) -> YoloBoxResult<Decoder> {
    let key = name.trim().to_ascii_lowercase().replace('_', "-");
    let decoder = match key.as_str() {
        "yolov2" => yolo_v2(),
        "yolov2-tiny" => yolo_v2_tiny(),
        "yolov3" => yolo_v3(),
        "yolov3-tiny" => yolo_v3_tiny(),
        "yolov4" => yolo_v4(),
        "yolov5" => yolo_v5(),
        "tlt" => tlt(),
        _ => return Err(YoloBoxError::UnknownPreset(name.to_owned())),
    };
    Ok(decoder)
}
