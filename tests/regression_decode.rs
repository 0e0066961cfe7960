use yolobox::decode::presets::yolo_v4;
use yolobox::lowlevel::TUPLE_LEN;
use yolobox::{Decoder, DetectionParams, LayerView, NetworkInfo, RegressionConfig, YoloBoxError};

fn packed(count: f32, tuples: &[[f32; TUPLE_LEN]]) -> Vec<f32> {
    let mut data = vec![count];
    for tuple in tuples {
        data.extend_from_slice(tuple);
    }
    data
}

fn decode(decoder: &Decoder, data: &[f32]) -> Result<Vec<yolobox::Candidate>, YoloBoxError> {
    let layers = [LayerView::from_f32("detections", &[data.len()], data).unwrap()];
    decoder.decode(
        &layers,
        &NetworkInfo::new(640, 640),
        &DetectionParams::uniform(80, 0.0, 0.0),
    )
}

#[test]
fn overlapping_duplicates_are_suppressed_per_class() {
    let data = packed(
        4.0,
        &[
            [100.0, 100.0, 50.0, 50.0, 0.9, 0.0],
            [102.0, 101.0, 50.0, 50.0, 0.8, 0.0],
            [100.0, 100.0, 50.0, 50.0, 0.7, 1.0],
            [300.0, 300.0, 50.0, 50.0, 0.3, 0.0],
        ],
    );
    let cands = decode(&yolo_v4(), &data).unwrap();
    assert_eq!(cands.len(), 2);

    assert_eq!(cands[0].class_id, 0);
    assert!((cands[0].confidence - 0.9).abs() < 1e-6);
    assert_eq!((cands[0].left, cands[0].top), (75.0, 75.0));
    assert_eq!((cands[0].width, cands[0].height), (50.0, 50.0));

    assert_eq!(cands[1].class_id, 1);
    assert!((cands[1].confidence - 0.7).abs() < 1e-6);
}

#[test]
fn confidence_gate_is_exclusive() {
    let data = packed(1.0, &[[100.0, 100.0, 20.0, 20.0, 0.4, 3.0]]);
    assert!(decode(&yolo_v4(), &data).unwrap().is_empty());
}

#[test]
fn leading_count_is_capped_by_max_detections() {
    let decoder = Decoder::DirectRegression(RegressionConfig {
        max_detections: 2,
        ..RegressionConfig::default()
    });
    // The header claims five tuples but only two are present.
    let data = packed(
        5.0,
        &[
            [50.0, 50.0, 20.0, 20.0, 0.9, 0.0],
            [300.0, 300.0, 20.0, 20.0, 0.8, 0.0],
        ],
    );
    let cands = decode(&decoder, &data).unwrap();
    assert_eq!(cands.len(), 2);
}

#[test]
fn truncated_buffer_is_a_shape_error() {
    let data = packed(
        3.0,
        &[
            [50.0, 50.0, 20.0, 20.0, 0.9, 0.0],
            [300.0, 300.0, 20.0, 20.0, 0.8, 0.0],
        ],
    );
    let err = decode(&yolo_v4(), &data).unwrap_err();
    assert!(matches!(err, YoloBoxError::ShapeMismatch { .. }));
}

#[test]
fn negative_origin_is_clamped_and_size_kept() {
    let data = packed(1.0, &[[10.0, 50.0, 40.0, 20.0, 0.95, 2.0]]);
    let cands = decode(&yolo_v4(), &data).unwrap();
    assert_eq!(cands.len(), 1);
    assert_eq!((cands[0].left, cands[0].top), (0.0, 40.0));
    assert_eq!((cands[0].width, cands[0].height), (40.0, 20.0));
}

#[test]
fn zero_count_yields_nothing() {
    let data = packed(0.0, &[]);
    assert!(decode(&yolo_v4(), &data).unwrap().is_empty());
}

#[test]
fn exactly_one_layer_is_required() {
    let data = packed(0.0, &[]);
    let layers = [
        LayerView::from_f32("a", &[1], &data).unwrap(),
        LayerView::from_f32("b", &[1], &data).unwrap(),
    ];
    let err = yolo_v4()
        .decode(
            &layers,
            &NetworkInfo::new(640, 640),
            &DetectionParams::uniform(80, 0.0, 0.0),
        )
        .unwrap_err();
    assert_eq!(err, YoloBoxError::LayerCountMismatch { expected: 1, got: 2 });
}

#[test]
fn unbounded_cap_with_huge_count_header_is_a_shape_error() {
    let decoder = Decoder::DirectRegression(RegressionConfig {
        max_detections: usize::MAX,
        ..RegressionConfig::default()
    });
    for header in [f32::INFINITY, 1e30] {
        let data = packed(header, &[[1.0, 1.0, 1.0, 1.0, 0.9, 0.0]]);
        let err = decode(&decoder, &data).unwrap_err();
        assert!(matches!(err, YoloBoxError::ShapeMismatch { .. }), "{err:?}");
    }
}
