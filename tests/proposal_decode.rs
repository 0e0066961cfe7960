use yolobox::decode::presets::tlt;
use yolobox::{
    Candidate, Decoder, DetectionParams, LayerView, NetworkInfo, ProposalConfig, YoloBoxError,
    YoloBoxResult,
};

struct ProposalHead {
    count: Vec<i32>,
    boxes: Vec<f32>,
    scores: Vec<f32>,
    classes: Vec<f32>,
}

impl ProposalHead {
    fn new(count: i32, entries: &[([f32; 4], f32, f32)]) -> Self {
        let mut head = Self {
            count: vec![count],
            boxes: Vec::new(),
            scores: Vec::new(),
            classes: Vec::new(),
        };
        for (bbox, score, class) in entries {
            head.boxes.extend_from_slice(bbox);
            head.scores.push(*score);
            head.classes.push(*class);
        }
        head
    }

    fn layers(&self) -> Vec<LayerView<'_>> {
        vec![
            LayerView::from_i32("keep_count", &[1], &self.count).unwrap(),
            LayerView::from_f32("boxes", &[self.boxes.len()], &self.boxes).unwrap(),
            LayerView::from_f32("scores", &[self.scores.len()], &self.scores).unwrap(),
            LayerView::from_f32("classes", &[self.classes.len()], &self.classes).unwrap(),
        ]
    }
}

fn decode(decoder: &Decoder, layers: &[LayerView<'_>]) -> YoloBoxResult<Vec<Candidate>> {
    decoder.decode(
        layers,
        &NetworkInfo::new(100, 100),
        &DetectionParams::uniform(10, 0.0, 0.0),
    )
}

#[test]
fn out_of_range_scores_are_skipped() {
    let head = ProposalHead::new(
        2,
        &[
            ([10.0, 10.0, 50.0, 50.0], 1.5, 3.0),
            ([20.0, 20.0, 60.0, 80.0], 0.7, 5.0),
        ],
    );
    let cands = decode(&tlt(), &head.layers()).unwrap();
    assert_eq!(cands, vec![Candidate::new(20.0, 20.0, 40.0, 60.0, 5, 0.7)]);
}

#[test]
fn scores_just_above_one_are_clamped() {
    let head = ProposalHead::new(1, &[([10.0, 10.0, 50.0, 50.0], 1.0005, 1.0)]);
    let cands = decode(&tlt(), &head.layers()).unwrap();
    assert_eq!(cands.len(), 1);
    assert_eq!(cands[0].confidence, 1.0);
}

#[test]
fn boxes_outside_the_frame_are_skipped() {
    let head = ProposalHead::new(
        4,
        &[
            ([10.0, 10.0, 120.0, 50.0], 0.9, 0.0),
            ([10.0, 10.0, 50.0, 101.0], 0.9, 0.0),
            ([60.0, 10.0, 20.0, 50.0], 0.9, 0.0),
            ([-1.0, 10.0, 20.0, 50.0], 0.9, 0.0),
        ],
    );
    assert!(decode(&tlt(), &head.layers()).unwrap().is_empty());
}

#[test]
fn count_is_capped_by_top_k() {
    let entries: Vec<_> = (0..5)
        .map(|i| ([i as f32, 0.0, i as f32 + 10.0, 10.0], 0.5, 0.0))
        .collect();
    let head = ProposalHead::new(5, &entries);
    let decoder = Decoder::ProposalPassthrough(ProposalConfig { top_k: 3 });
    let cands = decode(&decoder, &head.layers()).unwrap();
    assert_eq!(cands.len(), 3);
    assert_eq!(cands[2].left, 2.0);
}

#[test]
fn float_count_and_integer_class_ids_are_accepted() {
    let count = [1.0f32];
    let boxes = [5.0f32, 5.0, 25.0, 45.0];
    let scores = [0.6f32];
    let classes = [7i32];
    let layers = [
        LayerView::from_f32("keep_count", &[1], &count).unwrap(),
        LayerView::from_f32("boxes", &[1, 4], &boxes).unwrap(),
        LayerView::from_f32("scores", &[1], &scores).unwrap(),
        LayerView::from_i32("classes", &[1], &classes).unwrap(),
    ];
    let cands = decode(&tlt(), &layers).unwrap();
    assert_eq!(cands, vec![Candidate::new(5.0, 5.0, 20.0, 40.0, 7, 0.6)]);
}

#[test]
fn negative_class_ids_are_skipped() {
    let head = ProposalHead::new(1, &[([10.0, 10.0, 50.0, 50.0], 0.9, -1.0)]);
    assert!(decode(&tlt(), &head.layers()).unwrap().is_empty());
}

#[test]
fn four_layers_are_required() {
    let count = [0i32];
    let layers = [
        LayerView::from_i32("keep_count", &[1], &count).unwrap(),
        LayerView::from_i32("keep_count", &[1], &count).unwrap(),
        LayerView::from_i32("keep_count", &[1], &count).unwrap(),
    ];
    let err = decode(&tlt(), &layers).unwrap_err();
    assert_eq!(err, YoloBoxError::LayerCountMismatch { expected: 4, got: 3 });
}

#[test]
fn short_buffers_are_shape_errors() {
    let head = ProposalHead::new(
        2,
        &[
            ([10.0, 10.0, 50.0, 50.0], 0.9, 0.0),
            ([20.0, 20.0, 60.0, 60.0], 0.8, 0.0),
        ],
    );
    let mut layers = head.layers();
    layers[1] = LayerView::from_f32("boxes", &[4], &head.boxes[..4]).unwrap();
    let err = decode(&tlt(), &layers).unwrap_err();
    assert!(matches!(err, YoloBoxError::ShapeMismatch { .. }));

    let mut layers = head.layers();
    layers[2] = LayerView::from_f32("scores", &[1], &head.scores[..1]).unwrap();
    let err = decode(&tlt(), &layers).unwrap_err();
    assert!(matches!(err, YoloBoxError::ShapeMismatch { .. }));
}

#[test]
fn integer_boxes_are_rejected() {
    let count = [1i32];
    let boxes = [5i32, 5, 25, 45];
    let scores = [0.6f32];
    let classes = [1.0f32];
    let layers = [
        LayerView::from_i32("keep_count", &[1], &count).unwrap(),
        LayerView::from_i32("boxes", &[4], &boxes).unwrap(),
        LayerView::from_f32("scores", &[1], &scores).unwrap(),
        LayerView::from_f32("classes", &[1], &classes).unwrap(),
    ];
    let err = decode(&tlt(), &layers).unwrap_err();
    assert!(matches!(err, YoloBoxError::DataTypeMismatch { .. }));
}

#[test]
fn unbounded_top_k_with_huge_count_is_a_shape_error() {
    let count = [f32::INFINITY];
    let boxes = [10.0f32, 10.0, 50.0, 50.0];
    let scores = [0.9f32];
    let classes = [0.0f32];
    let layers = [
        LayerView::from_f32("keep_count", &[1], &count).unwrap(),
        LayerView::from_f32("boxes", &[4], &boxes).unwrap(),
        LayerView::from_f32("scores", &[1], &scores).unwrap(),
        LayerView::from_f32("classes", &[1], &classes).unwrap(),
    ];
    let decoder = Decoder::ProposalPassthrough(ProposalConfig { top_k: usize::MAX });
    let err = decode(&decoder, &layers).unwrap_err();
    assert!(matches!(err, YoloBoxError::ShapeMismatch { .. }), "{err:?}");
}
