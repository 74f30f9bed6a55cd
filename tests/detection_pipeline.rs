//! End-to-end tests for the detection-head refinement pipeline.
//!
//! Output order is deliberately unasserted: the pipeline guarantees which
//! detections come back, not how they are arranged.

use boxrefine::{BBox, BoxRefineError, Delta, DetectionRefiner, RefineConfig};

const TOL: f32 = 1e-3;

fn zero_deltas(num_regions: usize, num_classes: usize) -> Vec<Delta> {
    vec![Delta::default(); num_regions * num_classes]
}

fn flat_logits(rows: &[&[f32]]) -> Vec<f32> {
    rows.iter().flat_map(|row| row.iter().copied()).collect()
}

fn three_class_refiner(max_per_image: usize) -> DetectionRefiner {
    DetectionRefiner::new(RefineConfig {
        num_classes: 3,
        max_per_image,
        ..RefineConfig::default()
    })
    .unwrap()
}

/// softmax probability of the hot entry in a one-hot logit row `[0, .., 4, .., 0]`.
fn hot_prob(num_classes: usize) -> f32 {
    let hot = 4.0f32.exp();
    hot / (hot + (num_classes - 1) as f32)
}

#[test]
fn non_overlapping_single_class_regions_cap_at_max_per_image() {
    let refiner = three_class_refiner(3);
    let rois: Vec<BBox> = (0..5)
        .map(|i| {
            let off = 60.0 * i as f32;
            BBox::new(off, off, off + 30.0, off + 30.0)
        })
        .collect();
    // every region scores highest on class 1
    let logit_rows: Vec<&[f32]> = vec![&[0.0, 4.0, 0.0]; 5];
    let logits = flat_logits(&logit_rows);
    let deltas = zero_deltas(5, 3);

    let detections = refiner
        .refine(&logits, &deltas, &rois, (400.0, 400.0))
        .unwrap()
        .unwrap();

    assert_eq!(detections.len(), 3);
    for detection in &detections {
        assert_eq!(detection.class_id, 1);
        assert!((detection.score - hot_prob(3)).abs() < TOL);
    }
}

#[test]
fn each_class_uses_its_own_score_column() {
    let refiner = three_class_refiner(5);
    let rois = [
        BBox::new(0.0, 0.0, 50.0, 50.0),
        BBox::new(100.0, 100.0, 160.0, 160.0),
    ];
    let logits = flat_logits(&[&[0.0, 4.0, 0.0], &[0.0, 0.0, 4.0]]);
    let deltas = zero_deltas(2, 3);

    let mut detections = refiner
        .refine(&logits, &deltas, &rois, (200.0, 200.0))
        .unwrap()
        .unwrap();
    detections.sort_by_key(|d| d.class_id);

    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].class_id, 1);
    assert_eq!(detections[1].class_id, 2);
    for detection in &detections {
        assert!((detection.score - hot_prob(3)).abs() < TOL);
    }
}

#[test]
fn stride_sized_minimum_edge_drops_small_boxes() {
    let refiner = three_class_refiner(5);
    let rois = [
        BBox::new(0.0, 0.0, 5.0, 5.0), // below the 16px stride
        BBox::new(100.0, 100.0, 150.0, 150.0),
    ];
    let logits = flat_logits(&[&[0.0, 4.0, 0.0], &[0.0, 4.0, 0.0]]);
    let deltas = zero_deltas(2, 3);

    let detections = refiner
        .refine(&logits, &deltas, &rois, (200.0, 200.0))
        .unwrap()
        .unwrap();
    assert_eq!(detections.len(), 1);
    assert!((detections[0].bbox.y1 - 100.0).abs() < TOL);
}

#[test]
fn background_dominant_logits_yield_no_detections() {
    let refiner = three_class_refiner(5);
    let rois = [
        BBox::new(0.0, 0.0, 50.0, 50.0),
        BBox::new(100.0, 100.0, 150.0, 150.0),
    ];
    // background probability ~0.96 per region, foreground below threshold
    let logits = flat_logits(&[&[4.0, 0.0, 0.0], &[4.0, 0.0, 0.0]]);
    let deltas = zero_deltas(2, 3);

    let result = refiner
        .refine(&logits, &deltas, &rois, (200.0, 200.0))
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn empty_input_yields_no_detections() {
    let refiner = three_class_refiner(5);
    let result = refiner.refine(&[], &[], &[], (100.0, 100.0)).unwrap();
    assert!(result.is_none());
}

#[test]
fn overlapping_boxes_within_a_class_are_suppressed() {
    let refiner = three_class_refiner(5);
    // identical boxes; only the higher-scoring one survives class-1 NMS
    let rois = [
        BBox::new(20.0, 20.0, 80.0, 80.0),
        BBox::new(20.0, 20.0, 80.0, 80.0),
    ];
    let logits = flat_logits(&[&[0.0, 5.0, 0.0], &[0.0, 4.0, 0.0]]);
    let deltas = zero_deltas(2, 3);

    let detections = refiner
        .refine(&logits, &deltas, &rois, (200.0, 200.0))
        .unwrap()
        .unwrap();
    assert_eq!(detections.len(), 1);
    let hot = 5.0f32.exp();
    let expected = hot / (hot + 2.0);
    assert!((detections[0].score - expected).abs() < TOL);
}

#[test]
fn rejects_mismatched_input_lengths() {
    let refiner = three_class_refiner(5);
    let rois = [BBox::new(0.0, 0.0, 50.0, 50.0)];
    let logits = [0.0, 4.0, 0.0];
    let deltas = zero_deltas(2, 3); // one region too many

    let err = refiner
        .refine(&logits, &deltas, &rois, (100.0, 100.0))
        .unwrap_err();
    assert_eq!(
        err,
        BoxRefineError::LengthMismatch {
            expected: 3,
            got: 6,
            context: "deltas",
        }
    );
}

#[test]
fn construction_rejects_invalid_stride() {
    let err = DetectionRefiner::new(RefineConfig {
        extractor_stride: -1.0,
        ..RefineConfig::default()
    })
    .unwrap_err();
    assert_eq!(err, BoxRefineError::InvalidStride { stride: -1.0 });
}
