//! Per-class confidence thresholds applied around clustering.

use crate::candidate::Candidate;

/// Caller-supplied detection parameters for one parse call.
///
/// The `Default` value configures zero classes, so every candidate fails the
/// pre-cluster pass; build real parameters with [`DetectionParams::uniform`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionParams {
    /// Number of classes the caller wants parsed, starting at class 0.
    pub num_classes_configured: usize,
    /// Minimum confidence per class before clustering (inclusive).
    pub per_class_precluster_threshold: Vec<f32>,
    /// Minimum confidence per class after clustering (inclusive).
    pub per_class_postcluster_threshold: Vec<f32>,
}

impl DetectionParams {
    /// Same pre- and post-cluster thresholds for every class.
    pub fn uniform(num_classes: usize, precluster: f32, postcluster: f32) -> Self {
        Self {
            num_classes_configured: num_classes,
            per_class_precluster_threshold: vec![precluster; num_classes],
            per_class_postcluster_threshold: vec![postcluster; num_classes],
        }
    }

    /// Pre-cluster threshold for `class_id`; classes without an entry use 0.
    pub fn precluster_threshold(&self, class_id: u32) -> f32 {
        lookup(&self.per_class_precluster_threshold, class_id)
    }

    /// Post-cluster threshold for `class_id`; classes without an entry use 0.
    pub fn postcluster_threshold(&self, class_id: u32) -> f32 {
        lookup(&self.per_class_postcluster_threshold, class_id)
    }

    fn in_range(&self, class_id: u32) -> bool {
        (class_id as usize) < self.num_classes_configured
    }
}

fn lookup(thresholds: &[f32], class_id: u32) -> f32 {
    thresholds.get(class_id as usize).copied().unwrap_or(0.0)
}

/// Keeps candidates of configured classes that meet their pre-cluster threshold.
pub(crate) fn retain_precluster(candidates: &mut Vec<Candidate>, params: &DetectionParams) {
    candidates.retain(|c| {
        params.in_range(c.class_id) && c.confidence >= params.precluster_threshold(c.class_id)
    });
}

/// Keeps candidates that meet their post-cluster threshold.
pub(crate) fn retain_postcluster(candidates: &mut Vec<Candidate>, params: &DetectionParams) {
    candidates.retain(|c| c.confidence >= params.postcluster_threshold(c.class_id));
}
