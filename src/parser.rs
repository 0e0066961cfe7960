//! Per-frame parsing: decode, threshold, cluster, threshold.
//!
//! `FrameParser` owns a decoder and a clustering configuration. Each call is
//! independent, so a single parser can be shared across threads; batches are
//! parsed frame by frame, optionally on the rayon pool.

use crate::candidate::nms::nms_per_class_top_k;
use crate::candidate::threshold::{retain_postcluster, retain_precluster, DetectionParams};
use crate::candidate::Detection;
use crate::decode::Decoder;
use crate::layer::{LayerView, NetworkInfo};
use crate::trace::{trace_event, trace_span};
use crate::util::YoloBoxResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Clustering applied between the two threshold passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterMode {
    /// Class-wise greedy non-maximum suppression.
    Nms,
    /// Keep every candidate that passes the pre-cluster threshold.
    None,
}

/// Clustering and scheduling options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParseConfig {
    pub cluster_mode: ClusterMode,
    /// IoU above which same-class boxes are suppressed.
    pub iou_threshold: f32,
    /// Maximum boxes kept per class after NMS; 0 keeps all.
    pub top_k: usize,
    /// Parse batch frames in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            cluster_mode: ClusterMode::Nms,
            iou_threshold: 0.5,
            top_k: 0,
            parallel: false,
        }
    }
}

/// Decoder plus clustering configuration for one model.
#[derive(Clone, Debug)]
pub struct FrameParser {
    decoder: Decoder,
    config: ParseConfig,
}

impl FrameParser {
    /// Creates a parser with the default configuration.
    pub fn new(decoder: Decoder) -> Self {
        Self {
            decoder,
            config: ParseConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Parses one frame's output layers into final detections.
    pub fn parse(
        &self,
        layers: &[LayerView<'_>],
        network: &NetworkInfo,
        params: &DetectionParams,
    ) -> YoloBoxResult<Vec<Detection>> {
        let _span = trace_span!("parse_frame", family = self.decoder.family()).entered();

        let mut candidates = self.decoder.decode(layers, network, params)?;
        retain_precluster(&mut candidates, params);
        let decoded = candidates.len();

        let mut clustered = match self.config.cluster_mode {
            ClusterMode::Nms => {
                let top_k = match self.config.top_k {
                    0 => usize::MAX,
                    k => k,
                };
                // Pre-cluster thresholds already gated confidence.
                nms_per_class_top_k(
                    &candidates,
                    self.config.iou_threshold,
                    f32::NEG_INFINITY,
                    top_k,
                )
            }
            ClusterMode::None => candidates,
        };
        retain_postcluster(&mut clustered, params);

        trace_event!("parsed", precluster = decoded, detections = clustered.len());
        Ok(clustered.into_iter().map(Detection::from).collect())
    }

    /// Parses every frame of a batch independently.
    ///
    /// Results are in frame order; a failed frame does not affect the others.
    pub fn parse_batch(
        &self,
        frames: &[Vec<LayerView<'_>>],
        network: &NetworkInfo,
        params: &DetectionParams,
    ) -> Vec<YoloBoxResult<Vec<Detection>>> {
        let _span = trace_span!("parse_batch", frames = frames.len()).entered();

        #[cfg(feature = "rayon")]
        if self.config.parallel {
            return frames
                .par_iter()
                .map(|layers| self.parse(layers, network, params))
                .collect();
        }

        frames
            .iter()
            .map(|layers| self.parse(layers, network, params))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ProposalConfig;

    fn proposal_frame<'a>(
        count: &'a [i32],
        boxes: &'a [f32],
        scores: &'a [f32],
        classes: &'a [f32],
    ) -> Vec<LayerView<'a>> {
        vec![
            LayerView::from_i32("count", &[1], count).unwrap(),
            LayerView::from_f32("boxes", &[boxes.len() / 4, 4], boxes).unwrap(),
            LayerView::from_f32("scores", &[scores.len()], scores).unwrap(),
            LayerView::from_f32("classes", &[classes.len()], classes).unwrap(),
        ]
    }

    #[test]
    fn nms_and_thresholds_apply_in_order() {
        let count = [3];
        let boxes = [
            10.0, 10.0, 50.0, 50.0, //
            12.0, 12.0, 52.0, 52.0, //
            60.0, 60.0, 90.0, 90.0,
        ];
        let scores = [0.9, 0.8, 0.3];
        let classes = [0.0, 0.0, 1.0];
        let layers = proposal_frame(&count, &boxes, &scores, &classes);

        let parser = FrameParser::new(Decoder::ProposalPassthrough(ProposalConfig::default()));
        let net = NetworkInfo::new(100, 100);

        let params = DetectionParams::uniform(2, 0.2, 0.0);
        let dets = parser.parse(&layers, &net, &params).unwrap();
        let got: Vec<_> = dets.iter().map(|d| (d.class_id, d.confidence)).collect();
        assert_eq!(got, vec![(0, 0.9), (1, 0.3)]);

        let params = DetectionParams::uniform(2, 0.2, 0.5);
        let dets = parser.parse(&layers, &net, &params).unwrap();
        assert_eq!(dets.len(), 1);

        let no_cluster = parser.clone().with_config(ParseConfig {
            cluster_mode: ClusterMode::None,
            ..ParseConfig::default()
        });
        let params = DetectionParams::uniform(2, 0.0, 0.0);
        assert_eq!(no_cluster.parse(&layers, &net, &params).unwrap().len(), 3);
    }
}
