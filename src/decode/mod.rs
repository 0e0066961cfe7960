//! Tensor decoders for detector output layers.
//!
//! Each detector family has its own decoding contract; `Decoder` is the closed
//! set of families, selected by the caller to match its network. All decoders
//! return unfiltered `Candidate`s in network-input pixels, or an error when the
//! layer count or shapes do not match what the family expects.

pub mod grid;
pub mod presets;
pub mod proposal;
pub mod regression;

use crate::candidate::threshold::DetectionParams;
use crate::candidate::Candidate;
use crate::layer::{LayerView, NetworkInfo};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{YoloBoxError, YoloBoxResult};

pub use grid::{AnchorUnits, GridAnchorConfig, SizeEncoding};
pub use proposal::ProposalConfig;
pub use regression::RegressionConfig;

/// Detector family and its configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoder {
    /// Anchor-grid heads (YOLOv2/v3 style), one layer per mask group.
    GridAnchor(GridAnchorConfig),
    /// Packed `[count, (cx, cy, w, h, conf, class)...]` output (YOLOv4/v5 style).
    DirectRegression(RegressionConfig),
    /// Four-buffer region proposals: count, boxes, scores, class ids.
    ProposalPassthrough(ProposalConfig),
}

impl Decoder {
    /// Short family name for logs.
    pub fn family(&self) -> &'static str {
        match self {
            Decoder::GridAnchor(_) => "grid_anchor",
            Decoder::DirectRegression(_) => "direct_regression",
            Decoder::ProposalPassthrough(_) => "proposal_passthrough",
        }
    }

    /// Class count compiled into the decoder, if the family has one.
    pub fn num_classes(&self) -> Option<usize> {
        match self {
            Decoder::GridAnchor(cfg) => Some(cfg.num_classes),
            Decoder::DirectRegression(cfg) => Some(cfg.num_classes),
            Decoder::ProposalPassthrough(_) => None,
        }
    }

    /// Decodes one frame's output layers into candidates.
    ///
    /// A class-count mismatch between `params` and the decoder is logged and
    /// decoding continues with the decoder's own class count. The warning is
    /// only emitted when the `tracing` feature is enabled.
    pub fn decode(
        &self,
        layers: &[LayerView<'_>],
        network: &NetworkInfo,
        params: &DetectionParams,
    ) -> YoloBoxResult<Vec<Candidate>> {
        let _span = trace_span!("decode", family = self.family(), layers = layers.len()).entered();

        if network.width == 0 || network.height == 0 {
            return Err(YoloBoxError::InvalidInput("network resolution must be non-zero"));
        }
        if let Some(compiled) = self.num_classes() {
            warn_on_class_mismatch(compiled, params.num_classes_configured);
        }

        let candidates = match self {
            Decoder::GridAnchor(cfg) => grid::decode_grid_anchor(layers, network, cfg)?,
            Decoder::DirectRegression(cfg) => {
                regression::decode_direct_regression(layers, network, cfg)?
            }
            Decoder::ProposalPassthrough(cfg) => proposal::decode_proposals(layers, network, cfg)?,
        };

        trace_event!("decoded", candidates = candidates.len());
        Ok(candidates)
    }
}

fn warn_on_class_mismatch(compiled: usize, configured: usize) {
    if compiled != configured {
        trace_warn!(configured = configured, detected = compiled; "num classes mismatch");
    }
}

/// Fails unless exactly `expected` layers were supplied.
pub(crate) fn expect_layer_count(layers: &[LayerView<'_>], expected: usize) -> YoloBoxResult<()> {
    if layers.len() != expected {
        return Err(YoloBoxError::LayerCountMismatch {
            expected,
            got: layers.len(),
        });
    }
    Ok(())
}

/// Element count of `count` records of `width` elements after `header`
/// leading elements, or a shape error when it does not fit in `usize`.
pub(crate) fn span_len(
    layer: &LayerView<'_>,
    header: usize,
    count: usize,
    width: usize,
) -> YoloBoxResult<usize> {
    count
        .checked_mul(width)
        .and_then(|n| n.checked_add(header))
        .ok_or_else(|| YoloBoxError::ShapeMismatch {
            layer: layer.name().to_owned(),
            reason: format!("{count} records of {width} elements overflow the index range"),
        })
}

/// Fails unless `data` holds at least `needed` elements.
pub(crate) fn expect_len<T>(layer: &LayerView<'_>, data: &[T], needed: usize) -> YoloBoxResult<()> {
    if data.len() < needed {
        return Err(YoloBoxError::ShapeMismatch {
            layer: layer.name().to_owned(),
            reason: format!("needs {needed} elements, holds {}", data.len()),
        });
    }
    Ok(())
}
