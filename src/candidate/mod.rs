//! Detection candidates, suppression, and threshold filtering.
//!
//! Decoders produce `Candidate`s in network-input pixels; the suppression
//! engine and the per-class thresholds prune them into final `Detection`s.

pub(crate) mod nms;
pub(crate) mod threshold;

/// Axis-aligned box in center form, used for overlap computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl CenterBox {
    /// Creates a center-form box.
    pub fn new(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self { cx, cy, w, h }
    }

    /// Returns the box area.
    #[inline]
    pub fn area(&self) -> f32 {
        self.w * self.h
    }
}

/// One raw proposed detection in network-input pixels.
///
/// `left` and `top` may be negative until the producing decoder clamps them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub class_id: u32,
    pub confidence: f32,
}

impl Candidate {
    /// Creates a candidate from left/top/width/height.
    pub fn new(
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        class_id: u32,
        confidence: f32,
    ) -> Self {
        Self {
            left,
            top,
            width,
            height,
            class_id,
            confidence,
        }
    }

    /// Creates a candidate from a center-form box.
    pub fn from_center(bbox: CenterBox, class_id: u32, confidence: f32) -> Self {
        Self::new(
            bbox.cx - bbox.w * 0.5,
            bbox.cy - bbox.h * 0.5,
            bbox.w,
            bbox.h,
            class_id,
            confidence,
        )
    }

    /// Returns the box in center form.
    #[inline]
    pub fn center_box(&self) -> CenterBox {
        CenterBox::new(
            self.left + self.width * 0.5,
            self.top + self.height * 0.5,
            self.width,
            self.height,
        )
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Final detection record handed to the surrounding pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl From<Candidate> for Detection {
    fn from(value: Candidate) -> Self {
        Self {
            class_id: value.class_id,
            left: value.left,
            top: value.top,
            width: value.width,
            height: value.height,
            confidence: value.confidence,
        }
    }
}
