/// Contain-fit coordinate mapping.
///
/// Abnormality boxes arrive in source-image pixel space; the front end shows
/// the image scaled uniformly to fit its container, centered on the axis with
/// slack. This module computes that placement and maps boxes into on-screen
/// coordinates. Everything here is a pure function of its numeric inputs.
use serde::{Deserialize, Serialize};

use crate::analysis::types::{AnalysisResponse, SourceRect};

/// Height in pixels reserved for the label rendered directly above each box.
pub const LABEL_HEIGHT_PX: f64 = 18.0;

/// Placement of the scaled image within its container.
///
/// `scale_x` and `scale_y` are equal up to floating-point rounding; both are
/// computed independently and applied per axis, matching how each axis is
/// rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainLayout {
    pub scaled_width: f64,
    pub scaled_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    label_height: f64,
}

/// Anchor point for a box label, sitting immediately above the box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelAnchor {
    pub left: f64,
    pub top: f64,
}

/// Box in on-screen pixel space. Derived on demand from the latest container
/// measurement and never cached across resizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub label_anchor: LabelAnchor,
}

impl ContainLayout {
    /// Compute the contain-fit placement of an `image_width` x `image_height`
    /// image inside a `container_width` x `container_height` box.
    ///
    /// Returns `None` while any dimension is not strictly positive: either the
    /// container has not been measured yet or the image dimensions are
    /// unknown. Callers draw no boxes in that case instead of dividing by
    /// zero.
    pub fn compute(
        image_width: f64,
        image_height: f64,
        container_width: f64,
        container_height: f64,
    ) -> Option<Self> {
        Self::with_label_height(
            image_width,
            image_height,
            container_width,
            container_height,
            LABEL_HEIGHT_PX,
        )
    }

    pub fn with_label_height(
        image_width: f64,
        image_height: f64,
        container_width: f64,
        container_height: f64,
        label_height: f64,
    ) -> Option<Self> {
        if image_width <= 0.0
            || image_height <= 0.0
            || container_width <= 0.0
            || container_height <= 0.0
        {
            return None;
        }

        let image_aspect = image_width / image_height;
        let container_aspect = container_width / container_height;

        let (scaled_width, scaled_height, offset_x, offset_y) = if image_aspect > container_aspect {
            // Image relatively wider than the container: width binds, the
            // vertical slack is split evenly.
            let scaled_height = container_width / image_aspect;
            (
                container_width,
                scaled_height,
                0.0,
                (container_height - scaled_height) / 2.0,
            )
        } else {
            // Image relatively taller, or aspects equal: height binds.
            let scaled_width = container_height * image_aspect;
            (
                scaled_width,
                container_height,
                (container_width - scaled_width) / 2.0,
                0.0,
            )
        };

        Some(Self {
            scaled_width,
            scaled_height,
            offset_x,
            offset_y,
            scale_x: scaled_width / image_width,
            scale_y: scaled_height / image_height,
            label_height,
        })
    }

    /// Map a source-image rectangle into on-screen coordinates.
    ///
    /// Purely linear: boxes falling outside the image bounds are mapped as-is,
    /// not clamped. Out-of-range boxes are a producer data-quality issue, not
    /// a mapping concern.
    pub fn map_rect(&self, rect: &SourceRect) -> DisplayRect {
        let left = self.offset_x + rect.x * self.scale_x;
        let top = self.offset_y + rect.y * self.scale_y;
        DisplayRect {
            left,
            top,
            width: rect.width * self.scale_x,
            height: rect.height * self.scale_y,
            label_anchor: LabelAnchor {
                left,
                top: top - self.label_height,
            },
        }
    }
}

/// Map every abnormality box in `response` onto a container of the given
/// size, preserving input order.
///
/// Empty when the container is not ready or the payload carries no usable
/// image dimensions: fail closed, draw nothing.
pub fn map_abnormalities(
    response: &AnalysisResponse,
    container_width: f64,
    container_height: f64,
) -> Vec<DisplayRect> {
    map_abnormalities_with_label_height(response, container_width, container_height, LABEL_HEIGHT_PX)
}

pub fn map_abnormalities_with_label_height(
    response: &AnalysisResponse,
    container_width: f64,
    container_height: f64,
    label_height: f64,
) -> Vec<DisplayRect> {
    let Some(layout) = ContainLayout::with_label_height(
        response.image_width as f64,
        response.image_height as f64,
        container_width,
        container_height,
        label_height,
    ) else {
        return Vec::new();
    };

    response
        .abnormalities()
        .iter()
        .map(|ab| layout.map_rect(&ab.coordinates))
        .collect()
}
