//! Horizontal centering and vertical placement of fitted text

use serde::Serialize;
use tracing::{debug, warn};

use super::{CertificateLayout, LayoutSpec, OverflowPolicy, Rgb, fit_font_size};
use crate::errors::{CertificateError, CertificateResult};
use crate::models::RosterRecord;
use crate::rendering::{PageSize, TextMeasure};

/// A layout element resolved to a concrete size and position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedText {
    pub text: String,
    pub font_size: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub color: Rgb,
    pub overflowed: bool,
}

/// Left edge that centres a run of `width` on the page, plus `offset`
pub fn center_x(page_width: f32, width: f32, offset: f32) -> f32 {
    (page_width - width) / 2.0 + offset
}

/// Fit and place a single element on a canvas
pub fn place<M>(spec: &LayoutSpec, canvas: &M, max_width_fraction: f32) -> PlacedText
where
    M: TextMeasure + ?Sized,
{
    let PageSize { width: page_width, height: page_height } = canvas.page_size();
    let max_width = page_width * max_width_fraction;

    let fit = fit_font_size(spec.initial_font_size, spec.min_font_size, max_width, |size| {
        canvas.text_width(&spec.text, size as f32)
    });

    debug!(
        font_size = fit.font_size,
        width = fit.width,
        max_width,
        steps = fit.steps,
        "Fitted certificate text"
    );

    PlacedText {
        text: spec.text.clone(),
        font_size: fit.font_size,
        x: center_x(page_width, fit.width, spec.horizontal_offset),
        y: page_height * spec.vertical_fraction,
        width: fit.width,
        color: spec.color,
        overflowed: fit.overflowed,
    }
}

/// Fit and place every element of `layout` for `record`
///
/// Under [`OverflowPolicy::Reject`] the first element that still overflows
/// at its floor size fails the whole plan.
pub fn plan_layout<M>(
    layout: &CertificateLayout,
    record: &RosterRecord,
    canvas: &M,
) -> CertificateResult<Vec<PlacedText>>
where
    M: TextMeasure + ?Sized,
{
    let max_width = canvas.page_size().width * layout.max_width_fraction;

    layout
        .specs_for(record)
        .iter()
        .map(|spec| {
            let placed = place(spec, canvas, layout.max_width_fraction);
            if placed.overflowed {
                match layout.overflow {
                    OverflowPolicy::Tolerate => {
                        warn!(
                            font_size = placed.font_size,
                            width = placed.width,
                            max_width,
                            "Certificate text overflows at minimum font size"
                        );
                    }
                    OverflowPolicy::Reject => {
                        return Err(CertificateError::Layout {
                            text: placed.text,
                            font_size: placed.font_size,
                            width: placed.width,
                            max_width,
                        });
                    }
                }
            }
            Ok(placed)
        })
        .collect()
}
