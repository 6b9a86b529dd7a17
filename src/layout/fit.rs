//! Font-size fitting
//!
//! Sizes are searched linearly downward in whole-point steps and the first
//! fitting size from the top wins, even when the width function is not
//! perfectly monotonic.

/// Outcome of a fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontFit {
    /// Chosen font size in points
    pub font_size: u32,
    /// Measured width at `font_size`
    pub width: f32,
    /// Number of measurements taken
    pub steps: u32,
    /// `true` when the floor was reached and the text is still too wide
    pub overflowed: bool,
}

/// Largest whole size in `[min_size, initial_size]` whose measured width is
/// within `max_width`, or `min_size` when none is
///
/// `measure` is called once per candidate size, starting at `initial_size`
/// and stepping down by one. An `initial_size` below the floor is raised to
/// the floor.
pub fn fit_font_size<F>(initial_size: u32, min_size: u32, max_width: f32, mut measure: F) -> FontFit
where
    F: FnMut(u32) -> f32,
{
    let mut size = initial_size.max(min_size);
    let mut width = measure(size);
    let mut steps = 1;

    while width > max_width && size > min_size {
        size -= 1;
        width = measure(size);
        steps += 1;
    }

    FontFit {
        font_size: size,
        width,
        steps,
        overflowed: width > max_width,
    }
}
