//! Certificate layout: which strings go on the page, at what size, where
//!
//! A layout is one primary element (the team name) plus any number of
//! secondary elements. The two historical certificate variants are the
//! [`LayoutPreset::TeamOnly`] and [`LayoutPreset::WithOrganization`] presets
//! of the same engine.
//!
//! Vertical positions are fractions of the canvas height measured from the
//! bottom edge (PDF user space). Horizontal offsets are in points and are
//! added after centering.

use serde::{Deserialize, Serialize};

use crate::models::RosterRecord;
use crate::utils::{to_title_words, to_upper_words};

pub mod fit;
pub mod placement;

pub use fit::{FontFit, fit_font_size};
pub use placement::{PlacedText, center_x, plan_layout};

/// Share of the canvas width a single line may occupy
pub const DEFAULT_MAX_WIDTH_FRACTION: f32 = 0.7;

pub const PRIMARY_INITIAL_FONT_SIZE: u32 = 40;
pub const PRIMARY_MIN_FONT_SIZE: u32 = 20;
pub const PRIMARY_VERTICAL_FRACTION: f32 = 0.68;
/// Nudge applied to the centered primary label; the template artwork is not
/// symmetric around the page centre.
pub const PRIMARY_HORIZONTAL_OFFSET: f32 = 20.0;

pub const SECONDARY_INITIAL_FONT_SIZE: u32 = 24;
pub const SECONDARY_MIN_FONT_SIZE: u32 = 12;
pub const SECONDARY_VERTICAL_FRACTION: f32 = 0.65;
pub const SECONDARY_HORIZONTAL_OFFSET: f32 = 0.0;

/// RGB colour with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);

    pub fn is_valid(&self) -> bool {
        [self.0, self.1, self.2]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// What to do when text is still too wide at its minimum font size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Draw the text at the floor size and let it overflow
    #[default]
    Tolerate,
    /// Fail the request with a layout error
    Reject,
}

/// Roster field rendered by a layout element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    TeamName,
    ParticipantName,
    OrganizationName,
}

impl TextField {
    /// Display string for this field, or `None` when the record has no
    /// usable value
    pub fn display_text(&self, record: &RosterRecord) -> Option<String> {
        let text = match self {
            TextField::TeamName => to_upper_words(&record.team_name),
            TextField::ParticipantName => to_upper_words(&record.participant_name),
            TextField::OrganizationName => to_title_words(record.organization_name.as_deref()?),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Placement rules for one text element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub field: TextField,
    pub initial_font_size: u32,
    pub min_font_size: u32,
    pub vertical_fraction: f32,
    pub horizontal_offset: f32,
}

impl TextElement {
    pub fn primary_team_name() -> Self {
        Self {
            field: TextField::TeamName,
            initial_font_size: PRIMARY_INITIAL_FONT_SIZE,
            min_font_size: PRIMARY_MIN_FONT_SIZE,
            vertical_fraction: PRIMARY_VERTICAL_FRACTION,
            horizontal_offset: PRIMARY_HORIZONTAL_OFFSET,
        }
    }

    pub fn secondary_organization_name() -> Self {
        Self {
            field: TextField::OrganizationName,
            initial_font_size: SECONDARY_INITIAL_FONT_SIZE,
            min_font_size: SECONDARY_MIN_FONT_SIZE,
            vertical_fraction: SECONDARY_VERTICAL_FRACTION,
            horizontal_offset: SECONDARY_HORIZONTAL_OFFSET,
        }
    }
}

/// Named layouts selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPreset {
    #[default]
    TeamOnly,
    WithOrganization,
}

/// One fully-resolved element for a specific record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSpec {
    pub text: String,
    pub initial_font_size: u32,
    pub min_font_size: u32,
    pub vertical_fraction: f32,
    pub horizontal_offset: f32,
    pub color: Rgb,
}

/// Complete description of what gets drawn on a certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateLayout {
    pub primary: TextElement,
    #[serde(default)]
    pub secondary: Vec<TextElement>,
    pub max_width_fraction: f32,
    #[serde(default)]
    pub overflow: OverflowPolicy,
    #[serde(default)]
    pub color: Rgb,
}

impl CertificateLayout {
    pub fn from_preset(preset: LayoutPreset) -> Self {
        let secondary = match preset {
            LayoutPreset::TeamOnly => Vec::new(),
            LayoutPreset::WithOrganization => vec![TextElement::secondary_organization_name()],
        };
        Self {
            primary: TextElement::primary_team_name(),
            secondary,
            max_width_fraction: DEFAULT_MAX_WIDTH_FRACTION,
            overflow: OverflowPolicy::default(),
            color: Rgb::default(),
        }
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_max_width_fraction(mut self, fraction: f32) -> Self {
        self.max_width_fraction = fraction;
        self
    }

    /// Resolve every element against a record
    ///
    /// Secondary elements whose field is absent on the record are skipped.
    /// The primary element is always emitted.
    pub fn specs_for(&self, record: &RosterRecord) -> Vec<LayoutSpec> {
        let primary = self.spec(&self.primary, record).unwrap_or_else(|| LayoutSpec {
            text: String::new(),
            initial_font_size: self.primary.initial_font_size,
            min_font_size: self.primary.min_font_size,
            vertical_fraction: self.primary.vertical_fraction,
            horizontal_offset: self.primary.horizontal_offset,
            color: self.color,
        });

        std::iter::once(primary)
            .chain(
                self.secondary
                    .iter()
                    .filter_map(|element| self.spec(element, record)),
            )
            .collect()
    }

    fn spec(&self, element: &TextElement, record: &RosterRecord) -> Option<LayoutSpec> {
        Some(LayoutSpec {
            text: element.field.display_text(record)?,
            initial_font_size: element.initial_font_size,
            min_font_size: element.min_font_size,
            vertical_fraction: element.vertical_fraction,
            horizontal_offset: element.horizontal_offset,
            color: self.color,
        })
    }
}

impl Default for CertificateLayout {
    fn default() -> Self {
        Self::from_preset(LayoutPreset::default())
    }
}
