//! Declarative cell styles
//!
//! Layout code tags cells with small [`Style`] descriptors. They are turned
//! into `rust_xlsxwriter` formats only when a sheet is written, once per
//! distinct descriptor (see [`FormatCache`]).

use std::collections::HashMap;

use rust_xlsxwriter::Format;

/// Number display format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    #[default]
    General,
    /// `#,##0` (built-in format 3): volumes
    Integer,
    /// `#,##0.00` (built-in format 4): variances and unit prices
    Decimal,
}

impl NumberFormat {
    pub fn pattern(self) -> Option<&'static str> {
        match self {
            NumberFormat::General => None,
            NumberFormat::Integer => Some("#,##0"),
            NumberFormat::Decimal => Some("#,##0.00"),
        }
    }
}

/// Font color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontColor {
    #[default]
    Default,
    NegativeRed,
    /// Dark grey used for period headers
    Muted,
}

impl FontColor {
    pub fn rgb(self) -> Option<u32> {
        match self {
            FontColor::Default => None,
            FontColor::NegativeRed => Some(0xFF0000),
            FontColor::Muted => Some(0x333333),
        }
    }
}

/// Style descriptor attached to a cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub bold: bool,
    /// Title font (12pt)
    pub heading: bool,
    pub number_format: NumberFormat,
    pub color: FontColor,
}

impl Style {
    pub const PLAIN: Style = Style {
        bold: false,
        heading: false,
        number_format: NumberFormat::General,
        color: FontColor::Default,
    };

    /// Bold 12pt, for sheet titles
    pub const TITLE: Style = Style {
        bold: true,
        heading: true,
        ..Style::PLAIN
    };

    pub const BOLD: Style = Style {
        bold: true,
        ..Style::PLAIN
    };

    pub fn number(number_format: NumberFormat) -> Self {
        Style {
            number_format,
            ..Style::PLAIN
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn color(mut self, color: FontColor) -> Self {
        self.color = color;
        self
    }

    /// Red when `value` is negative; zero and positive keep the default color
    pub fn signed(self, value: f64) -> Self {
        if value < 0.0 {
            self.color(FontColor::NegativeRed)
        } else {
            self.color(FontColor::Default)
        }
    }

    pub fn is_negative(&self) -> bool {
        self.color == FontColor::NegativeRed
    }

    /// Build the writer format for this descriptor
    pub fn to_format(&self) -> Format {
        let mut format = Format::new();
        if self.bold {
            format = format.set_bold();
        }
        if self.heading {
            format = format.set_font_size(12);
        }
        if let Some(pattern) = self.number_format.pattern() {
            format = format.set_num_format(pattern);
        }
        if let Some(rgb) = self.color.rgb() {
            format = format.set_font_color(rgb);
        }
        format
    }
}

/// Formats resolved for one sheet, keyed by descriptor
#[derive(Debug, Default)]
pub struct FormatCache {
    formats: HashMap<Style, Format>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, style: Style) -> &Format {
        self.formats
            .entry(style)
            .or_insert_with(|| style.to_format())
    }

    /// Number of distinct formats created so far
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
