use crate::domain::HotelCode;
use std::fmt;

/// Industry segments the portfolio is benchmarked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Upscale,
    UpperUpscale,
}

impl Segment {
    pub const ALL: [Segment; 2] = [Segment::Upscale, Segment::UpperUpscale];

    /// Option value in the portal's segment selector.
    pub fn option_value(&self) -> &'static str {
        match self {
            Segment::Upscale => "Market Class: Singapore - Upscale Class",
            Segment::UpperUpscale => "Market Class: Singapore - Upper Upscale Class",
        }
    }

    /// Row 3, column B of a downloaded segment report.
    pub fn report_label(&self) -> &'static str {
        match self {
            Segment::Upscale => "Industry: Market Class: Singapore - Upscale",
            Segment::UpperUpscale => "Industry: Market Class: Singapore - Upper Upscale",
        }
    }

    pub fn from_report_label(label: &str) -> Option<Segment> {
        Segment::ALL
            .into_iter()
            .find(|s| s.report_label() == label.trim())
    }

    pub fn hotel_code(&self) -> HotelCode {
        match self {
            Segment::Upscale => HotelCode::AllUpscale,
            Segment::UpperUpscale => HotelCode::AllUpperUpscale,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Upscale => f.write_str("upscale"),
            Segment::UpperUpscale => f.write_str("upper_upscale"),
        }
    }
}
