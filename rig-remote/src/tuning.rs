//! Band and filter labels derived from raw radio values

use std::fmt;
use std::str::FromStr;

/// Amateur band, as shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    M160,
    M80,
    M40,
    M30,
    M20,
    M17,
    M15,
    M12,
    M10,
    M6,
    M2,
    Cm70,
}

/// Upper edge (exclusive, Hz) of each band's detection range
const BAND_EDGES: [(u64, Band); 11] = [
    (2_000_000, Band::M160),
    (4_000_000, Band::M80),
    (8_000_000, Band::M40),
    (11_000_000, Band::M30),
    (15_000_000, Band::M20),
    (19_000_000, Band::M17),
    (22_000_000, Band::M15),
    (25_000_000, Band::M12),
    (30_000_000, Band::M10),
    (54_000_000, Band::M6),
    (148_000_000, Band::M2),
];

impl Band {
    pub const ALL: [Band; 12] = [
        Band::M160,
        Band::M80,
        Band::M40,
        Band::M30,
        Band::M20,
        Band::M17,
        Band::M15,
        Band::M12,
        Band::M10,
        Band::M6,
        Band::M2,
        Band::Cm70,
    ];

    /// Band a frequency falls in; anything above 2m reads as 70cm
    pub fn from_frequency(hz: u64) -> Self {
        BAND_EDGES
            .iter()
            .find(|(edge, _)| hz < *edge)
            .map(|(_, band)| *band)
            .unwrap_or(Band::Cm70)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::M160 => "160m",
            Band::M80 => "80m",
            Band::M40 => "40m",
            Band::M30 => "30m",
            Band::M20 => "20m",
            Band::M17 => "17m",
            Band::M15 => "15m",
            Band::M12 => "12m",
            Band::M10 => "10m",
            Band::M6 => "6m",
            Band::M2 => "2m",
            Band::Cm70 => "70cm",
        }
    }

    /// Frequency to tune to when the operator picks this band
    pub fn preset_hz(&self) -> u64 {
        match self {
            Band::M160 => 1_900_000,
            Band::M80 => 3_500_000,
            Band::M40 => 7_200_000,
            Band::M30 => 10_125_000,
            Band::M20 => 14_200_000,
            Band::M17 => 18_100_000,
            Band::M15 => 21_300_000,
            Band::M12 => 24_900_000,
            Band::M10 => 28_500_000,
            Band::M6 => 50_125_000,
            Band::M2 => 144_200_000,
            Band::Cm70 => 432_100_000,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Band::ALL
            .into_iter()
            .find(|band| band.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown band '{}'", s))
    }
}

/// Receive filter width class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Narrow,
    Medium,
    Wide,
}

impl Filter {
    /// Classify a passband in Hz
    pub fn from_passband(passband_hz: i32) -> Self {
        if passband_hz < 600 {
            Filter::Narrow
        } else if passband_hz < 2000 {
            Filter::Medium
        } else {
            Filter::Wide
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::Narrow => "NARROW",
            Filter::Medium => "MEDIUM",
            Filter::Wide => "WIDE",
        }
    }

    /// Passband to request when the operator picks this filter
    pub fn preset_passband_hz(&self) -> i32 {
        match self {
            Filter::Narrow => 500,
            Filter::Medium => 1800,
            Filter::Wide => 2700,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NARROW" => Ok(Filter::Narrow),
            "MEDIUM" => Ok(Filter::Medium),
            "WIDE" => Ok(Filter::Wide),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

/// Rescale a nominal 0.0..=1.0 level to a 0..=100 display value
pub fn level_percent(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Format a frequency in MHz with Hz resolution
pub fn format_mhz(hz: u64) -> String {
    format!("{}.{:06}", hz / 1_000_000, hz % 1_000_000)
}
