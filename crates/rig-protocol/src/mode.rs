//! Hamlib mode tokens

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Operating mode as named by Hamlib
///
/// Tokens the daemon reports that are not listed here are preserved verbatim
/// in [`Mode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Upper Sideband
    Usb,
    /// Lower Sideband
    Lsb,
    /// Continuous Wave
    Cw,
    /// CW Reverse
    CwR,
    /// RTTY
    Rtty,
    /// RTTY Reverse
    RttyR,
    /// Amplitude Modulation
    Am,
    /// Frequency Modulation
    Fm,
    /// Wide FM (broadcast)
    Wfm,
    /// Packet over USB
    PktUsb,
    /// Packet over LSB
    PktLsb,
    /// Packet over FM
    PktFm,
    /// Any other token reported by the daemon
    Other(String),
}

impl Mode {
    /// Wire token for this mode
    pub fn token(&self) -> &str {
        match self {
            Mode::Usb => "USB",
            Mode::Lsb => "LSB",
            Mode::Cw => "CW",
            Mode::CwR => "CWR",
            Mode::Rtty => "RTTY",
            Mode::RttyR => "RTTYR",
            Mode::Am => "AM",
            Mode::Fm => "FM",
            Mode::Wfm => "WFM",
            Mode::PktUsb => "PKTUSB",
            Mode::PktLsb => "PKTLSB",
            Mode::PktFm => "PKTFM",
            Mode::Other(token) => token,
        }
    }

    /// Returns whether this is a voice mode
    pub fn is_voice(&self) -> bool {
        matches!(self, Mode::Usb | Mode::Lsb | Mode::Am | Mode::Fm | Mode::Wfm)
    }

    /// Returns whether this is a digital/data mode
    pub fn is_digital(&self) -> bool {
        matches!(
            self,
            Mode::Rtty | Mode::RttyR | Mode::PktUsb | Mode::PktLsb | Mode::PktFm
        )
    }

    /// Returns whether this is a CW mode
    pub fn is_cw(&self) -> bool {
        matches!(self, Mode::Cw | Mode::CwR)
    }
}

impl FromStr for Mode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Ok(match token.to_ascii_uppercase().as_str() {
            "USB" => Mode::Usb,
            "LSB" => Mode::Lsb,
            "CW" => Mode::Cw,
            "CWR" => Mode::CwR,
            "RTTY" => Mode::Rtty,
            "RTTYR" => Mode::RttyR,
            "AM" => Mode::Am,
            "FM" => Mode::Fm,
            "WFM" => Mode::Wfm,
            "PKTUSB" => Mode::PktUsb,
            "PKTLSB" => Mode::PktLsb,
            "PKTFM" => Mode::PktFm,
            _ => Mode::Other(token.to_string()),
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
