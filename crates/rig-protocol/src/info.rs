//! Parsed radio values

use std::collections::BTreeMap;

use crate::mode::Mode;

/// Mode and passband as reported by `m`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeInfo {
    /// Operating mode
    pub mode: Mode,
    /// Filter passband in Hz (0 = device default)
    pub passband_hz: i32,
}

/// Rig identity and capabilities scanned from a state dump
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigInfo {
    /// Model name from `Caps dump for model:`
    pub model: String,
    /// Backend version from `Rig version:`
    pub version: String,
    /// Every line mentioning `Can `, trimmed
    pub capabilities: Vec<String>,
}

const MODEL_PREFIX: &str = "Caps dump for model:";
const VERSION_PREFIX: &str = "Rig version:";
const CAPABILITY_MARKER: &str = "Can ";

impl RigInfo {
    /// Scan dump output for known line prefixes
    ///
    /// Lines that match nothing are ignored, so any dump format yields a
    /// (possibly empty) result.
    pub fn parse(dump: &str) -> Self {
        let mut info = RigInfo::default();

        for line in dump.lines() {
            if let Some(model) = line.strip_prefix(MODEL_PREFIX) {
                info.model = model.trim().to_string();
            } else if let Some(version) = line.strip_prefix(VERSION_PREFIX) {
                info.version = version.trim().to_string();
            } else if line.contains(CAPABILITY_MARKER) {
                info.capabilities.push(line.trim().to_string());
            }
        }

        info
    }
}

/// Point-in-time view of the radio, read fresh on every refresh
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadioSnapshot {
    /// VFO frequency in Hz
    pub frequency_hz: u64,
    /// Operating mode
    pub mode: Mode,
    /// Filter passband in Hz
    pub passband_hz: i32,
    /// PTT active
    pub ptt: bool,
    /// Level values keyed by level name, nominal 0.0 to 1.0
    ///
    /// Levels the rig does not support are absent.
    pub levels: BTreeMap<String, f32>,
}

impl RadioSnapshot {
    /// Look up a level value by name
    pub fn level(&self, name: &str) -> Option<f32> {
        self.levels.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_caps_dump() {
        let dump = "Caps dump for model: 1035\n\
                    Model name:\tFT-991\n\
                    Rig version: 20210101.0\n\
                    Can set Frequency:\tY\n\
                    Can get Frequency:\tY\n\
                    Has priv data:\tY";

        let info = RigInfo::parse(dump);
        assert_eq!(info.model, "1035");
        assert_eq!(info.version, "20210101.0");
        assert_eq!(
            info.capabilities,
            vec!["Can set Frequency:\tY", "Can get Frequency:\tY"]
        );
    }

    #[test]
    fn test_parse_unrecognized_dump() {
        let info = RigInfo::parse("1\n2\n0x0\ndone");
        assert_eq!(info, RigInfo::default());
    }
}
