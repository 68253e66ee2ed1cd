//! Virtual rig simulation
//!
//! Provides a simulated radio that answers rigctld protocol lines the way a
//! daemon in front of a real rig would.

use std::collections::BTreeMap;

use rig_protocol::{level, Mode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hamlib status codes used in `RPRT` replies
const RIG_OK: i32 = 0;
const RIG_EINVAL: i32 = -1;
const RIG_ENIMPL: i32 = -4;
const RIG_ENAVAIL: i32 = -11;

/// Configuration for creating a virtual rig
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualRigConfig {
    /// Hamlib model number reported in the caps dump
    pub model: String,
    /// Backend version reported in the caps dump
    pub version: String,
    /// Initial frequency in Hz
    pub initial_frequency_hz: u64,
    /// Initial operating mode
    pub initial_mode: Mode,
    /// Initial passband in Hz
    pub initial_passband_hz: i32,
    /// Level names the rig does not support
    pub unsupported_levels: Vec<String>,
}

impl Default for VirtualRigConfig {
    fn default() -> Self {
        Self {
            model: "1".to_string(),
            version: "20240101.0".to_string(),
            initial_frequency_hz: 14_250_000, // 20m
            initial_mode: Mode::Usb,
            initial_passband_hz: 2400,
            unsupported_levels: Vec::new(),
        }
    }
}

/// A simulated rig behind a rigctld daemon
#[derive(Debug)]
pub struct VirtualRig {
    model: String,
    version: String,
    frequency_hz: u64,
    mode: Mode,
    passband_hz: i32,
    ptt: bool,
    levels: BTreeMap<String, f32>,
    functions: BTreeMap<String, bool>,
    unsupported_levels: Vec<String>,
    /// Every command line handled, oldest first
    history: Vec<String>,
}

impl Default for VirtualRig {
    fn default() -> Self {
        Self::from_config(VirtualRigConfig::default())
    }
}

impl VirtualRig {
    /// Create a virtual rig from configuration
    pub fn from_config(config: VirtualRigConfig) -> Self {
        let levels = [
            (level::RF_GAIN, 0.75),
            (level::SQUELCH, 0.0),
            (level::RF_POWER, 0.5),
            (level::AF, 0.3),
        ]
        .into_iter()
        .filter(|(name, _)| !config.unsupported_levels.iter().any(|u| u == name))
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        Self {
            model: config.model,
            version: config.version,
            frequency_hz: config.initial_frequency_hz,
            mode: config.initial_mode,
            passband_hz: config.initial_passband_hz,
            ptt: false,
            levels,
            functions: BTreeMap::new(),
            unsupported_levels: config.unsupported_levels,
            history: Vec::new(),
        }
    }

    /// Get the current frequency in Hz
    pub fn frequency_hz(&self) -> u64 {
        self.frequency_hz
    }

    /// Set the frequency directly, as if the knob was turned
    pub fn set_frequency(&mut self, hz: u64) {
        self.frequency_hz = hz;
    }

    /// Get the current operating mode
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Get the current passband in Hz
    pub fn passband_hz(&self) -> i32 {
        self.passband_hz
    }

    /// Get the PTT state
    pub fn ptt(&self) -> bool {
        self.ptt
    }

    /// Get a level value
    pub fn level(&self, name: &str) -> Option<f32> {
        self.levels.get(name).copied()
    }

    /// Get a function state; functions never set read as off
    pub fn function(&self, name: &str) -> bool {
        self.functions.get(name).copied().unwrap_or(false)
    }

    /// Command lines handled so far, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Handle one command line and return the full response text
    ///
    /// The returned text includes its trailing newline.
    pub fn handle_line(&mut self, line: &str) -> String {
        let line = line.trim();
        self.history.push(line.to_string());

        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return report(RIG_EINVAL);
        };
        let args: Vec<&str> = parts.collect();

        let response = match normalize(name) {
            "f" => format!("{}\n", self.frequency_hz),
            "F" => match args.first().and_then(|a| parse_hz(a)) {
                Some(hz) => {
                    self.frequency_hz = hz;
                    report(RIG_OK)
                }
                None => report(RIG_EINVAL),
            },
            "m" => format!("{}\n{}\n", self.mode, self.passband_hz),
            "M" => self.handle_set_mode(&args),
            "t" => format!("{}\n", u8::from(self.ptt)),
            "T" => match args.first().and_then(|a| parse_flag(a)) {
                Some(active) => {
                    self.ptt = active;
                    report(RIG_OK)
                }
                None => report(RIG_EINVAL),
            },
            "l" => match args.first() {
                Some(name) if self.is_unsupported(name) => report(RIG_ENAVAIL),
                Some(name) => format!("{:.6}\n", self.levels.get(*name).copied().unwrap_or(0.0)),
                None => report(RIG_EINVAL),
            },
            "L" => self.handle_set_level(&args),
            "u" => match args.first() {
                Some(name) => format!("{}\n", u8::from(self.function(name))),
                None => report(RIG_EINVAL),
            },
            "U" => match (args.first(), args.get(1).and_then(|a| parse_flag(a))) {
                (Some(name), Some(enabled)) => {
                    self.functions.insert(name.to_string(), enabled);
                    report(RIG_OK)
                }
                _ => report(RIG_EINVAL),
            },
            "dump_state" | "dump_caps" => self.dump(),
            _ => report(RIG_ENIMPL),
        };

        debug!("Virtual rig {:?} -> {:?}", line, response.trim_end());
        response
    }

    fn handle_set_mode(&mut self, args: &[&str]) -> String {
        let Some(token) = args.first() else {
            return report(RIG_EINVAL);
        };
        let passband = match args.get(1) {
            Some(pb) => match pb.parse::<i32>() {
                Ok(pb) => pb,
                Err(_) => return report(RIG_EINVAL),
            },
            None => 0,
        };

        let mode: Mode = token.parse().unwrap_or_else(|e| match e {});
        if let Mode::Other(_) = mode {
            return report(RIG_EINVAL);
        }

        // 0 keeps the backend default for the mode; -1 leaves it unchanged
        self.passband_hz = match passband {
            0 => default_passband(&mode),
            pb if pb < 0 => self.passband_hz,
            pb => pb,
        };
        self.mode = mode;
        report(RIG_OK)
    }

    fn handle_set_level(&mut self, args: &[&str]) -> String {
        let (Some(name), Some(value)) = (args.first(), args.get(1)) else {
            return report(RIG_EINVAL);
        };
        if self.is_unsupported(name) {
            return report(RIG_ENAVAIL);
        }
        match value.parse::<f32>() {
            Ok(value) => {
                self.levels.insert(name.to_string(), value);
                report(RIG_OK)
            }
            Err(_) => report(RIG_EINVAL),
        }
    }

    fn is_unsupported(&self, name: &str) -> bool {
        self.unsupported_levels.iter().any(|u| u == name)
    }

    fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Caps dump for model: {}\n", self.model));
        out.push_str("Model name:\tVirtual Rig\n");
        out.push_str("Mfg name:\tHamlib\n");
        out.push_str(&format!("Rig version: {}\n", self.version));
        out.push_str("Rig type:\tTransceiver\n");
        out.push_str("Can set Frequency:\tY\n");
        out.push_str("Can get Frequency:\tY\n");
        out.push_str("Can set Mode:\tY\n");
        out.push_str("Can get Mode:\tY\n");
        out.push_str("Can set PTT:\tY\n");
        out.push_str("Can get PTT:\tY\n");
        out.push_str("done\n");
        out
    }
}

fn report(code: i32) -> String {
    format!("RPRT {}\n", code)
}

/// Map long command names onto their short forms
fn normalize(name: &str) -> &str {
    match name.strip_prefix('\\').unwrap_or(name) {
        "get_freq" => "f",
        "set_freq" => "F",
        "get_mode" => "m",
        "set_mode" => "M",
        "get_ptt" => "t",
        "set_ptt" => "T",
        "get_level" => "l",
        "set_level" => "L",
        "get_func" => "u",
        "set_func" => "U",
        other => other,
    }
}

fn parse_hz(text: &str) -> Option<u64> {
    text.parse::<u64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|hz| *hz >= 0.0).map(|hz| hz.round() as u64))
}

fn parse_flag(text: &str) -> Option<bool> {
    match text {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

fn default_passband(mode: &Mode) -> i32 {
    if mode.is_cw() {
        500
    } else if matches!(mode, Mode::Am) {
        6000
    } else if matches!(mode, Mode::Fm | Mode::PktFm) {
        12000
    } else if matches!(mode, Mode::Wfm) {
        230000
    } else {
        2400
    }
}
