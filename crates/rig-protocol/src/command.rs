//! Typed rigctld commands
//!
//! This module provides the `RigCommand` enum which encodes the commands the
//! client issues, and `ResponseShape` which tells the framing layer when the
//! daemon's answer is complete.
//!
//! # Format
//! - Commands: one line, short single-letter form (`f`, `F 14200000`)
//!   or long backslash form (`\dump_state`)
//! - Getters answer with one value per line
//! - Setters answer with a single `RPRT <code>` line
//! - Any command may answer with `RPRT -<n>` instead of its usual payload

use std::fmt;

use crate::mode::Mode;

/// Common level names accepted by `l`/`L`
pub mod level {
    /// RF gain
    pub const RF_GAIN: &str = "RFGAIN";
    /// Squelch
    pub const SQUELCH: &str = "SQL";
    /// Transmit power
    pub const RF_POWER: &str = "RFPOWER";
    /// Audio volume
    pub const AF: &str = "AF";
    /// Signal strength (read only)
    pub const STRENGTH: &str = "STRENGTH";
}

/// Common function names accepted by `u`/`U`
pub mod function {
    /// Noise blanker
    pub const NOISE_BLANKER: &str = "NB";
    /// Noise reduction
    pub const NOISE_REDUCTION: &str = "NR";
    /// Voice operated transmit
    pub const VOX: &str = "VOX";
    /// Automatic notch filter
    pub const AUTO_NOTCH: &str = "ANF";
}

/// How the daemon terminates the response to a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A fixed number of lines; an `RPRT` line ends the response early
    Lines(usize),
    /// Open-ended output; ends at an `RPRT` line, a `done` line, or when the
    /// wire goes quiet
    Open,
}

impl ResponseShape {
    /// Infer the response shape from raw command text
    ///
    /// Used for commands passed through verbatim. Unknown commands are
    /// treated as open-ended so that the framing never waits for lines that
    /// will not arrive.
    pub fn for_command(text: &str) -> Self {
        let text = text.trim();

        // Extended response protocol: every answer ends with RPRT
        if text.starts_with(['+', ';', '|', ',']) {
            return ResponseShape::Open;
        }

        if let Some(long) = text.strip_prefix('\\') {
            let name = long.split_whitespace().next().unwrap_or("");
            return match name {
                "get_mode" | "get_split_mode" | "get_split_vfo" => ResponseShape::Lines(2),
                "get_freq" | "get_ptt" | "get_level" | "get_func" | "get_vfo"
                | "get_split_freq" | "get_rit" | "get_xit" | "get_powerstat" => {
                    ResponseShape::Lines(1)
                }
                n if n.starts_with("set_") => ResponseShape::Lines(1),
                _ => ResponseShape::Open,
            };
        }

        let mut chars = text.chars();
        let (Some(first), rest) = (chars.next(), chars.as_str()) else {
            return ResponseShape::Open;
        };

        // Short commands are a single letter followed by whitespace or nothing
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return ResponseShape::Open;
        }

        match first {
            'm' | 's' | 'x' => ResponseShape::Lines(2),
            'f' | 't' | 'l' | 'u' | 'v' | 'i' | 'j' | 'z' | 'r' | 'n' => ResponseShape::Lines(1),
            c if c.is_ascii_uppercase() => ResponseShape::Lines(1),
            _ => ResponseShape::Open,
        }
    }
}

/// A command sent to a rigctld daemon
#[derive(Debug, Clone, PartialEq)]
pub enum RigCommand {
    /// Get VFO frequency: `f`
    GetFrequency,
    /// Set VFO frequency in Hz: `F 14200000`
    SetFrequency { hz: u64 },
    /// Get mode and passband: `m`
    GetMode,
    /// Set mode and passband in Hz (0 = device default): `M USB 2400`
    SetMode { mode: Mode, passband_hz: i32 },
    /// Get PTT: `t`
    GetPtt,
    /// Set PTT: `T 1`
    SetPtt { active: bool },
    /// Get a level value: `l RFGAIN`
    GetLevel { name: String },
    /// Set a level value, nominal 0.0 to 1.0: `L RFGAIN 0.5`
    SetLevel { name: String, value: f32 },
    /// Get a function state: `u NB`
    GetFunction { name: String },
    /// Set a function state: `U NB 1`
    SetFunction { name: String, enabled: bool },
    /// Dump rig state and capabilities: `\dump_state`
    DumpState,
    /// Verbatim command text
    Raw(String),
}

impl RigCommand {
    /// Encode to wire text, newline terminated
    pub fn encode(&self) -> String {
        let mut line = self.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        line
    }

    /// Shape of the response the daemon sends for this command
    pub fn response_shape(&self) -> ResponseShape {
        match self {
            RigCommand::GetMode => ResponseShape::Lines(2),
            RigCommand::GetFrequency
            | RigCommand::GetPtt
            | RigCommand::GetLevel { .. }
            | RigCommand::GetFunction { .. } => ResponseShape::Lines(1),
            RigCommand::SetFrequency { .. }
            | RigCommand::SetMode { .. }
            | RigCommand::SetPtt { .. }
            | RigCommand::SetLevel { .. }
            | RigCommand::SetFunction { .. } => ResponseShape::Lines(1),
            RigCommand::DumpState => ResponseShape::Open,
            RigCommand::Raw(text) => ResponseShape::for_command(text),
        }
    }
}

impl fmt::Display for RigCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RigCommand::GetFrequency => write!(f, "f"),
            RigCommand::SetFrequency { hz } => write!(f, "F {}", hz),
            RigCommand::GetMode => write!(f, "m"),
            RigCommand::SetMode { mode, passband_hz } => write!(f, "M {} {}", mode, passband_hz),
            RigCommand::GetPtt => write!(f, "t"),
            RigCommand::SetPtt { active } => write!(f, "T {}", u8::from(*active)),
            RigCommand::GetLevel { name } => write!(f, "l {}", name),
            RigCommand::SetLevel { name, value } => write!(f, "L {} {}", name, value),
            RigCommand::GetFunction { name } => write!(f, "u {}", name),
            RigCommand::SetFunction { name, enabled } => {
                write!(f, "U {} {}", name, u8::from(*enabled))
            }
            RigCommand::DumpState => write!(f, "\\dump_state"),
            RigCommand::Raw(text) => write!(f, "{}", text),
        }
    }
}
