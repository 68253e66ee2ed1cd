//! Response classification and value parsers

use crate::error::{ParseError, ProtocolError};
use crate::info::ModeInfo;
use crate::mode::Mode;

/// Prefix of a status report line
pub const REPORT_PREFIX: &str = "RPRT ";

/// Parse an `RPRT <code>` line, returning the signed code
///
/// Returns `None` if the line is not a report at all.
pub fn parse_report(line: &str) -> Option<Result<i32, ParseError>> {
    let code = line.trim().strip_prefix(REPORT_PREFIX)?;
    Some(
        code.trim()
            .parse::<i32>()
            .map_err(|_| ParseError::InvalidReport(line.trim().to_string())),
    )
}

/// Classify a completed response
///
/// A negative report on the first or last line fails with
/// [`ProtocolError::CommandFailed`]; anything else is returned as trimmed
/// text, lines joined with `\n`.
pub fn classify_reply<S: AsRef<str>>(lines: &[S]) -> Result<String, ProtocolError> {
    let report = lines
        .first()
        .filter(|l| l.as_ref().trim_start().starts_with(REPORT_PREFIX))
        .or_else(|| {
            lines
                .last()
                .filter(|l| l.as_ref().trim_start().starts_with(REPORT_PREFIX))
        });

    if let Some(line) = report {
        if let Some(code) = parse_report(line.as_ref()) {
            let code = code?;
            if code < 0 {
                return Err(ProtocolError::CommandFailed { code: -code });
            }
        }
    }

    let text = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .collect::<Vec<_>>()
        .join("\n");
    Ok(text.trim().to_string())
}

/// Parse a frequency in Hz
///
/// Some backends report fractional Hz (`14200000.000000`); the value is
/// rounded to the nearest Hz.
pub fn parse_frequency(text: &str) -> Result<u64, ParseError> {
    let text = text.trim();
    if let Ok(hz) = text.parse::<u64>() {
        return Ok(hz);
    }
    match text.parse::<f64>() {
        Ok(hz) if hz.is_finite() && hz >= 0.0 => Ok(hz.round() as u64),
        _ => Err(ParseError::InvalidFrequency(text.to_string())),
    }
}

/// Parse the two-line `m` response into mode and passband
pub fn parse_mode(text: &str) -> Result<ModeInfo, ParseError> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let (Some(mode), Some(passband)) = (lines.next(), lines.next()) else {
        return Err(ParseError::MissingLines {
            expected: 2,
            actual: text.lines().filter(|l| !l.trim().is_empty()).count(),
        });
    };

    let passband_hz = passband
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidPassband(passband.to_string()))?;

    Ok(ModeInfo {
        mode: mode.parse::<Mode>().unwrap_or_else(|e| match e {}),
        passband_hz,
    })
}

/// Parse a `0`/`1` flag; only `1` is true
pub fn parse_bool(text: &str) -> Result<bool, ParseError> {
    let text = text.trim();
    text.parse::<i64>()
        .map(|v| v == 1)
        .map_err(|_| ParseError::InvalidBool(text.to_string()))
}

/// Parse a floating point level value
pub fn parse_level(text: &str) -> Result<f32, ParseError> {
    let text = text.trim();
    text.parse::<f32>()
        .map_err(|_| ParseError::InvalidLevel(text.to_string()))
}
