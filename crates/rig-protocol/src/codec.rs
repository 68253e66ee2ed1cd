//! Streaming response framer
//!
//! TCP gives no message boundaries: one response may arrive across several
//! reads, and several lines may arrive in one. The codec buffers raw bytes
//! and only hands out a response once the [`ResponseShape`] of the command in
//! flight says it is complete.

use tracing::warn;

use crate::command::ResponseShape;
use crate::reply::REPORT_PREFIX;

/// Longest line accepted before the buffer is force-split
const MAX_LINE_LEN: usize = 64 * 1024;

/// Line that ends open-ended dumps
const DONE_LINE: &str = "done";

/// Streaming rigctld response codec
#[derive(Debug, Default)]
pub struct RigctlCodec {
    /// Bytes not yet split into lines
    buffer: Vec<u8>,
    /// Lines collected for the response in progress
    lines: Vec<String>,
}

impl RigctlCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(256),
            lines: Vec::new(),
        }
    }

    /// Push raw bytes into the codec buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Extract the next complete response for a command of the given shape
    ///
    /// Lines are consumed only until the response completes; anything after
    /// stays buffered. Blank lines are skipped.
    pub fn next_response(&mut self, shape: ResponseShape) -> Option<Vec<String>> {
        while let Some(line) = self.next_line() {
            if line.is_empty() {
                continue;
            }

            let complete = is_terminal(&line, shape, self.lines.len() + 1);
            self.lines.push(line);

            if complete {
                return Some(std::mem::take(&mut self.lines));
            }
        }
        None
    }

    /// Take whatever has been collected for the response in progress
    ///
    /// Used to end an open-ended response once the wire goes quiet. A
    /// trailing fragment without a newline is included.
    pub fn take_partial(&mut self) -> Option<Vec<String>> {
        if !self.buffer.is_empty() {
            let rest = String::from_utf8_lossy(&self.buffer).trim().to_string();
            self.buffer.clear();
            if !rest.is_empty() {
                self.lines.push(rest);
            }
        }

        if self.lines.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.lines))
        }
    }

    /// Returns whether any bytes or lines are waiting
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || !self.lines.is_empty()
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.lines.clear();
    }

    fn next_line(&mut self) -> Option<String> {
        let end = match self.buffer.iter().position(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None if self.buffer.len() > MAX_LINE_LEN => {
                warn!(
                    "Discarding line terminator search after {} bytes",
                    self.buffer.len()
                );
                self.buffer.len()
            }
            None => return None,
        };

        let raw: Vec<u8> = self.buffer.drain(..end).collect();
        Some(String::from_utf8_lossy(&raw).trim().to_string())
    }
}

fn is_terminal(line: &str, shape: ResponseShape, count: usize) -> bool {
    if line.starts_with(REPORT_PREFIX) {
        return true;
    }
    match shape {
        ResponseShape::Lines(expected) => count >= expected,
        ResponseShape::Open => line == DONE_LINE,
    }
}
