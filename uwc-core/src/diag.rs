// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `diag` module defines the warnings a lenient decoder raises while it skips over chunks it
//! cannot use, and the [`DiagnosticSink`] capability that receives them.

use std::fmt;

use log::warn;

/// A warning about a chunk that was skipped, or a record that was dropped, during decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A chunk with an unexpected tag was found where `expected` was required.
    UnexpectedChunk { pos: u64, expected: [u8; 4], tag: [u8; 4], len: u32 },
    /// A `fact` chunk declared a length other than the fixed record length.
    MalformedFact { pos: u64, len: u32 },
    /// A `data` chunk declared an odd length and so does not hold a whole number of samples.
    OddDataLength { pos: u64, len: u32 },
    /// A `data` chunk declared a length greater than the configured limit.
    DataTooLarge { pos: u64, len: u32, limit: u32 },
    /// A chunk declared more bytes than remain in the stream. Scanning stopped here.
    Truncated { pos: u64, len: u64, available: u64 },
    /// Bytes follow the span declared by the RIFF size field and were not scanned.
    TrailingBytes { pos: u64, len: u64 },
}

impl Diagnostic {
    /// Gets the stream position of the chunk header that caused the diagnostic.
    pub fn pos(&self) -> u64 {
        match *self {
            Diagnostic::UnexpectedChunk { pos, .. } => pos,
            Diagnostic::MalformedFact { pos, .. } => pos,
            Diagnostic::OddDataLength { pos, .. } => pos,
            Diagnostic::DataTooLarge { pos, .. } => pos,
            Diagnostic::Truncated { pos, .. } => pos,
            Diagnostic::TrailingBytes { pos, .. } => pos,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Diagnostic::UnexpectedChunk { pos, expected, tag, len } => write!(
                f,
                "{} chunk not found at {}: skipped chunk tag={}, len={}",
                String::from_utf8_lossy(&expected).trim_end(),
                pos,
                String::from_utf8_lossy(&tag),
                len
            ),
            Diagnostic::MalformedFact { pos, len } => {
                write!(f, "malformed fact chunk at {}: skipped {} bytes", pos, len)
            }
            Diagnostic::OddDataLength { pos, len } => {
                write!(f, "data chunk at {} has odd length {}: unit dropped", pos, len)
            }
            Diagnostic::DataTooLarge { pos, len, limit } => write!(
                f,
                "data chunk at {} exceeds limit ({} > {} bytes): unit dropped",
                pos, len, limit
            ),
            Diagnostic::Truncated { pos, len, available } => write!(
                f,
                "stream truncated at {}: chunk needs {} bytes, {} available",
                pos, len, available
            ),
            Diagnostic::TrailingBytes { pos, len } => {
                write!(f, "ignoring {} bytes after the riff chunk at {}", len, pos)
            }
        }
    }
}

/// A `DiagnosticSink` receives the warnings raised while decoding.
pub trait DiagnosticSink {
    fn report(&mut self, diag: Diagnostic);
}

/// `LogSink` forwards every diagnostic to the `log` facade at the warning level.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diag: Diagnostic) {
        warn!("uwc: {}", diag);
    }
}

/// `NullSink` discards every diagnostic.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diag: Diagnostic) {}
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diag: Diagnostic) {
        self.push(diag);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diag: Diagnostic) {
        (**self).report(diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_collecting_sink() {
        let mut diags: Vec<Diagnostic> = Vec::new();

        {
            let sink: &mut dyn DiagnosticSink = &mut diags;
            sink.report(Diagnostic::MalformedFact { pos: 48, len: 16 });
            sink.report(Diagnostic::OddDataLength { pos: 68, len: 3 });
        }

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].pos(), 48);
        assert_eq!(diags[1], Diagnostic::OddDataLength { pos: 68, len: 3 });
    }

    #[test]
    fn verify_display() {
        let diag =
            Diagnostic::UnexpectedChunk { pos: 48, expected: *b"fact", tag: *b"LIST", len: 26 };
        assert_eq!(diag.to_string(), "fact chunk not found at 48: skipped chunk tag=LIST, len=26");

        let diag = Diagnostic::Truncated { pos: 68, len: 100, available: 10 };
        assert_eq!(diag.to_string(), "stream truncated at 68: chunk needs 100 bytes, 10 available");
    }
}
