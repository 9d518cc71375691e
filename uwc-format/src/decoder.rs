// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::Read;
use std::mem;
use std::path::Path;

use uwc_core::diag::{Diagnostic, DiagnosticSink, LogSink};
use uwc_core::errors::Result;
use uwc_core::io::{BufReader, FiniteStream, ReadBytes};
use uwc_core::options::DecodeOptions;

use log::debug;

use crate::chunks::{read_chunk_header, ParseChunkTag, UwcChunks, DATA_TAG, FACT_TAG};
use crate::model::{UnitFact, UnitWaveform, UnitWaveformContainer};
use crate::signature::{is_uwc_bytes, read_prologue, HEADER_LEN, PROBE_LEN};

/// The state of the unit scanner between chunks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ScanState {
    /// The next chunk should be the `fact` chunk of a new unit.
    ExpectFact,
    /// A `fact` chunk was read, the next chunk should be the `data` chunk of the same unit.
    ExpectData(UnitFact),
    /// The end of the stream was reached.
    Done,
}

/// The outcome of one step of the unit scanner.
#[derive(Debug, PartialEq, Eq)]
pub enum ScanStep {
    /// A complete `fact` and `data` pair was read.
    Unit(UnitWaveform),
    /// A chunk was skipped. Any unit in progress was dropped.
    Skipped,
    /// A chunk did not fit in the remaining stream. Any unit in progress was dropped, and scanning
    /// stopped.
    Truncated,
}

/// `UnitScanner` reads units from the chunk stream that follows the format header.
///
/// The scanner is lenient: a chunk with an unexpected tag or length is skipped over using its
/// declared length, a diagnostic is reported, and scanning continues with the next chunk. Only
/// complete, well-sized `fact` and `data` pairs are returned as units.
pub struct UnitScanner {
    state: ScanState,
    max_data_len: Option<u32>,
}

impl UnitScanner {
    pub fn new(options: &DecodeOptions) -> Self {
        UnitScanner { state: ScanState::ExpectFact, max_data_len: options.max_data_len }
    }

    /// Returns `true` if the scanner reached the end of the stream.
    pub fn is_done(&self) -> bool {
        self.state == ScanState::Done
    }

    /// Scans the next unit or chunk. Returns `None` once the end of the stream is reached.
    pub fn next_step<B>(
        &mut self,
        reader: &mut B,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<ScanStep>>
    where
        B: ReadBytes + FiniteStream,
    {
        match self.step(reader, sink) {
            // Lengths are checked before every read, so this is only reachable if the reader is
            // shorter than it reports. Treat it as any other truncation.
            Err(err) if err.is_end_of_stream() => {
                self.state = ScanState::Done;
                Ok(Some(ScanStep::Truncated))
            }
            res => res,
        }
    }

    fn step<B>(&mut self, reader: &mut B, sink: &mut dyn DiagnosticSink) -> Result<Option<ScanStep>>
    where
        B: ReadBytes + FiniteStream,
    {
        loop {
            // Any path that does not set the next state leaves the scanner done.
            match mem::replace(&mut self.state, ScanState::Done) {
                ScanState::Done => return Ok(None),
                ScanState::ExpectFact => {
                    // A clean end of stream between units.
                    if reader.bytes_available() == 0 {
                        return Ok(None);
                    }

                    let pos = reader.pos();

                    let (tag, len) = match read_header_checked(reader, sink)? {
                        Some(header) => header,
                        None => return Ok(Some(ScanStep::Truncated)),
                    };

                    match UwcChunks::parse_tag(tag, len) {
                        Some(UwcChunks::Fact(fact)) if fact.declared_len() == UnitFact::CHUNK_LEN => {
                            if !body_fits(reader, sink, pos, len) {
                                return Ok(Some(ScanStep::Truncated));
                            }

                            self.state = ScanState::ExpectData(fact.parse(reader)?.fact);
                        }
                        Some(UwcChunks::Fact(_)) => {
                            let diag = Diagnostic::MalformedFact { pos, len };
                            return self.skip(reader, sink, pos, len, diag);
                        }
                        _ => {
                            let diag =
                                Diagnostic::UnexpectedChunk { pos, expected: FACT_TAG, tag, len };
                            return self.skip(reader, sink, pos, len, diag);
                        }
                    }
                }
                ScanState::ExpectData(fact) => {
                    let pos = reader.pos();

                    let (tag, len) = match read_header_checked(reader, sink)? {
                        Some(header) => header,
                        None => return Ok(Some(ScanStep::Truncated)),
                    };

                    let data = match UwcChunks::parse_tag(tag, len) {
                        Some(UwcChunks::Data(data)) => data,
                        _ => {
                            let diag =
                                Diagnostic::UnexpectedChunk { pos, expected: DATA_TAG, tag, len };
                            return self.skip(reader, sink, pos, len, diag);
                        }
                    };

                    if !body_fits(reader, sink, pos, len) {
                        return Ok(Some(ScanStep::Truncated));
                    }

                    if len & 0x1 == 1 {
                        let diag = Diagnostic::OddDataLength { pos, len };
                        return self.skip(reader, sink, pos, len, diag);
                    }

                    if let Some(limit) = self.max_data_len {
                        if len > limit {
                            let diag = Diagnostic::DataTooLarge { pos, len, limit };
                            return self.skip(reader, sink, pos, len, diag);
                        }
                    }

                    let samples = data.parse(reader)?.samples;

                    self.state = ScanState::ExpectFact;
                    return Ok(Some(ScanStep::Unit(UnitWaveform::new(fact, samples))));
                }
            }
        }
    }

    /// Skips the body of the chunk whose header was read at `pos`, and resumes scanning for the
    /// next unit.
    fn skip<B>(
        &mut self,
        reader: &mut B,
        sink: &mut dyn DiagnosticSink,
        pos: u64,
        len: u32,
        diag: Diagnostic,
    ) -> Result<Option<ScanStep>>
    where
        B: ReadBytes + FiniteStream,
    {
        // The declared length is trusted, even for a chunk that has the wrong length for its tag.
        // It only has to fit in the stream.
        if !body_fits(reader, sink, pos, len) {
            return Ok(Some(ScanStep::Truncated));
        }

        reader.ignore_bytes(u64::from(len))?;
        sink.report(diag);

        self.state = ScanState::ExpectFact;
        Ok(Some(ScanStep::Skipped))
    }
}

/// Reads a chunk header if one fits in the remaining stream. Otherwise, reports the truncation
/// and returns `None`.
fn read_header_checked<B>(
    reader: &mut B,
    sink: &mut dyn DiagnosticSink,
) -> Result<Option<([u8; 4], u32)>>
where
    B: ReadBytes + FiniteStream,
{
    let available = reader.bytes_available();

    if available < 8 {
        sink.report(Diagnostic::Truncated { pos: reader.pos(), len: 8, available });
        return Ok(None);
    }

    read_chunk_header(reader).map(Some)
}

/// Returns `true` if a chunk body of `len` bytes fits in the remaining stream. Otherwise, reports
/// the truncation of the chunk whose header was read at `pos`.
fn body_fits<B>(reader: &B, sink: &mut dyn DiagnosticSink, pos: u64, len: u32) -> bool
where
    B: FiniteStream,
{
    let available = reader.bytes_available();

    if u64::from(len) > available {
        sink.report(Diagnostic::Truncated { pos, len: 8 + u64::from(len), available: 8 + available });
        return false;
    }

    true
}

/// Decodes a unit waveform container from a buffer.
///
/// If the buffer does not begin with the signature of a container, an empty container is
/// returned. Chunks that cannot be used are skipped and reported to `sink`. A truncated stream
/// yields the units that were complete before the truncation.
pub fn decode_bytes(
    buf: &[u8],
    options: &DecodeOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<UnitWaveformContainer> {
    if !is_uwc_bytes(buf) {
        debug!("uwc: not a unit waveform container");
        return Ok(Default::default());
    }

    decode_probed(buf, options, sink)
}

/// Decodes a buffer that already passed the signature probes.
fn decode_probed(
    buf: &[u8],
    options: &DecodeOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<UnitWaveformContainer> {
    let mut reader = BufReader::new(buf);

    let (riff_len, format) = match read_prologue(&mut reader) {
        Ok(prologue) => prologue,
        Err(err) if err.is_end_of_stream() => {
            sink.report(Diagnostic::Truncated {
                pos: 0,
                len: HEADER_LEN,
                available: buf.len() as u64,
            });
            return Ok(Default::default());
        }
        Err(err) => return Err(err),
    };

    let stream_len = buf.len() as u64;
    let riff_end = 8 + u64::from(riff_len);

    if riff_end != stream_len {
        debug!("uwc: riff chunk ends at {}, but stream ends at {}", riff_end, stream_len);
    }

    // Limit scanning to the RIFF chunk if requested, but never cut into the header.
    let end = if options.trust_riff_len && riff_end < stream_len {
        let end = riff_end.max(HEADER_LEN);
        sink.report(Diagnostic::TrailingBytes { pos: end, len: stream_len - end });
        end
    }
    else {
        stream_len
    };

    let mut reader = BufReader::new(&buf[..end as usize]);
    reader.seek_to(HEADER_LEN)?;

    let mut uwc = UnitWaveformContainer::new(format);
    let mut scanner = UnitScanner::new(options);

    while let Some(step) = scanner.next_step(&mut reader, sink)? {
        if let ScanStep::Unit(unit) = step {
            uwc.push(unit);
        }
    }

    debug!("uwc: decoded {} units", uwc.len());

    Ok(uwc)
}

/// Loads a unit waveform container from the file at `path`, reporting skipped chunks to the log.
///
/// A file that is not a container, or that cannot be opened, yields an empty container. An error
/// is only returned if the file is a container and reading it fails.
pub fn load<P: AsRef<Path>>(path: P) -> Result<UnitWaveformContainer> {
    load_with(path, &Default::default(), &mut LogSink)
}

/// Loads a unit waveform container from the file at `path` with the provided options, reporting
/// skipped chunks to `sink`.
pub fn load_with<P: AsRef<Path>>(
    path: P,
    options: &DecodeOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<UnitWaveformContainer> {
    let path = path.as_ref();

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!("uwc: could not open {}: {}", path.display(), err);
            return Ok(Default::default());
        }
    };

    // Probe the prologue before reading the rest, so a foreign file is never read in full.
    let mut buf = Vec::with_capacity(PROBE_LEN);

    if let Err(err) = file.by_ref().take(PROBE_LEN as u64).read_to_end(&mut buf) {
        debug!("uwc: could not read {}: {}", path.display(), err);
        return Ok(Default::default());
    }

    if !is_uwc_bytes(&buf) {
        debug!("uwc: {} is not a unit waveform container", path.display());
        return Ok(Default::default());
    }

    file.read_to_end(&mut buf)?;

    decode_probed(&buf, options, sink)
}

#[cfg(test)]
mod tests {
    use uwc_core::diag::NullSink;

    use super::*;

    fn fact_chunk(buf: &mut Vec<u8>, fact: [u32; 3]) {
        buf.extend_from_slice(b"fact");
        buf.extend_from_slice(&12u32.to_le_bytes());
        for field in fact {
            buf.extend_from_slice(&field.to_le_bytes());
        }
    }

    fn chunk(buf: &mut Vec<u8>, tag: &[u8; 4], body: &[u8]) {
        buf.extend_from_slice(tag);
        buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
        buf.extend_from_slice(body);
    }

    fn scan(buf: &[u8], options: &DecodeOptions) -> (Vec<ScanStep>, Vec<Diagnostic>) {
        let mut reader = BufReader::new(buf);
        let mut scanner = UnitScanner::new(options);
        let mut diags: Vec<Diagnostic> = Vec::new();
        let mut steps = Vec::new();

        while let Some(step) = scanner.next_step(&mut reader, &mut diags).unwrap() {
            steps.push(step);
        }

        assert!(scanner.is_done());
        (steps, diags)
    }

    #[test]
    fn verify_scan_pairs() {
        let mut buf = Vec::new();
        fact_chunk(&mut buf, [1, 2, 3]);
        chunk(&mut buf, b"data", &[1, 0, 2, 0]);
        fact_chunk(&mut buf, [4, 5, 6]);
        chunk(&mut buf, b"data", &[]);

        let (steps, diags) = scan(&buf, &Default::default());

        assert_eq!(
            steps,
            vec![
                ScanStep::Unit(UnitWaveform::new(UnitFact::new(1, 2, 3), vec![1, 2])),
                ScanStep::Unit(UnitWaveform::new(UnitFact::new(4, 5, 6), vec![])),
            ]
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn verify_scan_skips_foreign_and_malformed_chunks() {
        let mut buf = Vec::new();
        chunk(&mut buf, b"LIST", &[0; 6]);
        chunk(&mut buf, b"fact", &[0; 16]);
        fact_chunk(&mut buf, [7, 8, 9]);
        chunk(&mut buf, b"data", &[1, 0, 2]);
        fact_chunk(&mut buf, [1, 1, 1]);
        chunk(&mut buf, b"data", &[0xff, 0xff]);

        let (steps, diags) = scan(&buf, &Default::default());

        assert_eq!(
            steps,
            vec![
                ScanStep::Skipped,
                ScanStep::Skipped,
                ScanStep::Skipped,
                ScanStep::Unit(UnitWaveform::new(UnitFact::new(1, 1, 1), vec![-1])),
            ]
        );
        assert_eq!(
            diags,
            vec![
                Diagnostic::UnexpectedChunk { pos: 0, expected: FACT_TAG, tag: *b"LIST", len: 6 },
                Diagnostic::MalformedFact { pos: 14, len: 16 },
                Diagnostic::OddDataLength { pos: 58, len: 3 },
            ]
        );
    }

    #[test]
    fn verify_scan_drops_unit_without_data() {
        let mut buf = Vec::new();
        fact_chunk(&mut buf, [1, 2, 3]);
        // A second fact where a data chunk is expected is skipped, not used.
        fact_chunk(&mut buf, [4, 5, 6]);
        fact_chunk(&mut buf, [7, 8, 9]);
        chunk(&mut buf, b"data", &[3, 0]);

        let (steps, diags) = scan(&buf, &Default::default());

        assert_eq!(
            steps,
            vec![
                ScanStep::Skipped,
                ScanStep::Unit(UnitWaveform::new(UnitFact::new(7, 8, 9), vec![3])),
            ]
        );
        assert_eq!(
            diags,
            vec![Diagnostic::UnexpectedChunk { pos: 20, expected: DATA_TAG, tag: FACT_TAG, len: 12 }]
        );
    }

    #[test]
    fn verify_scan_truncation() {
        let mut buf = Vec::new();
        fact_chunk(&mut buf, [1, 2, 3]);
        chunk(&mut buf, b"data", &[1, 0, 2, 0]);
        fact_chunk(&mut buf, [4, 5, 6]);
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&100u32.to_le_bytes());
        buf.extend_from_slice(&[0; 10]);

        let (steps, diags) = scan(&buf, &Default::default());

        assert_eq!(
            steps,
            vec![
                ScanStep::Unit(UnitWaveform::new(UnitFact::new(1, 2, 3), vec![1, 2])),
                ScanStep::Truncated,
            ]
        );
        assert_eq!(diags, vec![Diagnostic::Truncated { pos: 52, len: 108, available: 18 }]);
    }

    #[test]
    fn verify_scan_partial_header() {
        let mut buf = Vec::new();
        fact_chunk(&mut buf, [1, 2, 3]);
        chunk(&mut buf, b"data", &[]);
        buf.extend_from_slice(b"fac");

        let (steps, diags) = scan(&buf, &Default::default());

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1], ScanStep::Truncated);
        assert_eq!(diags, vec![Diagnostic::Truncated { pos: 28, len: 8, available: 3 }]);
    }

    #[test]
    fn verify_scan_fact_length_past_end() {
        let mut buf = Vec::new();
        fact_chunk(&mut buf, [1, 2, 3]);
        chunk(&mut buf, b"data", &[1, 0]);
        // A fact chunk with a corrupt length that runs past the end, over a complete unit.
        buf.extend_from_slice(b"fact");
        buf.extend_from_slice(&1000u32.to_le_bytes());
        fact_chunk(&mut buf, [4, 5, 6]);
        chunk(&mut buf, b"data", &[2, 0]);

        let (steps, diags) = scan(&buf, &Default::default());

        assert_eq!(
            steps,
            vec![
                ScanStep::Unit(UnitWaveform::new(UnitFact::new(1, 2, 3), vec![1])),
                ScanStep::Truncated,
            ]
        );
        assert_eq!(diags, vec![Diagnostic::Truncated { pos: 30, len: 1008, available: 38 }]);
    }

    #[test]
    fn verify_scan_data_limit() {
        let mut buf = Vec::new();
        fact_chunk(&mut buf, [1, 2, 3]);
        chunk(&mut buf, b"data", &[0; 8]);
        fact_chunk(&mut buf, [4, 5, 6]);
        chunk(&mut buf, b"data", &[0; 4]);

        let options = DecodeOptions { max_data_len: Some(4), ..Default::default() };
        let (steps, diags) = scan(&buf, &options);

        assert_eq!(steps[0], ScanStep::Skipped);
        assert_eq!(steps[1], ScanStep::Unit(UnitWaveform::new(UnitFact::new(4, 5, 6), vec![0; 2])));
        assert_eq!(diags, vec![Diagnostic::DataTooLarge { pos: 20, len: 8, limit: 4 }]);
    }

    #[test]
    fn verify_decode_foreign_bytes() {
        // A canonical PCM WAVE prologue.
        let buf = b"RIFF\x24\0\0\0WAVEfmt \x10\0\0\0\x01\0\x01\0";

        let uwc = decode_bytes(buf, &Default::default(), &mut NullSink).unwrap();
        assert!(uwc.is_empty());
        assert_eq!(uwc, UnitWaveformContainer::default());
    }
}
