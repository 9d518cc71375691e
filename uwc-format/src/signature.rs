// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use uwc_core::errors::{unsupported_error, Result};
use uwc_core::io::{BufReader, ReadBytes};

use log::debug;

use crate::chunks::{read_chunk_header, ParseChunk, FMT_TAG, UWC_FMT_CHUNK_LEN, UWC_FORMAT_TAG};
use crate::model::WaveformFormat;

/// A unit waveform container is a RIFF stream, with a "RIFF" ASCII stream marker.
pub const RIFF_STREAM_MARKER: [u8; 4] = *b"RIFF";

/// The RIFF form of a unit waveform container is "WAVE".
pub const WAVE_RIFF_FORM: [u8; 4] = *b"WAVE";

/// The number of bytes from the start of a stream the signature probes examine.
pub const PROBE_LEN: usize = 24;

/// The length of the prologue and format header, and so the position of the first unit.
pub const HEADER_LEN: u64 = 12 + 8 + UWC_FMT_CHUNK_LEN as u64;

fn probe(reader: &mut BufReader<'_>) -> io::Result<bool> {
    if reader.read_quad_bytes()? != RIFF_STREAM_MARKER {
        return Ok(false);
    }

    // Skip the RIFF length.
    reader.ignore_bytes(4)?;

    if reader.read_quad_bytes()? != WAVE_RIFF_FORM {
        return Ok(false);
    }

    // Only the length of the fmt chunk is probed, not its tag.
    reader.ignore_bytes(4)?;

    if reader.read_u32()? != UWC_FMT_CHUNK_LEN {
        return Ok(false);
    }

    Ok(reader.read_u16()? == UWC_FORMAT_TAG)
}

/// Returns `true` if the buffer begins with the signature of a unit waveform container.
///
/// Only the RIFF marker, the WAVE form, the length of the fmt chunk, and the format tag are
/// examined. A buffer shorter than [`PROBE_LEN`] is never a container.
pub fn is_uwc_bytes(buf: &[u8]) -> bool {
    if buf.len() < PROBE_LEN {
        return false;
    }

    probe(&mut BufReader::new(buf)).unwrap_or(false)
}

/// Returns `true` if the file at `path` begins with the signature of a unit waveform container.
///
/// Never fails: a file that cannot be opened or read is not a container.
pub fn is_uwc_file<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!("uwc: could not open {}: {}", path.display(), err);
            return false;
        }
    };

    let mut prologue = Vec::with_capacity(PROBE_LEN);

    if let Err(err) = file.take(PROBE_LEN as u64).read_to_end(&mut prologue) {
        debug!("uwc: could not read {}: {}", path.display(), err);
        return false;
    }

    is_uwc_bytes(&prologue)
}

/// Reads the RIFF prologue and the format header. Returns the RIFF length and the format.
pub(crate) fn read_prologue<B: ReadBytes>(reader: &mut B) -> Result<(u32, WaveformFormat)> {
    let marker = reader.read_quad_bytes()?;
    if marker != RIFF_STREAM_MARKER {
        return unsupported_error("uwc: missing riff stream marker");
    }

    let riff_len = reader.read_u32()?;
    let riff_form = reader.read_quad_bytes()?;

    if riff_form != WAVE_RIFF_FORM {
        return unsupported_error("uwc: riff form is not wave");
    }

    // As with the probe, the tag of the fmt chunk is not checked.
    let (_tag, len) = read_chunk_header(reader)?;
    let format = WaveformFormat::parse(reader, FMT_TAG, len)?;

    Ok((riff_len, format))
}

/// Reads the prologue and format header of a unit waveform container.
///
/// Unlike the lenient decoder, a stream that is not a container is an `Unsupported` error.
pub fn read_header<B: ReadBytes>(reader: &mut B) -> Result<WaveformFormat> {
    read_prologue(reader).map(|(_, format)| format)
}

#[cfg(test)]
mod tests {
    use uwc_core::errors::Error;

    use super::*;
    use crate::chunks::WriteChunk;

    fn prologue() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&40u32.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        WaveformFormat::mono_16bit(16_000).write_chunk(&mut buf).unwrap();
        buf
    }

    #[test]
    fn verify_probes() {
        let buf = prologue();
        assert_eq!(buf.len() as u64, HEADER_LEN);
        assert!(is_uwc_bytes(&buf));
        assert!(is_uwc_bytes(&buf[..PROBE_LEN]));
        assert!(!is_uwc_bytes(&buf[..PROBE_LEN - 1]));
        assert!(!is_uwc_bytes(&[]));

        let mut bad = buf.clone();
        bad[0..4].copy_from_slice(b"RIFX");
        assert!(!is_uwc_bytes(&bad));

        let mut bad = buf.clone();
        bad[8..12].copy_from_slice(b"AVI ");
        assert!(!is_uwc_bytes(&bad));

        let mut bad = buf.clone();
        bad[16..20].copy_from_slice(&16u32.to_le_bytes());
        assert!(!is_uwc_bytes(&bad));

        let mut bad = buf.clone();
        bad[20..22].copy_from_slice(&1u16.to_le_bytes());
        assert!(!is_uwc_bytes(&bad));

        // The fmt tag and the RIFF length are not probed.
        let mut odd = buf.clone();
        odd[4..8].copy_from_slice(&0u32.to_le_bytes());
        odd[12..16].copy_from_slice(b"junk");
        assert!(is_uwc_bytes(&odd));
    }

    #[test]
    fn verify_read_header() {
        let buf = prologue();

        let mut reader = BufReader::new(&buf);
        assert_eq!(read_header(&mut reader).unwrap(), WaveformFormat::mono_16bit(16_000));
        assert_eq!(reader.pos(), HEADER_LEN);

        let mut bad = buf.clone();
        bad[8..12].copy_from_slice(b"AVI ");
        match read_header(&mut BufReader::new(&bad)) {
            Err(Error::Unsupported(_)) => (),
            _ => panic!("expected an unsupported error"),
        }

        let err = read_header(&mut BufReader::new(&buf[..30])).unwrap_err();
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn verify_missing_file_is_not_uwc() {
        let path = std::env::temp_dir().join("uwc-format-signature-does-not-exist.uwc");
        assert!(!is_uwc_file(path));
    }
}
