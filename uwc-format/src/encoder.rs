// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use uwc_core::errors::{limit_error, Result};
use uwc_core::io::WriteBytes;

use log::debug;

use crate::chunks::{write_data_chunk, WriteChunk};
use crate::model::{UnitFact, UnitWaveformContainer};
use crate::signature::{HEADER_LEN, RIFF_STREAM_MARKER, WAVE_RIFF_FORM};

/// Gets the exact number of bytes `encode` will write for the container.
pub fn encoded_len(uwc: &UnitWaveformContainer) -> u64 {
    let unit_len = |data_len: u64| 8 + u64::from(UnitFact::CHUNK_LEN) + 8 + data_len;

    HEADER_LEN + uwc.iter().map(|unit| unit_len(unit.data_len())).sum::<u64>()
}

/// Encodes the container to a writer, starting at the writer's current position.
///
/// The RIFF length is written as a placeholder and backpatched once every unit has been written.
/// On success, the writer is left positioned after the container, and the number of bytes written
/// is returned.
///
/// A container too large for the 32-bit RIFF length is a `LimitError`, and nothing is written.
/// Any other failure may leave a partially written container behind.
pub fn encode<W: Write + Seek>(writer: &mut W, uwc: &UnitWaveformContainer) -> Result<u64> {
    if encoded_len(uwc) - 8 > u64::from(u32::MAX) {
        return limit_error("uwc: container exceeds the maximum riff length");
    }

    let start = writer.stream_position()?;

    writer.write_quad_bytes(RIFF_STREAM_MARKER)?;
    writer.write_u32(0)?;
    writer.write_quad_bytes(WAVE_RIFF_FORM)?;

    // The RIFF length counts every byte after the length field itself.
    let mut riff_len = 4;

    riff_len += uwc.format.write_chunk(writer)?;

    for unit in uwc {
        riff_len += unit.fact.write_chunk(writer)?;
        riff_len += write_data_chunk(writer, &unit.samples)?;
    }

    let end = writer.stream_position()?;

    writer.seek(SeekFrom::Start(start + 4))?;
    writer.write_u32(riff_len as u32)?;
    writer.seek(SeekFrom::Start(end))?;

    debug!("uwc: encoded {} units, riff_len={}", uwc.len(), riff_len);

    Ok(8 + riff_len)
}

/// Saves the container to the file at `path`. An existing file is truncated and overwritten.
///
/// The write is not atomic. If it fails part way through, the file is left truncated, with a RIFF
/// length that does not describe its contents.
pub fn save<P: AsRef<Path>>(path: P, uwc: &UnitWaveformContainer) -> Result<()> {
    let path = path.as_ref();

    let mut writer = io::BufWriter::new(File::create(path)?);

    let len = encode(&mut writer, uwc)?;
    writer.flush()?;

    debug!("uwc: wrote {} bytes to {}", len, path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::model::{UnitWaveform, WaveformFormat};

    #[test]
    fn verify_empty_container_layout() {
        let uwc = UnitWaveformContainer::new(WaveformFormat::mono_16bit(16_000));

        let mut cursor = Cursor::new(Vec::new());
        assert_eq!(encode(&mut cursor, &uwc).unwrap(), 48);

        let buf = cursor.into_inner();
        assert_eq!(buf.len(), 48);
        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(&buf[4..8], &40u32.to_le_bytes());
        assert_eq!(&buf[8..12], b"WAVE");
        assert_eq!(&buf[12..16], b"fmt ");
        assert_eq!(&buf[36..38], &10u16.to_le_bytes());
    }

    #[test]
    fn verify_unit_layout() {
        let mut uwc = UnitWaveformContainer::new(WaveformFormat::default());
        uwc.push(UnitWaveform::new(UnitFact::new(5, 6, 7), vec![-2, 3]));

        assert_eq!(encoded_len(&uwc), 48 + 20 + 12);

        let mut cursor = Cursor::new(Vec::new());
        assert_eq!(encode(&mut cursor, &uwc).unwrap(), 80);
        assert_eq!(cursor.position(), 80);

        let buf = cursor.into_inner();
        assert_eq!(&buf[4..8], &72u32.to_le_bytes());
        assert_eq!(&buf[48..52], b"fact");
        assert_eq!(&buf[52..56], &12u32.to_le_bytes());
        assert_eq!(&buf[56..60], &5u32.to_le_bytes());
        assert_eq!(&buf[64..68], &7u32.to_le_bytes());
        assert_eq!(&buf[68..72], b"data");
        assert_eq!(&buf[72..76], &4u32.to_le_bytes());
        assert_eq!(&buf[76..80], &[0xfe, 0xff, 0x03, 0x00]);
    }

    #[test]
    fn verify_encode_at_offset() {
        let uwc = UnitWaveformContainer::default();

        let mut cursor = Cursor::new(vec![0xaa; 4]);
        cursor.set_position(4);

        assert_eq!(encode(&mut cursor, &uwc).unwrap(), 48);

        let buf = cursor.into_inner();
        assert_eq!(buf.len(), 52);
        assert_eq!(&buf[0..4], &[0xaa; 4]);
        assert_eq!(&buf[8..12], &40u32.to_le_bytes());
    }
}
