// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::marker::PhantomData;

use uwc_core::errors::{decode_error, unsupported_error, Result};
use uwc_core::io::{ReadBytes, WriteBytes};

use crate::model::{UnitFact, WaveformFormat};

/// The `fmt ` chunk tag.
pub const FMT_TAG: [u8; 4] = *b"fmt ";
/// The `fact` chunk tag.
pub const FACT_TAG: [u8; 4] = *b"fact";
/// The `data` chunk tag.
pub const DATA_TAG: [u8; 4] = *b"data";

/// The private format tag that distinguishes a unit waveform container from generic WAVE audio.
pub const UWC_FORMAT_TAG: u16 = 0x5557;

/// The number of bytes of synthesis parameters that extend the basic WAVE format block.
pub const UWC_FMT_EXTENSION_LEN: u16 = 10;

/// The only length the `fmt ` chunk of a unit waveform container may declare: the 16 byte basic
/// format block, the 2 byte extension length, and the extension itself.
pub const UWC_FMT_CHUNK_LEN: u32 = 16 + 2 + UWC_FMT_EXTENSION_LEN as u32;

pub trait ParseChunkTag: Sized {
    fn parse_tag(tag: [u8; 4], len: u32) -> Option<Self>;
}

/// Common trait implemented for all chunks that are parsed by a `ChunkParser`.
pub trait ParseChunk: Sized {
    fn parse<B: ReadBytes>(reader: &mut B, tag: [u8; 4], len: u32) -> Result<Self>;
}

/// Common trait implemented for all chunks the encoder emits. Writes the chunk header followed by
/// the chunk body, and returns the total number of bytes written.
pub trait WriteChunk {
    fn write_chunk<W: WriteBytes>(&self, writer: &mut W) -> Result<u64>;
}

/// `ChunkParser` is a utility struct for unifying the parsing of chunks.
pub struct ChunkParser<P: ParseChunk> {
    tag: [u8; 4],
    len: u32,
    phantom: PhantomData<P>,
}

impl<P: ParseChunk> ChunkParser<P> {
    fn new(tag: [u8; 4], len: u32) -> Self {
        ChunkParser { tag, len, phantom: PhantomData }
    }

    pub fn declared_len(&self) -> u32 {
        self.len
    }

    pub fn parse<B: ReadBytes>(&self, reader: &mut B) -> Result<P> {
        P::parse(reader, self.tag, self.len)
    }
}

/// The chunks that may follow the format header of a unit waveform container.
pub enum UwcChunks {
    Fact(ChunkParser<FactChunk>),
    Data(ChunkParser<DataChunk>),
}

macro_rules! parser {
    ($class:expr, $result:ty, $tag:expr, $len:expr) => {
        Some($class(ChunkParser::<$result>::new($tag, $len)))
    };
}

impl ParseChunkTag for UwcChunks {
    fn parse_tag(tag: [u8; 4], len: u32) -> Option<Self> {
        match &tag {
            b"fact" => parser!(UwcChunks::Fact, FactChunk, tag, len),
            b"data" => parser!(UwcChunks::Data, DataChunk, tag, len),
            _ => None,
        }
    }
}

/// Reads a chunk header: the 4 byte tag, and the 4 byte little-endian chunk length.
pub fn read_chunk_header<B: ReadBytes>(reader: &mut B) -> Result<([u8; 4], u32)> {
    let tag = reader.read_quad_bytes()?;
    let len = reader.read_u32()?;
    Ok((tag, len))
}

fn write_chunk_header<W: WriteBytes>(writer: &mut W, tag: [u8; 4], len: u32) -> Result<()> {
    writer.write_quad_bytes(tag)?;
    writer.write_u32(len)?;
    Ok(())
}

/// The body of the `fmt ` chunk, starting at the format tag.
impl ParseChunk for WaveformFormat {
    fn parse<B: ReadBytes>(reader: &mut B, _tag: [u8; 4], len: u32) -> Result<WaveformFormat> {
        if len != UWC_FMT_CHUNK_LEN {
            return unsupported_error("uwc: fmt chunk length is not that of a unit waveform format");
        }

        let format_tag = reader.read_u16()?;

        if format_tag != UWC_FORMAT_TAG {
            return unsupported_error("uwc: format tag is not that of a unit waveform format");
        }

        let n_channels = reader.read_u16()?;
        let sample_rate = reader.read_u32()?;
        let avg_bytes_per_sec = reader.read_u32()?;
        let block_align = reader.read_u16()?;
        let bits_per_sample = reader.read_u16()?;

        // The extension length. Always the same for this format, so it is not checked.
        let _extension_len = reader.read_u16()?;

        let lobe_size = reader.read_u16()?;
        let repeat_start = reader.read_u32()?;
        let f0 = reader.read_f32()?;

        Ok(WaveformFormat {
            n_channels,
            sample_rate,
            avg_bytes_per_sec,
            block_align,
            bits_per_sample,
            lobe_size,
            repeat_start,
            f0,
        })
    }
}

impl WriteChunk for WaveformFormat {
    fn write_chunk<W: WriteBytes>(&self, writer: &mut W) -> Result<u64> {
        write_chunk_header(writer, FMT_TAG, UWC_FMT_CHUNK_LEN)?;

        writer.write_u16(UWC_FORMAT_TAG)?;
        writer.write_u16(self.n_channels)?;
        writer.write_u32(self.sample_rate)?;
        writer.write_u32(self.avg_bytes_per_sec)?;
        writer.write_u16(self.block_align)?;
        writer.write_u16(self.bits_per_sample)?;
        writer.write_u16(UWC_FMT_EXTENSION_LEN)?;
        writer.write_u16(self.lobe_size)?;
        writer.write_u32(self.repeat_start)?;
        writer.write_f32(self.f0)?;

        Ok(8 + u64::from(UWC_FMT_CHUNK_LEN))
    }
}

/// `FactChunk` carries the metadata of one unit.
#[derive(Debug)]
pub struct FactChunk {
    pub fact: UnitFact,
}

impl ParseChunk for FactChunk {
    fn parse<B: ReadBytes>(reader: &mut B, _tag: [u8; 4], len: u32) -> Result<FactChunk> {
        if len != UnitFact::CHUNK_LEN {
            return decode_error("uwc: malformed fact chunk");
        }

        let pitch_left = reader.read_u32()?;
        let pitch_right = reader.read_u32()?;
        let position = reader.read_u32()?;

        Ok(FactChunk { fact: UnitFact { pitch_left, pitch_right, position } })
    }
}

impl WriteChunk for UnitFact {
    fn write_chunk<W: WriteBytes>(&self, writer: &mut W) -> Result<u64> {
        write_chunk_header(writer, FACT_TAG, UnitFact::CHUNK_LEN)?;

        writer.write_u32(self.pitch_left)?;
        writer.write_u32(self.pitch_right)?;
        writer.write_u32(self.position)?;

        Ok(8 + u64::from(UnitFact::CHUNK_LEN))
    }
}

/// `DataChunk` carries the 16-bit little-endian samples of one unit.
#[derive(Debug)]
pub struct DataChunk {
    pub samples: Vec<i16>,
}

impl ParseChunk for DataChunk {
    fn parse<B: ReadBytes>(reader: &mut B, _tag: [u8; 4], len: u32) -> Result<DataChunk> {
        if len & 0x1 == 1 {
            return decode_error("uwc: data chunk length is not a whole number of samples");
        }

        let buf = reader.read_boxed_slice_exact(len as usize)?;

        let samples =
            buf.chunks_exact(2).map(|pair| i16::from_le_bytes([pair[0], pair[1]])).collect();

        Ok(DataChunk { samples })
    }
}

/// Writes the samples as a `data` chunk. The caller guarantees the byte length fits the 32-bit
/// length field.
pub fn write_data_chunk<W: WriteBytes>(writer: &mut W, samples: &[i16]) -> Result<u64> {
    let len = 2 * samples.len() as u64;

    write_chunk_header(writer, DATA_TAG, len as u32)?;

    let mut buf = Vec::with_capacity(len as usize);
    for sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }
    writer.write_buf(&buf)?;

    Ok(8 + len)
}
