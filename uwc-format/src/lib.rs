// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Reader and writer for the Unit Waveform Cache (UWC) container.
//!
//! A unit waveform container is a RIFF/WAVE stream that stores a collection of short audio
//! segments, units, that share one format header. The `fmt ` chunk carries a private format tag
//! and is extended with synthesis parameters. It is followed by one `fact` and `data` chunk pair
//! per unit:
//!
//! ```text
//! "RIFF" <riff_len> "WAVE"
//! "fmt " 28 <format_tag> <n_channels> <sample_rate> <avg_bytes_per_sec> <block_align>
//!           <bits_per_sample> 10 <lobe_size> <repeat_start> <f0>
//! "fact" 12 <pitch_left> <pitch_right> <position>
//! "data" <len> <samples (16-bit)>
//! ...
//! ```
//!
//! All fields are little-endian. The decoder is lenient: chunks it cannot use are skipped and
//! reported to a [`DiagnosticSink`], and a truncated stream yields the units that were complete.

mod chunks;
mod decoder;
mod encoder;
mod model;
mod signature;

pub use chunks::{UWC_FMT_CHUNK_LEN, UWC_FMT_EXTENSION_LEN, UWC_FORMAT_TAG};
pub use decoder::{decode_bytes, load, load_with, ScanStep, UnitScanner};
pub use encoder::{encode, encoded_len, save};
pub use model::{UnitFact, UnitWaveform, UnitWaveformContainer, WaveformFormat};
pub use signature::{is_uwc_bytes, is_uwc_file, read_header, HEADER_LEN, PROBE_LEN};

pub use uwc_core::diag::{Diagnostic, DiagnosticSink, LogSink, NullSink};
pub use uwc_core::errors::{Error, Result};
pub use uwc_core::options::DecodeOptions;
