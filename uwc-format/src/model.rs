// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory model of a unit waveform container.

use std::slice;
use std::vec;

/// The shared format header of a unit waveform container.
///
/// The format tag is not stored: every container carries [`crate::UWC_FORMAT_TAG`], which is
/// checked on read and always written on write.
#[derive(Copy, Clone, Debug, Default)]
pub struct WaveformFormat {
    /// The number of channels.
    pub n_channels: u16,
    /// The sample rate in Hz.
    pub sample_rate: u32,
    /// The average data rate in bytes/second.
    pub avg_bytes_per_sec: u32,
    /// The byte alignment of one audio frame.
    pub block_align: u16,
    /// The number of bits per sample.
    pub bits_per_sample: u16,
    /// The spectral lobe size used by the synthesizer.
    pub lobe_size: u16,
    /// The sample index at which a repeated section starts.
    pub repeat_start: u32,
    /// The fundamental frequency (F0) in Hz.
    pub f0: f32,
}

impl WaveformFormat {
    /// Instantiate a mono, 16-bit PCM format at the given sample rate with the synthesis
    /// parameters zeroed.
    pub fn mono_16bit(sample_rate: u32) -> Self {
        WaveformFormat {
            n_channels: 1,
            sample_rate,
            avg_bytes_per_sec: sample_rate.saturating_mul(2),
            block_align: 2,
            bits_per_sample: 16,
            ..Default::default()
        }
    }
}

/// Formats are equal if they encode to the same bytes, so F0 is compared bit-for-bit. A NaN F0
/// equals itself, and `0.0` and `-0.0` differ.
impl PartialEq for WaveformFormat {
    fn eq(&self, other: &Self) -> bool {
        self.n_channels == other.n_channels
            && self.sample_rate == other.sample_rate
            && self.avg_bytes_per_sec == other.avg_bytes_per_sec
            && self.block_align == other.block_align
            && self.bits_per_sample == other.bits_per_sample
            && self.lobe_size == other.lobe_size
            && self.repeat_start == other.repeat_start
            && self.f0.to_bits() == other.f0.to_bits()
    }
}

impl Eq for WaveformFormat {}

/// Per-unit metadata carried by a `fact` chunk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitFact {
    /// The left pitch mark.
    pub pitch_left: u32,
    /// The right pitch mark.
    pub pitch_right: u32,
    /// The position of the unit.
    pub position: u32,
}

impl UnitFact {
    /// The only length a `fact` chunk may declare.
    pub const CHUNK_LEN: u32 = 12;

    pub fn new(pitch_left: u32, pitch_right: u32, position: u32) -> Self {
        UnitFact { pitch_left, pitch_right, position }
    }
}

/// A single unit waveform: its metadata and its signed 16-bit samples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitWaveform {
    pub fact: UnitFact,
    pub samples: Vec<i16>,
}

impl UnitWaveform {
    pub fn new(fact: UnitFact, samples: Vec<i16>) -> Self {
        UnitWaveform { fact, samples }
    }

    /// Instantiate a unit from normalized samples in the range [-1.0, 1.0]. Samples outside the
    /// range saturate.
    pub fn from_f64(fact: UnitFact, samples: &[f64]) -> Self {
        let samples = samples.iter().map(|&s| (s.clamp(-1.0, 1.0) * 32_768.0) as i16).collect();
        UnitWaveform { fact, samples }
    }

    /// Gets the samples normalized to the range [-1.0, 1.0).
    pub fn samples_f64(&self) -> Vec<f64> {
        self.samples.iter().map(|&s| f64::from(s) / 32_768.0).collect()
    }

    /// Gets the length in bytes of the unit's `data` chunk payload.
    pub fn data_len(&self) -> u64 {
        2 * self.samples.len() as u64
    }

    /// Gets the duration of the unit in seconds at the given sample rate.
    pub fn duration(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(sample_rate)
    }
}

/// A unit waveform container: one shared format header, and an ordered list of units.
///
/// The order of the units is the order they are stored in, and the order in which they are
/// selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitWaveformContainer {
    pub format: WaveformFormat,
    units: Vec<UnitWaveform>,
}

impl UnitWaveformContainer {
    /// Instantiate an empty container with the given format header.
    pub fn new(format: WaveformFormat) -> Self {
        UnitWaveformContainer { format, units: Vec::new() }
    }

    /// Appends a unit to the end of the container.
    pub fn push(&mut self, unit: UnitWaveform) {
        self.units.push(unit);
    }

    /// Gets the units in container order.
    pub fn units(&self) -> &[UnitWaveform] {
        &self.units
    }

    /// Gets the unit at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&UnitWaveform> {
        self.units.get(index)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, UnitWaveform> {
        self.units.iter()
    }
}

impl Extend<UnitWaveform> for UnitWaveformContainer {
    fn extend<T: IntoIterator<Item = UnitWaveform>>(&mut self, iter: T) {
        self.units.extend(iter)
    }
}

impl IntoIterator for UnitWaveformContainer {
    type Item = UnitWaveform;
    type IntoIter = vec::IntoIter<UnitWaveform>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_iter()
    }
}

impl<'a> IntoIterator for &'a UnitWaveformContainer {
    type Item = &'a UnitWaveform;
    type IntoIter = slice::Iter<'a, UnitWaveform>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}
