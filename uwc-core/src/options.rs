// Symphonia UWC
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `options` module defines the options that tune decoding.

/// `DecodeOptions` is a common set of options that the container decoder uses.
#[derive(Copy, Clone, Debug)]
pub struct DecodeOptions {
    /// The largest `data` chunk payload, in bytes, that will be read into memory. A larger chunk
    /// is skipped and its unit dropped. When `None`, a chunk is bounded only by the length of the
    /// stream. Default: `None`.
    pub max_data_len: Option<u32>,
    /// Stop scanning for units at the end of the span declared by the RIFF size field rather than
    /// at the end of the stream. Default: `false`.
    ///
    /// Note: Writers that fail part way through leave a stale size field behind, so trusting it can
    /// hide units that are otherwise complete.
    pub trust_riff_len: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { max_data_len: None, trust_riff_len: false }
    }
}
