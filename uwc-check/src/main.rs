// Symphonia UWC Check Tool
// Copyright (c) 2019-2026 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use uwc_format::{
    decode_bytes, encode, is_uwc_bytes, is_uwc_file, load_with, DecodeOptions, Diagnostic,
    NullSink, Result, UnitWaveformContainer,
};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{info, warn};
use serde::Serialize;

#[derive(Serialize)]
struct FormatSummary {
    n_channels: u16,
    sample_rate: u32,
    avg_bytes_per_sec: u32,
    block_align: u16,
    bits_per_sample: u16,
    lobe_size: u16,
    repeat_start: u32,
    f0: f32,
}

#[derive(Serialize)]
struct UnitSummary {
    index: usize,
    pitch_left: u32,
    pitch_right: u32,
    position: u32,
    n_samples: usize,
}

#[derive(Serialize)]
struct ContainerSummary {
    path: String,
    format: FormatSummary,
    units: Vec<UnitSummary>,
    diagnostics: Vec<String>,
}

fn summarize(path: &Path, uwc: &UnitWaveformContainer, diags: &[Diagnostic]) -> ContainerSummary {
    let format = &uwc.format;

    ContainerSummary {
        path: path.display().to_string(),
        format: FormatSummary {
            n_channels: format.n_channels,
            sample_rate: format.sample_rate,
            avg_bytes_per_sec: format.avg_bytes_per_sec,
            block_align: format.block_align,
            bits_per_sample: format.bits_per_sample,
            lobe_size: format.lobe_size,
            repeat_start: format.repeat_start,
            f0: format.f0,
        },
        units: uwc
            .iter()
            .enumerate()
            .map(|(index, unit)| UnitSummary {
                index,
                pitch_left: unit.fact.pitch_left,
                pitch_right: unit.fact.pitch_right,
                position: unit.fact.position,
                n_samples: unit.samples.len(),
            })
            .collect(),
        diagnostics: diags.iter().map(|diag| diag.to_string()).collect(),
    }
}

fn print_summary(summary: &ContainerSummary) {
    let format = &summary.format;

    println!("Input Path: {}", summary.path);
    println!();
    println!("Format");
    println!("=================================================");
    println!("  Channels:          {:>12}", format.n_channels);
    println!("  Sample Rate:       {:>12}", format.sample_rate);
    println!("  Bytes/Second:      {:>12}", format.avg_bytes_per_sec);
    println!("  Block Align:       {:>12}", format.block_align);
    println!("  Bits/Sample:       {:>12}", format.bits_per_sample);
    println!("  Lobe Size:         {:>12}", format.lobe_size);
    println!("  Repeat Start:      {:>12}", format.repeat_start);
    println!("  F0:                {:>12.3}", format.f0);
    println!();
    println!("Units ({})", summary.units.len());
    println!("=================================================");
    println!("  {:>6} {:>10} {:>10} {:>10} {:>10}", "#", "Left", "Right", "Position", "Samples");

    for unit in &summary.units {
        println!(
            "  {:>6} {:>10} {:>10} {:>10} {:>10}",
            unit.index, unit.pitch_left, unit.pitch_right, unit.position, unit.n_samples
        );
    }

    if !summary.diagnostics.is_empty() {
        println!();
        println!("Diagnostics ({})", summary.diagnostics.len());
        println!("=================================================");

        for diag in &summary.diagnostics {
            println!("  {}", diag);
        }
    }
}

/// The outcome of decoding a container, re-encoding it, and decoding it again.
#[derive(Debug, PartialEq, Eq)]
enum VerifyResult {
    Pass,
    NotUwc,
    RiffLenMismatch { riff_len: u32, expected: u64 },
    Mismatch,
}

fn verify_buf(buf: &[u8], opts: &DecodeOptions) -> Result<VerifyResult> {
    if !is_uwc_bytes(buf) {
        return Ok(VerifyResult::NotUwc);
    }

    let mut diags: Vec<Diagnostic> = Vec::new();
    let uwc = decode_bytes(buf, opts, &mut diags)?;

    for diag in &diags {
        warn!("{}", diag);
    }

    let mut cursor = Cursor::new(Vec::new());
    encode(&mut cursor, &uwc)?;

    let reencoded = cursor.into_inner();
    let decoded = decode_bytes(&reencoded, opts, &mut NullSink)?;

    if decoded != uwc {
        return Ok(VerifyResult::Mismatch);
    }

    // The RIFF length of the input is checked last, so that a stale length does not hide a
    // mismatch.
    let riff_len = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let expected = buf.len() as u64 - 8;

    if u64::from(riff_len) != expected {
        return Ok(VerifyResult::RiffLenMismatch { riff_len, expected });
    }

    info!("verified {} units", uwc.len());

    Ok(VerifyResult::Pass)
}

fn decode_options(matches: &ArgMatches) -> DecodeOptions {
    DecodeOptions {
        max_data_len: matches.get_one::<u32>("max-data-len").copied(),
        trust_riff_len: matches.get_flag("trust-riff-len"),
    }
}

fn run_probe(matches: &ArgMatches) -> i32 {
    let mut ret = 0;

    for path in matches.get_many::<PathBuf>("INPUT").into_iter().flatten() {
        if is_uwc_file(path) {
            println!("{}: uwc", path.display());
        }
        else {
            println!("{}: not a uwc file", path.display());
            ret = 1;
        }
    }

    ret
}

fn run_dump(matches: &ArgMatches) -> Result<i32> {
    let path = match matches.get_one::<PathBuf>("INPUT") {
        Some(path) => path,
        None => return Ok(2),
    };

    if !is_uwc_file(path) {
        eprintln!("{}: not a uwc file", path.display());
        return Ok(1);
    }

    let mut diags: Vec<Diagnostic> = Vec::new();
    let uwc = load_with(path, &decode_options(matches), &mut diags)?;

    let summary = summarize(path, &uwc, &diags);

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("Could not serialize summary: {}", err);
                return Ok(2);
            }
        }
    }
    else {
        print_summary(&summary);
    }

    Ok(0)
}

fn run_verify(matches: &ArgMatches) -> Result<i32> {
    let path = match matches.get_one::<PathBuf>("INPUT") {
        Some(path) => path,
        None => return Ok(2),
    };

    println!("Input Path: {}", path.display());
    println!();

    let buf = fs::read(path)?;

    let ret = match verify_buf(&buf, &decode_options(matches))? {
        VerifyResult::Pass => {
            println!("PASS");
            0
        }
        VerifyResult::NotUwc => {
            println!("FAIL (not a uwc file)");
            1
        }
        VerifyResult::RiffLenMismatch { riff_len, expected } => {
            println!("FAIL (riff length is {}, expected {})", riff_len, expected);
            1
        }
        VerifyResult::Mismatch => {
            println!("FAIL (re-encoded container differs)");
            1
        }
    };

    Ok(ret)
}

fn decode_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("max-data-len")
            .long("max-data-len")
            .value_name("BYTES")
            .value_parser(value_parser!(u32))
            .help("Skip data chunks larger than this many bytes"),
    )
    .arg(
        Arg::new("trust-riff-len")
            .long("trust-riff-len")
            .action(ArgAction::SetTrue)
            .help("Stop scanning at the end of the RIFF chunk instead of the end of the file"),
    )
}

fn input_arg() -> Arg {
    Arg::new("INPUT")
        .help("The input file path")
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

fn build_cli() -> Command {
    Command::new("UWC Check")
        .version("1.0")
        .author("Philip Deljanov <philip.deljanov@gmail.com>")
        .about("Inspect and verify Unit Waveform Cache files")
        .subcommand_required(true)
        .subcommand(
            Command::new("probe")
                .about("Check if files are unit waveform containers")
                .arg(input_arg().num_args(1..)),
        )
        .subcommand(decode_args(
            Command::new("dump")
                .about("Print the format header and units of a container")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print a JSON summary"),
                )
                .arg(input_arg()),
        ))
        .subcommand(decode_args(
            Command::new("verify")
                .about("Check that a container re-encodes to the same units")
                .arg(input_arg()),
        ))
}

fn main() {
    pretty_env_logger::init();

    let matches = build_cli().get_matches();

    let res = match matches.subcommand() {
        Some(("probe", sub)) => Ok(run_probe(sub)),
        Some(("dump", sub)) => run_dump(sub),
        Some(("verify", sub)) => run_verify(sub),
        // A subcommand is required, and all subcommands are matched above.
        _ => unreachable!(),
    };

    let ret = match res {
        Ok(ret) => ret,
        Err(err) => {
            eprintln!("Check interrupted by error: {}", err);
            2
        }
    };

    std::process::exit(ret)
}

#[cfg(test)]
mod tests {
    use uwc_format::{UnitFact, UnitWaveform, WaveformFormat};

    use super::*;

    fn test_container() -> UnitWaveformContainer {
        let mut uwc = UnitWaveformContainer::new(WaveformFormat::mono_16bit(16_000));
        uwc.push(UnitWaveform::new(UnitFact::new(1, 2, 3), vec![1, 2, 3]));
        uwc.push(UnitWaveform::new(UnitFact::new(4, 5, 6), vec![-4]));
        uwc
    }

    fn encode_to_vec(uwc: &UnitWaveformContainer) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        encode(&mut cursor, uwc).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn verify_cli() {
        build_cli().debug_assert();
    }

    #[test]
    fn verify_pass() {
        let buf = encode_to_vec(&test_container());
        assert_eq!(verify_buf(&buf, &Default::default()).unwrap(), VerifyResult::Pass);
    }

    #[test]
    fn verify_pass_with_nan_f0() {
        let mut uwc = test_container();
        uwc.format.f0 = f32::NAN;

        let buf = encode_to_vec(&uwc);
        assert_eq!(verify_buf(&buf, &Default::default()).unwrap(), VerifyResult::Pass);
    }

    #[test]
    fn verify_failures() {
        assert_eq!(verify_buf(b"RIFF", &Default::default()).unwrap(), VerifyResult::NotUwc);

        let mut buf = encode_to_vec(&test_container());
        buf[4..8].copy_from_slice(&0u32.to_le_bytes());

        assert_eq!(
            verify_buf(&buf, &Default::default()).unwrap(),
            VerifyResult::RiffLenMismatch { riff_len: 0, expected: buf.len() as u64 - 8 }
        );
    }

    #[test]
    fn verify_summary_json() {
        let uwc = test_container();
        let diags = vec![Diagnostic::MalformedFact { pos: 48, len: 16 }];

        let summary = summarize(Path::new("a.uwc"), &uwc, &diags);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["format"]["sample_rate"], 16_000);
        assert_eq!(json["units"][1]["position"], 6);
        assert_eq!(json["units"][0]["n_samples"], 3);
        assert_eq!(json["diagnostics"][0], "malformed fact chunk at 48: skipped 16 bytes");
    }
}
