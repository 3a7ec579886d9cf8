// Copyright (c) 2026 rezky_nightky

//! Unordered glyph pools for the rain effect.

use crate::error::{FxError, FxResult};

#[derive(Clone, Copy, Debug)]
enum Span {
    Range(u32, u32),
    List(&'static str),
}

const LETTERS: &[Span] = &[Span::Range(0x41, 0x5A), Span::Range(0x61, 0x7A)];
const DIGITS: &[Span] = &[Span::Range(0x30, 0x39)];
const KATAKANA: &[Span] = &[Span::Range(0xFF66, 0xFF9D)];
const HEX: &[Span] = &[Span::Range(0x30, 0x39), Span::Range(0x41, 0x46)];
const PUNCTUATION: &[Span] = &[
    Span::Range(0x21, 0x2F),
    Span::Range(0x3A, 0x40),
    Span::Range(0x5B, 0x60),
    Span::Range(0x7B, 0x7E),
];
const SYMBOLS: &[Span] = &[Span::List("∞∑∫√π∆Ωµλ≈≠≤≥×÷±∂∇∈∉∩∪⊂⊃⊆⊇⊕⊗")];

const POOLS: &[(&str, &[&[Span]], &str)] = &[
    ("matrix", &[LETTERS, DIGITS, KATAKANA], "Letters + digits + katakana"),
    ("ascii", &[LETTERS, DIGITS, PUNCTUATION], "Letters + digits + punctuation"),
    ("binary", &[&[Span::Range(0x30, 0x31)]], "0 and 1"),
    ("digits", &[DIGITS], "Digits only"),
    ("hex", &[HEX], "0-9 and A-F"),
    ("katakana", &[KATAKANA], "Katakana"),
    ("greek", &[&[Span::Range(0x0391, 0x03A9), Span::Range(0x03B1, 0x03C9)]], "Greek letters"),
    ("braille", &[&[Span::Range(0x2801, 0x28FF)]], "Braille patterns"),
    ("runic", &[&[Span::Range(0x16A0, 0x16EA)]], "Runic"),
    ("cyberpunk", &[LETTERS, HEX, KATAKANA, SYMBOLS], "Katakana + hex + symbols"),
    ("dna", &[&[Span::List("ACGT")]], "DNA bases"),
];

pub fn pool_from_str(spec: &str, ascii_only: bool) -> FxResult<Vec<char>> {
    let spec = spec.trim().to_ascii_lowercase();
    let name = match spec.as_str() {
        "auto" if ascii_only => "ascii",
        "auto" => "matrix",
        "bin" | "01" => "binary",
        "dec" | "decimal" => "digits",
        "hexadecimal" => "hex",
        other => other,
    };

    let (_, spans, _) = POOLS
        .iter()
        .find(|(n, _, _)| *n == name)
        .ok_or_else(|| FxError::config(format!("--charset {} (see --list-charsets)", spec)))?;

    let mut out = Vec::new();
    for group in spans.iter() {
        for span in group.iter() {
            match *span {
                Span::Range(a, b) => out.extend((a..=b).filter_map(char::from_u32)),
                Span::List(s) => out.extend(s.chars()),
            }
        }
    }
    if out.is_empty() {
        out.extend(['0', '1']);
    }
    Ok(out)
}

pub fn print_list_charsets() {
    println!("AVAILABLE CHARSETS (rain):");
    println!();
    println!("VALUE        DESCRIPTION");
    println!("{:<12} Auto-select (ascii when LANG is not UTF-8, otherwise matrix)", "auto");
    for (name, _, desc) in POOLS {
        println!("{:<12} {}", name, desc);
    }
}
