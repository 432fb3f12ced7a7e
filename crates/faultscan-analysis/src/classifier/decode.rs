//! Source decoding with a fixed probe order.
//!
//! UTF-8 first (a leading BOM is dropped), then UTF-16 when a byte-order mark
//! announces it, then Windows-1252. Windows-1252 leaves five bytes
//! undefined, so arbitrary binary data can still fail every probe.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Windows1252 => "windows-1252",
        })
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// How far into a file the binary sniff looks.
const SNIFF_LEN: usize = 8192;

/// Windows-1252 mappings for 0x80..=0x9F; `None` marks undefined bytes.
#[rustfmt::skip]
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// Decode with the first encoding that accepts `bytes`.
pub fn decode(bytes: &[u8]) -> Option<(String, SourceEncoding)> {
    if let Ok(text) = std::str::from_utf8(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)) {
        return Some((text.to_string(), SourceEncoding::Utf8));
    }
    if let Some(body) = bytes.strip_prefix(UTF16LE_BOM) {
        if let Some(text) = decode_utf16(body, u16::from_le_bytes) {
            return Some((text, SourceEncoding::Utf16Le));
        }
    }
    if let Some(body) = bytes.strip_prefix(UTF16BE_BOM) {
        if let Some(text) = decode_utf16(body, u16::from_be_bytes) {
            return Some((text, SourceEncoding::Utf16Be));
        }
    }
    decode_windows_1252(bytes).map(|text| (text, SourceEncoding::Windows1252))
}

/// NUL bytes near the start of a file that does not announce UTF-16.
pub fn looks_binary(bytes: &[u8]) -> bool {
    if bytes.starts_with(UTF16LE_BOM) || bytes.starts_with(UTF16BE_BOM) {
        return false;
    }
    bytes[..bytes.len().min(SNIFF_LEN)].contains(&0)
}

fn decode_utf16(body: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if body.len() % 2 != 0 {
        return None;
    }
    let units = body.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

fn decode_windows_1252(bytes: &[u8]) -> Option<String> {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[usize::from(b - 0x80)],
            _ => Some(char::from(b)),
        })
        .collect()
}
