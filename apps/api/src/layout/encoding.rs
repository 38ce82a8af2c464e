//! WinAnsiEncoding, the single-byte code page the standard PDF fonts are set in.
//!
//! It is Latin-1 except for 0x80..=0x9F, where Latin-1 has C1 control codes
//! and WinAnsi places typographic punctuation and a handful of extra letters.
//! Characters with no code point here are drawn, and measured, as `?`.

/// Characters at 0x80..=0x9F. `None` marks the five unassigned codes.
pub(crate) const WIN_ANSI_80_9F: [Option<char>; 32] = [
    Some('\u{20AC}'), // 0x80 €
    None,             // 0x81
    Some('\u{201A}'), // 0x82 ‚
    Some('\u{0192}'), // 0x83 ƒ
    Some('\u{201E}'), // 0x84 „
    Some('\u{2026}'), // 0x85 …
    Some('\u{2020}'), // 0x86 †
    Some('\u{2021}'), // 0x87 ‡
    Some('\u{02C6}'), // 0x88 ˆ
    Some('\u{2030}'), // 0x89 ‰
    Some('\u{0160}'), // 0x8A Š
    Some('\u{2039}'), // 0x8B ‹
    Some('\u{0152}'), // 0x8C Œ
    None,             // 0x8D
    Some('\u{017D}'), // 0x8E Ž
    None,             // 0x8F
    None,             // 0x90
    Some('\u{2018}'), // 0x91 ‘
    Some('\u{2019}'), // 0x92 ’
    Some('\u{201C}'), // 0x93 “
    Some('\u{201D}'), // 0x94 ”
    Some('\u{2022}'), // 0x95 •
    Some('\u{2013}'), // 0x96 –
    Some('\u{2014}'), // 0x97 —
    Some('\u{02DC}'), // 0x98 ˜
    Some('\u{2122}'), // 0x99 ™
    Some('\u{0161}'), // 0x9A š
    Some('\u{203A}'), // 0x9B ›
    Some('\u{0153}'), // 0x9C œ
    None,             // 0x9D
    Some('\u{017E}'), // 0x9E ž
    Some('\u{0178}'), // 0x9F Ÿ
];

const REPLACEMENT: u8 = b'?';

/// Code of `c` in WinAnsiEncoding, or `?` when it has none.
///
/// Control characters, including the C1 range U+0080..=U+009F, have no glyph
/// and map to `?` as well. The result is always printable.
pub fn win_ansi_byte(c: char) -> u8 {
    match u32::from(c) {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
        _ => WIN_ANSI_80_9F
            .iter()
            .position(|&mapped| mapped == Some(c))
            .map(|i| 0x80 + i as u8)
            .unwrap_or(REPLACEMENT),
    }
}

/// Encodes a whole string, one byte per character.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}
