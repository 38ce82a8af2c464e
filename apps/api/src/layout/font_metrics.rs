//! Static font-metric tables for the two standard PDF faces Stapler renders with.
//!
//! Widths are the Adobe AFM advance widths for Helvetica and Helvetica-Bold,
//! in 1/1000 em. These are the exact metrics a PDF viewer uses for the
//! standard-14 fonts, so a line measured here renders at the measured width.
//! Characters are measured by their WinAnsiEncoding byte (see `encoding.rs`),
//! the same byte the PDF writer emits, so an unmappable character is measured
//! as the `?` it will be drawn as.

use serde::{Deserialize, Serialize};

use crate::layout::encoding::win_ansi_byte;

// ────────────────────────────────────────────────────────────────────────────
// Font face enum
// ────────────────────────────────────────────────────────────────────────────

/// The faces a text run can be set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    /// Body text and footers.
    Regular,
    /// Titles and syntactic headings.
    Bold,
}

impl FontFace {
    /// PostScript name of the standard-14 font backing this face.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }

    /// Resource name used in page content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font face.
///
/// `ascii[i]` = advance width of byte `(i + 0x20)`, covering 0x20 (space)
/// through 0x7E (~). `upper[i]` = advance width of byte `(i + 0x80)`.
///
/// ASCII slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    ascii: [u16; 95],
    upper: [u16; 128],
}

impl FontMetricTable {
    /// Advance width of a single character in 1/1000 em.
    pub fn char_width(&self, c: char) -> u16 {
        match win_ansi_byte(c) {
            byte @ 0x80..=0xFF => self.upper[usize::from(byte - 0x80)],
            byte @ 0x20..=0x7E => self.ascii[usize::from(byte - 0x20)],
            // win_ansi_byte never yields control codes
            _ => self.ascii[usize::from(b'?' - 0x20)],
        }
    }

    /// Rendered width of `s` in layout units at `size`.
    pub fn measure_str(&self, s: &str, size: f32) -> f32 {
        let units: u32 = s.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size / 1000.0
    }
}

/// Returns the static metric table for a face.
pub fn get_metrics(face: FontFace) -> &'static FontMetricTable {
    match face {
        FontFace::Regular => &HELVETICA_TABLE,
        FontFace::Bold => &HELVETICA_BOLD_TABLE,
    }
}

/// Rendered width of `text` in `face` at `size`, in layout units.
pub fn measure(face: FontFace, text: &str, size: f32) -> f32 {
    get_metrics(face).measure_str(text, size)
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable + 128 upper WinAnsi bytes each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    ascii: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    #[rustfmt::skip]
    upper: [
        // 0x80: €   -    ‚    ƒ    „    …    †    ‡    ˆ    ‰    Š    ‹    Œ    -    Ž    -
        556,   0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000,  0, 611,   0,
        // 0x90: -   ‘    ’    “    ”    •    –    —    ˜    ™    š    ›    œ    -    ž    Ÿ
          0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944,   0, 500, 667,
        // 0xA0: nbsp ¡   ¢    £    ¤    ¥    ¦    §    ¨    ©    ª    «    ¬    shy  ®    ¯
        278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
        // 0xB0: °   ±    ²    ³    ´    µ    ¶    ·    ¸    ¹    º    »    ¼    ½    ¾    ¿
        400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
        // 0xC0: À   Á    Â    Ã    Ä    Å    Æ    Ç    È    É    Ê    Ë    Ì    Í    Î    Ï
        667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
        // 0xD0: Ð   Ñ    Ò    Ó    Ô    Õ    Ö    ×    Ø    Ù    Ú    Û    Ü    Ý    Þ    ß
        722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
        // 0xE0: à   á    â    ã    ä    å    æ    ç    è    é    ê    ë    ì    í    î    ï
        556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
        // 0xF0: ð   ñ    ò    ó    ô    õ    ö    ÷    ø    ù    ú    û    ü    ý    þ    ÿ
        556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
    ],
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    ascii: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    #[rustfmt::skip]
    upper: [
        // 0x80: €   -    ‚    ƒ    „    …    †    ‡    ˆ    ‰    Š    ‹    Œ    -    Ž    -
        556,   0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000,  0, 611,   0,
        // 0x90: -   ‘    ’    “    ”    •    –    —    ˜    ™    š    ›    œ    -    ž    Ÿ
          0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944,   0, 500, 667,
        // 0xA0: nbsp ¡   ¢    £    ¤    ¥    ¦    §    ¨    ©    ª    «    ¬    shy  ®    ¯
        278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
        // 0xB0: °   ±    ²    ³    ´    µ    ¶    ·    ¸    ¹    º    »    ¼    ½    ¾    ¿
        400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
        // 0xC0: À   Á    Â    Ã    Ä    Å    Æ    Ç    È    É    Ê    Ë    Ì    Í    Î    Ï
        722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
        // 0xD0: Ð   Ñ    Ò    Ó    Ô    Õ    Ö    ×    Ø    Ù    Ú    Û    Ü    Ý    Þ    ß
        722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
        // 0xE0: à   á    â    ã    ä    å    æ    ç    è    é    ê    ë    ì    í    î    ï
        556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
        // 0xF0: ð   ñ    ò    ó    ô    õ    ö    ÷    ø    ù    ú    û    ü    ý    þ    ÿ
        611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
    ],
};

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
