/// Standard PDF fonts that viewers supply themselves. They are never
/// embedded, so a PDF/A document may not use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    Courier,
}

impl BuiltinFont {
    /// The PDF `/BaseFont` name (e.g. "Helvetica", "Times-Roman").
    pub fn base_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::TimesRoman => "Times-Roman",
            BuiltinFont::Courier => "Courier",
        }
    }

    /// Single-byte code for a character. Only printable ASCII is
    /// covered by the width tables.
    pub fn code_for(&self, ch: char) -> Option<u8> {
        match ch as u32 {
            code @ 32..=126 => Some(code as u8),
            _ => None,
        }
    }

    /// Width of a character code in 1/1000 em.
    pub fn code_width(&self, code: u8) -> u16 {
        if !(32..=126).contains(&code) {
            return 0;
        }
        let table = match self {
            BuiltinFont::Helvetica => &HELVETICA_WIDTHS,
            BuiltinFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
            BuiltinFont::TimesRoman => &TIMES_ROMAN_WIDTHS,
            BuiltinFont::Courier => return COURIER_WIDTH,
        };
        table[(code - 32) as usize]
    }
}

/// Courier is monospaced.
const COURIER_WIDTH: u16 = 600;

// Widths for ASCII 32..=126 in 1/1000 em, from the Adobe AFM files.

const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];
