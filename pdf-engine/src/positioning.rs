//! Per-character glyph resolution and line measurement.
//!
//! Layout is deliberately simple: one glyph per character, advances
//! summed left to right, no kerning and no ligatures. Characters the
//! font cannot map go through a [`FallbackPolicy`], so the same input
//! always produces the same glyphs and the same width.

use std::str::Chars;

use crate::fonts::BuiltinFont;
use crate::truetype::FontProgram;

/// Anything that can map characters to glyphs and report advances.
pub trait GlyphSource {
    /// Glyph for a character, `None` when the font does not define one.
    fn glyph_for(&self, ch: char) -> Option<u16>;
    /// Advance width in font units.
    fn advance(&self, glyph: u16) -> u16;
    fn units_per_em(&self) -> u16;
    /// Baseline-to-baseline distance for a font size, in points.
    fn line_height(&self, size: f64) -> f64;
}

impl GlyphSource for FontProgram {
    fn glyph_for(&self, ch: char) -> Option<u16> {
        self.glyph_index(ch)
    }

    fn advance(&self, glyph: u16) -> u16 {
        self.advance_width(glyph)
    }

    fn units_per_em(&self) -> u16 {
        FontProgram::units_per_em(self)
    }

    /// Uses ascent - descent.
    fn line_height(&self, size: f64) -> f64 {
        let height = (self.ascent() as i32 - self.descent() as i32) as f64;
        height / FontProgram::units_per_em(self) as f64 * size
    }
}

/// Builtin fonts use their single-byte code as the glyph number.
impl GlyphSource for BuiltinFont {
    fn glyph_for(&self, ch: char) -> Option<u16> {
        self.code_for(ch).map(u16::from)
    }

    fn advance(&self, glyph: u16) -> u16 {
        u8::try_from(glyph).map_or(0, |code| self.code_width(code))
    }

    fn units_per_em(&self) -> u16 {
        1000
    }

    /// 1.2x the font size.
    fn line_height(&self, size: f64) -> f64 {
        size * 1.2
    }
}

/// What to do with a character the font has no glyph for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Use the glyph of another character (a space by default). If that
    /// character is unmapped too, the result is `.notdef`.
    Substitute(char),
    /// Keep glyph 0 (`.notdef`). Rejected by PDF/A validation.
    Notdef,
    /// Drop the character; it takes no space.
    Omit,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        FallbackPolicy::Substitute(' ')
    }
}

/// How a character was turned into a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Mapped,
    /// Replaced by the glyph of the given character.
    Substituted(char),
    /// No glyph available; `.notdef` is shown.
    Notdef,
}

/// One character of a laid-out line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionedGlyph {
    /// The character from the input text.
    pub codepoint: char,
    pub glyph: u16,
    /// Advance in font units.
    pub advance: u16,
    pub resolution: Resolution,
}

impl PositionedGlyph {
    /// False when the glyph is `.notdef`.
    pub fn is_defined(&self) -> bool {
        self.resolution != Resolution::Notdef
    }
}

/// Resolve one character. Returns `None` only under [`FallbackPolicy::Omit`].
pub fn resolve<F: GlyphSource + ?Sized>(
    font: &F,
    ch: char,
    policy: FallbackPolicy,
) -> Option<PositionedGlyph> {
    let (glyph, resolution) = match font.glyph_for(ch) {
        Some(glyph) => (glyph, Resolution::Mapped),
        None => match policy {
            FallbackPolicy::Omit => return None,
            FallbackPolicy::Notdef => (0, Resolution::Notdef),
            FallbackPolicy::Substitute(sub) => match font.glyph_for(sub) {
                Some(glyph) => (glyph, Resolution::Substituted(sub)),
                None => (0, Resolution::Notdef),
            },
        },
    };
    Some(PositionedGlyph {
        codepoint: ch,
        glyph,
        advance: font.advance(glyph),
        resolution,
    })
}

/// Lazy sequence of positioned glyphs for a string. Cloning restarts
/// from the clone's current position.
pub struct Positions<'a, F: ?Sized> {
    font: &'a F,
    chars: Chars<'a>,
    policy: FallbackPolicy,
}

impl<F: ?Sized> Clone for Positions<'_, F> {
    fn clone(&self) -> Self {
        Positions {
            font: self.font,
            chars: self.chars.clone(),
            policy: self.policy,
        }
    }
}

impl<F: GlyphSource + ?Sized> Iterator for Positions<'_, F> {
    type Item = PositionedGlyph;

    fn next(&mut self) -> Option<PositionedGlyph> {
        loop {
            let ch = self.chars.next()?;
            if let Some(glyph) = resolve(self.font, ch, self.policy) {
                return Some(glyph);
            }
        }
    }
}

pub fn positions<'a, F: GlyphSource + ?Sized>(
    font: &'a F,
    text: &'a str,
    policy: FallbackPolicy,
) -> Positions<'a, F> {
    Positions {
        font,
        chars: text.chars(),
        policy,
    }
}

/// Width of `text` in points at `size`.
pub fn measure<F: GlyphSource + ?Sized>(
    font: &F,
    text: &str,
    size: f64,
    policy: FallbackPolicy,
) -> f64 {
    let units: u64 = positions(font, text, policy)
        .map(|g| g.advance as u64)
        .sum();
    units as f64 * size / font.units_per_em() as f64
}

/// Width in font units that an unmapped character contributes.
pub fn fallback_advance<F: GlyphSource + ?Sized>(font: &F, policy: FallbackPolicy) -> u16 {
    match policy {
        FallbackPolicy::Omit => 0,
        FallbackPolicy::Notdef => font.advance(0),
        FallbackPolicy::Substitute(sub) => font.advance(font.glyph_for(sub).unwrap_or(0)),
    }
}
