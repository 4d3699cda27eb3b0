use crate::foundation::core::BezPath;

/// External glyph metrics and outlines.
///
/// scenecast never shapes text itself; a shaper backed by a real font stack supplies per-character
/// advances and outlines. Returning `None` means the font (or glyph) is unavailable and the text
/// renders empty.
pub trait TextShaper: Send + Sync {
    /// Horizontal advance of `ch` at `size` pixels.
    fn advance(&self, font: &str, ch: char, size: f32) -> Option<f32>;

    /// Outline of `ch` at `size` pixels, with the em box top-left at the origin.
    fn outline(&self, font: &str, ch: char, size: f32) -> Option<BezPath>;
}

/// Shaper that knows no fonts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFonts;

impl TextShaper for NoFonts {
    fn advance(&self, _font: &str, _ch: char, _size: f32) -> Option<f32> {
        None
    }

    fn outline(&self, _font: &str, _ch: char, _size: f32) -> Option<BezPath> {
        None
    }
}

/// One laid-out line: characters with their advances (letter spacing included).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLine {
    /// Characters and advances in visual order.
    pub chars: Vec<(char, f32)>,
    /// Sum of advances.
    pub width: f32,
}

/// Break `text` into lines.
///
/// Explicit `\n` always breaks. Words (split on spaces) are appended greedily; a word that would
/// push a non-empty line past `max_width` starts the next line without its leading space.
/// Returns `None` when the shaper has no metrics for the font.
pub fn layout_lines(
    shaper: &dyn TextShaper,
    font: &str,
    text: &str,
    size: f32,
    letter_spacing: f32,
    max_width: Option<f32>,
) -> Option<Vec<TextLine>> {
    let wrap_width = max_width.filter(|w| *w > 0.0).unwrap_or(f32::MAX);
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let mut current = TextLine::default();
        for (i, word) in raw_line.split(' ').enumerate() {
            let mut word_chars = Vec::with_capacity(word.len() + 1);
            let mut word_width = 0.0;
            let lead = if i == 0 { None } else { Some(' ') };
            for ch in lead.into_iter().chain(word.chars()) {
                let adv = shaper.advance(font, ch, size)? + letter_spacing;
                word_chars.push((ch, adv));
                word_width += adv;
            }

            if current.width + word_width > wrap_width && !current.chars.is_empty() {
                lines.push(std::mem::take(&mut current));
                let skip = usize::from(lead.is_some());
                current.chars = word_chars.into_iter().skip(skip).collect();
                current.width = current.chars.iter().map(|(_, a)| a).sum();
            } else {
                current.chars.extend(word_chars);
                current.width += word_width;
            }
        }
        lines.push(current);
    }
    Some(lines)
}

/// Size of the laid-out block: widest line by `line_count * line_height`.
pub fn measure_block(lines: &[TextLine], line_height: f32) -> (f32, f32) {
    let w = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
    (w, lines.len() as f32 * line_height)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
