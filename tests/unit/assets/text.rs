use super::*;

/// Every glyph is half an em wide.
struct Mono;

impl TextShaper for Mono {
    fn advance(&self, font: &str, _ch: char, size: f32) -> Option<f32> {
        (font == "mono").then_some(size * 0.5)
    }

    fn outline(&self, _font: &str, _ch: char, _size: f32) -> Option<BezPath> {
        None
    }
}

fn line_text(l: &TextLine) -> String {
    l.chars.iter().map(|(c, _)| *c).collect()
}

#[test]
fn explicit_newlines_always_break() {
    let lines = layout_lines(&Mono, "mono", "ab\ncd", 10.0, 0.0, None).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(line_text(&lines[0]), "ab");
    assert_eq!(lines[1].width, 10.0);
}

#[test]
fn words_wrap_without_leading_space() {
    // 5px per glyph: "hello world" is 55px; the box fits 30px.
    let lines = layout_lines(&Mono, "mono", "hello world", 10.0, 0.0, Some(30.0)).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(line_text(&lines[0]), "hello");
    assert_eq!(line_text(&lines[1]), "world");
    assert_eq!(lines[1].width, 25.0);
}

#[test]
fn overlong_single_word_stays_on_its_line() {
    let lines = layout_lines(&Mono, "mono", "abcdefgh", 10.0, 0.0, Some(10.0)).unwrap();
    assert_eq!(lines.len(), 1);
}

#[test]
fn letter_spacing_widens_every_advance() {
    let lines = layout_lines(&Mono, "mono", "abc", 10.0, 2.0, None).unwrap();
    assert_eq!(lines[0].width, 21.0);
}

#[test]
fn unknown_font_yields_none() {
    assert!(layout_lines(&Mono, "serif", "abc", 10.0, 0.0, None).is_none());
    assert!(layout_lines(&NoFonts, "mono", "abc", 10.0, 0.0, None).is_none());
}

#[test]
fn block_measure_uses_widest_line() {
    let lines = layout_lines(&Mono, "mono", "a\nabc", 10.0, 0.0, None).unwrap();
    assert_eq!(measure_block(&lines, 12.0), (15.0, 24.0));
}
