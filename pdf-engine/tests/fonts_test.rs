use pdf_engine::{BuiltinFont, Document, DocumentOptions, PageSize};

fn doc() -> Document<Vec<u8>> {
    Document::new(Vec::new(), DocumentOptions::default().with_compression(false))
}

#[test]
fn measure_text_hello() {
    // H=722, e=556, l=222, l=222, o=556 => total = 2278
    // At 12pt: 2278 * 12 / 1000 = 27.336
    let mut doc = doc();
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();
    let w = doc.measure(font, "Hello").unwrap();
    assert!((w - 27.336).abs() < 1e-9, "{w}");
}

#[test]
fn bold_is_wider() {
    let mut doc = doc();
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).unwrap();
    let text = "Bold text";
    assert!(doc.measure(bold, text).unwrap() > doc.measure(regular, text).unwrap());
}

#[test]
fn courier_is_monospaced() {
    let mut doc = doc();
    let font = doc.add_builtin_font(BuiltinFont::Courier).unwrap();
    doc.set_font_size(font, 10.0).unwrap();
    assert_eq!(doc.measure(font, "iiii").unwrap(), 24.0);
    assert_eq!(doc.measure(font, "WWWW").unwrap(), 24.0);
}

#[test]
fn builtin_font_object_is_type1() {
    let mut doc = doc();
    let font = doc.add_builtin_font(BuiltinFont::TimesRoman).unwrap();
    let page = doc.add_page(PageSize::LETTER).unwrap();
    doc.draw_text(page, font, "Plain", 72.0, 720.0).unwrap();
    doc.complete().unwrap();

    let bytes = doc.into_inner();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("/Subtype /Type1"));
    assert!(output.contains("/BaseFont /Times-Roman"));
    assert!(output.contains("/Encoding /WinAnsiEncoding"));
    assert!(output.contains("(Plain) Tj"));
    assert!(!output.contains("/FontFile"));
}
