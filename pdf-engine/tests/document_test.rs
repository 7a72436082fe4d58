mod common;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use common::{ascii_font, fixed_date, greek_font};
use pdf_engine::{
    BuiltinFont, Document, DocumentOptions, DocumentState, FontHandle, FontProgram, PageHandle,
    PageSize, PdfError, PdfReader,
};

fn doc() -> Document<Vec<u8>> {
    Document::new(Vec::new(), DocumentOptions::default().with_compression(false))
}

#[test]
fn create_empty_document() {
    let mut doc = doc();
    doc.add_page(PageSize::LETTER).unwrap();
    doc.complete().unwrap();
    let bytes = doc.into_inner();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.starts_with("%PDF-1.7\n"));
    assert!(output.contains("/MediaBox [0 0 612 792]"));
    assert!(output.ends_with("%%EOF\n"));
}

#[test]
fn handles_are_issued_in_order() {
    let mut doc = doc();
    let f1 = doc.load_font(ascii_font()).unwrap();
    let f2 = doc.add_builtin_font(BuiltinFont::Courier).unwrap();
    let p1 = doc.add_page(PageSize::A4).unwrap();
    let p2 = doc.add_page(PageSize::A4.landscape()).unwrap();
    assert_eq!((f1, f2), (FontHandle(0), FontHandle(1)));
    assert_eq!((p1, p2), (PageHandle(0), PageHandle(1)));
    assert_eq!(doc.font(f2).unwrap().resource_name(), "F2");
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.page(p2).unwrap().size(), PageSize::new(841.89, 595.28));
}

#[test]
fn object_ids_are_monotonic() {
    let mut doc = doc();
    let f1 = doc.load_font(ascii_font()).unwrap();
    let p1 = doc.add_page(PageSize::A4).unwrap();
    let f2 = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();
    let p2 = doc.add_page(PageSize::A4).unwrap();

    let ids = [
        doc.font(f1).unwrap().object_id(),
        doc.page(p1).unwrap().object_id(),
        doc.font(f2).unwrap().object_id(),
        doc.page(p2).unwrap().object_id(),
    ];
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "{ids:?}");
    // Catalog, page tree and info come first.
    assert_eq!(ids[0].0, 4);
}

#[test]
fn set_font_size_is_not_retroactive() {
    let mut doc = doc();
    let font = doc.load_font(ascii_font()).unwrap();
    let page = doc.add_page(PageSize::LETTER).unwrap();
    assert_eq!(doc.font_size(font).unwrap(), 12.0);

    doc.set_font_size(font, 15.0).unwrap();
    doc.draw_text(page, font, "first", 70.0, 94.0).unwrap();
    doc.set_font_size(font, 9.0).unwrap();
    doc.draw_text(page, font, "second", 70.0, 118.0).unwrap();

    let sizes: Vec<f64> = doc
        .page(page)
        .unwrap()
        .content()
        .text_runs()
        .map(|r| r.size)
        .collect();
    assert_eq!(sizes, vec![15.0, 9.0]);
}

#[test]
fn invalid_font_size_is_rejected() {
    let mut doc = doc();
    let font = doc.load_font(ascii_font()).unwrap();
    for size in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            doc.set_font_size(font, size),
            Err(PdfError::InvalidArgument(_))
        ));
    }
    assert_eq!(doc.font_size(font).unwrap(), 12.0);
}

#[test]
fn foreign_handles_are_broken_references() {
    let mut doc = doc();
    let page = doc.add_page(PageSize::LETTER).unwrap();
    let err = doc.draw_text(page, FontHandle(7), "x", 0.0, 0.0).unwrap_err();
    match err {
        PdfError::BrokenReference { id, .. } => assert_eq!(id, "font #7"),
        other => panic!("unexpected error {other:?}"),
    }

    let font = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();
    let err = doc.draw_text(PageHandle(3), font, "x", 0.0, 0.0).unwrap_err();
    assert!(matches!(err, PdfError::BrokenReference { .. }));
    assert!(matches!(
        doc.set_font_size(FontHandle(9), 10.0),
        Err(PdfError::BrokenReference { .. })
    ));
}

#[test]
fn invalid_page_size_is_rejected() {
    let mut doc = doc();
    assert!(matches!(
        doc.add_page(PageSize::new(0.0, 792.0)),
        Err(PdfError::InvalidArgument(_))
    ));
    assert_eq!(doc.page_count(), 0);
}

#[test]
fn mutations_after_complete_are_rejected() {
    let mut doc = doc();
    let font = doc.load_font(ascii_font()).unwrap();
    let page = doc.add_page(PageSize::LETTER).unwrap();
    doc.complete().unwrap();
    assert_eq!(doc.state(), DocumentState::Closed);
    assert!(doc.is_finalized());

    let before = doc.to_bytes().unwrap();
    assert!(matches!(doc.complete(), Err(PdfError::AlreadyFinalized)));
    assert!(matches!(
        doc.draw_text(page, font, "late", 1.0, 1.0),
        Err(PdfError::AlreadyFinalized)
    ));
    assert!(matches!(doc.add_page(PageSize::LETTER), Err(PdfError::AlreadyFinalized)));
    assert!(matches!(doc.load_font(ascii_font()), Err(PdfError::AlreadyFinalized)));
    assert!(matches!(doc.set_font_size(font, 8.0), Err(PdfError::AlreadyFinalized)));
    assert!(matches!(doc.set_title("late"), Err(PdfError::AlreadyFinalized)));
    assert_eq!(doc.to_bytes().unwrap(), before);
}

#[test]
fn nothing_reaches_the_sink_before_complete() {
    struct CountingWriter(Arc<Mutex<usize>>);

    impl Write for CountingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            *self.0.lock().unwrap() += buf.len();
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let count = Arc::new(Mutex::new(0));
    let mut doc = Document::new(CountingWriter(count.clone()), DocumentOptions::default());
    let font = doc.load_font(ascii_font()).unwrap();
    let page = doc.add_page(PageSize::LETTER).unwrap();
    doc.draw_text(page, font, "Hello", 72.0, 720.0).unwrap();
    assert_eq!(*count.lock().unwrap(), 0);

    doc.complete().unwrap();
    assert!(*count.lock().unwrap() > 0);
}

#[test]
fn sink_failure_is_reported_and_closes_document() {
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut doc = Document::new(FailingWriter, DocumentOptions::default());
    doc.add_page(PageSize::LETTER).unwrap();
    match doc.complete() {
        Err(PdfError::SinkIo(e)) => assert_eq!(e.to_string(), "disk full"),
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(doc.state(), DocumentState::Closed);
}

#[test]
fn set_info_appears_in_output() {
    let mut doc = doc();
    doc.set_title("Test Doc")
        .unwrap()
        .set_author("Ada")
        .unwrap()
        .set_creator("pdf-engine tests")
        .unwrap()
        .set_creation_date(Some(fixed_date()))
        .unwrap();
    doc.add_page(PageSize::LETTER).unwrap();
    doc.complete().unwrap();
    let bytes = doc.into_inner();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("/Title (Test Doc)"));
    assert!(output.contains("/Author (Ada)"));
    assert!(output.contains("/Creator (pdf-engine tests)"));
    assert!(output.contains("/CreationDate (D:20240517093000+01'00')"));
    assert!(output.contains("/Producer (pdf-engine "));
}

#[test]
fn non_ascii_title_is_utf16() {
    let mut doc = doc();
    doc.set_title("Ωmega").unwrap();
    let bytes = doc.to_bytes().unwrap();
    let output = String::from_utf8_lossy(&bytes);
    assert!(output.contains("/Title <FEFF03A9006D006500670061>"));
}

#[test]
fn create_writes_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let mut doc = Document::create(&path, DocumentOptions::default()).unwrap();
    let font = doc.load_font(ascii_font()).unwrap();
    let page = doc.add_page(PageSize::LETTER).unwrap();
    doc.draw_text(page, font, "On disk", 72.0, 720.0).unwrap();
    doc.complete().unwrap();
    drop(doc);

    let reader = PdfReader::open(&path).unwrap();
    assert_eq!(reader.page_count(), 1);
    assert_eq!(reader.page_text(0).unwrap().len(), 1);
}

#[test]
fn load_font_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("greek.ttf");
    std::fs::write(&path, greek_font()).unwrap();
    let mut doc = doc();
    let font = doc.load_font_file(&path).unwrap();
    assert_eq!(doc.measure(font, "\u{3A3}").unwrap(), 650.0 * 12.0 / 1000.0);
}

#[test]
fn fonts_parse_in_parallel_and_document_is_shared_behind_mutex() {
    let handles: Vec<_> = [ascii_font(), greek_font()]
        .into_iter()
        .map(|bytes| thread::spawn(move || FontProgram::parse(bytes).unwrap()))
        .collect();
    let programs: Vec<FontProgram> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let doc = Arc::new(Mutex::new(doc()));
    let fonts: Vec<FontHandle> = programs
        .into_iter()
        .map(|p| doc.lock().unwrap().add_font_program(p).unwrap())
        .collect();
    let page = doc.lock().unwrap().add_page(PageSize::LETTER).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let doc = Arc::clone(&doc);
            let font = fonts[i % fonts.len()];
            thread::spawn(move || {
                let mut doc = doc.lock().unwrap();
                doc.draw_text(page, font, "line", 70.0, 94.0 + 24.0 * i as f64)
                    .unwrap();
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let mut doc = doc.lock().unwrap();
    assert_eq!(doc.page(page).unwrap().content().len(), 4);
    doc.complete().unwrap();
}
