use std::path::PathBuf;

use log::{info, warn};
use pdf_engine::{Document, DocumentOptions, OutputIntent, PageSize};

/// Rows of sixteen characters, starting 70pt in and stepping 24pt down.
const ROW_LEN: usize = 16;
const MARGIN: f64 = 70.0;
const LEADING: f64 = 24.0;

fn ranges() -> Vec<(&'static str, Vec<char>)> {
    vec![
        ("Basic Latin", (0x20u32..=0x7E).filter_map(char::from_u32).collect()),
        ("Greek", (0x391u32..=0x3C9).filter_map(char::from_u32).collect()),
        ("Cyrillic", (0x410u32..=0x44F).filter_map(char::from_u32).collect()),
    ]
}

fn main() {
    env_logger::init();

    // Usage: unicode_ranges REGULAR.ttf BOLD.ttf [PROFILE.icc]
    // With an ICC profile the output is PDF/A-1B.
    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if args.len() < 2 {
        eprintln!("usage: unicode_ranges REGULAR.ttf BOLD.ttf [PROFILE.icc]");
        std::process::exit(2);
    }

    std::fs::create_dir_all("demos/output").unwrap();
    let path = "demos/output/unicode-ranges.pdf";

    let options = if args.len() > 2 {
        DocumentOptions::pdfa1b()
    } else {
        warn!("no ICC profile given, writing an unrestricted PDF");
        DocumentOptions::default()
    };
    let mut doc = Document::create(path, options).unwrap();
    doc.set_title("Unicode ranges")
        .unwrap()
        .set_creator("pdf-demos")
        .unwrap();

    if let Some(profile) = args.get(2) {
        let icc = std::fs::read(profile).expect("Failed to read ICC profile");
        doc.set_output_intent(OutputIntent::from_icc(icc, "sRGB IEC61966-2.1").unwrap())
            .unwrap();
    }

    let fonts = [
        doc.load_font_file(&args[0]).expect("Failed to load regular font"),
        doc.load_font_file(&args[1]).expect("Failed to load bold font"),
    ];

    for font in fonts {
        doc.set_font_size(font, 15.0).unwrap();
        let page = doc.add_page(PageSize::LETTER).unwrap();
        let top = PageSize::LETTER.height - MARGIN;

        let mut line = 0;
        for (name, chars) in ranges() {
            info!("{}: {} characters", name, chars.len());
            for row in chars.chunks(ROW_LEN) {
                let text: String = row.iter().collect();
                let y = top - LEADING * line as f64;
                doc.draw_text(page, font, &text, MARGIN, y).unwrap();
                line += 1;
            }
            line += 1;
        }
    }

    match doc.complete() {
        Ok(()) => println!("Generated: {} ({} pages)", path, doc.page_count()),
        Err(e) => {
            eprintln!("Failed to write {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
