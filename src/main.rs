//! # Photobook CLI
//!
//! Usage:
//!   photobook input.json -o pages.json
//!   echo '{ ... }' | photobook -o pages.json
//!   photobook input.json --layout portrait --size letter --max-date 2024-01-31
//!   photobook input.json --font Body.ttf --title-font Title.ttf
//!   photobook --example > book.json
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `photobook=info`).

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use chrono::NaiveDate;
use photobook::font::Typefaces;
use photobook::{BookInput, Photobook, PhotobookError};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", env!("CARGO_PKG_NAME")))),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_book_json());
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn read_font(path: &str) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("failed to read font {}: {}", path, e))
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    // Read input
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).map_err(|e| format!("failed to read {}: {}", args[1], e))?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let mut book: BookInput = serde_json::from_str(&input).map_err(PhotobookError::from)?;

    // Command-line overrides
    if let Some(layout) = flag_value(args, "--layout") {
        book.config.layout = layout.parse()?;
    }
    if let Some(size) = flag_value(args, "--size") {
        book.config.paper_size = size.parse()?;
    }
    if let Some(date) = flag_value(args, "--max-date") {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("invalid --max-date {}: {}", date, e))?;
        book.max_date = Some(parsed);
    }

    let title_font = flag_value(args, "--title-font").map(read_font).transpose()?;
    let text_font = flag_value(args, "--font").map(read_font).transpose()?;
    let fonts = Typefaces::with_font_data(&book.config, title_font.as_deref(), text_font.as_deref())?;

    let pages = Photobook::with_typefaces(book.config.clone(), fonts)?.layout(&book.to_entries())?;
    let json = serde_json::to_string_pretty(&pages)?;

    match flag_value(args, "-o") {
        Some(path) => {
            fs::write(path, &json).map_err(|e| format!("failed to write {}: {}", path, e))?;
            eprintln!("✓ Laid out {} pages to {}", pages.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn example_book_json() -> &'static str {
    r##"{
  "config": {
    "layout": "landscape",
    "paperSize": "A4",
    "marginMm": 5,
    "coverTitle": "Photobook"
  },
  "images": [
    { "sourceId": "demo1.jpg", "pixelWidth": 4032, "pixelHeight": 3024 },
    { "sourceId": "demo2.jpg", "pixelWidth": 3024, "pixelHeight": 4032 },
    { "sourceId": "demo3.jpg", "pixelWidth": 1920, "pixelHeight": 1080 },
    { "sourceId": "demo4.jpg", "pixelWidth": 2000, "pixelHeight": 2000 },
    { "sourceId": "demo5.jpg", "pixelWidth": 1600, "pixelHeight": 1200 },
    { "sourceId": "demo6.jpg", "pixelWidth": 1080, "pixelHeight": 1920 }
  ],
  "entries": [
    {
      "Title": "First Day",
      "Day": "January 1, 2024",
      "Photos": "demo1.jpg,demo2.jpg",
      "Text": "This is a sample entry for testing the photobook generator. It contains some text to demonstrate how the layout works with multiple paragraphs.\n\nThis is a second paragraph to show text wrapping and spacing."
    },
    {
      "Title": "Second Day",
      "Day": "January 2, 2024",
      "Photos": "demo3.jpg",
      "Text": "Another sample entry with just one photo and some text content."
    },
    {
      "Title": "Third Day",
      "Day": "January 3, 2024",
      "Photos": "demo4.jpg,demo5.jpg,demo6.jpg",
      "Text": "This entry has three photos to test the three-photo layout algorithm."
    }
  ]
}
"##
}
