#![forbid(unsafe_code)]

//! Page a UTF-8 file through the page cache and print a JSONL report.
//!
//! # Running
//!
//! ```sh
//! cargo run -p pager-harness -- book.txt
//! PAGER_HARNESS_COLS=60 PAGER_HARNESS_PAGES=3 cargo run -p pager-harness -- book.txt
//! cat book.txt | RUST_LOG=pager_text=debug cargo run -p pager-harness
//! ```
//!
//! With no path (or `-`) the buffer is read from stdin. Invalid UTF-8 is
//! replaced rather than rejected.

use std::io::{self, Read};

use pager_harness::{HarnessConfig, run, write_report};
use tracing_subscriber::EnvFilter;

fn read_input(path: Option<&str>) -> io::Result<Vec<u8>> {
    match path {
        None | Some("-") => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes)?;
            Ok(bytes)
        }
        Some(path) => std::fs::read(path),
    }
}

fn main() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next();
    if args.next().is_some() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "usage: pager-harness [PATH]",
        ));
    }

    let config = HarnessConfig::from_env()?;
    let bytes = read_input(path.as_deref())?;
    let text = String::from_utf8_lossy(&bytes);

    let report = run(&config, &text);
    tracing::info!(
        pages = report.pages.len(),
        at_end = report.at_end,
        "harness run complete"
    );
    write_report(&report, &mut io::stdout().lock())
}
