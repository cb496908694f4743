//! User-facing progress lines. Advisory only: nothing here affects the outcome.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

pub trait Reporter {
    /// Plain detail line ("  Downloading...").
    fn info(&self, msg: &str);
    /// Numbered stage header ("[1/2] Processing ...").
    fn stage(&self, msg: &str);
    fn success(&self, msg: &str);
    fn warn(&self, msg: &str);
    /// Low-key notice (skips, cleanup).
    fn note(&self, msg: &str);
    fn error(&self, msg: &str);
    /// Progress bar for a download; length is set once it is known.
    fn download_bar(&self) -> ProgressBar;
}

/// Colored output on stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn info(&self, msg: &str) {
        println!("{msg}");
    }

    fn stage(&self, msg: &str) {
        println!("{}", style(msg).cyan());
    }

    fn success(&self, msg: &str) {
        println!("{}", style(msg).green());
    }

    fn warn(&self, msg: &str) {
        println!("{}", style(msg).yellow());
    }

    fn note(&self, msg: &str) {
        println!("{}", style(msg).color256(8));
    }

    fn error(&self, msg: &str) {
        eprintln!("{}", style(format!("Error: {msg}")).red());
    }

    fn download_bar(&self) -> ProgressBar {
        let pb = ProgressBar::new(0);
        if let Ok(s) = ProgressStyle::with_template("  [{bar:40}] {bytes}/{total_bytes} ({eta})") {
            pb.set_style(s.progress_chars("=>-"));
        }
        pb
    }
}

/// Swallows everything; for tests and embedding.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn info(&self, _msg: &str) {}
    fn stage(&self, _msg: &str) {}
    fn success(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn note(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}

    fn download_bar(&self) -> ProgressBar {
        ProgressBar::hidden()
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn info(&self, msg: &str) {
        (**self).info(msg)
    }
    fn stage(&self, msg: &str) {
        (**self).stage(msg)
    }
    fn success(&self, msg: &str) {
        (**self).success(msg)
    }
    fn warn(&self, msg: &str) {
        (**self).warn(msg)
    }
    fn note(&self, msg: &str) {
        (**self).note(msg)
    }
    fn error(&self, msg: &str) {
        (**self).error(msg)
    }
    fn download_bar(&self) -> ProgressBar {
        (**self).download_bar()
    }
}
