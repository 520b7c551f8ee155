//! Colour for terminal output

use owo_colors::{colors::css, OwoColorize};

/// Whether stdout takes colour
fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Styling for the pieces of reqfolio output
pub trait Colorize {
    /// Something that went right (green)
    fn ok(&self) -> String;
    /// A problem (amber)
    fn problem(&self) -> String;
    /// A requirement index (blue)
    fn key(&self) -> String;
    /// A section heading (dimmed)
    fn heading(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn ok(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::Green>().to_string())
    }

    fn problem(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::Orange>().to_string())
    }

    fn key(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::LightBlue>().to_string())
    }

    fn heading(&self) -> String {
        paint(self.as_ref(), |s| s.dimmed().to_string())
    }
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}
