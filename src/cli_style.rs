use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Color as CtColor, Stylize};
use unicode_width::UnicodeWidthStr;

use rymfetch::organizer::OrganizeTally;
use rymfetch::outcome::SearchResults;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    let heading = Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Magenta)));

    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Palette
// ═══════════════════════════════════════════════════════════════════════════════

mod colors {
    use crossterm::style::Color;

    pub const ACCENT: Color = Color::Rgb {
        r: 180,
        g: 100,
        b: 255,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 0,
        g: 255,
        b: 136,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 255,
        g: 165,
        b: 0,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Lines
// ═══════════════════════════════════════════════════════════════════════════════

fn print_status(mark: &str, color: CtColor, message: &str) {
    println!(" {} {}", mark.with(color).bold(), message.with(color));
}

pub fn print_success(message: &str) {
    print_status("✓", colors::GREEN, message);
}

pub fn print_warning(message: &str) {
    print_status("⚠", colors::ORANGE, message);
}

/// Final counters of a download or organize run.
pub fn print_tally(tally: &OrganizeTally) {
    let message = format!("Organized: {}, skipped: {}", tally.moved, tally.skipped);
    if tally.skipped == 0 {
        print_success(&message);
    } else {
        print_warning(&message);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Search Summary
// ═══════════════════════════════════════════════════════════════════════════════

/// One row per album: the active choice, or a dash when nothing was found.
pub fn print_search_summary(results: &SearchResults) {
    let label_width = results.keys().map(|l| l.width()).max().unwrap_or(0);

    println!();
    for (label, outcome) in results {
        let padding = " ".repeat(label_width.saturating_sub(label.width()));
        match outcome.as_ref().and_then(|o| o.active()) {
            Some(best) => {
                let detail = if best.bitrate > 0 {
                    format!("{} {}kbps", best.format.to_uppercase(), best.bitrate)
                } else {
                    best.format.to_uppercase()
                };
                let fallbacks = outcome
                    .as_ref()
                    .map(|o| o.alternatives().len().saturating_sub(1))
                    .unwrap_or(0);
                println!(
                    "  {}{}  {}  {}  {}",
                    label.as_str().with(colors::ACCENT),
                    padding,
                    detail.with(colors::GREEN).bold(),
                    format!("@{}", best.username).with(colors::DIM),
                    format!("+{} fallback(s)", fallbacks).with(colors::DIM),
                );
            }
            None => println!(
                "  {}{}  {}",
                label.as_str().with(colors::DIM),
                padding,
                "not found".with(colors::ORANGE)
            ),
        }
    }
    println!();
}
