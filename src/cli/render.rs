//! Presentation adapter for the terminal. Pure rendering, no state of its own.

use ansi_term::{Colour, Style};

use crate::tracker::controller::{ItemStatus, MILESTONE_STREAK};

pub fn print_status(items: &[ItemStatus]) {
    let width = items.iter().map(|v| v.name.len()).max().unwrap_or(0);

    for item in items {
        let marker = if item.done_today {
            Colour::Green.paint("✔")
        } else {
            Style::new().dimmed().paint("·")
        };

        let streak = match item.streak {
            0 => Style::new().dimmed().paint("no streak".to_string()),
            v if v >= MILESTONE_STREAK => Colour::Yellow
                .bold()
                .paint(format!("{v} day streak ★")),
            1 => Style::new().paint("1 day streak".to_string()),
            v => Style::new().paint(format!("{v} day streak")),
        };

        println!("{marker} {:<width$}  {streak}", item.name);
    }
}

pub fn print_celebration(name: &str) {
    let sparkles = Colour::Yellow.paint("✦ ✧ ✦");
    println!();
    println!("  {sparkles}  {}  {sparkles}", Colour::Green.bold().paint(format!("{name} — done for today!")));
    println!();
}

pub fn print_milestone_toast(name: &str, streak: u32) {
    let message = format!("{streak} day streak on {name}!");
    let border = "─".repeat(message.len() + 2);
    let highlight = Colour::Yellow.bold();

    println!("  ┌{border}┐");
    println!("  │ {} │", highlight.paint(message.as_str()));
    println!("  └{border}┘");
    println!();
}
