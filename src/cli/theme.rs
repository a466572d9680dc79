//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

// Terminal color theme using the standard ANSI palette.
//
// Colors are dropped when stdout is not a terminal so CI logs stay clean.

use std::io::IsTerminal;
use std::sync::OnceLock;

use nu_ansi_term::{Color, Style};

fn enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::io::stdout().is_terminal())
}

fn paint(style: Style, text: &str) -> String {
    if enabled() {
        style.paint(text).to_string()
    } else {
        text.to_string()
    }
}

// Section headings
pub fn heading(text: &str) -> String {
    paint(Color::Cyan.bold(), text)
}

// Step counters, folders and other secondary detail
pub fn dim(text: &str) -> String {
    paint(Color::DarkGray.normal(), text)
}

// A command line about to run
pub fn command(text: &str) -> String {
    paint(Style::new().bold(), text)
}

pub fn success(text: &str) -> String {
    paint(Color::Green.normal(), text)
}

pub fn error(text: &str) -> String {
    paint(Color::Red.bold(), text)
}
