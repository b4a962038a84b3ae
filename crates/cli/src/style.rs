use std::io::IsTerminal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Green,
    Yellow,
    Red,
}

/// Status glyph shown next to a migration in list output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    Applied,
    Pending,
}

#[derive(Clone, Copy, Debug)]
pub struct Style {
    color_stdout: bool,
    color_stderr: bool,
}

impl Style {
    /// Colors only real terminals and honours `NO_COLOR`.
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some();

        Self {
            color_stdout: !no_color && std::io::stdout().is_terminal(),
            color_stderr: !no_color && std::io::stderr().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self {
            color_stdout: false,
            color_stderr: false,
        }
    }

    pub fn mark(&self, mark: Mark) -> String {
        match mark {
            Mark::Applied => self.paint_stdout(Color::Green, "✔"),
            Mark::Pending => self.paint_stdout(Color::Yellow, "→"),
        }
    }

    pub fn bullet(&self) -> &'static str {
        "•"
    }

    pub fn paint_stdout(&self, color: Color, text: &str) -> String {
        if self.color_stdout {
            paint(color, text)
        } else {
            text.to_string()
        }
    }

    pub fn paint_stderr(&self, color: Color, text: &str) -> String {
        if self.color_stderr {
            paint(color, text)
        } else {
            text.to_string()
        }
    }
}

fn paint(color: Color, text: &str) -> String {
    let code = match color {
        Color::Green => "32",
        Color::Yellow => "33",
        Color::Red => "31",
    };

    format!("\u{1b}[{code}m{text}\u{1b}[0m")
}
