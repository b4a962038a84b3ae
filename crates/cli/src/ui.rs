use crate::style::{Color, Mark, Style};

const RULE_WIDTH: usize = 48;
const KEY_WIDTH: usize = 20;
const LABEL_WIDTH: usize = 40;

/// Line formatting for human-readable command output.
pub struct Ui {
    style: Style,
}

impl Ui {
    pub fn new(style: Style) -> Self {
        Self { style }
    }

    pub fn rule(&self) -> String {
        "-".repeat(RULE_WIDTH)
    }

    pub fn header(&self, title: &str) -> [String; 2] {
        [self.rule(), title.to_string()]
    }

    pub fn footer(&self) -> String {
        self.rule()
    }

    pub fn kv(&self, key: &str, value: &str) -> String {
        format!("{key:<KEY_WIDTH$}: {value}")
    }

    pub fn ok_line(&self, message: &str) -> String {
        format!(
            "{} {}",
            self.style.mark(Mark::Applied),
            self.style.paint_stdout(Color::Green, message)
        )
    }

    pub fn info_line(&self, message: &str) -> String {
        format!("{} {message}", self.style.mark(Mark::Pending))
    }

    /// `  • 00003_add_index.............. ✔ 12ms`
    pub fn script_line(&self, label: &str, mark: Mark, suffix: Option<&str>) -> String {
        let dots = ".".repeat(LABEL_WIDTH.saturating_sub(label.chars().count()));
        let mut line = format!(
            "  {} {label}{dots} {}",
            self.style.bullet(),
            self.style.mark(mark)
        );

        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            line.push(' ');
            line.push_str(suffix);
        }

        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lines_align_marks() {
        let ui = Ui::new(Style::plain());

        let short = ui.script_line("00001_a", Mark::Applied, None);
        let long = ui.script_line("00002_create_claction_table", Mark::Pending, Some("pending"));

        assert_eq!(short.find('✔'), long.find('→'));
        assert!(long.ends_with("→ pending"));
    }

    #[test]
    fn kv_pads_keys() {
        let ui = Ui::new(Style::plain());
        assert_eq!(ui.kv("pending", "2"), format!("{:<20}: 2", "pending"));
    }
}
