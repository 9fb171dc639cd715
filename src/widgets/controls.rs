use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph, Widget},
};

/// One key hint in the controls bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub key: &'static str,
    pub action: &'static str,
    /// Disabled controls are drawn dimmed and their key is not dispatched.
    pub enabled: bool,
}

impl Control {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self {
            key,
            action,
            enabled: true,
        }
    }

    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

pub struct Controls {
    pub controls: Vec<Control>,
    /// Right-aligned status text (e.g. the current phase)
    pub status: Option<String>,
    pub bg_color: Color,
    pub key_color: Color,
    pub label_color: Color,
    pub disabled_color: Color,
    pub throbber_color: Color,
    /// When true, show throbber at far right
    pub busy: bool,
    pub throbber_frame: u8,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            controls: Vec::new(),
            status: None,
            bg_color: Color::Indexed(236),
            key_color: Color::Cyan,
            label_color: Color::White,
            disabled_color: Color::DarkGray,
            throbber_color: Color::Cyan,
            busy: false,
            throbber_frame: 0,
        }
    }
}

impl Controls {
    /// Key hints for the dashboard. `run_enabled` reflects whether a report may be run.
    pub fn dashboard(run_enabled: bool) -> Self {
        Self {
            controls: vec![
                Control::new("Tab", "Focus"),
                Control::new("Enter", "Category"),
                Control::new("Space", "Toggle"),
                Control::new("r", "Run Report").enabled(run_enabled),
                Control::new("c", "Clear Filters"),
                Control::new("Esc", "No Category"),
                Control::new("q", "Quit"),
            ],
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_busy(mut self, busy: bool, throbber_frame: u8) -> Self {
        self.busy = busy;
        self.throbber_frame = throbber_frame;
        self
    }

    pub fn with_colors(
        mut self,
        bg_color: Color,
        key_color: Color,
        label_color: Color,
        disabled_color: Color,
    ) -> Self {
        self.bg_color = bg_color;
        self.key_color = key_color;
        self.label_color = label_color;
        self.disabled_color = disabled_color;
        self.throbber_color = key_color;
        self
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.controls
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.enabled)
            .unwrap_or(false)
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Block::default()
            .style(Style::default().bg(self.bg_color))
            .render(area, buf);

        // Width of one key-label pair: key plus one space, label plus one space.
        let pair_width = |c: &Control| -> u16 {
            (c.key.chars().count() as u16 + 1) + (c.action.chars().count() as u16 + 1)
        };

        const THROBBER_WIDTH: u16 = 3;
        let status_width = self
            .status
            .as_ref()
            .map(|s| s.chars().count() as u16 + 1)
            .unwrap_or(0);
        let mut available = area
            .width
            .saturating_sub(status_width + THROBBER_WIDTH + 1);

        let mut n_show = 0;
        for control in self.controls.iter() {
            let need = pair_width(control);
            if available >= need {
                available -= need;
                n_show += 1;
            } else {
                break;
            }
        }

        let mut constraints: Vec<Constraint> = self
            .controls
            .iter()
            .take(n_show)
            .flat_map(|c| {
                [
                    Constraint::Length(c.key.chars().count() as u16 + 1),
                    Constraint::Length(c.action.chars().count() as u16 + 1),
                ]
            })
            .collect();
        constraints.push(Constraint::Fill(1));
        constraints.push(Constraint::Length(status_width));
        constraints.push(Constraint::Length(THROBBER_WIDTH));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let base = Style::default().bg(self.bg_color);

        for (i, control) in self.controls.iter().take(n_show).enumerate() {
            let j = i * 2;
            let (key_style, label_style) = if control.enabled {
                (base.fg(self.key_color), base.fg(self.label_color))
            } else {
                (base.fg(self.disabled_color), base.fg(self.disabled_color))
            };
            Paragraph::new(control.key)
                .style(key_style)
                .render(layout[j], buf);
            Paragraph::new(control.action)
                .style(label_style)
                .render(layout[j + 1], buf);
        }

        let fill_idx = n_show * 2;
        if let Some(status) = &self.status {
            Paragraph::new(status.as_str())
                .style(base.fg(self.label_color))
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }

        const THROBBER_BRAILLE_EIGHT: [char; 8] = ['⣷', '⣯', '⣟', '⡿', '⢿', '⣻', '⣽', '⣾'];
        let throbber = if self.busy {
            THROBBER_BRAILLE_EIGHT[self.throbber_frame as usize % 8].to_string()
        } else {
            " ".to_string()
        };
        Paragraph::new(throbber)
            .style(base.fg(self.throbber_color))
            .centered()
            .render(layout[fill_idx + 2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_report_disabled_flag() {
        assert!(!Controls::dashboard(false).is_enabled("r"));
        assert!(Controls::dashboard(true).is_enabled("r"));
        assert!(Controls::dashboard(false).is_enabled("c"));
        assert!(!Controls::dashboard(true).is_enabled("x"));
    }

    #[test]
    fn test_dashboard_lists_every_binding() {
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        (&Controls::dashboard(true)).render(area, &mut buf);
        let line: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        for hint in [
            "Tab",
            "Enter",
            "Space",
            "Run Report",
            "Clear Filters",
            "Esc",
            "No Category",
            "Quit",
        ] {
            assert!(line.contains(hint), "missing hint {hint}: {line}");
        }
    }

    #[test]
    fn test_disabled_control_drawn_dimmed() {
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        let controls = Controls::dashboard(false);
        (&controls).render(area, &mut buf);

        let line: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        let run_at = line.find("Run Report").expect("run report hint rendered") as u16;
        assert_eq!(buf[(run_at, 0)].fg, Color::DarkGray);
        let clear_at = line.find("Clear Filters").expect("clear hint rendered") as u16;
        assert_eq!(buf[(clear_at, 0)].fg, Color::White);
    }
}
