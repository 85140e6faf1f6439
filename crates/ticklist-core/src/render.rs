use std::io::{self, IsTerminal, Write};

use ticklist_shared::{Filter, Icon, Task, ThemeColor, ThemeMode};
use unicode_width::UnicodeWidthStr;

use crate::app::{Notice, NoticeLevel};
use crate::config::Config;
use crate::prefs::Preferences;
use crate::projection::Counts;
use crate::session::EditSession;

const SHORT_ID_LEN: usize = 8;
pub const EMPTY_LIST_MESSAGE: &str = "No tasks 😌";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    prefs: Preferences,
}

impl Renderer {
    pub fn new(cfg: &Config, prefs: Preferences) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);
        Ok(Self { color, prefs })
    }

    pub fn set_preferences(&mut self, prefs: Preferences) {
        self.prefs = prefs;
    }

    #[tracing::instrument(skip_all, fields(count = tasks.len(), filter = %filter))]
    pub fn print_task_list(&self, tasks: &[&Task], filter: Filter, counts: Counts) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(
            out,
            "{}",
            self.accent(&format!(
                "{} · {} of {} ({} pending, {} completed)",
                filter,
                counts.for_filter(filter),
                counts.all,
                counts.pending,
                counts.completed
            ))
        )?;

        if tasks.is_empty() {
            writeln!(out, "{EMPTY_LIST_MESSAGE}")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            String::new(),
            "Icon".to_string(),
            "Name".to_string(),
        ];
        let rows = tasks
            .iter()
            .map(|task| {
                let name = if task.done {
                    self.paint(&task.name, self.done_code())
                } else {
                    task.name.clone()
                };
                vec![
                    self.paint(&short_id(task), "33"),
                    status_glyph(task).to_string(),
                    task.icon.glyph().to_string(),
                    name,
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(id = %task.id))]
    pub fn print_task_info(&self, task: &Task) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "id      {}", task.id)?;
        writeln!(out, "name    {}", task.name)?;
        writeln!(out, "icon    {} ({})", task.icon.glyph(), task.icon.name())?;
        writeln!(
            out,
            "status  {} {}",
            status_glyph(task),
            if task.done { "completed" } else { "pending" }
        )?;
        Ok(())
    }

    pub fn print_session(&self, session: &EditSession) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        match session.editing() {
            Some(task) => writeln!(
                out,
                "{}",
                self.accent(&format!("editing {} {} {}", short_id(task), task.icon.glyph(), task.name))
            )?,
            None => writeln!(out, "{}", self.accent("new task"))?,
        }
        Ok(())
    }

    pub fn print_notice(&self, notice: &Notice) -> anyhow::Result<()> {
        match notice.level {
            NoticeLevel::Success => {
                let mut out = io::stdout().lock();
                writeln!(out, "{} {}", self.paint("✔", "32"), notice.message)?;
            }
            NoticeLevel::Error => {
                let mut err = io::stderr().lock();
                writeln!(err, "{} {}", self.paint("✘", "31"), notice.message)?;
            }
        }
        Ok(())
    }

    pub fn print_palette(&self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let rows = Icon::PALETTE
            .iter()
            .map(|icon| vec![icon.glyph().to_string(), icon.name().to_string()])
            .collect();
        write_table(&mut out, vec!["Icon".to_string(), "Name".to_string()], rows)?;
        Ok(())
    }

    pub fn print_preferences(&self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "theme   {}", self.prefs.theme.storage_value())?;
        writeln!(out, "color   {}", self.accent(self.prefs.color.storage_value()))?;
        Ok(())
    }

    pub fn print_pairs<'a, I>(&self, pairs: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut out = io::stdout().lock();
        let mut pairs: Vec<_> = pairs.into_iter().collect();
        pairs.sort();
        let rows = pairs
            .into_iter()
            .map(|(k, v)| vec![k.clone(), v.clone()])
            .collect();
        write_table(&mut out, vec!["Key".to_string(), "Value".to_string()], rows)?;
        Ok(())
    }

    fn accent(&self, text: &str) -> String {
        self.paint(text, accent_code(self.prefs.color, self.prefs.theme))
    }

    fn done_code(&self) -> &'static str {
        match self.prefs.theme {
            ThemeMode::Light => "32",
            ThemeMode::Dark => "92",
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Dark mode uses the bright variant of the theme color.
fn accent_code(color: ThemeColor, theme: ThemeMode) -> &'static str {
    match (color, theme) {
        (ThemeColor::Blue, ThemeMode::Light) => "34",
        (ThemeColor::Red, ThemeMode::Light) => "31",
        (ThemeColor::Green, ThemeMode::Light) => "32",
        (ThemeColor::Yellow, ThemeMode::Light) => "33",
        (ThemeColor::Blue, ThemeMode::Dark) => "94",
        (ThemeColor::Red, ThemeMode::Dark) => "91",
        (ThemeColor::Green, ThemeMode::Dark) => "92",
        (ThemeColor::Yellow, ThemeMode::Dark) => "93",
    }
}

pub fn status_glyph(task: &Task) -> &'static str {
    if task.done { "✅" } else { "⏳" }
}

pub fn short_id(task: &Task) -> String {
    task.id.as_str().chars().take(SHORT_ID_LEN).collect()
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        let padding = widths[idx].saturating_sub(UnicodeWidthStr::width(header.as_str()));
        write!(writer, "{}{} ", header, " ".repeat(padding))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use ticklist_shared::TaskId;

    use super::*;

    #[test]
    fn table_pads_by_display_width() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["I".to_string(), "Name".to_string()],
            vec![
                vec!["🛒".to_string(), "milk".to_string()],
                vec!["\x1b[33mx\x1b[0m".to_string(), "eggs".to_string()],
            ],
        )
        .expect("write table");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "I  Name ");
        assert_eq!(lines[1], "-- ---- ");
        assert_eq!(lines[2], "🛒 milk ");
        assert_eq!(lines[3], "\x1b[33mx\x1b[0m  eggs ");
    }

    #[test]
    fn short_ids_and_status_glyphs() {
        let mut task = Task {
            id: TaskId::new("0123456789abcdef"),
            name: "x".to_string(),
            done: false,
            icon: Icon::Memo,
        };
        assert_eq!(short_id(&task), "01234567");
        assert_eq!(status_glyph(&task), "⏳");
        task.done = true;
        task.id = TaskId::new("42");
        assert_eq!(short_id(&task), "42");
        assert_eq!(status_glyph(&task), "✅");
    }

    #[test]
    fn dark_mode_brightens_accent() {
        assert_eq!(accent_code(ThemeColor::Red, ThemeMode::Light), "31");
        assert_eq!(accent_code(ThemeColor::Red, ThemeMode::Dark), "91");
    }
}
