use std::io::{self, IsTerminal, Write};

use tasklist_core::datetime::format_due_date;
use tasklist_core::tags::TagCatalog;
use tasklist_core::view::{ItemView, ListView, Phase};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_view(&self, view: &ListView) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_view(&mut out, view)
    }

    pub fn write_view<W: Write>(&self, mut out: W, view: &ListView) -> anyhow::Result<()> {
        if view.is_empty() {
            writeln!(out, "No tasks.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Done".to_string(),
            "Due".to_string(),
            "Priority".to_string(),
            "Title".to_string(),
            "Tags".to_string(),
        ];

        let rows = view.items().iter().map(|item| self.row(item)).collect();
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn write_tags<W: Write>(&self, mut out: W, catalog: &TagCatalog) -> anyhow::Result<()> {
        if catalog.tags().is_empty() {
            writeln!(out, "No tags.")?;
        }
        for tag in catalog.tags() {
            writeln!(out, "{tag}")?;
        }
        Ok(())
    }

    fn row(&self, item: &ItemView) -> Vec<String> {
        let done = if item.done { "✔" } else { "" };
        let due = item.due_date.map(format_due_date).unwrap_or_default();
        let due = if item.overdue { self.paint(&due, "31") } else { due };

        let mut title = item.title.clone();
        if !item.description.is_empty() {
            title = format!("{title} ({})", item.description);
        }
        let title = match (item.phase, item.done) {
            (Phase::Leaving, _) => self.paint(&format!("{title} [deleting]"), "9"),
            (_, true) => self.paint(&title, "2"),
            _ => title,
        };

        vec![
            self.paint(&item.id.to_string(), "33"),
            done.to_string(),
            due,
            item.priority.to_string(),
            title,
            item.tags.join(", "),
        ]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
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

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ", width = *width)?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
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
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use tasklist_core::{Priority, Task, TaskId};

    use super::*;

    #[test]
    fn table_lists_items_in_view_order() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).expect("date");
        let tasks = [
            Task {
                id: TaskId(2),
                title: "Später".to_string(),
                description: String::new(),
                tags: vec!["home".to_string()],
                due_date: NaiveDate::from_ymd_opt(2024, 6, 10),
                priority: Priority::High,
                done: true,
            },
            Task {
                id: TaskId(1),
                title: "Now".to_string(),
                description: "soon".to_string(),
                tags: vec!["work".to_string(), "urgent".to_string()],
                due_date: None,
                priority: Priority::Low,
                done: false,
            },
        ];
        let mut view = ListView::default();
        view.render(&tasks.iter().collect::<Vec<_>>(), today, &BTreeSet::new());

        let mut buf = Vec::new();
        Renderer::plain().write_view(&mut buf, &view).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[2].starts_with("2 "));
        assert!(lines[2].contains("2024-06-10"));
        assert!(lines[2].contains("✔"));
        assert!(lines[3].contains("Now (soon)"));
        assert!(lines[3].contains("work, urgent"));
    }

    #[test]
    fn empty_view_says_so() {
        let mut buf = Vec::new();
        Renderer::plain()
            .write_view(&mut buf, &ListView::default())
            .expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "No tasks.\n");
    }

    #[test]
    fn ansi_codes_do_not_count_toward_width() {
        assert_eq!(strip_ansi("\x1b[31m2024-06-10\x1b[0m"), "2024-06-10");
    }
}
