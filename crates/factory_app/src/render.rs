//! Plain-text rendering of the task view for the terminal.

use factory_core::{PreviewEntry, TaskView};

/// Tracks which log lines were already printed.
///
/// The backend resends the whole log on every poll, so only lines past the
/// common prefix with what is on screen are new.
#[derive(Debug, Default)]
pub(crate) struct LogPrinter {
    shown: Vec<String>,
}

impl LogPrinter {
    pub(crate) fn fresh<'a>(&mut self, logs: &'a [String]) -> &'a [String] {
        let common = self
            .shown
            .iter()
            .zip(logs)
            .take_while(|(shown, line)| shown == line)
            .count();
        self.shown = logs.to_vec();
        &logs[common..]
    }
}

pub(crate) fn status_line(view: &TaskView) -> String {
    match (&view.task_id, view.status) {
        (Some(id), Some(status)) => format!("[{}] task {} is {}", view.phase, id, status),
        _ => format!("[{}]", view.phase),
    }
}

/// Preview rows as aligned `METHOD  NAME  URL` columns, header first.
pub(crate) fn preview_table(entries: &[PreviewEntry]) -> Vec<String> {
    if entries.is_empty() {
        return Vec::new();
    }
    let method_width = entries
        .iter()
        .map(|entry| entry.method.as_str().len())
        .max()
        .unwrap_or(0)
        .max("METHOD".len());
    let name_width = entries
        .iter()
        .map(|entry| entry.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut rows = Vec::with_capacity(entries.len() + 1);
    rows.push(format!(
        "{:<mw$}  {:<nw$}  URL",
        "METHOD",
        "NAME",
        mw = method_width,
        nw = name_width
    ));
    for entry in entries {
        rows.push(format!(
            "{:<mw$}  {:<nw$}  {}",
            entry.method.as_str(),
            entry.name,
            entry.url,
            mw = method_width,
            nw = name_width
        ));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::{preview_table, status_line, LogPrinter};
    use factory_core::{HttpMethod, PhaseLabel, PreviewEntry, TaskId, TaskStatus, TaskView};
    use pretty_assertions::assert_eq;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn only_new_lines_are_printed() {
        let mut printer = LogPrinter::default();
        let first = lines(&["Parsing sheet 1"]);
        assert_eq!(printer.fresh(&first), &first[..]);

        let second = lines(&["Parsing sheet 1", "Generating tests"]);
        assert_eq!(printer.fresh(&second), &second[1..]);
        assert!(printer.fresh(&second).is_empty());
    }

    #[test]
    fn rewritten_log_is_printed_from_the_divergence() {
        let mut printer = LogPrinter::default();
        printer.fresh(&lines(&["a", "b", "c"]));
        let rewritten = lines(&["a", "x"]);
        assert_eq!(printer.fresh(&rewritten), &rewritten[1..]);
    }

    #[test]
    fn status_line_names_the_task() {
        let view = TaskView {
            phase: PhaseLabel::Active,
            task_id: Some(TaskId::new("t1")),
            status: Some(TaskStatus::Processing),
            ..TaskView::default()
        };
        assert_eq!(status_line(&view), "[active] task t1 is processing");
        assert_eq!(status_line(&TaskView::default()), "[idle]");
    }

    #[test]
    fn preview_columns_are_aligned() {
        let entries = vec![
            PreviewEntry {
                ref_id: "1".to_string(),
                method: HttpMethod::Get,
                name: "GetUser".to_string(),
                url: "/v1/users/{id}".to_string(),
            },
            PreviewEntry {
                ref_id: "2".to_string(),
                method: HttpMethod::Delete,
                name: "DeleteUser".to_string(),
                url: "/v1/users/{id}".to_string(),
            },
        ];
        assert_eq!(
            preview_table(&entries),
            vec![
                "METHOD  NAME        URL",
                "GET     GetUser     /v1/users/{id}",
                "DELETE  DeleteUser  /v1/users/{id}",
            ]
        );
        assert!(preview_table(&[]).is_empty());
    }
}
