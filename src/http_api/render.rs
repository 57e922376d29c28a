use crate::ProgressSnapshot;

const STYLESHEET: &str = "/static/style.css";

pub fn progress_page(snapshot: &ProgressSnapshot) -> String {
    let percentage = snapshot.percentage;
    let rows: String = snapshot
        .log
        .iter()
        .map(|entry| {
            format!(
                "      <tr><td>{}</td><td>{}</td></tr>\n",
                entry.date.format("%Y-%m-%d"),
                entry.value
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Progress</title>
  <link rel="stylesheet" href="{STYLESHEET}">
</head>
<body>
  <h1>Progress</h1>
  <div class="progress" role="progressbar" aria-valuemin="0" aria-valuemax="100" aria-valuenow="{percentage}">
    <div class="progress-bar" style="width: {width}%;">{percentage}%</div>
  </div>
  <p class="summary">{completed} of {total} tasks complete</p>
  <table class="log">
    <thead>
      <tr><th>Date</th><th>Completed</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"#,
        width = percentage.min(100),
        completed = snapshot.completion.completed,
        total = snapshot.completion.total,
    )
}

pub fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Service error</title>
  <link rel="stylesheet" href="{STYLESHEET}">
</head>
<body>
  <h1>Service error</h1>
  <p class="error">{}</p>
</body>
</html>
"#,
        escape(message)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Completion, LogEntry};
    use chrono::NaiveDate;

    #[test]
    fn page_lists_log_rows_in_order() {
        let snapshot = ProgressSnapshot {
            completion: Completion {
                completed: 2,
                total: 3,
            },
            percentage: 66,
            log: vec![
                LogEntry {
                    date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                    value: 1,
                },
                LogEntry {
                    date: NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
                    value: 1,
                },
            ],
        };
        let html = progress_page(&snapshot);
        assert!(html.contains("width: 66%;"));
        assert!(html.contains("2 of 3 tasks complete"));
        let first = html.find("2025-05-01").unwrap();
        let second = html.find("2025-05-02").unwrap();
        assert!(first < second);
        assert_eq!(html.matches("<tr><td>").count(), 2);
    }

    #[test]
    fn error_message_is_escaped() {
        let html = error_page("bad <key> & \"value\"");
        assert!(html.contains("bad &lt;key&gt; &amp; &quot;value&quot;"));
    }
}
