//! Plain-text rendering of the dashboard

use std::fmt::Write;

use samadhan_client::ComplaintStatus;
use samadhan_client::view::DashboardState;

const DESCRIPTION_WIDTH: usize = 36;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn render(state: &DashboardState) -> String {
    let mut out = String::new();

    let role = state.role.map_or("-".to_string(), |r| r.to_string());
    let refreshed = state
        .last_refreshed_at
        .map_or("never".to_string(), |t| t.format("%H:%M:%S UTC").to_string());
    let _ = writeln!(out, "Role: {role}    Last refresh: {refreshed}");

    let summary: Vec<String> = ComplaintStatus::ALL
        .iter()
        .map(|s| format!("{s}: {}", state.counts.get(*s)))
        .collect();
    let _ = writeln!(out, "Total: {}  |  {}", state.counts.total, summary.join("  "));
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<10} {:<12} {:<28} {:<DESCRIPTION_WIDTH$} {}",
        "ID", "STATUS", "DEPARTMENT", "DESCRIPTION", "ACTIONS"
    );
    for row in &state.rows {
        let c = &row.complaint;
        let department = c
            .assigned_department
            .map_or("-".to_string(), |d| d.to_string());
        let mut actions: Vec<String> = row.actions.iter().map(|a| a.to_string()).collect();
        if row.updating {
            actions.insert(0, "[updating]".into());
        }
        let _ = writeln!(
            out,
            "{:<10} {:<12} {:<28} {:<DESCRIPTION_WIDTH$} {}",
            c.complaint_id,
            c.status.to_string(),
            department,
            truncate(&c.description, DESCRIPTION_WIDTH),
            actions.join(", ")
        );
    }
    if state.rows.is_empty() {
        out.push_str("(no complaints match the current filter)\n");
    }

    let _ = writeln!(out, "\n{} complaint(s) on the map", state.markers.len());
    if let Some(error) = &state.error {
        let _ = writeln!(out, "Error: {error}");
    }
    if let Some(notice) = &state.notice {
        let _ = writeln!(out, "{notice}");
    }
    out
}
