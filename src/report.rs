//! # Terminal Rendering
//!
//! Plain-text rendering of the tide views for the command-line tool. Every
//! function returns a `String` so the output can be tested without a terminal.
//!
//! ```text
//! Brest                      ┌────┐
//!   Height   +3.42 m         │    │
//!   Level    62 %            │~~~~│
//!   Rising   → high 6.10 m   │████│
//!            in 2h05         └────┘
//! ```

use crate::config::Port;
use crate::refresh::RefreshReport;
use crate::{NationalCoefficient, Phase, TideKind, TideView};
use std::fmt::Write;

/// Rows of the water gauge, excluding its borders.
const GAUGE_ROWS: usize = 8;

/// Format a height in meters with an explicit sign.
pub fn format_height(height_m: f64) -> String {
    if height_m == 0.0 {
        " 0.00 m".to_string()
    } else if height_m > 0.0 {
        format!("+{:.2} m", height_m)
    } else {
        format!("{:.2} m", height_m)
    }
}

/// Format a duration in minutes as `2h05`.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h{:02}", minutes / 60, minutes % 60)
}

/// Vertical gauge of a `[0, 1]` water level, one line per row.
pub fn water_gauge(level: f64) -> Vec<String> {
    let filled = (level.clamp(0.0, 1.0) * GAUGE_ROWS as f64).round() as usize;
    let mut lines = Vec::with_capacity(GAUGE_ROWS + 2);
    lines.push("┌────┐".to_string());
    for row in 0..GAUGE_ROWS {
        let from_bottom = GAUGE_ROWS - row;
        let cell = if from_bottom < filled {
            "████"
        } else if from_bottom == filled {
            "~~~~"
        } else {
            "    "
        };
        lines.push(format!("│{cell}│"));
    }
    lines.push("└────┘".to_string());
    lines
}

/// Render the real-time view of one port next to its water gauge.
pub fn render_view(port: &Port, view: &TideView) -> String {
    let trend = if view.is_rising { "Rising" } else { "Falling" };
    let next_kind = match view.next_extreme.kind {
        TideKind::High => "high",
        TideKind::Low => "low",
    };
    let text = [
        port.name.clone(),
        format!("  Height   {}", format_height(view.current_height)),
        format!("  Level    {:.0} %", view.water_level * 100.0),
        format!(
            "  {:<8} → {} {:.2} m",
            trend, next_kind, view.next_extreme.height
        ),
        format!("           in {}", format_minutes(view.minutes_until_next)),
        format!("  Coef     {}", view.coefficient),
        format!(
            "  Range    {:.2} m → {:.2} m",
            view.min_tide.height, view.max_tide.height
        ),
    ];

    let gauge = water_gauge(view.water_level);
    let rows = text.len().max(gauge.len());
    let mut out = String::new();
    for i in 0..rows {
        let left = text.get(i).map(String::as_str).unwrap_or("");
        let right = gauge.get(i).map(String::as_str).unwrap_or("");
        let _ = writeln!(out, "{:<27}{}", left, right);
    }
    out
}

/// Render the national coefficient record.
pub fn render_national(national: &NationalCoefficient) -> String {
    let arrow = match national.phase {
        Phase::Rising => "↗ rising",
        Phase::Falling => "↘ falling",
    };
    let mut out = format!("Coefficient {}  {}", national.value, arrow);
    if !national.detail.phase_from_data {
        out.push_str(" (default)");
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "  {}/{} ports used",
        national.detail.used_count, national.detail.total_count
    );
    if !national.detail.excluded_location_ids.is_empty() {
        let _ = writeln!(
            out,
            "  outliers: {}",
            national.detail.excluded_location_ids.join(", ")
        );
    }
    out
}

/// Render the outcome of a batch refresh.
pub fn render_refresh(report: &RefreshReport) -> String {
    let mut out = format!(
        "Refreshed {} port(s) in {}ms, {} failed\n",
        report.refreshed.len(),
        report.duration_ms,
        report.failures.len()
    );
    for failure in &report.failures {
        let _ = writeln!(out, "  ✗ {}: {}", failure.port_id, failure.error);
    }
    match (&report.national, &report.aggregation_error) {
        (Some(national), _) => out.push_str(&render_national(national)),
        (None, Some(error)) => {
            let _ = writeln!(out, "No coefficient: {error}");
        }
        (None, None) => {}
    }
    out
}
