// crates/csvdata-core/src/runtime/render.rs
// ============================================================================
// Module: HTML Rendering
// Description: Renders a result set as a minimal HTML table document.
// Purpose: Produce the filtered-data page body.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Output is a single bordered table under a `Filtered Data` heading. Column
//! names form the header row. Every name and value is HTML-escaped, and
//! `NULL` cells are empty.

use crate::core::ResultSet;

/// Page heading.
const HEADING: &str = "Filtered Data";
/// Opening markup up to and including the table tag.
const TABLE_OPEN: &str = "<table border='1' style='border-collapse:collapse;'>";
/// Header cell opening tag.
const TH_OPEN: &str = "<th style='padding: 5px;'>";
/// Data cell opening tag.
const TD_OPEN: &str = "<td style='padding: 5px;'>";

/// Renders `result` as an HTML document.
#[must_use]
pub fn render_html_table(result: &ResultSet) -> String {
    let mut html = String::with_capacity(256 + result.len() * 64);
    html.push_str("<html><body><h2>");
    html.push_str(HEADING);
    html.push_str("</h2>");
    html.push_str(TABLE_OPEN);

    html.push_str("<tr>");
    for column in &result.columns {
        html.push_str(TH_OPEN);
        escape_into(&mut html, column);
        html.push_str("</th>");
    }
    html.push_str("</tr>");

    for row in &result.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(TD_OPEN);
            escape_into(&mut html, &cell.to_string());
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }

    html.push_str("</table></body></html>");
    html
}

/// Appends `value` to `out` with HTML metacharacters escaped.
fn escape_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
}
