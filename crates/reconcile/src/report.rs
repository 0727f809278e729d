#![allow(clippy::format_push_string)]

//! Self-contained HTML report of a fee audit.
//!
//! Sections always render in the same order. A domain that could not be
//! compared renders its reason in place of the tables; nothing here fails.

use crate::engine::FeeAuditReport;
use crate::order_limits::{OrderLimitRow, OrderLimitsComparison};
use crate::outcome::{Comparison, ComparisonOutcome, Reconciliation};
use crate::vip_fee::VipFeeComparison;
use bito_qa_core::RawTable;
use chrono::{DateTime, Local};
use std::collections::BTreeSet;

const TITLE: &str = "BitoPro Fee Data Comparison Report";

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; line-height: 1.6; margin: 0; padding: 20px; color: #333; }
    h1, h2, h3 { color: #2c3e50; }
    .container { max-width: 1400px; margin: 0 auto; }
    .header { background-color: #3498db; color: white; padding: 20px; text-align: center; margin-bottom: 20px; border-radius: 5px; }
    .header h1 { color: white; }
    .section { background-color: #f9f9f9; padding: 20px; margin-bottom: 20px; border-radius: 5px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
    table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
    th, td { padding: 12px 15px; text-align: left; border-bottom: 1px solid #ddd; word-wrap: break-word; max-width: 300px; }
    th { background-color: #3498db; color: white; white-space: normal; overflow-wrap: break-word; }
    tr:nth-child(even) { background-color: #f2f2f2; }
    .success { color: #27ae60; font-weight: bold; }
    .error { color: #e74c3c; font-weight: bold; }
    .true-value { color: #27ae60; font-weight: bold; }
    .false-value { color: #e74c3c; font-weight: bold; }
    .footer { text-align: center; margin-top: 30px; padding: 20px; background-color: #2c3e50; color: white; border-radius: 5px; }
    .collapsible { background-color: #3498db; color: white; cursor: pointer; padding: 18px; width: 100%; border: none; text-align: left; outline: none; font-size: 16px; border-radius: 5px 5px 0 0; margin-top: 10px; }
    .active, .collapsible:hover { background-color: #2980b9; }
    .content { padding: 0 18px; max-height: 0; overflow: hidden; transition: max-height 0.2s ease-out; background-color: #f9f9f9; border: 1px solid #ddd; border-top: none; }
    .summary-box { background-color: #ecf0f1; padding: 15px; border-radius: 5px; margin-bottom: 20px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
    .summary-title { font-weight: bold; margin-bottom: 10px; }
    .summary-item { display: flex; justify-content: space-between; margin-bottom: 5px; }
    .summary-label { font-weight: bold; }
    .summary-pass { color: #27ae60; }
    .summary-fail { color: #e74c3c; }
    .draggable-table { cursor: grab; overflow: auto; max-width: 100%; }
    .draggable-table:active { cursor: grabbing; }
"#;

const SCRIPT: &str = r#"
    document.addEventListener('DOMContentLoaded', function() {
        var coll = document.getElementsByClassName('collapsible');
        for (var i = 0; i < coll.length; i++) {
            coll[i].addEventListener('click', function() {
                this.classList.toggle('active');
                var content = this.nextElementSibling;
                if (content.style.maxHeight) {
                    content.style.maxHeight = null;
                } else {
                    content.style.maxHeight = content.scrollHeight + 'px';
                }
            });
        }

        var tables = document.getElementsByClassName('draggable-table');
        for (var j = 0; j < tables.length; j++) {
            initDraggable(tables[j]);
        }

        function initDraggable(element) {
            var pos = { top: 0, left: 0, x: 0, y: 0 };
            var onMove = function(e) {
                element.scrollTop = pos.top - (e.clientY - pos.y);
                element.scrollLeft = pos.left - (e.clientX - pos.x);
            };
            var onUp = function() {
                element.style.cursor = 'grab';
                element.style.removeProperty('user-select');
                document.removeEventListener('mousemove', onMove);
                document.removeEventListener('mouseup', onUp);
            };
            element.addEventListener('mousedown', function(e) {
                element.style.cursor = 'grabbing';
                element.style.userSelect = 'none';
                pos = { left: element.scrollLeft, top: element.scrollTop, x: e.clientX, y: e.clientY };
                document.addEventListener('mousemove', onMove);
                document.addEventListener('mouseup', onUp);
            });
        }
    });
"#;

/// One rendered table cell.
enum Cell<'a> {
    Text(&'a str),
    Flag(bool),
}

/// Renders the complete report document.
#[must_use]
pub fn render_html(report: &FeeAuditReport, generated_at: DateTime<Local>) -> String {
    let timestamp = generated_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!("<title>{TITLE}</title>\n"));
    html.push_str(&format!("<style>{STYLE}</style>\n"));
    html.push_str(&format!("<script>{SCRIPT}</script>\n"));
    html.push_str("</head>\n<body>\n<div class=\"container\">\n");
    html.push_str(&format!(
        "<div class=\"header\"><h1>{TITLE}</h1><p>Generated: {timestamp}</p></div>\n"
    ));

    render_order_limits_section(&mut html, &report.order_limits);
    render_vip_fee_section(&mut html, &report.vip_fee);
    render_summary_section(&mut html, report);

    html.push_str(&format!(
        "<div class=\"footer\"><p>{TITLE} | Generated: {timestamp}</p></div>\n"
    ));
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

// =============================================================================
// Sections
// =============================================================================

fn render_order_limits_section(html: &mut String, result: &Reconciliation<OrderLimitsComparison>) {
    html.push_str("<div class=\"section\">\n<h2>1. Order Limits</h2>\n");

    render_row_count(html, result);
    render_source_tables(html, result, "Web order limits", "API order limits");

    match &result.outcome {
        ComparisonOutcome::Compared(comparison) => {
            let header = [
                "Pair",
                "Min amount (web)",
                "Min amount (API)",
                "Amount match",
                "Min digits (web)",
                "Min digits (API)",
                "Digits match",
            ];
            let rows: Vec<Vec<Cell<'_>>> = comparison.rows.iter().map(order_limit_cells).collect();
            let inconsistent: Vec<Vec<Cell<'_>>> =
                comparison.inconsistent().map(order_limit_cells).collect();

            html.push_str(&collapsible(
                &format!("Full comparison (rows: {})", comparison.rows.len()),
                &render_grid(&header, &rows),
            ));

            render_key_set(html, "Pairs only on the web page", &comparison.web_only);
            render_key_set(html, "Pairs only in the API", &comparison.api_only);

            if inconsistent.is_empty() {
                html.push_str(
                    "<h4 class=\"success\">All pairs present on both sides match.</h4>\n",
                );
            } else {
                html.push_str(&format!(
                    "<h4 class=\"error\">Found {} inconsistent pairs:</h4>\n",
                    inconsistent.len()
                ));
                html.push_str(&collapsible(
                    "Inconsistent pairs",
                    &render_grid(&header, &inconsistent),
                ));
            }
        }
        ComparisonOutcome::Error(message) => render_not_compared(html, message),
    }

    html.push_str("</div>\n");
}

fn order_limit_cells(r: &OrderLimitRow) -> Vec<Cell<'_>> {
    vec![
        Cell::Text(&r.pair),
        Cell::Text(&r.web_amount),
        Cell::Text(&r.api_amount),
        Cell::Flag(r.amount_match),
        Cell::Text(&r.web_digits),
        Cell::Text(&r.api_digits),
        Cell::Flag(r.digits_match),
    ]
}

fn render_vip_fee_section(html: &mut String, result: &Reconciliation<VipFeeComparison>) {
    html.push_str("<div class=\"section\">\n<h2>2. VIP Fee Tiers</h2>\n");

    render_row_count(html, result);
    render_source_tables(html, result, "Web VIP fee tiers", "API trading fee rates");

    match &result.outcome {
        ComparisonOutcome::Compared(comparison) => {
            let header = [
                "Level (web)",
                "Level (API)",
                "Level match",
                "Volume (web)",
                "Volume (API)",
                "Volume match",
                "Fee (web)",
                "Fee (API)",
                "Fee match",
                "Fee (web, normalized)",
                "Fee (API, normalized)",
            ];
            let rows: Vec<Vec<Cell<'_>>> = comparison
                .rows
                .iter()
                .map(|r| {
                    vec![
                        Cell::Text(&r.web_level),
                        Cell::Text(&r.api_level),
                        Cell::Flag(r.level_match),
                        Cell::Text(&r.web_volume),
                        Cell::Text(&r.api_volume),
                        Cell::Flag(r.volume_match),
                        Cell::Text(&r.web_fee),
                        Cell::Text(&r.api_fee),
                        Cell::Flag(r.fee_match),
                        Cell::Text(&r.web_fee_normalized),
                        Cell::Text(&r.api_fee_normalized),
                    ]
                })
                .collect();

            html.push_str(&collapsible(
                &format!("Comparison details (rows: {})", comparison.rows.len()),
                &render_grid(&header, &rows),
            ));

            let inconsistent = comparison.inconsistent_count();
            if inconsistent == 0 {
                html.push_str("<h4 class=\"success\">All aligned VIP tiers match.</h4>\n");
            } else {
                let levels: Vec<String> = comparison
                    .inconsistent()
                    .map(|r| escape_html(&r.web_level))
                    .collect();
                html.push_str(&format!(
                    "<h4 class=\"error\">Found {inconsistent} inconsistent tiers: {}</h4>\n",
                    levels.join(", ")
                ));
            }

            let notation_only = comparison.notation_only_fee_differences();
            if notation_only > 0 {
                html.push_str(&format!(
                    "<p>Note: {notation_only} fee values differ only in notation. The web page \
                     shows percentages (e.g. 0.1%) while the API returns fractions (e.g. 0.001); \
                     they match after normalization.</p>\n"
                ));
            }
        }
        ComparisonOutcome::Error(message) => render_not_compared(html, message),
    }

    html.push_str("</div>\n");
}

fn render_summary_section(html: &mut String, report: &FeeAuditReport) {
    let stats = &report.statistics;

    html.push_str("<div class=\"section\">\n<h2>3. Consistency Summary</h2>\n");
    html.push_str("<div class=\"summary-box\">\n");
    html.push_str("<div class=\"summary-title\">Check results</div>\n");
    html.push_str(&format!(
        "<div class=\"summary-item\"><span class=\"summary-label\">Total checks:</span>\
         <span class=\"summary-value\">{}</span></div>\n",
        stats.total_checks()
    ));
    html.push_str(&format!(
        "<div class=\"summary-item\"><span class=\"summary-label\">Passed:</span>\
         <span class=\"summary-value summary-pass\">{} ({:.1}%)</span></div>\n",
        stats.passed_checks(),
        stats.pass_rate()
    ));
    html.push_str(&format!(
        "<div class=\"summary-item\"><span class=\"summary-label\">Failed:</span>\
         <span class=\"summary-value summary-fail\">{} ({:.1}%)</span></div>\n",
        stats.failed_checks(),
        stats.fail_rate()
    ));
    html.push_str("</div>\n");
    html.push_str(&format!(
        "<p>Web tables compared: {}</p>\n",
        report.web_table_count()
    ));

    render_domain_verdict(html, "Order limits", &report.order_limits);
    render_domain_verdict(html, "VIP fee tiers", &report.vip_fee);

    html.push_str("</div>\n");
}

// =============================================================================
// Building blocks
// =============================================================================

fn render_row_count<C>(html: &mut String, result: &Reconciliation<C>) {
    let (Some(rows_match), Some(web), Some(api)) =
        (result.rows_match, &result.web_table, &result.api_table)
    else {
        return;
    };
    html.push_str(&format!(
        "<p>Row count between web and API: {} (web: {}, API: {})</p>\n",
        verdict_span(rows_match, "match", "mismatch"),
        web.len(),
        api.len()
    ));
}

fn render_source_tables<C>(
    html: &mut String,
    result: &Reconciliation<C>,
    web_label: &str,
    api_label: &str,
) {
    if let Some(table) = &result.web_table {
        html.push_str(&collapsible(
            &format!("{web_label} (rows: {})", table.len()),
            &render_raw_table(table),
        ));
    }
    if let Some(table) = &result.api_table {
        html.push_str(&collapsible(
            &format!("{api_label} (rows: {})", table.len()),
            &render_raw_table(table),
        ));
    }
}

fn render_not_compared(html: &mut String, message: &str) {
    html.push_str(&format!(
        "<p class=\"error\">Comparison not performed: {}</p>\n\
         <p>The table structure may have changed; check the tables above manually.</p>\n",
        escape_html(message)
    ));
}

fn render_key_set(html: &mut String, label: &str, keys: &BTreeSet<String>) {
    if keys.is_empty() {
        return;
    }
    let joined = keys
        .iter()
        .map(|k| escape_html(k))
        .collect::<Vec<_>>()
        .join(", ");
    html.push_str(&format!("<h4>{label}:</h4>\n<p>{joined}</p>\n"));
}

fn render_domain_verdict<C: Comparison>(html: &mut String, label: &str, result: &Reconciliation<C>) {
    if let Some(rows_match) = result.rows_match {
        html.push_str(&format!(
            "<p>{label} row count: {}</p>\n",
            verdict_span(rows_match, "match ✓", "mismatch ✗")
        ));
    }

    match &result.outcome {
        ComparisonOutcome::Compared(comparison) if comparison.inconsistent_count() == 0 => {
            html.push_str(&format!(
                "<p class=\"success\">{label}: web and API data are consistent ✓</p>\n"
            ));
        }
        ComparisonOutcome::Compared(comparison) => {
            html.push_str(&format!(
                "<p class=\"error\">{label}: {} of {} rows inconsistent ✗</p>\n",
                comparison.inconsistent_count(),
                comparison.row_count()
            ));
        }
        ComparisonOutcome::Error(_) => {
            html.push_str(&format!(
                "<p class=\"error\">{label}: not compared ✗</p>\n"
            ));
        }
    }
}

fn verdict_span(ok: bool, yes: &str, no: &str) -> String {
    if ok {
        format!("<span class=\"success\">{yes}</span>")
    } else {
        format!("<span class=\"error\">{no}</span>")
    }
}

fn collapsible(title: &str, body: &str) -> String {
    format!(
        "<button class=\"collapsible\">{} - click to expand/collapse</button>\n\
         <div class=\"content\"><div class=\"draggable-table\">\n{body}</div></div>\n",
        escape_html(title)
    )
}

fn render_raw_table(table: &RawTable) -> String {
    let header: Vec<&str> = table.columns().iter().map(String::as_str).collect();
    let rows: Vec<Vec<Cell<'_>>> = table
        .rows()
        .iter()
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|c| Cell::Text(row.get(c).map_or("", String::as_str)))
                .collect()
        })
        .collect();
    render_grid(&header, &rows)
}

fn render_grid(header: &[&str], rows: &[Vec<Cell<'_>>]) -> String {
    let mut out = String::from("<table class=\"table\">\n<thead><tr>");
    for name in header {
        out.push_str(&format!("<th>{}</th>", escape_html(name)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            match cell {
                Cell::Text(text) => out.push_str(&format!("<td>{}</td>", escape_html(text))),
                Cell::Flag(true) => out.push_str("<td><span class=\"true-value\">True</span></td>"),
                Cell::Flag(false) => {
                    out.push_str("<td><span class=\"false-value\">False</span></td>");
                }
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Escapes text for element content and double-quoted attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
