//! Plain-text rendering of ledger contents for the shell.

use crate::models::{HarvestRecord, LossSummary, RowIdentifier};

/// Format an amount as Brazilian reais, e.g. `R$ 1.234,56`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}R$ {},{}", sign, grouped, frac_part)
}

/// Render one record as a boxed card.
///
/// ```text
/// ╔══════════════════╗
/// ║  Record #1 – A1  ║
/// ╚══════════════════╝
/// Date: 2025-06-01
/// ...
/// ```
pub fn render_card(position: usize, record: &HarvestRecord) -> String {
    let title = format!("Record #{} – {}", position, record.plot_name());
    let bar = "═".repeat(title.chars().count() + 4);

    let lines = [
        format!("╔{}╗", bar),
        format!("║  {}  ║", title),
        format!("╚{}╝", bar),
        format!("Date: {}", record.date()),
        format!("Method: {}", record.method()),
        format!("Area: {} ha", record.area_ha()),
        format!("Yield: {} t/ha", record.yield_t_per_ha()),
        format!("Loss: {} t ({}%)", record.loss_tons(), record.loss_pct()),
        format!("Loss cost: {}", format_currency(record.loss_cost())),
    ];

    let mut out = String::new();
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn render_ledger(records: &[HarvestRecord]) -> String {
    if records.is_empty() {
        return "No records.\n".to_string();
    }
    records
        .iter()
        .enumerate()
        .map(|(i, r)| render_card(i + 1, r))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_summary(summary: &LossSummary) -> String {
    format!(
        "Total produced (t): {:.2}\nTotal lost     (t): {:.2}\nLoss cost     (R$): {}\n",
        summary.total_tons,
        summary.loss_tons,
        format_currency(summary.loss_cost)
    )
}

/// Stored rows, one line each, in table column order.
pub fn render_rows(records: &[HarvestRecord]) -> String {
    if records.is_empty() {
        return "No rows.\n".to_string();
    }
    let mut out = String::new();
    for r in records {
        out.push_str(&format!(
            "{} | {} | {} | {:.2} | {:.2} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2}\n",
            r.id(),
            r.date(),
            r.plot_name(),
            r.area_ha(),
            r.yield_t_per_ha(),
            r.method(),
            r.price_per_ton(),
            r.loss_pct(),
            r.loss_tons(),
            r.loss_cost(),
            r.total_tons(),
        ));
    }
    out
}

pub fn render_identifiers(ids: &[RowIdentifier]) -> String {
    if ids.is_empty() {
        return "No rows.\n".to_string();
    }
    let mut out = String::new();
    for (i, row) in ids.iter().enumerate() {
        out.push_str(&format!("[{}] {} {} {}\n", i + 1, row.date, row.plot_name, row.id));
    }
    out
}
