//! Reporting engine: aggregate KPIs re-derived from the analytical store.
//!
//! Computation is a pure function of the rows read back from disk plus the
//! render timestamp. The zero-data case renders placeholders instead of
//! failing, and the average ticket never divides by zero.

use crate::record::CleanRecord;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRevenue {
    pub product_id: String,
    pub revenue: f64,
    /// Integer-rounded percentage of total revenue. The sum over all
    /// products may drift ±1 from 100; that rounding rule is part of the
    /// report's output contract.
    pub share_pct: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub revenue: f64,
    pub transactions: usize,
}

/// Aggregates over the clean set. Ephemeral: recomputed on every run,
/// rendered as text, never persisted as structured data.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub total_revenue: f64,
    pub transactions: usize,
    pub avg_ticket: f64,
    pub products: Vec<ProductRevenue>,
    pub by_day: Vec<DailyRollup>,
    pub period: Option<(NaiveDate, NaiveDate)>,
    pub top_product: Option<String>,
}

/// Bronze/silver/quarantine row totals for the coverage section.
#[derive(Debug, Clone, Copy)]
pub struct RowCounts {
    pub bronze: usize,
    pub silver: usize,
    pub quarantined: usize,
}

impl AggregateReport {
    pub fn compute(records: &[CleanRecord]) -> Self {
        let total_revenue: f64 = records.iter().map(|r| r.amount).sum();
        let transactions = records.len();
        let avg_ticket = if transactions > 0 {
            total_revenue / transactions as f64
        } else {
            0.0
        };

        let mut per_product: HashMap<&str, f64> = HashMap::new();
        for rec in records {
            *per_product.entry(rec.product_id.as_str()).or_insert(0.0) += rec.amount;
        }

        // Floor the denominator at 1 so a zero-revenue ranking still renders.
        let share_denom = if total_revenue > 0.0 { total_revenue } else { 1.0 };
        let mut products: Vec<ProductRevenue> = per_product
            .into_iter()
            .map(|(product_id, revenue)| ProductRevenue {
                product_id: product_id.to_string(),
                revenue,
                share_pct: (100.0 * revenue / share_denom).round() as i64,
            })
            .collect();
        products.sort_by(|a, b| {
            b.revenue
                .partial_cmp(&a.revenue)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        let mut per_day: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for rec in records {
            let entry = per_day.entry(rec.date).or_insert((0.0, 0));
            entry.0 += rec.amount;
            entry.1 += 1;
        }
        let by_day: Vec<DailyRollup> = per_day
            .into_iter()
            .map(|(date, (revenue, transactions))| DailyRollup {
                date,
                revenue,
                transactions,
            })
            .collect();

        let period = match (by_day.first(), by_day.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        };
        let top_product = products.first().map(|p| p.product_id.clone());

        Self {
            total_revenue,
            transactions,
            avg_ticket,
            products,
            by_day,
            period,
            top_product,
        }
    }
}

/// Render the fixed-structure Markdown document.
pub fn render(
    report: &AggregateReport,
    counts: RowCounts,
    parquet_path: &Path,
    db_path: &Path,
    generated_at: DateTime<Utc>,
) -> String {
    let (period_start, period_end) = match report.period {
        Some((start, end)) => (start.to_string(), end.to_string()),
        None => ("—".to_string(), "—".to_string()),
    };
    let top_product = report.top_product.as_deref().unwrap_or("—");

    let mut out = String::new();

    out.push_str("# Sales Report\n");
    let _ = writeln!(
        out,
        "**Period:** {} to {} · **Source:** clean_sales (Parquet) · **Generated:** {}\n",
        period_start,
        period_end,
        generated_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    );

    out.push_str("## 1. Headline\n");
    let _ = writeln!(
        out,
        "Total revenue {:.2} €; top product: {}.\n",
        report.total_revenue, top_product
    );

    out.push_str("## 2. KPIs\n");
    let _ = writeln!(out, "- **Net revenue:** {:.2} €", report.total_revenue);
    let _ = writeln!(out, "- **Average ticket:** {:.2} €", report.avg_ticket);
    let _ = writeln!(out, "- **Transactions:** {}\n", report.transactions);

    out.push_str("## 3. Top products\n");
    if report.products.is_empty() {
        out.push_str("_(no data)_\n\n");
    } else {
        out.push_str("| product_id | revenue | share |\n");
        out.push_str("|---|---:|---:|\n");
        for product in &report.products {
            let _ = writeln!(
                out,
                "| {} | {:.2} € | {}% |",
                product.product_id, product.revenue, product.share_pct
            );
        }
        out.push('\n');
    }

    out.push_str("## 4. Daily summary\n");
    if report.by_day.is_empty() {
        out.push_str("_(no data)_\n\n");
    } else {
        out.push_str("| date | revenue | transactions |\n");
        out.push_str("|---|---:|---:|\n");
        for day in &report.by_day {
            let _ = writeln!(
                out,
                "| {} | {:.2} € | {} |",
                day.date, day.revenue, day.transactions
            );
        }
        out.push('\n');
    }

    out.push_str("## 5. Quality & coverage\n");
    let _ = writeln!(
        out,
        "- Bronze rows: {} · Silver: {} · Quarantine: {}\n",
        counts.bronze, counts.silver, counts.quarantined
    );

    out.push_str("## 6. Persistence\n");
    let _ = writeln!(out, "- Parquet: {}", parquet_path.display());
    let _ = writeln!(
        out,
        "- SQLite : {} (tables: raw_sales, clean_sales; view: daily_sales)\n",
        db_path.display()
    );

    out.push_str("## 7. Recommendations\n");
    out.push_str("- Restock the top product to match demand.\n");
    out.push_str("- Review quarantined rows (types/ranges).\n");
    out.push_str("- Consider partitioning by date as volume grows.\n");

    out
}
