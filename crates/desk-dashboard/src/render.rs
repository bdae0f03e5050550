//! Plain-text renderers for the dashboard cards.
//!
//! Writing into a `String` cannot fail, so `writeln!` results are ignored throughout.

use std::fmt::Write;

use chrono::NaiveDate;
use repairdesk_types::Division;

use crate::{
    derive::{Share, StatusBreakdown},
    fetcher::DashboardState,
    widgets::{ChartViewModel, WIDGETS, WidgetFrame, WidgetSpec},
};

const BAR_WIDTH: usize = 24;

fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = ((value as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled.min(BAR_WIDTH))
}

fn percent_bar(percent: f64) -> String {
    let filled = (percent / 100.0 * BAR_WIDTH as f64).round().max(0.0) as usize;
    "#".repeat(filled.min(BAR_WIDTH))
}

fn dmy(date: NaiveDate) -> String {
    date.format("%d-%m-%y").to_string()
}

/// Known divisions are shown in their canonical spelling, anything else as sent.
fn division_label(raw: &str) -> String {
    Division::lookup(raw).map_or_else(|| raw.to_string(), |d| d.to_string())
}

fn shares(out: &mut String, shares: &[Share], label: fn(&str) -> String) {
    for share in shares {
        let _ = writeln!(
            out,
            "  {:<14} {:>6} {:>5.1}% {}",
            label(&share.label),
            share.count,
            share.percent,
            percent_bar(share.percent)
        );
    }
}

fn stacked(out: &mut String, breakdown: &StatusBreakdown) {
    if breakdown.bars.is_empty() {
        let _ = writeln!(out, "  (no records)");
        return;
    }
    for bar in &breakdown.bars {
        let _ = writeln!(
            out,
            "  {:<8} total {}",
            division_label(&bar.division),
            bar.total()
        );
        for share in bar.shares() {
            let _ = writeln!(
                out,
                "    {:<12} {:>5} ({:.1}%) {}",
                breakdown.label_for(&share.label),
                share.count,
                share.percent,
                percent_bar(share.percent)
            );
        }
    }
}

pub fn customer(model: &ChartViewModel) -> String {
    let ChartViewModel::Customer(summary) = model else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Customers: {}   ASC names: {}",
        summary.customers, summary.asc_names
    );
    let _ = writeln!(out, "Top customers:");
    if summary.top.is_empty() {
        let _ = writeln!(out, "  (none yet)");
    }
    let max = summary.top.first().map_or(0, |t| t.value);
    for entry in &summary.top {
        let _ = writeln!(
            out,
            "  {:<24} {:>6} {}",
            entry.name,
            entry.value,
            bar(entry.value, max)
        );
    }
    out
}

pub fn warranty(model: &ChartViewModel) -> String {
    let ChartViewModel::Warranty {
        settlement,
        timeline,
    } = model
    else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "Settlement by division:");
    stacked(&mut out, settlement);

    let _ = writeln!(out, "SRF to delivery, monthly average:");
    if timeline.monthly.is_empty() {
        let _ = writeln!(out, "  (no deliveries)");
    }
    for month in &timeline.monthly {
        let _ = writeln!(
            out,
            "  {:<9} {:>4} days over {} SRF(s)",
            month.month, month.avg_days, month.count
        );
    }

    let recent = timeline.recent();
    if !recent.is_empty() {
        let _ = writeln!(out, "Recent deliveries:");
    }
    for record in recent {
        let _ = writeln!(
            out,
            "  {} {:<12} {} -> {} {:>4} days {}",
            record.band.marker(),
            record.srf_number,
            dmy(record.srf_date),
            dmy(record.delivery_date),
            record.days,
            record.band
        );
    }
    out
}

pub fn out_of_warranty(model: &ChartViewModel) -> String {
    let ChartViewModel::OutOfWarranty { status, timeline } = model else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "SRF / repair / delivery:");
    if timeline.records.is_empty() {
        let _ = writeln!(out, "  (no SRFs)");
    }
    for record in &timeline.records {
        let repair = record.repair_date.map_or_else(|| "--".to_string(), dmy);
        let delivery = record.delivery_date.map_or_else(|| "--".to_string(), dmy);
        let band = record
            .band()
            .map_or_else(|| "Open".to_string(), |b| format!("{} {b}", b.marker()));
        let _ = writeln!(
            out,
            "  {:<12} {} | {:<8} | {:<8} {}",
            record.srf_number,
            dmy(record.srf_date),
            repair,
            delivery,
            band
        );
    }

    let _ = writeln!(out, "Final status by division:");
    stacked(&mut out, status);
    out
}

pub fn market(model: &ChartViewModel) -> String {
    let ChartViewModel::Market(breakdown) = model else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "Status per division:");
    stacked(&mut out, breakdown);
    out
}

pub fn challan(model: &ChartViewModel) -> String {
    let ChartViewModel::Challan(summary) = model else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Challans: {}   Items dispatched: {}",
        summary.challans, summary.items
    );
    let max = summary.months.iter().map(|m| m.challans).max().unwrap_or(0);
    for month in &summary.months {
        let _ = writeln!(
            out,
            "  {:<14} {:>5} challans {:>6} qty {}",
            month.label,
            month.challans,
            month.quantity,
            bar(month.challans, max)
        );
    }
    out
}

pub fn retail(model: &ChartViewModel) -> String {
    let ChartViewModel::Retail(summary) = model else {
        return String::new();
    };

    let mut out = String::new();
    let _ = writeln!(out, "Division mix:");
    if summary.divisions.is_empty() {
        let _ = writeln!(out, "  (no sales)");
    }
    shares(&mut out, &summary.divisions, division_label);
    let _ = writeln!(out, "Settlement ({:.1}% settled):", summary.settled_percent);
    shares(&mut out, &summary.settlement, str::to_string);
    out
}

/// One card: header, actions and whichever frame the state resolves to.
pub fn render_card(spec: &WidgetSpec, state: &DashboardState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", spec.icon, spec.title);
    let _ = writeln!(out, "  Actions: {}", spec.actions.join(" | "));

    let body = WidgetFrame::resolve(spec, state).render(spec);
    for line in body.lines() {
        let _ = writeln!(out, "  {line}");
    }
    out
}

pub fn render_dashboard(state: &DashboardState) -> String {
    let mut out = String::from("Menu Dashboard\n==============\n");
    for spec in &WIDGETS {
        out.push('\n');
        out.push_str(&render_card(spec, state));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use repairdesk_client::{AggregatePayload, MarketStatusCount, TopCustomers};

    use super::*;
    use crate::fetcher::FetchError;

    fn state(payload: AggregatePayload) -> DashboardState {
        DashboardState {
            data: Some(Arc::new(payload)),
            loading: false,
            error: None,
            generation: 1,
        }
    }

    #[test]
    fn test_dashboard_lists_every_card() {
        let rendered = render_dashboard(&state(AggregatePayload::fallback()));
        for spec in &WIDGETS {
            assert!(rendered.contains(spec.title));
        }
        assert!(rendered.contains("Create Vendor Challan"));
    }

    #[test]
    fn test_error_state_shows_placeholder_on_every_card() {
        let failed = DashboardState {
            error: Some(FetchError::Status(500)),
            ..state(AggregatePayload::fallback())
        };
        let rendered = render_dashboard(&failed);
        assert_eq!(rendered.matches("Error Loading ...").count(), WIDGETS.len());
    }

    #[test]
    fn test_refetch_does_not_keep_stale_rows() {
        let mut first = AggregatePayload::fallback();
        first.customer.top_customers = TopCustomers::from_iter([("Old Traders".to_string(), 3)]);
        first.market.status_per_division_stacked_bar_chart = vec![MarketStatusCount {
            division: "COOLER".to_string(),
            final_status: "Y".to_string(),
            count: 2,
        }];
        let before = render_dashboard(&state(first));
        assert!(before.contains("Old Traders"));
        assert!(before.contains("COOLER"));

        let mut second = AggregatePayload::fallback();
        second.customer.top_customers = TopCustomers::from_iter([("New Agencies".to_string(), 8)]);
        let after = render_dashboard(&state(second));
        assert!(after.contains("New Agencies"));
        assert!(!after.contains("Old Traders"));
        assert!(!after.contains("COOLER"));
    }

    #[test]
    fn test_division_labels_are_normalized() {
        assert_eq!(division_label("fans"), "FANS");
        assert_eq!(division_label("Geyser"), "Geyser");
    }

    #[test]
    fn test_bars_scale_to_largest() {
        assert_eq!(bar(10, 10).len(), BAR_WIDTH);
        assert_eq!(bar(5, 10).len(), BAR_WIDTH / 2);
        assert!(bar(0, 0).is_empty());
        assert_eq!(percent_bar(50.0).len(), BAR_WIDTH / 2);
    }
}
