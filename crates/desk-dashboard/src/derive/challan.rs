use chrono::NaiveDate;
use repairdesk_client::AggregatePayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallanMonthView {
    /// `YYYY-MM` as sent by the backend.
    pub month: String,
    /// e.g. `January 2025`.
    pub label: String,
    /// e.g. `Jan`.
    pub short: String,
    pub challans: u64,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallanSummary {
    pub challans: u64,
    pub items: u64,
    pub months: Vec<ChallanMonthView>,
}

/// Month labels for a `YYYY-MM` key. Unparseable keys are shown as-is.
fn month_labels(month: &str) -> (String, String) {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").map_or_else(
        |_| (month.to_string(), month.to_string()),
        |d| (d.format("%B %Y").to_string(), d.format("%b").to_string()),
    )
}

pub fn challan_summary(payload: &AggregatePayload) -> ChallanSummary {
    let section = &payload.challan;
    let months = section
        .challan_rolling_months
        .iter()
        .map(|m| {
            let (label, short) = month_labels(&m.month);
            ChallanMonthView {
                month: m.month.clone(),
                label,
                short,
                challans: m.total_challans,
                quantity: m.total_quantity,
            }
        })
        .collect();

    ChallanSummary {
        challans: section.number_of_challans,
        items: section.number_of_items,
        months,
    }
}
