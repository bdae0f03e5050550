use repairdesk_client::{AggregatePayload, SettlementCounts};

#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub label: String,
    pub count: u64,
    /// 0 to 100.
    pub percent: f64,
}

/// `count / total * 100` for every entry; every share is `0` when the total is `0`.
pub fn percentages<L: AsRef<str>>(counts: &[(L, u64)]) -> Vec<Share> {
    let total = counts.iter().fold(0u64, |acc, (_, c)| acc.saturating_add(*c));

    counts
        .iter()
        .map(|(label, count)| Share {
            label: label.as_ref().to_string(),
            count: *count,
            percent: if total == 0 {
                0.0
            } else {
                *count as f64 * 100.0 / total as f64
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetailSummary {
    pub divisions: Vec<Share>,
    pub settlement: Vec<Share>,
    /// Share of the settlement pie that is settled, the pie's headline number.
    pub settled_percent: f64,
}

fn settlement_counts(pie: &SettlementCounts) -> [(&'static str, u64); 4] {
    [
        ("Not Received", pie.not_received),
        ("Not Settled", pie.received_not_settled),
        ("To Settle", pie.propose_for_settlement),
        ("Settled", pie.settled),
    ]
}

pub fn retail_summary(payload: &AggregatePayload) -> RetailSummary {
    let retail = &payload.retail;

    let divisions: Vec<(&str, u64)> = retail
        .division_wise_donut
        .iter()
        .map(|d| (d.division.as_str(), d.count))
        .collect();

    let settlement = percentages(&settlement_counts(&retail.settled_vs_unsettled_pie_chart));
    let settled_percent = settlement.last().map_or(0.0, |s| s.percent);

    RetailSummary {
        divisions: percentages(&divisions),
        settlement,
        settled_percent,
    }
}
