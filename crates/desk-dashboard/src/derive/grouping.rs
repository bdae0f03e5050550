use repairdesk_client::AggregatePayload;

/// Count for one status inside a division's bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub status: String,
    pub count: u64,
}

/// One bar per division with a segment per status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackedBar {
    pub division: String,
    pub segments: Vec<Segment>,
}

impl StackedBar {
    pub fn count(&self, status: &str) -> u64 {
        self.segments
            .iter()
            .find(|s| s.status == status)
            .map_or(0, |s| s.count)
    }

    pub fn total(&self) -> u64 {
        self.segments.iter().map(|s| s.count).sum()
    }

    /// Each segment's share of this bar, all zero when the bar is empty.
    pub fn shares(&self) -> Vec<crate::derive::Share> {
        let counts: Vec<(&str, u64)> = self
            .segments
            .iter()
            .map(|s| (s.status.as_str(), s.count))
            .collect();
        crate::derive::percentages(&counts)
    }
}

/// Folds `(division, status, count)` rows into one bar per division, in order of first
/// appearance. Every bar starts with both `named` statuses at zero; other statuses are
/// appended as they show up. Repeated rows for the same pair add up.
pub fn group_by_division<'a, I>(rows: I, named: [&str; 2]) -> Vec<StackedBar>
where
    I: IntoIterator<Item = (&'a str, &'a str, u64)>,
{
    let mut bars: Vec<StackedBar> = Vec::new();

    for (division, status, count) in rows {
        let idx = match bars.iter().position(|b| b.division == division) {
            Some(idx) => idx,
            None => {
                bars.push(StackedBar {
                    division: division.to_string(),
                    segments: named
                        .iter()
                        .map(|s| Segment {
                            status: (*s).to_string(),
                            count: 0,
                        })
                        .collect(),
                });
                bars.len() - 1
            }
        };

        let bar = &mut bars[idx];
        match bar.segments.iter_mut().find(|s| s.status == status) {
            Some(segment) => segment.count = segment.count.saturating_add(count),
            None => bar.segments.push(Segment {
                status: status.to_string(),
                count,
            }),
        }
    }

    bars
}

/// Bars plus the display names of the two expected statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub statuses: [&'static str; 2],
    pub labels: [&'static str; 2],
    pub bars: Vec<StackedBar>,
}

impl StatusBreakdown {
    pub fn label_for<'a>(&self, status: &'a str) -> &'a str {
        self.statuses
            .iter()
            .position(|s| *s == status)
            .map_or(status, |i| self.labels[i])
    }
}

const YES_NO: [&str; 2] = ["Y", "N"];
const COMPLETED_PENDING: [&str; 2] = ["COMPLETED", "PENDING"];
const LABELS: [&str; 2] = ["Completed", "Pending"];

pub fn market_status(payload: &AggregatePayload) -> StatusBreakdown {
    let rows = payload
        .market
        .status_per_division_stacked_bar_chart
        .iter()
        .map(|r| (r.division.as_str(), r.final_status.as_str(), r.count));
    StatusBreakdown {
        statuses: YES_NO,
        labels: LABELS,
        bars: group_by_division(rows, YES_NO),
    }
}

pub fn warranty_settlement(payload: &AggregatePayload) -> StatusBreakdown {
    let rows = payload
        .warranty
        .division_wise_pending_completed_bar_graph
        .iter()
        .map(|r| (r.division.as_str(), r.settlement.as_str(), r.count));
    StatusBreakdown {
        statuses: YES_NO,
        labels: ["Settled", "Pending"],
        bars: group_by_division(rows, YES_NO),
    }
}

pub fn out_of_warranty_status(payload: &AggregatePayload) -> StatusBreakdown {
    let rows = payload
        .out_of_warranty
        .final_status_bar_graph
        .iter()
        .map(|r| (r.division.as_str(), r.status.as_str(), r.count));
    StatusBreakdown {
        statuses: COMPLETED_PENDING,
        labels: LABELS,
        bars: group_by_division(rows, COMPLETED_PENDING),
    }
}
