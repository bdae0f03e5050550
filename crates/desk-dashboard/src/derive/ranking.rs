use repairdesk_client::{AggregatePayload, CustomerCount};

pub const TOP_CUSTOMERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub name: String,
    pub value: u64,
}

/// The `n` largest entries, highest first. Equal values keep the order they arrived in.
pub fn top_n(entries: &[CustomerCount], n: usize) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = entries
        .iter()
        .map(|entry| RankedEntry {
            name: entry.name.clone(),
            value: entry.value,
        })
        .collect();
    ranked.sort_by(|a, b| b.value.cmp(&a.value));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSummary {
    pub customers: u64,
    pub asc_names: u64,
    pub top: Vec<RankedEntry>,
}

pub fn customer_summary(payload: &AggregatePayload) -> CustomerSummary {
    let section = &payload.customer;
    CustomerSummary {
        customers: section.number_of_customers,
        asc_names: section.number_of_asc_names,
        top: top_n(section.top_customers.entries(), TOP_CUSTOMERS),
    }
}
