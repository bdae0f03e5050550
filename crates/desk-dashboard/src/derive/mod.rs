//! Pure functions turning an [`AggregatePayload`](repairdesk_client::AggregatePayload)
//! into what each widget draws. None of them mutate the payload or keep state.

pub mod challan;
pub mod grouping;
pub mod percent;
pub mod ranking;
pub mod timeline;

pub use challan::{ChallanMonthView, ChallanSummary, challan_summary};
pub use grouping::{
    Segment, StackedBar, StatusBreakdown, group_by_division, market_status,
    out_of_warranty_status, warranty_settlement,
};
pub use percent::{RetailSummary, Share, percentages, retail_summary};
pub use ranking::{CustomerSummary, RankedEntry, TOP_CUSTOMERS, customer_summary, top_n};
pub use timeline::{
    DeliveryRecord, DeliveryTimeline, MonthlyDelivery, RepairRecord, RepairTimeline,
    delivery_days, out_of_warranty_timeline, parse_date, warranty_timeline,
};
