use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use repairdesk_client::AggregatePayload;
use repairdesk_types::DeliveryBand;
use tracing::debug;

const MS_PER_DAY: i64 = 86_400_000;

/// Number of most recent deliveries the warranty card lists.
pub const RECENT_DELIVERIES: usize = 10;

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]`, `YYYY-MM-DD HH:MM:SS[.fff]` and
/// `YYYY-MM-DD`. Times without an offset are taken as UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Whole days from `start` to `end`, rounded up.
pub fn delivery_days(start: &str, end: &str) -> Option<i64> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    Some(days_between(start, end))
}

fn days_between(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let ms = (end - start).num_milliseconds();
    let days = ms.div_euclid(MS_PER_DAY);
    if ms.rem_euclid(MS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

/// `Math.round` semantics: halves round towards positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub srf_number: String,
    pub srf_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub days: i64,
    pub band: DeliveryBand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyDelivery {
    /// e.g. `Jan 2025`, taken from the SRF date.
    pub month: String,
    pub count: u64,
    pub avg_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryTimeline {
    pub records: Vec<DeliveryRecord>,
    /// In order of first appearance.
    pub monthly: Vec<MonthlyDelivery>,
}

impl DeliveryTimeline {
    pub fn recent(&self) -> &[DeliveryRecord] {
        let skip = self.records.len().saturating_sub(RECENT_DELIVERIES);
        &self.records[skip..]
    }
}

pub fn warranty_timeline(payload: &AggregatePayload) -> DeliveryTimeline {
    let mut records = Vec::new();
    let mut totals: Vec<(String, u64, i64)> = Vec::new();

    for item in &payload.warranty.srf_vs_delivery_month_wise_bar_graph {
        let (Some(srf), Some(delivery)) = (parse_date(&item.srf_date), parse_date(&item.delivery_date))
        else {
            debug!(srf_number = %item.srf_number, "Skipping SRF with unparseable dates");
            continue;
        };

        let days = days_between(srf, delivery);
        let month = srf.format("%b %Y").to_string();
        match totals.iter_mut().find(|(m, _, _)| *m == month) {
            Some((_, count, total)) => {
                *count += 1;
                *total += days;
            }
            None => totals.push((month, 1, days)),
        }

        records.push(DeliveryRecord {
            srf_number: item.srf_number.clone(),
            srf_date: srf.date(),
            delivery_date: delivery.date(),
            days,
            band: DeliveryBand::from_days(days),
        });
    }

    let monthly = totals
        .into_iter()
        .map(|(month, count, total)| MonthlyDelivery {
            month,
            count,
            avg_days: round_half_up(total as f64 / count as f64),
        })
        .collect();

    DeliveryTimeline { records, monthly }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairRecord {
    pub srf_number: String,
    pub srf_date: NaiveDate,
    pub repair_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub repair_days: Option<i64>,
    pub delivery_days: Option<i64>,
}

impl RepairRecord {
    /// Banded on SRF to delivery; `None` while the unit is still out.
    pub fn band(&self) -> Option<DeliveryBand> {
        self.delivery_days.map(DeliveryBand::from_days)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairTimeline {
    pub records: Vec<RepairRecord>,
}

pub fn out_of_warranty_timeline(payload: &AggregatePayload) -> RepairTimeline {
    let records = payload
        .out_of_warranty
        .srf_receive_vs_delivery_bar_graph
        .iter()
        .filter_map(|item| {
            let Some(srf) = parse_date(&item.srf_date) else {
                debug!(srf_number = %item.srf_number, "Skipping SRF with unparseable date");
                return None;
            };
            let repair = parse_date(&item.repair_date);
            let delivery = parse_date(&item.delivery_date);

            Some(RepairRecord {
                srf_number: item.srf_number.clone(),
                srf_date: srf.date(),
                repair_date: repair.map(|d| d.date()),
                delivery_date: delivery.map(|d| d.date()),
                repair_days: repair.map(|d| days_between(srf, d)),
                delivery_days: delivery.map(|d| days_between(srf, d)),
            })
        })
        .collect();

    RepairTimeline { records }
}

#[cfg(test)]
mod tests {
    use repairdesk_client::{SrfDelivery, SrfRepairDelivery};

    use super::*;

    fn srf(number: &str, srf_date: &str, delivery_date: &str) -> SrfDelivery {
        SrfDelivery {
            srf_number: number.to_string(),
            srf_date: srf_date.to_string(),
            delivery_date: delivery_date.to_string(),
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2025-03-05"), Some(expected));
        assert_eq!(parse_date("2025-03-05T00:00:00"), Some(expected));
        assert_eq!(parse_date("2025-03-05 00:00:00.000"), Some(expected));
        assert_eq!(parse_date("2025-03-05T05:30:00+05:30"), Some(expected));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("05/03/2025"), None);
    }

    #[test]
    fn test_delivery_days_rounds_up() {
        assert_eq!(delivery_days("2025-01-01", "2025-01-08"), Some(7));
        assert_eq!(delivery_days("2025-01-01", "2025-01-08T01:00:00"), Some(8));
        assert_eq!(delivery_days("2025-01-01", "2025-01-01"), Some(0));
        assert_eq!(delivery_days("2025-01-02T00:00:00", "2025-01-01T12:00:00"), Some(0));
        assert_eq!(delivery_days("2025-01-01", "not a date"), None);
    }

    #[test]
    fn test_warranty_timeline_bands_and_monthly_stats() {
        let mut payload = AggregatePayload::fallback();
        payload.warranty.srf_vs_delivery_month_wise_bar_graph = vec![
            srf("W1", "2025-01-03", "2025-01-06"),
            srf("W2", "2025-01-20", "2025-01-24"),
            srf("W3", "2025-02-01", "2025-02-23"),
            srf("W4", "garbage", "2025-02-23"),
        ];

        let timeline = warranty_timeline(&payload);
        assert_eq!(timeline.records.len(), 3);
        assert_eq!(timeline.records[0].days, 3);
        assert_eq!(timeline.records[0].band, DeliveryBand::Fast);
        assert_eq!(timeline.records[2].days, 22);
        assert_eq!(timeline.records[2].band, DeliveryBand::Delayed);

        assert_eq!(
            timeline.monthly,
            vec![
                MonthlyDelivery {
                    month: "Jan 2025".to_string(),
                    count: 2,
                    avg_days: 4,
                },
                MonthlyDelivery {
                    month: "Feb 2025".to_string(),
                    count: 1,
                    avg_days: 22,
                },
            ]
        );
    }

    #[test]
    fn test_recent_keeps_last_ten() {
        let mut payload = AggregatePayload::fallback();
        payload.warranty.srf_vs_delivery_month_wise_bar_graph = (1..=12)
            .map(|day| srf(&format!("W{day}"), &format!("2025-05-{day:02}"), "2025-05-20"))
            .collect();

        let timeline = warranty_timeline(&payload);
        let recent = timeline.recent();
        assert_eq!(recent.len(), RECENT_DELIVERIES);
        assert_eq!(recent[0].srf_number, "W3");
        assert_eq!(recent[9].srf_number, "W12");
    }

    #[test]
    fn test_out_of_warranty_timeline_tolerates_open_repairs() {
        let mut payload = AggregatePayload::fallback();
        payload.out_of_warranty.srf_receive_vs_delivery_bar_graph = vec![
            SrfRepairDelivery {
                srf_number: "R1".to_string(),
                srf_date: "2025-04-01".to_string(),
                repair_date: "2025-04-05".to_string(),
                delivery_date: "2025-04-10".to_string(),
            },
            SrfRepairDelivery {
                srf_number: "R2".to_string(),
                srf_date: "2025-04-02".to_string(),
                repair_date: String::new(),
                delivery_date: String::new(),
            },
            SrfRepairDelivery {
                srf_number: "R3".to_string(),
                srf_date: String::new(),
                repair_date: "2025-04-05".to_string(),
                delivery_date: "2025-04-10".to_string(),
            },
        ];

        let timeline = out_of_warranty_timeline(&payload);
        assert_eq!(timeline.records.len(), 2);

        let done = &timeline.records[0];
        assert_eq!(done.repair_days, Some(4));
        assert_eq!(done.delivery_days, Some(9));
        assert_eq!(done.band(), Some(DeliveryBand::Normal));

        let open = &timeline.records[1];
        assert_eq!(open.repair_date, None);
        assert_eq!(open.band(), None);
    }

    #[test]
    fn test_timelines_on_fallback_are_empty() {
        let fallback = AggregatePayload::fallback();
        assert_eq!(warranty_timeline(&fallback), DeliveryTimeline::default());
        assert_eq!(out_of_warranty_timeline(&fallback), RepairTimeline::default());
    }
}
