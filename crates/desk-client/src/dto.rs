use std::fmt;

use repairdesk_types::Role;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, SeqAccess, Visitor},
    ser::SerializeMap,
};

/// Treats an explicit `null` the same as an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of `GET menu/dashboard`: every widget's data in a single object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatePayload {
    #[serde(default, deserialize_with = "nullable")]
    pub customer: CustomerSection,
    #[serde(default, deserialize_with = "nullable")]
    pub challan: ChallanSection,
    #[serde(default, deserialize_with = "nullable")]
    pub retail: RetailSection,
    #[serde(default, deserialize_with = "nullable")]
    pub market: MarketSection,
    #[serde(default, deserialize_with = "nullable")]
    pub warranty: WarrantySection,
    #[serde(default, deserialize_with = "nullable")]
    pub out_of_warranty: OutOfWarrantySection,
}

impl AggregatePayload {
    /// Structurally complete payload with every count at zero and every list empty.
    /// Committed in place of real data whenever a fetch fails.
    pub fn fallback() -> Self {
        Self::default()
    }
}

/// Free-function form of [`AggregatePayload::fallback`].
pub fn build_fallback() -> AggregatePayload {
    AggregatePayload::fallback()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSection {
    #[serde(default, deserialize_with = "nullable")]
    pub number_of_customers: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub number_of_asc_names: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub top_customers: TopCustomers,
}

/// Customer name to record count, in the order the backend listed them.
///
/// Serialized as a JSON object. Also accepts an array of `{name, value}` entries, the
/// shape older cached payloads used for an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopCustomers(pub Vec<CustomerCount>);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCount {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "count", deserialize_with = "nullable")]
    pub value: u64,
}

impl TopCustomers {
    pub fn entries(&self) -> &[CustomerCount] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u64)> for TopCustomers {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| CustomerCount { name, value })
                .collect(),
        )
    }
}

impl Serialize for TopCustomers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.name, &entry.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TopCustomers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TopCustomersVisitor;

        impl<'de> Visitor<'de> for TopCustomersVisitor {
            type Value = TopCustomers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of customer name to count, or a list of {name, value}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, value)) = map.next_entry::<String, Option<u64>>()? {
                    entries.push(CustomerCount {
                        name,
                        value: value.unwrap_or_default(),
                    });
                }
                Ok(TopCustomers(entries))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(entry) = seq.next_element::<CustomerCount>()? {
                    entries.push(entry);
                }
                Ok(TopCustomers(entries))
            }
        }

        deserializer.deserialize_any(TopCustomersVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallanSection {
    #[serde(default, deserialize_with = "nullable")]
    pub number_of_challans: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub number_of_items: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub challan_rolling_months: Vec<ChallanMonth>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallanMonth {
    /// `YYYY-MM`
    #[serde(default, deserialize_with = "nullable")]
    pub month: String,
    #[serde(default, deserialize_with = "nullable")]
    pub total_challans: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub total_quantity: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailSection {
    #[serde(default, deserialize_with = "nullable")]
    pub division_wise_donut: Vec<DivisionCount>,
    #[serde(default, deserialize_with = "nullable")]
    pub settled_vs_unsettled_pie_chart: SettlementCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionCount {
    #[serde(default, deserialize_with = "nullable")]
    pub division: String,
    #[serde(default, deserialize_with = "nullable")]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementCounts {
    #[serde(default, deserialize_with = "nullable")]
    pub not_received: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub received_not_settled: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub propose_for_settlement: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub settled: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSection {
    #[serde(default, deserialize_with = "nullable")]
    pub status_per_division_stacked_bar_chart: Vec<MarketStatusCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatusCount {
    #[serde(default, deserialize_with = "nullable")]
    pub division: String,
    #[serde(default, deserialize_with = "nullable")]
    pub final_status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantySection {
    #[serde(default, deserialize_with = "nullable")]
    pub division_wise_pending_completed_bar_graph: Vec<WarrantySettlementCount>,
    #[serde(default, deserialize_with = "nullable")]
    pub srf_vs_delivery_month_wise_bar_graph: Vec<SrfDelivery>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantySettlementCount {
    #[serde(default, deserialize_with = "nullable")]
    pub division: String,
    #[serde(default, deserialize_with = "nullable")]
    pub settlement: String,
    #[serde(default, deserialize_with = "nullable")]
    pub count: u64,
}

/// One service request, from booking to hand-back. Dates are ISO-8601 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrfDelivery {
    #[serde(default, deserialize_with = "nullable")]
    pub srf_number: String,
    #[serde(default, deserialize_with = "nullable")]
    pub srf_date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub delivery_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfWarrantySection {
    #[serde(default, deserialize_with = "nullable")]
    pub srf_receive_vs_delivery_bar_graph: Vec<SrfRepairDelivery>,
    #[serde(default, deserialize_with = "nullable")]
    pub final_status_bar_graph: Vec<OutOfWarrantyStatusCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrfRepairDelivery {
    #[serde(default, deserialize_with = "nullable")]
    pub srf_number: String,
    #[serde(default, deserialize_with = "nullable")]
    pub srf_date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub repair_date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub delivery_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfWarrantyStatusCount {
    #[serde(default, deserialize_with = "nullable")]
    pub division: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// The signed-in account as reported by `auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

/// `auth/me` answers either with the user itself or wrapped in `{ "user": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MeResponse {
    Wrapped { user: CurrentUser },
    Bare(CurrentUser),
}

impl From<MeResponse> for CurrentUser {
    fn from(response: MeResponse) -> Self {
        match response {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        }
    }
}

/// Error body returned by the auth endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub resolution: Option<String>,
}

impl ErrorBody {
    /// Prefers `message`, then a string `detail`, then whatever `detail` holds.
    pub(crate) fn describe(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return Some(message.to_string());
        }
        match self.detail.as_ref()? {
            serde_json::Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
            serde_json::Value::String(_) | serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
