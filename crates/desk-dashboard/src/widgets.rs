use repairdesk_client::AggregatePayload;
use repairdesk_types::WidgetKey;

use crate::{
    derive::{
        ChallanSummary, CustomerSummary, DeliveryTimeline, RepairTimeline, RetailSummary,
        StatusBreakdown, challan_summary, customer_summary, market_status,
        out_of_warranty_status, out_of_warranty_timeline, retail_summary, warranty_settlement,
        warranty_timeline,
    },
    fetcher::DashboardState,
    render,
};

pub const ERROR_TEXT: &str = "Error Loading ...";

/// Derived data for one card.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartViewModel {
    Customer(CustomerSummary),
    Warranty {
        settlement: StatusBreakdown,
        timeline: DeliveryTimeline,
    },
    OutOfWarranty {
        status: StatusBreakdown,
        timeline: RepairTimeline,
    },
    Market(StatusBreakdown),
    Challan(ChallanSummary),
    Retail(RetailSummary),
}

/// One dashboard card: what it is called, which actions it links to, and how its chart
/// is derived and drawn.
#[derive(Debug, Clone, Copy)]
pub struct WidgetSpec {
    pub key: WidgetKey,
    pub title: &'static str,
    /// Used in the loading placeholder.
    pub data_name: &'static str,
    pub icon: &'static str,
    pub actions: &'static [&'static str],
    pub derive: fn(&AggregatePayload) -> ChartViewModel,
    pub render: fn(&ChartViewModel) -> String,
}

impl WidgetSpec {
    pub fn lookup(key: WidgetKey) -> &'static Self {
        // The table covers every key.
        WIDGETS
            .iter()
            .find(|w| w.key == key)
            .unwrap_or(&WIDGETS[0])
    }

    pub fn loading_text(&self) -> String {
        format!("Loading {} Data ...", self.data_name)
    }
}

fn derive_customer(payload: &AggregatePayload) -> ChartViewModel {
    ChartViewModel::Customer(customer_summary(payload))
}

fn derive_warranty(payload: &AggregatePayload) -> ChartViewModel {
    ChartViewModel::Warranty {
        settlement: warranty_settlement(payload),
        timeline: warranty_timeline(payload),
    }
}

fn derive_out_of_warranty(payload: &AggregatePayload) -> ChartViewModel {
    ChartViewModel::OutOfWarranty {
        status: out_of_warranty_status(payload),
        timeline: out_of_warranty_timeline(payload),
    }
}

fn derive_market(payload: &AggregatePayload) -> ChartViewModel {
    ChartViewModel::Market(market_status(payload))
}

fn derive_challan(payload: &AggregatePayload) -> ChartViewModel {
    ChartViewModel::Challan(challan_summary(payload))
}

fn derive_retail(payload: &AggregatePayload) -> ChartViewModel {
    ChartViewModel::Retail(retail_summary(payload))
}

pub static WIDGETS: [WidgetSpec; 6] = [
    WidgetSpec {
        key: WidgetKey::Customer,
        title: "Customer Entry",
        data_name: "Customer",
        icon: "[C]",
        actions: &["Add Record", "Update Record"],
        derive: derive_customer,
        render: render::customer,
    },
    WidgetSpec {
        key: WidgetKey::Warranty,
        title: "Warranty Replacement / Repair",
        data_name: "Warranty",
        icon: "[W]",
        actions: &[
            "Create SRF",
            "Create CNF Challan",
            "Print SRF",
            "Print CNF Challan",
            "Update SRF",
        ],
        derive: derive_warranty,
        render: render::warranty,
    },
    WidgetSpec {
        key: WidgetKey::OutOfWarranty,
        title: "Out of Warranty Repair",
        data_name: "Out of Warranty",
        icon: "[O]",
        actions: &[
            "Create SRF",
            "Print SRF",
            "Update SRF",
            "Settle SRF",
            "Create Vendor Challan",
            "Print Vendor Challan",
            "Print Estimate",
            "Settle Vendor",
        ],
        derive: derive_out_of_warranty,
        render: render::out_of_warranty,
    },
    WidgetSpec {
        key: WidgetKey::Market,
        title: "Direct Market Replacement",
        data_name: "Market",
        icon: "[M]",
        actions: &["Add Record", "Update Record"],
        derive: derive_market,
        render: render::market,
    },
    WidgetSpec {
        key: WidgetKey::Challan,
        title: "Road Challan",
        data_name: "Challan",
        icon: "[R]",
        actions: &["Create Challan", "Print Challan"],
        derive: derive_challan,
        render: render::challan,
    },
    WidgetSpec {
        key: WidgetKey::Retail,
        title: "Retail Sales / Services",
        data_name: "Retail",
        icon: "[S]",
        actions: &["Add Record", "Update Record", "Settle Record", "Print Receipt"],
        derive: derive_retail,
        render: render::retail,
    },
];

/// What a single card shows for a given dashboard state.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetFrame {
    Loading { text: String },
    Error { text: String },
    Ready(ChartViewModel),
}

impl WidgetFrame {
    /// Loading wins over error, and error over data. Without data the card keeps
    /// showing its loading placeholder.
    pub fn resolve(spec: &WidgetSpec, state: &DashboardState) -> Self {
        if state.loading {
            return Self::Loading {
                text: spec.loading_text(),
            };
        }
        if state.error.is_some() {
            return Self::Error {
                text: ERROR_TEXT.to_string(),
            };
        }
        match state.data.as_deref() {
            Some(payload) => Self::Ready((spec.derive)(payload)),
            None => Self::Loading {
                text: spec.loading_text(),
            },
        }
    }

    pub fn render(&self, spec: &WidgetSpec) -> String {
        match self {
            Self::Loading { text } | Self::Error { text } => text.clone(),
            Self::Ready(model) => (spec.render)(model),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::fetcher::FetchError;

    fn ready_state(payload: AggregatePayload) -> DashboardState {
        DashboardState {
            data: Some(Arc::new(payload)),
            loading: false,
            error: None,
            generation: 1,
        }
    }

    #[test]
    fn test_table_covers_every_key_once() {
        for key in WidgetKey::iter() {
            assert_eq!(WIDGETS.iter().filter(|w| w.key == key).count(), 1);
            assert_eq!(WidgetSpec::lookup(key).key, key);
        }
    }

    #[test]
    fn test_every_deriver_accepts_the_fallback() {
        let fallback = AggregatePayload::fallback();
        for spec in &WIDGETS {
            let model = (spec.derive)(&fallback);
            assert!(!(spec.render)(&model).is_empty(), "{} rendered nothing", spec.title);
        }
    }

    #[test]
    fn test_card_actions() {
        assert_eq!(
            WidgetSpec::lookup(WidgetKey::Customer).actions,
            ["Add Record", "Update Record"]
        );
        assert_eq!(
            WidgetSpec::lookup(WidgetKey::Market).actions,
            ["Add Record", "Update Record"]
        );
        assert_eq!(
            WidgetSpec::lookup(WidgetKey::Challan).actions,
            ["Create Challan", "Print Challan"]
        );
        assert_eq!(
            WidgetSpec::lookup(WidgetKey::Retail).actions,
            ["Add Record", "Update Record", "Settle Record", "Print Receipt"]
        );
        assert_eq!(WidgetSpec::lookup(WidgetKey::OutOfWarranty).actions.len(), 8);
    }

    #[test]
    fn test_frames_follow_state() {
        let spec = WidgetSpec::lookup(WidgetKey::OutOfWarranty);

        let loading = DashboardState {
            loading: true,
            ..ready_state(AggregatePayload::fallback())
        };
        assert_eq!(
            WidgetFrame::resolve(spec, &loading),
            WidgetFrame::Loading {
                text: "Loading Out of Warranty Data ...".to_string()
            }
        );

        let failed = DashboardState {
            error: Some(FetchError::Transport),
            ..ready_state(AggregatePayload::fallback())
        };
        assert_eq!(
            WidgetFrame::resolve(spec, &failed),
            WidgetFrame::Error {
                text: "Error Loading ...".to_string()
            }
        );

        let empty = DashboardState::default();
        assert!(matches!(
            WidgetFrame::resolve(spec, &empty),
            WidgetFrame::Loading { .. }
        ));

        assert!(matches!(
            WidgetFrame::resolve(spec, &ready_state(AggregatePayload::fallback())),
            WidgetFrame::Ready(ChartViewModel::OutOfWarranty { .. })
        ));
    }

    #[test]
    fn test_widgets_resolve_independently() {
        let mut payload = AggregatePayload::fallback();
        payload.customer.number_of_customers = 12;
        let state = ready_state(payload);

        let frames: Vec<_> = WIDGETS
            .iter()
            .map(|spec| WidgetFrame::resolve(spec, &state))
            .collect();
        assert!(frames.iter().all(|f| matches!(f, WidgetFrame::Ready(_))));
        match &frames[0] {
            WidgetFrame::Ready(ChartViewModel::Customer(summary)) => {
                assert_eq!(summary.customers, 12);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
