pub mod band;
pub mod division;
pub mod role;
pub mod widget;

pub use band::DeliveryBand;
pub use division::Division;
pub use role::Role;
pub use widget::WidgetKey;
