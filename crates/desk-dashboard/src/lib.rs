pub mod cache;
pub mod config;
pub mod counter;
pub mod derive;
pub mod error;
pub mod fetcher;
pub mod render;
pub mod widgets;

pub use cache::{FilePayloadStore, MemoryPayloadStore, PayloadStore};
pub use config::DashboardConfig;
pub use counter::{CounterAnimation, counter_frames};
pub use error::DashboardError;
pub use fetcher::{DashboardFetcher, DashboardState, FetchError};
pub use render::render_dashboard;
pub use widgets::{ChartViewModel, WIDGETS, WidgetFrame, WidgetSpec};
