//! Headless application layer: viewer windows over a stack overlay, their settings,
//! and the time-series session that links windows across time points.

pub mod session;
pub mod settings;
pub mod timeseries;
pub mod window;

pub use session::Session;
pub use settings::ViewerSettings;
pub use timeseries::{RowChange, TimeSeriesError, TimeSeriesHub, TimeSeriesMap, WindowId};
pub use window::{StackData, ViewerWindow};
