mod display;
mod price_monitor;

pub use display::{format_change, format_price, render_price_table};
pub use price_monitor::{INITIAL_FETCH_DELAY, PriceMonitor};
