pub mod bar_store;
pub mod rest_source;

pub use bar_store::{Bar, BarKey, BarStore};
pub use rest_source::{run_bar_poller, UpstreamClient};
