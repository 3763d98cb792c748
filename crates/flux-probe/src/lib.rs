pub mod app;
pub mod http;
pub mod rules;

pub use app::{build_mapping, run};
pub use http::create_router;
pub use rules::default_rules;
