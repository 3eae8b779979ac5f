mod settings;

pub use settings::{Config, DEFAULT_BACKEND_URL, EXAMPLE_CONFIG};
