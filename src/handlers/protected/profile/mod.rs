mod preferences;

pub use preferences::{preferences_get, preferences_put};
