mod collection;
mod record;

pub use collection::{collection_get, collection_post};
pub use record::{record_delete, record_get, record_put};

use crate::error::ApiError;

const MAX_COLLECTION_NAME_LEN: usize = 64;

/// Collection names are lowercase identifiers: notes, tasks, health_metrics.
fn validate_collection(name: &str) -> Result<(), ApiError> {
    let mut chars = name.chars();
    let ok = name.len() <= MAX_COLLECTION_NAME_LEN
        && chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Invalid collection name: {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_validated() {
        assert!(validate_collection("notes").is_ok());
        assert!(validate_collection("health_metrics").is_ok());
        assert!(validate_collection("2boards").is_err()); // digits ok, leading letter required
        assert!(validate_collection("notes2").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_collection("Notes").is_err());
        assert!(validate_collection("notes; drop table users").is_err());
        assert!(validate_collection(&"x".repeat(65)).is_err());
    }
}
