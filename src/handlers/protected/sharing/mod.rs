mod grants;

pub use grants::{grants_delete, grants_get, grants_post};
