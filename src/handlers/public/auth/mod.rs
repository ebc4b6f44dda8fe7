mod login;
mod register;
pub mod utils;

pub use login::login_post;
pub use register::register_post;
