pub mod host;
pub mod path;

pub use host::request_host;
pub use path::{sanitize_path, MAX_REDIRECT_PATH_LENGTH};
