mod download;

pub use download::{download_to_path, http_client};
