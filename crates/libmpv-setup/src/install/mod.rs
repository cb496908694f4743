pub mod engine;
mod extract;
mod locate;
pub mod vfs;

pub use extract::{extract_archive, reset_dir};
pub use locate::{find_file, locate_and_move};
