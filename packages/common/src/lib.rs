pub mod file_type;
pub mod post_type;
pub mod size;
pub mod storage;

pub use file_type::FileType;
pub use post_type::PostType;
pub use size::format_size;
