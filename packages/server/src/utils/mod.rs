pub mod filename;
pub mod hash;
