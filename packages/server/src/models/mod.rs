pub mod attachment;
pub mod comment;
pub mod page;
pub mod post;
pub mod shared;
pub mod user;
