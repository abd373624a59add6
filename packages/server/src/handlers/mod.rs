pub mod attachments;
pub mod comments;
pub mod pages;
pub mod posts;
pub mod users;
