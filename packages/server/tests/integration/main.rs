mod comment;
mod common;
mod pages;
mod post;
mod user;
