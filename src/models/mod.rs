pub mod book;
pub mod reading_progress;
pub mod user;

pub use book::NewBook;
