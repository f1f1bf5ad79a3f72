pub mod about;
pub mod entities;
pub mod error;
pub mod headings;
pub mod listing;
pub mod slug;
pub mod types;
