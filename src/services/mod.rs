pub mod catalog;
pub mod chat;
pub mod providers;
pub mod snapshot;
