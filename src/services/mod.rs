pub mod database;
pub mod editor;
pub mod notification;
pub mod payload;
pub mod resolver;
pub mod slug;
pub mod store;
pub mod tokens;
