pub mod common;
pub mod editor;
pub mod form;
pub mod payload;
