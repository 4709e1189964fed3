// Presentation layer - HTTP surface for chart consumers
pub mod app_state;
pub mod handlers;
pub mod view;
