pub mod app;
pub mod hub;
pub mod todos;
