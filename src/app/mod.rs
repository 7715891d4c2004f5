pub mod api;
pub mod batch;
pub mod display;
pub mod interactive;
