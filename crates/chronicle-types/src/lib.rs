pub mod forms;
pub mod frames;
pub mod models;
