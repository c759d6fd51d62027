pub mod archive;
pub mod eda;
pub mod file_processor;
pub mod plot_store;
pub mod render;
pub mod utils;
