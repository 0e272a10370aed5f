pub mod dataset;
pub mod jcamp;
pub mod loader;
pub mod project;
pub mod region;
