pub mod catalog;
pub mod controller;
pub mod functions;
pub mod model;
pub mod params;
pub mod processing;
pub mod regions;
pub mod state;
