pub mod config;
pub mod data;
pub mod decode;
pub mod engine;
pub mod error;
pub mod hard;
pub mod model;
pub mod problem;
pub mod server;
pub mod soft;
pub mod solver;
pub mod variables;
