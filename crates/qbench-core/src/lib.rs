pub mod backend;
pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod preflight;
pub mod report;
pub mod runlog;
pub mod stats;

pub mod doctor;
