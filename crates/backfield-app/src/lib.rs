pub mod report;
pub mod service;
