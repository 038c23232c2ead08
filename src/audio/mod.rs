pub mod capture;
pub mod processing;
