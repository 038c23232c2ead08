pub mod filter;
pub mod monitor;
pub mod segment;
