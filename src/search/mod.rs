pub mod filter;
pub mod results;
