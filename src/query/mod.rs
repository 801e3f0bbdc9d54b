// Query module - SQL parsing and execution for the embedded datasource
pub mod executor;
pub mod parser;

pub use executor::{QueryExecutor, QueryResult};
pub use parser::QueryParser;
