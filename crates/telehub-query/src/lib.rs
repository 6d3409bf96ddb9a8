pub mod columns;
pub mod flux;
pub mod parser;
pub mod sql;

pub use flux::FluxQueryBuilder;
pub use parser::FluxResponseParser;
pub use sql::SqlQueryBuilder;
