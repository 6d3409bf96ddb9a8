pub mod error;
pub mod factory;
pub mod local_filter;
pub mod push_down;
pub mod strategy;

pub use error::{AggregationError, Result};
pub use factory::StrategyFactory;
pub use local_filter::LocalFilterStrategy;
pub use push_down::PushDownStrategy;
pub use strategy::AggregationStrategy;
