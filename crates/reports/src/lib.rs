pub mod aggregator;
pub mod handler;
pub mod period;
pub mod service;
