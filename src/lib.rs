pub mod aggregate;
pub mod config;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod publish;
pub mod retry;
pub mod schema;
pub mod sink;
