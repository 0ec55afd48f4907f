pub mod assoc;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod output;
pub mod series;
pub mod server;
pub mod stats;
pub mod trend;
pub mod types;
