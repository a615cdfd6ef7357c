pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;
pub mod worker;

pub use models::Config;
pub use worker::VectorizationWorker;
