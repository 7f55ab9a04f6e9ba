pub mod client;
pub mod clock;
pub(crate) mod config;
pub mod contests;
pub mod error;
pub mod hub;
pub mod model;
pub mod pacer;
pub mod pool;
pub mod problems;
pub mod ratings;
pub mod resolver;
pub mod settings;
pub mod standings;
pub mod store;

pub use client::ApiClient;
pub use hub::Hub;
pub use resolver::{Resolved, Resolver, Source};
pub use settings::Settings;
