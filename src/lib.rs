pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod resolver;
pub mod rules;
pub mod service;
pub mod store;

pub use config::{AnswerMode, ServiceConfig};
pub use service::create_app;
