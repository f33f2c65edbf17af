//! External API integrations

pub mod ai_grading;

pub use ai_grading::AiGradingClient;
