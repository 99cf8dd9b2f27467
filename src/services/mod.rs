pub mod analytics;
pub mod insight;
