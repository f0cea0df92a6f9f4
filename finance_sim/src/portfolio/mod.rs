pub mod engine;
pub mod model;

pub use engine::PortfolioEngine;
