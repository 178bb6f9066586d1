pub mod cart_service;
pub mod pricing;
pub mod resilient_service;

pub use cart_service::CartService;
pub use resilient_service::{ResilienceConfig, ResilientCartService};
