pub mod cart_repo;
pub mod catalog_client;
pub mod memory_repo;
pub mod models;

pub use cart_repo::{DieselCartRepository, StoreConfig};
pub use catalog_client::HttpPriceLookup;
pub use memory_repo::InMemoryCartRepository;
