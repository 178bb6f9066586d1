pub mod cart;
pub mod errors;
pub mod order_list;
pub mod ports;
