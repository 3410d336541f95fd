pub mod account;
pub mod cars;
pub mod favorites;
pub mod filter;
pub mod password;
