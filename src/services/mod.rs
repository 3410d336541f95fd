pub mod account_service;
pub mod car_service;
pub mod favorite_service;
pub mod filter_service;
pub mod identity;
pub mod password_service;
pub mod token_service;
