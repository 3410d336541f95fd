pub mod cars;
pub mod favorites;
pub mod pictures;
pub mod roles;
pub mod user_tokens;
pub mod users;

pub use cars::Entity as Cars;
pub use favorites::Entity as Favorites;
pub use pictures::Entity as Pictures;
pub use roles::Entity as Roles;
pub use user_tokens::Entity as UserTokens;
pub use users::Entity as Users;
