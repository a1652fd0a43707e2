pub mod account;
pub mod types;

#[cfg(test)]
mod tests;

pub use account::{CreateUser, DeleteUser, UpdateUser, CREATE_USER, DELETE_USER, UPDATE_USER};
pub use types::{CreateUserInput, DeleteUserInput, UpdateUserInput};
