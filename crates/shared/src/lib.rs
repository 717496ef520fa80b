//! Wire and domain types shared by the hiring pipeline service.

mod api;
mod application;
mod plan;
mod role;

pub use api::*;
pub use application::*;
pub use plan::*;
pub use role::*;
