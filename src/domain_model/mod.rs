mod apply;
mod relation;
mod user;

pub use apply::*;
pub use relation::*;
pub use user::*;
