mod notice;
mod server;

pub use notice::*;
pub use server::*;
