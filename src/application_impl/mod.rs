mod friend_service_impl;
mod notice_fake;

pub use friend_service_impl::*;
pub use notice_fake::*;
