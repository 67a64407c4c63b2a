// repo

mod apply_repo;
mod friendship_repo;
mod profile_repo;

mod repo_tx;

pub use apply_repo::*;
pub use friendship_repo::*;
pub use profile_repo::*;

pub use repo_tx::*;

// outbound

mod notice;

pub use notice::*;
