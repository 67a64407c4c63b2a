mod apply_repo_mysql;
mod friendship_repo_mysql;
mod profile_repo_mysql;

pub use apply_repo_mysql::*;
pub use friendship_repo_mysql::*;
pub use profile_repo_mysql::*;

mod repo_tx_mysql;

pub use repo_tx_mysql::*;

mod util;
