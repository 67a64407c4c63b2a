use super::repo_tx_mysql::MySqlTx;
use crate::domain_port::*;

/// All `StorageTx` values handed to these repos come from `MySqlTxManager`,
/// so the concrete type behind the trait object is always `MySqlTx`.
pub fn downcast<'a, 't>(tx: &'a mut dyn StorageTx<'t>) -> &'a mut MySqlTx<'t> {
    unsafe {
        let p = tx as *mut dyn StorageTx<'t>;
        let p = p as *mut MySqlTx<'t>;
        &mut *p
    }
}
