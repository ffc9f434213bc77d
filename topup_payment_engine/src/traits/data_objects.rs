use tps_common::Rupiah;

use crate::db_types::{Deposit, Transaction};

/// The outcome of a conditional status transition on a transaction.
#[derive(Debug, Clone)]
pub enum StatusTransition {
    /// The transition was applied; the updated transaction is returned. Exactly one concurrent caller per
    /// transition observes this variant, which is what gates the side effects (ledger credit, provisioning) to a
    /// single delivery.
    Applied(Transaction),
    /// The transaction was already at, or beyond, the target status. The current record is returned unchanged.
    Duplicate(Transaction),
}

/// The outcome of settling a deposit from a gateway callback.
#[derive(Debug, Clone)]
pub enum DepositSettlement {
    /// The deposit moved out of PENDING. `credited` is true when the user's balance was incremented as part of the
    /// same atomic unit.
    Applied { deposit: Deposit, credited: bool },
    /// The deposit had already been settled; nothing was changed.
    Duplicate(Deposit),
}

#[derive(Debug, Clone)]
pub struct NewDeposit {
    pub user_id: String,
    pub username: String,
    pub method: String,
    pub amount: Rupiah,
}
