// Vault module - Tracks what each account holds

mod balance;

pub use balance::{BalanceError, BalanceUpdate, Balances};
