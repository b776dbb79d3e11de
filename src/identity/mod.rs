// Identity module - who is calling the ledger
// Ed25519 keypairs and the account ids derived from them

mod account;
mod keypair;

pub use account::{AccountId, AccountIdError};
pub use keypair::{Keypair, KeypairError, PublicKey};
