//! trisync-core: canonical transactions, parsers, import ids and the checkpoint watermark

pub mod account;
pub mod checkpoint;
pub mod filter;
pub mod iban;
pub mod import_id;
pub mod money;
pub mod transaction;

pub use account::{AccountMatcher, LinkedAccount, MatchResult, canonical_account_number};
pub use checkpoint::{Checkpoint, CheckpointPolicy, CheckpointStore, create_last_import_date};
pub use filter::{Dated, select_since};
pub use iban::{Iban, InvalidIban};
pub use import_id::import_id;
pub use money::{parse_amount, parse_date};
pub use transaction::{FlowType, Transaction};
