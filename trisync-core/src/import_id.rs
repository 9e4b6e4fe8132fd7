//! Deterministic import ids used by the budgeting API for deduplication.

use sha2::{Digest, Sha256};

use crate::transaction::Transaction;

/// Bumped whenever the hashed fields, their order, or the digest change.
/// Any bump makes every previously imported transaction look new.
pub const IMPORT_ID_VERSION: &str = "v2";

/// Digest bytes kept; 16 bytes = 32 hex chars, under the API's 36-char cap.
const DIGEST_BYTES: usize = 16;

/// Hash `version + payee + type + amount + description + account_number`,
/// concatenated without separators. A missing account number hashes as "".
pub fn import_id(txn: &Transaction) -> String {
    let account = txn
        .account_number
        .as_ref()
        .map(|iban| iban.print_format())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(IMPORT_ID_VERSION.as_bytes());
    hasher.update(txn.payee.as_bytes());
    hasher.update(txn.flow.as_str().as_bytes());
    hasher.update(txn.amount.to_string().as_bytes());
    hasher.update(txn.description.as_bytes());
    hasher.update(account.as_bytes());
    let digest = hasher.finalize();

    hex::encode(&digest[..DIGEST_BYTES])
}
