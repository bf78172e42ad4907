use std::fmt;

/// Why the target storage pool cannot be benchmarked.
#[derive(Debug, PartialEq, Eq)]
pub enum StorageError {
    NotFound(String),
    Inactive { name: String, status: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(name) => {
                write!(f, "storage pool '{}' not found", name)
            }
            StorageError::Inactive { name, status } => {
                write!(f, "storage pool '{}' is not active (status: {})", name, status)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Checks the `pvesm status` listing for the target pool. The pool name
/// must match the leading column exactly and its status must be "active".
pub fn check_storage(listing: &str, storage: &str) -> Result<(), StorageError> {
    for line in listing.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some(storage) {
            continue;
        }

        // columns are: Name Type Status Total Used Available %
        let status = fields.nth(1).unwrap_or("");
        if status == "active" {
            return Ok(());
        }
        return Err(StorageError::Inactive {
            name: storage.to_string(),
            status: status.to_string(),
        });
    }

    Err(StorageError::NotFound(storage.to_string()))
}
