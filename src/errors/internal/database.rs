use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {operation} failed: {source}")]
    Operation {
        operation: String,
        #[source]
        source: DbErr,
    },

    #[error("Starting transaction failed: {source}")]
    TransactionBegin {
        #[source]
        source: DbErr,
    },

    #[error("Committing transaction failed: {source}")]
    TransactionCommit {
        #[source]
        source: DbErr,
    },
}

impl DatabaseError {
    fn source_err(&self) -> &DbErr {
        match self {
            DatabaseError::Operation { source, .. } => source,
            DatabaseError::TransactionBegin { source } => source,
            DatabaseError::TransactionCommit { source } => source,
        }
    }

    /// Connection-level faults and lock contention can clear up on retry
    pub fn is_transient(&self) -> bool {
        match self.source_err() {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
            other => {
                let message = other.to_string().to_lowercase();
                message.contains("database is locked") || message.contains("database is busy")
            }
        }
    }

    /// Whether the failure came from a unique index rejecting the write
    pub fn is_unique_violation(&self) -> bool {
        let message = self.source_err().to_string();
        message.contains("UNIQUE") || message.to_lowercase().contains("duplicate key")
    }
}
