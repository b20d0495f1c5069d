use tsim_ledger::LedgerError;

/// Typed failure surface of the store.
///
/// Constraint violations (duplicate username, duplicate portfolio name) are
/// surfaced as their own variants instead of leaking raw database errors;
/// callers render them, they do not parse them.
#[derive(Debug)]
pub enum StoreError {
    UnknownUser { username: String },
    UnknownTicker { symbol: String },
    UnknownPortfolio { portfolio: String },
    DuplicateUsername { username: String },
    DuplicatePortfolioName { name: String },
    DuplicateTicker { symbol: String },
    /// An accounting rule rejected the operation (insufficient funds,
    /// insufficient shares, invalid amount, ...). Nothing was persisted.
    Ledger(LedgerError),
    Db(sqlx::Error),
    Migrate(sqlx::migrate::MigrateError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUser { username } => write!(f, "unknown user '{username}'"),
            Self::UnknownTicker { symbol } => write!(f, "unknown ticker '{symbol}'"),
            Self::UnknownPortfolio { portfolio } => {
                write!(f, "unknown portfolio '{portfolio}'")
            }
            Self::DuplicateUsername { username } => {
                write!(f, "username '{username}' is already taken")
            }
            Self::DuplicatePortfolioName { name } => {
                write!(f, "a portfolio named '{name}' already exists for this user")
            }
            Self::DuplicateTicker { symbol } => {
                write!(f, "ticker '{symbol}' already exists")
            }
            Self::Ledger(e) => write!(f, "{e}"),
            Self::Db(e) => write!(f, "database error: {e}"),
            Self::Migrate(e) => write!(f, "migration failed: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ledger(e) => Some(e),
            Self::Db(e) => Some(e),
            Self::Migrate(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Db(e)
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migrate(e)
    }
}

impl From<LedgerError> for StoreError {
    fn from(e: LedgerError) -> Self {
        StoreError::Ledger(e)
    }
}

/// Detect a SQLite unique-constraint violation on a specific column.
///
/// SQLite reports these as `UNIQUE constraint failed: <table>.<column>` in
/// the error message (extended result code 2067); matching on the qualified
/// column name keeps the true cause attached to the typed variant.
pub(crate) fn is_unique_violation(err: &sqlx::Error, qualified_column: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.message().contains("UNIQUE constraint failed")
                && db_err.message().contains(qualified_column)
        }
        _ => false,
    }
}
