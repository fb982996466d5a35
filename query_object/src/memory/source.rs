use crate::errors::QueryError;
use crate::executor::Record;
use serde_json::Value;

/// Read access to named tables of unqualified rows
pub trait TableSource: Send + Sync {
    /// Every row of `table`, keyed by bare column name
    fn scan(&self, table: &str) -> Result<Vec<Record>, QueryError>;

    /// Column names of `table`, used to null-fill unmatched outer joins
    fn columns(&self, table: &str) -> Result<&'static [&'static str], QueryError>;

    /// Column identifying one row of `table`
    fn primary_key(&self, table: &str) -> Result<&'static str, QueryError>;
}

/// Write access used by bulk UPDATE and DELETE
pub trait TableSink: TableSource {
    /// Overwrite the given columns of the row whose primary key is `key`
    fn update_row(&mut self, table: &str, key: &Value, changes: &Record) -> Result<(), QueryError>;

    fn delete_row(&mut self, table: &str, key: &Value) -> Result<(), QueryError>;
}
