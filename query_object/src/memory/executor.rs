use crate::errors::QueryError;
use crate::executor::{QueryExecutor, Record};
use crate::memory::evaluate;
use crate::memory::source::TableSink;
use crate::query_builder::{QueryBuilder, SelectField};
use crate::validation::ValidatedFieldName;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Executes built queries against an in-process table source.
///
/// Bulk statements run against a staged copy of the source that replaces
/// the live one only once every row has been written, so a failing row
/// leaves nothing half-applied.
#[derive(Debug, Default)]
pub struct MemoryExecutor<S> {
    source: RwLock<S>,
}

impl<S> MemoryExecutor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: RwLock::new(source),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, S> {
        self.source.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, S> {
        self.source.write().await
    }

    pub fn into_inner(self) -> S {
        self.source.into_inner()
    }
}

#[async_trait]
impl<S> QueryExecutor for MemoryExecutor<S>
where
    S: TableSink + Clone + 'static,
{
    async fn fetch_rows(&self, query: &QueryBuilder) -> Result<Vec<Record>, QueryError> {
        let source = self.source.read().await;
        let rows = evaluate::select(&*source, query)?;
        debug_log!("[fetch_rows] {} rows", rows.len());
        Ok(rows)
    }

    async fn fetch_count(&self, query: &QueryBuilder) -> Result<i64, QueryError> {
        let output = match query.select_fields() {
            [only] if only.is_aggregate() => only.output_name(),
            _ => None,
        }
        .ok_or_else(|| QueryError::invalid("count query must select one aggregate"))?;

        let source = self.source.read().await;
        let rows = evaluate::select(&*source, query)?;

        match rows.first().and_then(|row| row.get(output)) {
            None => Ok(0),
            Some(value) => value.as_i64().ok_or_else(|| {
                QueryError::TypeMismatch(format!("count column {} is {}", output, value))
            }),
        }
    }

    async fn execute_update(&self, query: &QueryBuilder) -> Result<u64, QueryError> {
        let update_set = query
            .update_set()
            .filter(|set| !set.is_empty())
            .ok_or_else(|| QueryError::invalid("UPDATE needs at least one assignment"))?;
        let table = target_table(query)?;

        let mut source = self.source.write().await;
        let matched = evaluate::matching_rows(&*source, query)?;

        // every new value is computed from the pre-update row before any write
        let mut changes = Vec::with_capacity(matched.len());
        for (key, row) in matched {
            let mut change = Record::new();
            for (field, operation) in update_set.iter() {
                let column = ValidatedFieldName::new(field)?;
                let current = row
                    .get(column.as_str())
                    .ok_or_else(|| QueryError::UnknownColumn(field.clone()))?;
                change.insert(field.clone(), operation.apply(field, current)?);
            }
            changes.push((key, change));
        }

        let mut staged = source.clone();
        for (key, change) in &changes {
            staged.update_row(&table, key, change)?;
        }
        *source = staged;

        debug_log!("[execute_update] {} rows in {}", changes.len(), table);
        Ok(changes.len() as u64)
    }

    async fn execute_delete(&self, query: &QueryBuilder) -> Result<u64, QueryError> {
        let table = target_table(query)?;

        let mut source = self.source.write().await;
        let keys: Vec<Value> = evaluate::matching_rows(&*source, query)?
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        let mut staged = source.clone();
        for key in &keys {
            staged.delete_row(&table, key)?;
        }
        *source = staged;

        debug_log!("[execute_delete] {} rows from {}", keys.len(), table);
        Ok(keys.len() as u64)
    }
}

fn target_table(query: &QueryBuilder) -> Result<String, QueryError> {
    query
        .from_table()
        .map(|from| from.table.clone())
        .ok_or_else(|| QueryError::invalid("bulk statement has no target table"))
}
