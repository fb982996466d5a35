/// Represents the type of SQL JOIN operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN - rows with a match on both sides
    Inner,
    /// LEFT JOIN - every left row, right columns null when nothing matches
    Left,
    /// RIGHT JOIN - every right row, left columns null when nothing matches
    Right,
    /// FULL OUTER JOIN - unmatched rows from either side
    Full,
    /// CROSS JOIN - Cartesian product, the ON condition is ignored
    Cross,
}

impl JoinType {
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// A table in a FROM or JOIN position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    pub fn aliased(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: Some(alias.into()),
        }
    }

    /// Name columns of this table are qualified with (alias if present, otherwise table name)
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// A JOIN clause with an equality ON condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: TableRef,
    /// Column on an already joined table (e.g. `m.team_id`)
    pub left_field: String,
    /// Column on the joined table (e.g. `t.team_id`)
    pub right_field: String,
}

impl JoinClause {
    pub fn new_on(
        join_type: JoinType,
        table: impl Into<String>,
        left_field: impl Into<String>,
        right_field: impl Into<String>,
    ) -> Self {
        Self {
            join_type,
            table: TableRef::new(table),
            left_field: left_field.into(),
            right_field: right_field.into(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.table.alias = Some(alias.into());
        self
    }

    pub fn table_ref(&self) -> &str {
        self.table.reference()
    }
}
