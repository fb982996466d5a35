/// SQL aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// COUNT(*) or COUNT(field); COUNT(field) skips nulls
    Count,
    Sum,
    Avg,
    Min,
    Max,
    /// COUNT(DISTINCT field)
    CountDistinct,
}

impl AggregateFunction {
    pub fn to_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count | AggregateFunction::CountDistinct => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    pub fn is_distinct(&self) -> bool {
        matches!(self, AggregateFunction::CountDistinct)
    }

    /// Column name PostgreSQL gives an unaliased aggregate
    pub fn default_name(&self) -> &'static str {
        match self {
            AggregateFunction::Count | AggregateFunction::CountDistinct => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }
}

/// A field selection in a SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub enum SelectField {
    /// SELECT *
    All,
    /// SELECT field
    Field(String),
    /// SELECT field AS alias
    FieldWithAlias { field: String, alias: String },
    /// SELECT COUNT(field) [AS alias]
    Aggregate {
        function: AggregateFunction,
        field: Option<String>, // None for COUNT(*)
        alias: Option<String>,
    },
}

impl SelectField {
    pub fn field(field: impl Into<String>) -> Self {
        SelectField::Field(field.into())
    }

    pub fn field_as(field: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::FieldWithAlias {
            field: field.into(),
            alias: alias.into(),
        }
    }

    fn aggregate(function: AggregateFunction, field: Option<String>) -> Self {
        SelectField::Aggregate {
            function,
            field,
            alias: None,
        }
    }

    pub fn count_all() -> Self {
        Self::aggregate(AggregateFunction::Count, None)
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Count, Some(field.into()))
    }

    pub fn count_distinct(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::CountDistinct, Some(field.into()))
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Sum, Some(field.into()))
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Avg, Some(field.into()))
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Min, Some(field.into()))
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Max, Some(field.into()))
    }

    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        match self {
            SelectField::Field(field) | SelectField::FieldWithAlias { field, .. } => {
                SelectField::FieldWithAlias {
                    field,
                    alias: alias.into(),
                }
            }
            SelectField::Aggregate {
                function, field, ..
            } => SelectField::Aggregate {
                function,
                field,
                alias: Some(alias.into()),
            },
            SelectField::All => SelectField::All,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, SelectField::Aggregate { .. })
    }

    /// Key this field appears under in a result record.
    ///
    /// Unaliased columns drop their qualifier (`m.age` comes back as `age`).
    /// `None` for `*`, whose output columns depend on the tables involved.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            SelectField::All => None,
            SelectField::Field(field) => Some(field.rsplit('.').next().unwrap_or(field.as_str())),
            SelectField::FieldWithAlias { alias, .. } => Some(alias.as_str()),
            SelectField::Aggregate {
                function, alias, ..
            } => Some(alias.as_deref().unwrap_or(function.default_name())),
        }
    }
}
