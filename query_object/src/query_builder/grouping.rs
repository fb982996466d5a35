/// GROUP BY clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBy {
    pub fields: Vec<String>,
}

impl GroupBy {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn single(field: impl Into<String>) -> Self {
        Self {
            fields: vec![field.into()],
        }
    }

    /// Whether `field` is one of the grouping keys
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}
