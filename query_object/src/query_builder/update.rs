use crate::errors::QueryError;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Type of update operation to perform on a field
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperation {
    /// field = $N
    Set(Value),
    /// field = field + $N
    Increment(Value),
    /// field = field - $N
    Decrement(Value),
    /// field = field * $N
    Multiply(Value),
    /// field = field / $N
    Divide(Value),
}

impl UpdateOperation {
    /// SQL assignment for this operation, e.g. `age = age + $1`
    pub fn to_sql(&self, field_name: &str, placeholder: &str) -> String {
        match self {
            UpdateOperation::Set(_) => format!("{} = {}", field_name, placeholder),
            UpdateOperation::Increment(_) => {
                format!("{} = {} + {}", field_name, field_name, placeholder)
            }
            UpdateOperation::Decrement(_) => {
                format!("{} = {} - {}", field_name, field_name, placeholder)
            }
            UpdateOperation::Multiply(_) => {
                format!("{} = {} * {}", field_name, field_name, placeholder)
            }
            UpdateOperation::Divide(_) => {
                format!("{} = {} / {}", field_name, field_name, placeholder)
            }
        }
    }

    /// Value bound as the operation's parameter
    pub fn value(&self) -> &Value {
        match self {
            UpdateOperation::Set(v)
            | UpdateOperation::Increment(v)
            | UpdateOperation::Decrement(v)
            | UpdateOperation::Multiply(v)
            | UpdateOperation::Divide(v) => v,
        }
    }

    /// New value of the field given its current value.
    ///
    /// Arithmetic on a null operand yields null; integer division truncates.
    pub fn apply(&self, field_name: &str, current: &Value) -> Result<Value, QueryError> {
        let (int_op, float_op): (fn(i64, i64) -> Option<i64>, fn(f64, f64) -> f64) = match self {
            UpdateOperation::Set(value) => return Ok(value.clone()),
            UpdateOperation::Increment(_) => (i64::checked_add, |a, b| a + b),
            UpdateOperation::Decrement(_) => (i64::checked_sub, |a, b| a - b),
            UpdateOperation::Multiply(_) => (i64::checked_mul, |a, b| a * b),
            UpdateOperation::Divide(_) => (i64::checked_div, |a, b| a / b),
        };

        let operand = self.value();
        if current.is_null() || operand.is_null() {
            return Ok(Value::Null);
        }

        let (Value::Number(left), Value::Number(right)) = (current, operand) else {
            return Err(QueryError::TypeMismatch(format!(
                "arithmetic update on {} needs numeric operands, got {} and {}",
                field_name, current, operand
            )));
        };

        if matches!(self, UpdateOperation::Divide(_)) && right.as_f64() == Some(0.0) {
            return Err(QueryError::ConstraintViolation(
                "division by zero".to_string(),
            ));
        }

        let overflow = || QueryError::ConstraintViolation(format!("{} out of range", field_name));
        match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => int_op(a, b).map(Value::from).ok_or_else(overflow),
            _ => {
                let a = left.as_f64().unwrap_or(f64::NAN);
                let b = right.as_f64().unwrap_or(f64::NAN);
                Number::from_f64(float_op(a, b))
                    .map(Value::Number)
                    .ok_or_else(overflow)
            }
        }
    }
}

/// Field assignments of a bulk UPDATE, ordered by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    pub operations: BTreeMap<String, UpdateOperation>,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.operations
            .insert(field.into(), UpdateOperation::Set(value));
        self
    }

    pub fn increment(mut self, field: impl Into<String>, value: Value) -> Self {
        self.operations
            .insert(field.into(), UpdateOperation::Increment(value));
        self
    }

    pub fn decrement(mut self, field: impl Into<String>, value: Value) -> Self {
        self.operations
            .insert(field.into(), UpdateOperation::Decrement(value));
        self
    }

    pub fn multiply(mut self, field: impl Into<String>, value: Value) -> Self {
        self.operations
            .insert(field.into(), UpdateOperation::Multiply(value));
        self
    }

    pub fn divide(mut self, field: impl Into<String>, value: Value) -> Self {
        self.operations
            .insert(field.into(), UpdateOperation::Divide(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UpdateOperation)> {
        self.operations.iter()
    }
}
