//! In-memory evaluation of a `QueryBuilder`
//!
//! Rows are carried with qualified keys (`m.age`, `t.name`) from the FROM
//! clause through joins and filtering, then grouped or projected into
//! records keyed by output name. Filters follow SQL three-valued logic:
//! a comparison involving NULL is unknown, and unknown rows are dropped.

use crate::errors::QueryError;
use crate::executor::Record;
use crate::memory::source::TableSource;
use crate::query_builder::{
    AggregateFunction, JoinClause, JoinType, LogicalOperator, OrderBy, QueryBuilder,
    QueryCondition, QueryFilter, QueryOperator, SelectField, SortOrder, TableRef,
};
use crate::validation::{ColumnRef, ValidatedTableName};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Run a SELECT and return its output records
pub(crate) fn select<S: TableSource + ?Sized>(
    source: &S,
    query: &QueryBuilder,
) -> Result<Vec<Record>, QueryError> {
    let rows = filtered_rows(source, query)?;

    let grouped = query.grouping().is_some()
        || query.select_fields().iter().any(SelectField::is_aggregate);
    let mut produced = if grouped {
        group_rows(query, rows)?
    } else {
        project_rows(query, rows)?
    };

    sort_rows(query.ordering(), &mut produced)?;

    let offset = usize::try_from(query.offset_value().unwrap_or(0))
        .map_err(|_| QueryError::invalid("OFFSET must not be negative"))?;
    let limit = match query.limit_value() {
        Some(limit) => usize::try_from(limit)
            .map_err(|_| QueryError::invalid("LIMIT must not be negative"))?,
        None => usize::MAX,
    };

    Ok(produced
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(_, output)| output)
        .collect())
}

/// Rows of the FROM table matched by a bulk statement, as
/// `(primary key, unqualified row)` pairs
pub(crate) fn matching_rows<S: TableSource + ?Sized>(
    source: &S,
    query: &QueryBuilder,
) -> Result<Vec<(Value, Record)>, QueryError> {
    if !query.joins().is_empty() {
        return Err(QueryError::invalid(
            "bulk statements cannot join; use a subquery condition instead",
        ));
    }
    let from = query
        .from_table()
        .ok_or_else(|| QueryError::invalid("bulk statement has no target table"))?;
    let key_column = source.primary_key(&from.table)?;
    let prefix = format!("{}.", from.reference());

    filtered_rows(source, query)?
        .into_iter()
        .map(|row| {
            let row: Record = row
                .into_iter()
                .map(|(key, value)| (key.strip_prefix(&prefix).unwrap_or(&key).to_string(), value))
                .collect();
            let key = row
                .get(key_column)
                .cloned()
                .ok_or_else(|| QueryError::UnknownColumn(key_column.to_string()))?;
            Ok((key, row))
        })
        .collect()
}

fn filtered_rows<S: TableSource + ?Sized>(
    source: &S,
    query: &QueryBuilder,
) -> Result<Vec<Record>, QueryError> {
    let from = query
        .from_table()
        .ok_or_else(|| QueryError::invalid("query has no FROM table"))?;

    let mut rows = qualified_rows(source, from)?;
    for join in query.joins() {
        rows = join_rows(source, rows, join)?;
    }

    let mut predicates = Vec::with_capacity(query.conditions().len());
    for condition in query.conditions() {
        if let Some(predicate) = compile(source, condition)? {
            predicates.push(predicate);
        }
    }

    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if matches_all(&predicates, &row)? {
            kept.push(row);
        }
    }
    Ok(kept)
}

fn qualified_rows<S: TableSource + ?Sized>(
    source: &S,
    table: &TableRef,
) -> Result<Vec<Record>, QueryError> {
    let name = ValidatedTableName::new(&table.table)?;
    let alias = ValidatedTableName::new(table.reference())?;

    Ok(source
        .scan(name.as_str())?
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(column, value)| (format!("{}.{}", alias, column), value))
                .collect::<Record>()
        })
        .collect())
}

fn merge(left: &Record, right: &Record) -> Record {
    let mut merged = left.clone();
    merged.extend(right.iter().map(|(key, value)| (key.clone(), value.clone())));
    merged
}

// ========================================
// Joins
// ========================================

fn join_rows<S: TableSource + ?Sized>(
    source: &S,
    rows: Vec<Record>,
    join: &JoinClause,
) -> Result<Vec<Record>, QueryError> {
    let right_rows = qualified_rows(source, &join.table)?;

    let outer = match join.join_type {
        JoinType::Cross => {
            return Ok(rows
                .iter()
                .flat_map(|left| right_rows.iter().map(move |right| merge(left, right)))
                .collect());
        }
        JoinType::Inner => false,
        JoinType::Left => true,
        JoinType::Right | JoinType::Full => {
            return Err(QueryError::Unsupported(format!(
                "{} is not evaluated in memory",
                join.join_type.to_sql()
            )));
        }
    };

    let left_column = ColumnRef::parse(&join.left_field)?;
    let right_column = ColumnRef::parse(&join.right_field)?;
    let null_row: Record = if outer {
        source
            .columns(&join.table.table)?
            .iter()
            .map(|column| (format!("{}.{}", join.table_ref(), column), Value::Null))
            .collect()
    } else {
        Record::new()
    };

    let mut joined = Vec::with_capacity(rows.len());
    for left in &rows {
        let mut matched = false;
        for right in &right_rows {
            let merged = merge(left, right);
            let l = resolve(&merged, &left_column)?;
            let r = resolve(&merged, &right_column)?;
            if !l.is_null() && !r.is_null() && compare_values(l, r)? == Ordering::Equal {
                joined.push(merged);
                matched = true;
            }
        }
        if outer && !matched {
            joined.push(merge(left, &null_row));
        }
    }
    Ok(joined)
}

/// Value of `column` in a qualified row; an unqualified name must match
/// exactly one column across the joined tables
fn resolve<'r>(row: &'r Record, column: &ColumnRef) -> Result<&'r Value, QueryError> {
    if column.qualifier().is_some() {
        let key = column.to_string();
        return row.get(&key).ok_or(QueryError::UnknownColumn(key));
    }

    let suffix = format!(".{}", column.column());
    let mut candidates = row
        .iter()
        .filter(|(key, _)| key.as_str() == column.column() || key.ends_with(&suffix));
    match (candidates.next(), candidates.next()) {
        (Some((_, value)), None) => Ok(value),
        (None, _) => Err(QueryError::UnknownColumn(column.to_string())),
        (Some(_), Some(_)) => Err(QueryError::invalid(format!(
            "column reference '{}' is ambiguous",
            column
        ))),
    }
}

// ========================================
// Filtering
// ========================================

enum Predicate {
    NullCheck {
        column: ColumnRef,
        is_null: bool,
    },
    Compare {
        column: ColumnRef,
        value: Value,
        test: fn(Ordering) -> bool,
    },
    Like {
        column: ColumnRef,
        pattern: String,
    },
    InList {
        column: ColumnRef,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        column: ColumnRef,
        low: Value,
        high: Value,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

/// `None` for a filter that constrains nothing
fn compile<S: TableSource + ?Sized>(
    source: &S,
    filter: &QueryFilter,
) -> Result<Option<Predicate>, QueryError> {
    if filter.is_vacuous() {
        return Ok(None);
    }

    match filter {
        QueryFilter::Condition(condition) => compile_condition(condition).map(Some),
        QueryFilter::Group { operator, filters } => {
            let mut members = Vec::with_capacity(filters.len());
            for member in filters {
                if let Some(predicate) = compile(source, member)? {
                    members.push(predicate);
                }
            }
            Ok(Some(match operator {
                LogicalOperator::And => Predicate::All(members),
                LogicalOperator::Or => Predicate::Any(members),
            }))
        }
        QueryFilter::Not(inner) => Ok(compile(source, inner)?.map(|p| Predicate::Not(Box::new(p)))),
        QueryFilter::InSubquery { field, query } => {
            let column = ColumnRef::parse(field)?;
            let output = match query.select_fields() {
                [only] => only.output_name(),
                _ => None,
            }
            .ok_or_else(|| QueryError::invalid("subquery must select exactly one named column"))?;

            let values = select(source, query)?
                .into_iter()
                .map(|mut row| row.remove(output).unwrap_or(Value::Null))
                .collect();
            Ok(Some(Predicate::InList {
                column,
                values,
                negated: false,
            }))
        }
    }
}

fn compile_condition(condition: &QueryCondition) -> Result<Predicate, QueryError> {
    let column = ColumnRef::parse(&condition.field)?;
    let operator = &condition.operator;

    match (operator, &condition.value) {
        (QueryOperator::Eq, None) | (QueryOperator::IsNull, _) => Ok(Predicate::NullCheck {
            column,
            is_null: true,
        }),
        (QueryOperator::Ne, None) | (QueryOperator::IsNotNull, _) => Ok(Predicate::NullCheck {
            column,
            is_null: false,
        }),
        (
            QueryOperator::Eq
            | QueryOperator::Ne
            | QueryOperator::Gt
            | QueryOperator::Gte
            | QueryOperator::Lt
            | QueryOperator::Lte,
            Some(value),
        ) => {
            let test: fn(Ordering) -> bool = match operator {
                QueryOperator::Eq => Ordering::is_eq,
                QueryOperator::Ne => Ordering::is_ne,
                QueryOperator::Gt => Ordering::is_gt,
                QueryOperator::Gte => Ordering::is_ge,
                QueryOperator::Lt => Ordering::is_lt,
                _ => Ordering::is_le,
            };
            Ok(Predicate::Compare {
                column,
                value: value.clone(),
                test,
            })
        }
        (QueryOperator::Like, Some(Value::String(pattern))) => Ok(Predicate::Like {
            column,
            pattern: pattern.clone(),
        }),
        (QueryOperator::In | QueryOperator::NotIn, Some(Value::Array(values))) => {
            Ok(Predicate::InList {
                column,
                values: values.clone(),
                negated: *operator == QueryOperator::NotIn,
            })
        }
        (QueryOperator::Between, Some(Value::Array(bounds))) if bounds.len() == 2 => {
            Ok(Predicate::Between {
                column,
                low: bounds[0].clone(),
                high: bounds[1].clone(),
            })
        }
        _ => Err(QueryError::invalid(format!(
            "{} on {} has a missing or malformed value",
            operator.to_sql(),
            column
        ))),
    }
}

fn matches_all(predicates: &[Predicate], row: &Record) -> Result<bool, QueryError> {
    for predicate in predicates {
        if eval(predicate, row)? != Some(true) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `None` is SQL's unknown
fn eval(predicate: &Predicate, row: &Record) -> Result<Option<bool>, QueryError> {
    match predicate {
        Predicate::NullCheck { column, is_null } => {
            Ok(Some(resolve(row, column)?.is_null() == *is_null))
        }
        Predicate::Compare {
            column,
            value,
            test,
        } => {
            let current = resolve(row, column)?;
            if current.is_null() || value.is_null() {
                return Ok(None);
            }
            Ok(Some(test(compare_values(current, value)?)))
        }
        Predicate::Like { column, pattern } => match resolve(row, column)? {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(like_matches(text, pattern))),
            other => Err(QueryError::TypeMismatch(format!(
                "LIKE needs text, {} is {}",
                column, other
            ))),
        },
        Predicate::InList {
            column,
            values,
            negated,
        } => {
            let current = resolve(row, column)?;
            if current.is_null() {
                return Ok(None);
            }
            let mut saw_null = false;
            for candidate in values {
                if candidate.is_null() {
                    saw_null = true;
                } else if compare_values(current, candidate)? == Ordering::Equal {
                    return Ok(Some(!negated));
                }
            }
            Ok(if saw_null { None } else { Some(*negated) })
        }
        Predicate::Between { column, low, high } => {
            let current = resolve(row, column)?;
            if current.is_null() || low.is_null() || high.is_null() {
                return Ok(None);
            }
            Ok(Some(
                compare_values(low, current)? != Ordering::Greater
                    && compare_values(current, high)? != Ordering::Greater,
            ))
        }
        Predicate::All(members) => {
            let mut unknown = false;
            for member in members {
                match eval(member, row)? {
                    Some(false) => return Ok(Some(false)),
                    None => unknown = true,
                    Some(true) => {}
                }
            }
            Ok(if unknown { None } else { Some(true) })
        }
        Predicate::Any(members) => {
            let mut unknown = false;
            for member in members {
                match eval(member, row)? {
                    Some(true) => return Ok(Some(true)),
                    None => unknown = true,
                    Some(false) => {}
                }
            }
            Ok(if unknown { None } else { Some(false) })
        }
        Predicate::Not(inner) => Ok(eval(inner, row)?.map(|matched| !matched)),
    }
}

fn compare_values(a: &Value, b: &Value) -> Result<Ordering, QueryError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(compare_numbers(x, y)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        _ => Err(QueryError::TypeMismatch(format!(
            "cannot compare {} with {}",
            a, b
        ))),
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    match (x.as_i64(), y.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
    }
}

enum LikeToken {
    AnySequence,
    AnyChar,
    Literal(char),
}

/// SQL LIKE: `%` matches any run, `_` one character, `\` escapes the next
fn like_matches(text: &str, pattern: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::AnySequence,
            '_' => LikeToken::AnyChar,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            c => LikeToken::Literal(c),
        });
    }

    let text: Vec<char> = text.chars().collect();
    // reachable[i]: the tokens so far can consume exactly text[..i]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;

    for token in &tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            LikeToken::AnySequence => {
                let mut seen = false;
                for (i, slot) in next.iter_mut().enumerate() {
                    seen |= reachable[i];
                    *slot = seen;
                }
            }
            LikeToken::AnyChar => {
                for i in 1..=text.len() {
                    next[i] = reachable[i - 1];
                }
            }
            LikeToken::Literal(expected) => {
                for i in 1..=text.len() {
                    next[i] = reachable[i - 1] && text[i - 1] == *expected;
                }
            }
        }
        reachable = next;
    }

    reachable[text.len()]
}

// ========================================
// Projection and grouping
// ========================================

enum Projection {
    All,
    Column { output: String, column: ColumnRef },
}

/// Pairs of (row the ORDER BY sees, output record)
type Produced = Vec<(Record, Record)>;

fn project_rows(query: &QueryBuilder, rows: Vec<Record>) -> Result<Produced, QueryError> {
    let mut projections = Vec::with_capacity(query.select_fields().len().max(1));
    for field in query.select_fields() {
        projections.push(match field {
            SelectField::All => Projection::All,
            SelectField::Field(name) | SelectField::FieldWithAlias { field: name, .. } => {
                Projection::Column {
                    output: field.output_name().unwrap_or(name.as_str()).to_string(),
                    column: ColumnRef::parse(name)?,
                }
            }
            SelectField::Aggregate { .. } => {
                return Err(QueryError::invalid("aggregate outside of a grouped query"));
            }
        });
    }
    if projections.is_empty() {
        projections.push(Projection::All);
    }
    if !query.joins().is_empty() && projections.iter().any(|p| matches!(p, Projection::All)) {
        return Err(QueryError::Unsupported(
            "SELECT * over a join is not evaluated in memory; list the columns".to_string(),
        ));
    }

    let mut produced = Vec::with_capacity(rows.len());
    for row in rows {
        let mut output = Record::new();
        for projection in &projections {
            match projection {
                Projection::All => {
                    for (key, value) in &row {
                        let column = key.split_once('.').map_or(key.as_str(), |(_, c)| c);
                        output.insert(column.to_string(), value.clone());
                    }
                }
                Projection::Column { output: name, column } => {
                    output.insert(name.clone(), resolve(&row, column)?.clone());
                }
            }
        }
        produced.push((row, output));
    }
    Ok(produced)
}

fn group_rows(query: &QueryBuilder, rows: Vec<Record>) -> Result<Produced, QueryError> {
    let mut group_columns = Vec::new();
    if let Some(group_by) = query.grouping() {
        for field in &group_by.fields {
            group_columns.push((field.as_str(), ColumnRef::parse(field)?));
        }
    }

    let mut groups: Vec<(Vec<Value>, Vec<Record>)> = Vec::new();
    for row in rows {
        let mut key = Vec::with_capacity(group_columns.len());
        for (_, column) in &group_columns {
            key.push(resolve(&row, column)?.clone());
        }
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(row),
            None => groups.push((key, vec![row])),
        }
    }
    // aggregates without GROUP BY always yield one row
    if group_columns.is_empty() && groups.is_empty() {
        groups.push((Vec::new(), Vec::new()));
    }

    let mut produced = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let working: Record = group_columns
            .iter()
            .zip(key)
            .map(|((name, _), value)| (name.to_string(), value))
            .collect();

        let mut output = Record::new();
        for field in query.select_fields() {
            match field {
                SelectField::All => {
                    return Err(QueryError::invalid("SELECT * cannot be grouped"));
                }
                SelectField::Field(name) | SelectField::FieldWithAlias { field: name, .. } => {
                    let value = working.get(name).cloned().ok_or_else(|| {
                        QueryError::invalid(format!(
                            "column {} must appear in GROUP BY or be aggregated",
                            name
                        ))
                    })?;
                    output.insert(field.output_name().unwrap_or(name.as_str()).to_string(), value);
                }
                SelectField::Aggregate {
                    function,
                    field: argument,
                    ..
                } => {
                    let value = aggregate(*function, argument.as_deref(), &members)?;
                    let name = field.output_name().unwrap_or(function.default_name());
                    output.insert(name.to_string(), value);
                }
            }
        }
        produced.push((working, output));
    }
    Ok(produced)
}

fn aggregate(
    function: AggregateFunction,
    argument: Option<&str>,
    rows: &[Record],
) -> Result<Value, QueryError> {
    let column = match argument {
        Some(name) => ColumnRef::parse(name)?,
        None if function == AggregateFunction::Count => return Ok(Value::from(rows.len())),
        None => {
            return Err(QueryError::invalid(format!(
                "{}(*) is not an aggregate",
                function.to_sql()
            )));
        }
    };

    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let value = resolve(row, &column)?;
        if !value.is_null() {
            values.push(value);
        }
    }

    match function {
        AggregateFunction::Count => Ok(Value::from(values.len())),
        AggregateFunction::CountDistinct => {
            let mut distinct: Vec<&Value> = Vec::with_capacity(values.len());
            for value in values {
                if !distinct.contains(&value) {
                    distinct.push(value);
                }
            }
            Ok(Value::from(distinct.len()))
        }
        AggregateFunction::Sum => {
            let numbers = numbers_of(&values, &column)?;
            if numbers.is_empty() {
                return Ok(Value::Null);
            }
            let exact = numbers
                .iter()
                .try_fold(0i64, |total, n| n.as_i64().and_then(|n| total.checked_add(n)));
            Ok(match exact {
                Some(total) => Value::from(total),
                None => float_value(numbers.iter().filter_map(|n| n.as_f64()).sum()),
            })
        }
        AggregateFunction::Avg => {
            let numbers = numbers_of(&values, &column)?;
            if numbers.is_empty() {
                return Ok(Value::Null);
            }
            let total: f64 = numbers.iter().filter_map(|n| n.as_f64()).sum();
            Ok(float_value(total / numbers.len() as f64))
        }
        AggregateFunction::Min => extreme(values, Ordering::Less),
        AggregateFunction::Max => extreme(values, Ordering::Greater),
    }
}

fn numbers_of<'v>(values: &[&'v Value], column: &ColumnRef) -> Result<Vec<&'v Number>, QueryError> {
    values
        .iter()
        .map(|value| match *value {
            Value::Number(n) => Ok(n),
            other => Err(QueryError::TypeMismatch(format!(
                "{} holds non-numeric value {}",
                column, other
            ))),
        })
        .collect()
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn extreme(values: Vec<&Value>, wanted: Ordering) -> Result<Value, QueryError> {
    let mut best: Option<&Value> = None;
    for value in values {
        best = match best {
            Some(current) if compare_values(value, current)? != wanted => Some(current),
            _ => Some(value),
        };
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

// ========================================
// Ordering
// ========================================

fn sort_rows(order_by: &[OrderBy], rows: &mut Produced) -> Result<(), QueryError> {
    if order_by.is_empty() {
        return Ok(());
    }

    let columns = order_by
        .iter()
        .map(|item| ColumnRef::parse(&item.field))
        .collect::<Result<Vec<_>, _>>()?;

    let mut keyed = Vec::with_capacity(rows.len());
    for (working, output) in rows.drain(..) {
        let mut key = Vec::with_capacity(columns.len());
        for column in &columns {
            key.push(sort_value(&working, &output, column)?);
        }
        keyed.push((key, working, output));
    }

    keyed.sort_by(|(a, ..), (b, ..)| compare_sort_keys(order_by, a, b));
    rows.extend(keyed.into_iter().map(|(_, working, output)| (working, output)));
    Ok(())
}

/// A bare name may refer to an output column, as in `ORDER BY member_count`
fn sort_value(working: &Record, output: &Record, column: &ColumnRef) -> Result<Value, QueryError> {
    if column.qualifier().is_none() {
        if let Some(value) = output.get(column.column()) {
            return Ok(value.clone());
        }
    }
    resolve(working, column).cloned()
}

fn compare_sort_keys(order_by: &[OrderBy], a: &[Value], b: &[Value]) -> Ordering {
    for ((item, x), y) in order_by.iter().zip(a).zip(b) {
        let nulls_last = item.puts_nulls_last();
        let ordering = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) if nulls_last => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, true) if nulls_last => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => {
                let ordering = compare_values(x, y)
                    .unwrap_or_else(|_| type_rank(x).cmp(&type_rank(y)));
                match item.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::GroupBy;
    use serde_json::json;

    struct Tables;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {:?}", other),
        }
    }

    impl TableSource for Tables {
        fn scan(&self, table: &str) -> Result<Vec<Record>, QueryError> {
            match table {
                "member" => Ok(vec![
                    record(json!({"member_id": 1, "username": "member1", "age": 10, "team_id": 1})),
                    record(json!({"member_id": 2, "username": "member2", "age": 20, "team_id": 1})),
                    record(json!({"member_id": 3, "username": null, "age": 30, "team_id": 2})),
                    record(json!({"member_id": 4, "username": "member4", "age": 40, "team_id": null})),
                ]),
                "team" => Ok(vec![
                    record(json!({"team_id": 1, "name": "teamA"})),
                    record(json!({"team_id": 2, "name": "teamB"})),
                    record(json!({"team_id": 3, "name": "teamC"})),
                ]),
                other => Err(QueryError::UnknownTable(other.to_string())),
            }
        }

        fn columns(&self, table: &str) -> Result<&'static [&'static str], QueryError> {
            match table {
                "member" => Ok(&["member_id", "username", "age", "team_id"]),
                "team" => Ok(&["team_id", "name"]),
                other => Err(QueryError::UnknownTable(other.to_string())),
            }
        }

        fn primary_key(&self, table: &str) -> Result<&'static str, QueryError> {
            match table {
                "member" => Ok("member_id"),
                "team" => Ok("team_id"),
                other => Err(QueryError::UnknownTable(other.to_string())),
            }
        }
    }

    fn ids(rows: &[Record]) -> Vec<i64> {
        rows.iter()
            .map(|row| row["member_id"].as_i64().unwrap())
            .collect()
    }

    fn members() -> QueryBuilder {
        QueryBuilder::new()
            .select(vec![SelectField::field("m.member_id")])
            .from("member", "m")
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let query = QueryBuilder::new()
            .select(vec![
                SelectField::field("m.member_id"),
                SelectField::field_as("t.name", "team_name"),
            ])
            .from("member", "m")
            .left_join("team", "t", "m.team_id", "t.team_id")
            .order_by(OrderBy::asc("m.member_id"));

        let rows = select(&Tables, &query).unwrap();
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);
        assert_eq!(rows[2]["team_name"], json!("teamB"));
        assert_eq!(rows[3]["team_name"], Value::Null);
    }

    #[test]
    fn test_inner_join_drops_unmatched_rows() {
        let query = members()
            .inner_join("team", "t", "m.team_id", "t.team_id")
            .order_by(OrderBy::asc("m.member_id"));
        assert_eq!(ids(&select(&Tables, &query).unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn test_null_comparisons_never_match() {
        let query = members().filter(QueryFilter::ne("m.username", json!("member1")));
        assert_eq!(ids(&select(&Tables, &query).unwrap()), vec![2, 4]);

        let negated = members().filter(QueryFilter::not(QueryFilter::eq(
            "m.username",
            json!("member1"),
        )));
        assert_eq!(ids(&select(&Tables, &negated).unwrap()), vec![2, 4]);

        let either = members().filter(QueryFilter::or(vec![
            QueryFilter::eq("m.username", json!("member1")),
            QueryFilter::is_null("m.username"),
        ]));
        assert_eq!(ids(&select(&Tables, &either).unwrap()), vec![1, 3]);
    }

    #[test]
    fn test_vacuous_filters_keep_every_row() {
        let query = members()
            .filter(QueryFilter::and(vec![]))
            .filter(QueryFilter::not(QueryFilter::or(vec![])))
            .filter(QueryFilter::not_in_values("m.age", vec![]));
        assert_eq!(select(&Tables, &query).unwrap().len(), 4);

        let none = members().filter(QueryFilter::in_values("m.age", vec![]));
        assert!(select(&Tables, &none).unwrap().is_empty());
    }

    #[test]
    fn test_like_between_and_lists() {
        let like = members().filter(QueryFilter::like("m.username", "member_"));
        assert_eq!(ids(&select(&Tables, &like).unwrap()), vec![1, 2, 4]);

        let suffix = members().filter(QueryFilter::like("m.username", "%4"));
        assert_eq!(ids(&select(&Tables, &suffix).unwrap()), vec![4]);

        let between = members().filter(QueryFilter::between("m.age", json!(20), json!(30)));
        assert_eq!(ids(&select(&Tables, &between).unwrap()), vec![2, 3]);

        let listed = members().filter(QueryFilter::not_in_values(
            "m.team_id",
            vec![json!(1)],
        ));
        // team_id NULL is unknown for NOT IN
        assert_eq!(ids(&select(&Tables, &listed).unwrap()), vec![3]);
    }

    #[test]
    fn test_like_escapes() {
        assert!(like_matches("100%", "100\\%"));
        assert!(!like_matches("1000", "100\\%"));
        assert!(like_matches("", "%"));
        assert!(!like_matches("", "_"));
        assert!(like_matches("teamA", "t%A"));
    }

    #[test]
    fn test_subquery_membership() {
        let teams = QueryBuilder::new()
            .select(vec![SelectField::field("t.team_id")])
            .from("team", "t")
            .filter(QueryFilter::eq("t.name", json!("teamB")));
        let query = members().filter(QueryFilter::in_subquery("m.team_id", teams));
        assert_eq!(ids(&select(&Tables, &query).unwrap()), vec![3]);
    }

    #[test]
    fn test_grouped_aggregates() {
        let query = QueryBuilder::new()
            .select(vec![
                SelectField::field_as("t.name", "team_name"),
                SelectField::count("m.member_id").with_alias("member_count"),
                SelectField::avg("m.age").with_alias("average_age"),
            ])
            .from("member", "m")
            .inner_join("team", "t", "m.team_id", "t.team_id")
            .group_by(GroupBy::single("t.name"))
            .order_by(OrderBy::desc("t.name"));

        let rows = select(&Tables, &query).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["team_name"], json!("teamB"));
        assert_eq!(rows[0]["member_count"], json!(1));
        assert_eq!(rows[1]["average_age"], json!(15.0));
    }

    #[test]
    fn test_ungrouped_aggregates_yield_one_row() {
        let query = QueryBuilder::new()
            .select(vec![
                SelectField::count("m.username").with_alias("named"),
                SelectField::sum("m.age"),
                SelectField::max("m.age"),
            ])
            .from("member", "m")
            .filter(QueryFilter::gt("m.age", json!(15)));
        let rows = select(&Tables, &query).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["named"], json!(2));
        assert_eq!(rows[0]["sum"], json!(90));
        assert_eq!(rows[0]["max"], json!(40));

        let empty = QueryBuilder::new()
            .select(vec![SelectField::count_all(), SelectField::avg("m.age")])
            .from("member", "m")
            .filter(QueryFilter::gt("m.age", json!(100)));
        let rows = select(&Tables, &empty).unwrap();
        assert_eq!(rows[0]["count"], json!(0));
        assert_eq!(rows[0]["avg"], Value::Null);
    }

    #[test]
    fn test_ungrouped_column_is_rejected() {
        let query = QueryBuilder::new()
            .select(vec![SelectField::field("m.username"), SelectField::count_all()])
            .from("member", "m");
        assert!(matches!(
            select(&Tables, &query),
            Err(QueryError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_nulls_placement_and_paging() {
        let query = QueryBuilder::new()
            .select(vec![SelectField::field("m.member_id"), SelectField::field("m.username")])
            .from("member", "m")
            .order_by(OrderBy::desc("m.username").nulls_last());
        assert_eq!(ids(&select(&Tables, &query).unwrap()), vec![4, 2, 1, 3]);

        let default_desc = members().order_by(OrderBy::desc("m.username"));
        assert_eq!(ids(&select(&Tables, &default_desc).unwrap())[0], 3);

        let paged = members().order_by(OrderBy::asc("m.age")).offset(1).limit(2);
        assert_eq!(ids(&select(&Tables, &paged).unwrap()), vec![2, 3]);
    }

    #[test]
    fn test_column_resolution_errors() {
        let unknown = members().filter(QueryFilter::eq("m.nickname", json!("x")));
        assert!(matches!(
            select(&Tables, &unknown),
            Err(QueryError::UnknownColumn(_))
        ));

        let ambiguous = members()
            .left_join("team", "t", "m.team_id", "t.team_id")
            .filter(QueryFilter::eq("team_id", json!(1)));
        assert!(matches!(
            select(&Tables, &ambiguous),
            Err(QueryError::InvalidQuery(_))
        ));

        let mismatch = members().filter(QueryFilter::gt("m.age", json!("ten")));
        assert!(matches!(
            select(&Tables, &mismatch),
            Err(QueryError::TypeMismatch(_))
        ));

        let missing = QueryBuilder::new().from("squad", "s");
        assert!(matches!(
            select(&Tables, &missing),
            Err(QueryError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_matching_rows_strip_alias() {
        let query = QueryBuilder::new()
            .from("member", "m")
            .filter(QueryFilter::gte("m.age", json!(30)));
        let matched = matching_rows(&Tables, &query).unwrap();
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].0, json!(3));
        assert_eq!(matched[0].1["age"], json!(30));

        let joined = query.left_join("team", "t", "m.team_id", "t.team_id");
        assert!(matches!(
            matching_rows(&Tables, &joined),
            Err(QueryError::InvalidQuery(_))
        ));
    }
}
