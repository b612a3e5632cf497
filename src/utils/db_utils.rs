use chrono::NaiveDate;

use crate::model::attendance::AttendanceFilter;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Date(NaiveDate),
}

/// ===============================
/// SQL statement + ordered bindings
/// ===============================
#[derive(Debug)]
pub struct SqlStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// `None` when there is nothing to assign.
pub fn build_update_sql(
    table: &str,
    assignments: &[(&str, &str)],
    id_column: &str,
    id_value: &str,
) -> Option<SqlStatement> {
    if assignments.is_empty() {
        return None;
    }

    let set_clause = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<SqlValue> = assignments
        .iter()
        .map(|(_, value)| SqlValue::String(value.to_string()))
        .collect();
    values.push(SqlValue::String(id_value.to_string()));

    Some(SqlStatement { sql, values })
}

/// ===============================
/// WHERE clause for attendance filters
/// ===============================
pub fn build_attendance_where(filter: &AttendanceFilter) -> SqlStatement {
    let mut sql = String::from(" WHERE 1=1");
    let mut values = Vec::new();

    if let Some(user_id) = &filter.user_id {
        sql.push_str(" AND user_id = ?");
        values.push(SqlValue::String(user_id.clone()));
    }

    if let Some(date) = filter.date {
        sql.push_str(" AND date = ?");
        values.push(SqlValue::Date(date));
    }

    if let Some(status) = filter.status {
        sql.push_str(" AND status = ?");
        values.push(SqlValue::String(status.as_ref().to_string()));
    }

    if let Some(from) = filter.from {
        sql.push_str(" AND date >= ?");
        values.push(SqlValue::Date(from));
    }

    if let Some(to) = filter.to {
        sql.push_str(" AND date <= ?");
        values.push(SqlValue::Date(to));
    }

    SqlStatement { sql, values }
}
