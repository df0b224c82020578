//! Statement execution.
//!
//! One statement per call, executed once with no caching and no retry. The
//! query path maps every result row to string-normalized cells keyed by
//! the column names the backend reports; the update path binds positional
//! parameters recovered from the statement text against a JSON payload.
//!
//! Backend-specific implementations live in submodules with intentionally
//! parallel structure.

use crate::db::columns::extract_bound_columns;
use crate::db::connection::{Connection, Session};
use crate::db::types::RowToCells;
use crate::error::{OperationError, OperationResult};
use crate::models::{OperationOutcome, Row, RowSet};
use serde_json::Value as JsonValue;
use tracing::debug;

const QUERY_FAILED: &str = "Error occurred while executing the query.";
const UPDATE_OPERATION: &str = "update";

/// Execute a read statement and return its rows.
///
/// Fails with `InvalidConfiguration` when `sql` is empty, before anything
/// reaches the backend; any driver failure surfaces as an `Operation`
/// error wrapping the cause.
pub async fn run_query(conn: &mut Connection, sql: &str) -> OperationResult<RowSet> {
    if sql.trim().is_empty() {
        return Err(OperationError::invalid_configuration(
            "Execute query is not provided.",
        ));
    }

    debug!(name = %conn.name(), "Executing query");
    let rows = match conn.session_mut() {
        Session::Postgres(c) => postgres::fetch_rows(c, sql).await?,
        Session::MySql(c) => mysql::fetch_rows(c, sql).await?,
        Session::Sqlite(c) => sqlite::fetch_rows(c, sql).await?,
    };
    debug!(name = %conn.name(), row_count = rows.len(), "Query complete");
    Ok(RowSet::from(rows))
}

/// Execute an update statement, binding positional parameters from a JSON
/// payload, and report the affected-row count.
///
/// The statement is prepared as written; [`extract_bound_columns`] only
/// discovers the binding order. Each bound column takes the payload's
/// value for that name, stringified; a column absent from the payload
/// binds the empty string rather than failing. (That substitution can turn
/// a caller's omission into a blank overwrite; it is preserved behavior,
/// not an accident of this implementation.)
pub async fn run_update(
    conn: &mut Connection,
    sql: &str,
    payload: &str,
) -> OperationResult<OperationOutcome> {
    if sql.trim().is_empty() {
        return Err(OperationError::invalid_configuration(
            "Update query is not provided.",
        ));
    }
    if payload.trim().is_empty() {
        return Err(OperationError::invalid_configuration(
            "Empty payload is provided.",
        ));
    }

    let fields = parse_payload(payload)?;
    let columns = extract_bound_columns(sql);
    let values: Vec<String> = columns
        .iter()
        .map(|column| fields.get(column).map(payload_text).unwrap_or_default())
        .collect();

    debug!(
        name = %conn.name(),
        bound_columns = columns.len(),
        "Executing update"
    );
    let affected = match conn.session_mut() {
        Session::Postgres(c) => postgres::execute_update(c, sql, &values).await?,
        Session::MySql(c) => mysql::execute_update(c, sql, &values).await?,
        Session::Sqlite(c) => sqlite::execute_update(c, sql, &values).await?,
    };

    debug!(name = %conn.name(), rows_affected = affected, "Update complete");
    Ok(OperationOutcome::succeeded(
        UPDATE_OPERATION,
        format!("Rows affected: {affected}"),
    ))
}

/// Parse the payload into a flat field map. A payload that is valid JSON
/// but not an object is caller error, surfaced before any statement is
/// prepared.
fn parse_payload(payload: &str) -> OperationResult<serde_json::Map<String, JsonValue>> {
    let value: JsonValue = serde_json::from_str(payload).map_err(|e| {
        OperationError::invalid_configuration(format!("Payload is not valid JSON: {e}"))
    })?;
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(OperationError::invalid_configuration(format!(
            "Payload must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// String form of a payload field: strings bind verbatim, null binds
/// empty, everything else binds its compact JSON text.
fn payload_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn query_error(err: sqlx::Error) -> OperationError {
    OperationError::operation_with(QUERY_FAILED, err)
}

// =============================================================================
// Backend-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::PgConnection;

    pub async fn fetch_rows(conn: &mut PgConnection, sql: &str) -> OperationResult<Vec<Row>> {
        let rows = sqlx::query(sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(query_error)?;
        Ok(rows.iter().map(RowToCells::to_cells).collect())
    }

    pub async fn execute_update(
        conn: &mut PgConnection,
        sql: &str,
        values: &[String],
    ) -> OperationResult<u64> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = query.bind(value.as_str());
        }
        let result = query.execute(&mut *conn).await.map_err(query_error)?;
        Ok(result.rows_affected())
    }
}

mod mysql {
    use super::*;
    use sqlx::MySqlConnection;

    pub async fn fetch_rows(conn: &mut MySqlConnection, sql: &str) -> OperationResult<Vec<Row>> {
        let rows = sqlx::query(sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(query_error)?;
        Ok(rows.iter().map(RowToCells::to_cells).collect())
    }

    pub async fn execute_update(
        conn: &mut MySqlConnection,
        sql: &str,
        values: &[String],
    ) -> OperationResult<u64> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = query.bind(value.as_str());
        }
        let result = query.execute(&mut *conn).await.map_err(query_error)?;
        Ok(result.rows_affected())
    }
}

mod sqlite {
    use super::*;
    use sqlx::SqliteConnection;

    pub async fn fetch_rows(conn: &mut SqliteConnection, sql: &str) -> OperationResult<Vec<Row>> {
        let rows = sqlx::query(sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(query_error)?;
        Ok(rows.iter().map(RowToCells::to_cells).collect())
    }

    pub async fn execute_update(
        conn: &mut SqliteConnection,
        sql: &str,
        values: &[String],
    ) -> OperationResult<u64> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = query.bind(value.as_str());
        }
        let result = query.execute(&mut *conn).await.map_err(query_error)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionSettings;
    use crate::error::ErrorKind;

    async fn memory_connection() -> Connection {
        let settings = ConnectionSettings::new("mem", "sqlite::memory:").unwrap();
        Connection::open(&settings).await.unwrap()
    }

    /// Statements without SET/WHERE bind nothing, so DDL and literal
    /// inserts can go through the update path for test seeding.
    async fn seed(conn: &mut Connection, sql: &str) {
        run_update(conn, sql, "{}").await.unwrap();
    }

    #[tokio::test]
    async fn empty_query_fails_before_execution() {
        let mut conn = memory_connection().await;
        let err = run_query(&mut conn, "   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[tokio::test]
    async fn empty_update_inputs_fail_before_execution() {
        let mut conn = memory_connection().await;

        let err = run_update(&mut conn, "", "{\"a\":\"1\"}").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        let err = run_update(&mut conn, "UPDATE t SET a=? WHERE b=?", "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[tokio::test]
    async fn non_object_payload_is_invalid_configuration() {
        let mut conn = memory_connection().await;
        let err = run_update(&mut conn, "UPDATE t SET a=? WHERE b=?", "[1,2]")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert!(err.to_string().contains("JSON object"));

        let err = run_update(&mut conn, "UPDATE t SET a=? WHERE b=?", "not json")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[tokio::test]
    async fn bad_sql_is_operation_error() {
        let mut conn = memory_connection().await;
        let err = run_query(&mut conn, "SELECT FROM WHERE").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
        // The driver cause stays attached for hosts that inspect it
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn query_maps_rows_in_column_order() {
        let mut conn = memory_connection().await;
        seed(&mut conn, "CREATE TABLE users (id INTEGER, name TEXT, note TEXT)").await;
        seed(&mut conn, "INSERT INTO users VALUES (1, 'ada', NULL)").await;
        seed(&mut conn, "INSERT INTO users VALUES (2, 'grace', 'x')").await;

        let set = run_query(&mut conn, "SELECT id, name, note FROM users ORDER BY id")
            .await
            .unwrap();
        assert_eq!(set.row_count(), 2);

        let first = &set.rows[0];
        let keys: Vec<&String> = first.keys().collect();
        assert_eq!(keys, vec!["id", "name", "note"]);
        assert_eq!(first["id"], JsonValue::String("1".to_string()));
        assert_eq!(first["name"], JsonValue::String("ada".to_string()));
        assert_eq!(first["note"], JsonValue::Null);
    }

    #[tokio::test]
    async fn query_with_no_matches_is_empty_rowset() {
        let mut conn = memory_connection().await;
        seed(&mut conn, "CREATE TABLE t (a TEXT)").await;
        let set = run_query(&mut conn, "SELECT * FROM t").await.unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn update_binds_payload_in_extracted_order() {
        let mut conn = memory_connection().await;
        seed(&mut conn, "CREATE TABLE t (a TEXT, b TEXT, c TEXT)").await;
        seed(&mut conn, "INSERT INTO t VALUES ('old-a', 'old-b', 'key')").await;

        let outcome = run_update(
            &mut conn,
            "UPDATE t SET a=?, b=? WHERE c=?",
            r#"{"a":"new-a","b":"new-b","c":"key"}"#,
        )
        .await
        .unwrap();
        assert_eq!(outcome.operation, "update");
        assert!(outcome.success);
        assert_eq!(outcome.message, "Rows affected: 1");

        let set = run_query(&mut conn, "SELECT a, b FROM t").await.unwrap();
        assert_eq!(set.rows[0]["a"], JsonValue::String("new-a".to_string()));
        assert_eq!(set.rows[0]["b"], JsonValue::String("new-b".to_string()));
    }

    #[tokio::test]
    async fn missing_payload_column_binds_empty_string() {
        let mut conn = memory_connection().await;
        seed(&mut conn, "CREATE TABLE t (a TEXT, b TEXT, c TEXT)").await;
        seed(&mut conn, "INSERT INTO t VALUES ('x', 'y', '')").await;

        // c is absent from the payload: the condition binds '' and matches
        // the seeded row, and b is blanked rather than erroring.
        let outcome = run_update(
            &mut conn,
            "UPDATE t SET a=?, b=? WHERE c=?",
            r#"{"a":"1"}"#,
        )
        .await
        .unwrap();
        assert_eq!(outcome.message, "Rows affected: 1");

        let set = run_query(&mut conn, "SELECT a, b FROM t").await.unwrap();
        assert_eq!(set.rows[0]["a"], JsonValue::String("1".to_string()));
        assert_eq!(set.rows[0]["b"], JsonValue::String("".to_string()));
    }

    #[tokio::test]
    async fn update_matching_nothing_reports_zero() {
        let mut conn = memory_connection().await;
        seed(&mut conn, "CREATE TABLE t (a TEXT, b TEXT)").await;

        let outcome = run_update(
            &mut conn,
            "UPDATE t SET a=? WHERE b=?",
            r#"{"a":"1","b":"absent"}"#,
        )
        .await
        .unwrap();
        assert_eq!(outcome.message, "Rows affected: 0");
    }

    #[test]
    fn payload_text_stringifies_scalars() {
        assert_eq!(payload_text(&JsonValue::String("s".into())), "s");
        assert_eq!(payload_text(&serde_json::json!(42)), "42");
        assert_eq!(payload_text(&serde_json::json!(true)), "true");
        assert_eq!(payload_text(&JsonValue::Null), "");
        assert_eq!(payload_text(&serde_json::json!({"k":"v"})), r#"{"k":"v"}"#);
    }
}
