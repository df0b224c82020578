//! Bound-column discovery for UPDATE statements.
//!
//! Positional placeholders carry no names, so the binding order has to be
//! recovered from the statement text itself. This is a textual heuristic,
//! not a SQL parser; it is kept behind this module so a real tokenizer can
//! replace it without touching callers.

use regex::Regex;
use std::sync::LazyLock;

/// Matches `SET <assignments> WHERE <conditions>` anywhere in the statement.
/// The lazy assignments group stops at the first WHERE.
static SET_WHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)SET\s+(.+?)\s+WHERE\s+(.+)").unwrap());

/// Splits a WHERE clause on AND keywords.
static AND_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+AND\s+").unwrap());

/// Extract the ordered bound-column names from an UPDATE statement.
///
/// Assignment columns (left-hand sides in the SET clause, in statement
/// order) come first, then condition columns (left-hand sides in the WHERE
/// clause, split on AND). The result order must equal the order of `?`
/// placeholders the caller wrote; the extractor discovers binding order
/// only and never rewrites the SQL.
///
/// Returns an empty list when the SET/WHERE pattern is absent. Known
/// limitations: subqueries, nested parentheses, quoted identifiers
/// containing `=`, and OR conditions are not understood; such statements
/// silently under-bind or mis-bind.
pub fn extract_bound_columns(sql: &str) -> Vec<String> {
    let Some(caps) = SET_WHERE.captures(sql) else {
        return Vec::new();
    };
    let assignments = &caps[1];
    let conditions = &caps[2];

    let mut columns: Vec<String> = Vec::new();
    for assignment in assignments.split(',') {
        columns.push(lhs_column(assignment));
    }
    for condition in AND_SPLIT.split(conditions) {
        columns.push(lhs_column(condition));
    }
    columns
}

/// Left-hand side of the first `=`, trimmed. A piece with no `=` yields the
/// whole piece trimmed, matching the split-then-trim behavior callers see
/// for malformed fragments.
fn lhs_column(piece: &str) -> String {
    piece
        .split('=')
        .next()
        .unwrap_or(piece)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_then_conditions_in_order() {
        let cols = extract_bound_columns("UPDATE t SET a=?, b=? WHERE c=? AND d=?");
        assert_eq!(cols, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn no_set_where_yields_empty() {
        assert!(extract_bound_columns("SELECT 1").is_empty());
        assert!(extract_bound_columns("DELETE FROM t").is_empty());
        assert!(extract_bound_columns("").is_empty());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let cols = extract_bound_columns("update t set A = ? where B = ? and C = ?");
        assert_eq!(cols, vec!["A", "B", "C"]);
    }

    #[test]
    fn whitespace_around_names_is_trimmed() {
        let cols = extract_bound_columns("UPDATE t SET  a  = ?,\n  b =? WHERE  c  = ?");
        assert_eq!(cols, vec!["a", "b", "c"]);
    }

    #[test]
    fn single_assignment_single_condition() {
        let cols = extract_bound_columns("UPDATE accounts SET balance=? WHERE id=?");
        assert_eq!(cols, vec!["balance", "id"]);
    }

    #[test]
    fn multiline_statement() {
        let sql = "UPDATE t\nSET a = ?,\n    b = ?\nWHERE c = ?";
        assert_eq!(extract_bound_columns(sql), vec!["a", "b", "c"]);
    }

    #[test]
    fn first_where_wins() {
        // The WHERE inside the literal is indistinguishable from the real
        // one at this level; the first occurrence terminates the SET group.
        let cols = extract_bound_columns("UPDATE t SET a=? WHERE b=? AND c=?");
        assert_eq!(cols, vec!["a", "b", "c"]);
    }

    #[test]
    fn or_conditions_are_not_split() {
        // Documented limitation: OR is not a separator, so both sides land
        // in one piece and the extractor under-binds.
        let cols = extract_bound_columns("UPDATE t SET a=? WHERE b=? OR c=?");
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0], "a");
    }

    #[test]
    fn and_inside_column_name_is_not_a_separator() {
        let cols = extract_bound_columns("UPDATE t SET brand=? WHERE candidate=?");
        assert_eq!(cols, vec!["brand", "candidate"]);
    }
}
