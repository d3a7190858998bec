//! Identifier checks.
//!
//! Table and column names are written into statements unquoted, so anything
//! that reaches SQL text as a name must pass one of these checks first.
//! SQLite keywords are rejected in any case.

use std::sync::OnceLock;

use regex::Regex;

/// SQLite keywords, sorted.
const KEYWORDS: [&str; 147] = [
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHOUT",
];

/// Returns true if `word` is a SQLite keyword, in any case.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS
        .binary_search(&word.to_ascii_uppercase().as_str())
        .is_ok()
}

fn identifier_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

fn field_path_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("field path pattern is valid")
    })
}

/// Returns true for a bare identifier such as `users` or `first_name`.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    identifier_regex().is_match(name) && !is_keyword(name)
}

/// Returns true for a column reference, optionally table-qualified
/// (`age`, `customers.age`).
#[must_use]
pub fn is_field_path(name: &str) -> bool {
    field_path_regex().is_match(name) && !name.split('.').any(is_keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("users"));
        assert!(is_identifier("_shadow2"));
        assert!(!is_identifier("2users"));
        assert!(!is_identifier("users; DROP TABLE x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("users.name"));
    }

    #[test]
    fn test_field_paths() {
        assert!(is_field_path("age"));
        assert!(is_field_path("customers.age"));
        assert!(!is_field_path("a.b.c"));
        assert!(!is_field_path("age OR 1=1"));
        assert!(!is_field_path("$gt"));
    }

    #[test]
    fn test_keywords_are_not_names() {
        assert!(is_keyword("order"));
        assert!(is_keyword("Group"));
        assert!(is_keyword("CURRENT_TIMESTAMP"));
        assert!(!is_keyword("orders"));
        assert!(!is_identifier("order"));
        assert!(!is_identifier("SELECT"));
        assert!(!is_field_path("group"));
        assert!(!is_field_path("items.order"));
        assert!(!is_field_path("order.total"));
        assert!(is_field_path("orders.total"));
    }

    #[test]
    fn test_keyword_list_is_sorted() {
        assert!(KEYWORDS.windows(2).all(|w| w[0] < w[1]));
    }
}
