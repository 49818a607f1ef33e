use std::sync::LazyLock;

use regex::Regex;

use crate::results::FieldMap;
use crate::store::KEY_PATH;
use crate::types::RowValues;

// Patterns keep the legacy shape on purpose: single literal spaces between keywords, and a
// `WHERE id = ?` tail whose `?` only makes the preceding space optional. Placeholder and
// literal tokens are never evaluated; only their positions matter.
static INSERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)INSERT INTO [A-Za-z0-9_]+ \(([^)]+)\) VALUES \(([^)]+)\)")
        .expect("valid INSERT pattern")
});

static UPDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)UPDATE [A-Za-z0-9_]+ SET (.+) WHERE id = ?").expect("valid UPDATE pattern")
});

static DELETE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)DELETE FROM [A-Za-z0-9_]+ WHERE id = ?").expect("valid DELETE pattern")
});

static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|INTO|UPDATE)\s+([A-Za-z0-9_]+)").expect("valid table pattern")
});

/// Key and assignments pulled out of an UPDATE statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateClause {
    /// `None` when the statement did not match or the key parameter is absent or NULL.
    pub id: Option<RowValues>,
    pub updates: FieldMap,
}

fn param_at(params: &[RowValues], index: usize) -> RowValues {
    params.get(index).cloned().unwrap_or(RowValues::Null)
}

fn non_null_param(params: &[RowValues], index: usize) -> Option<RowValues> {
    params.get(index).filter(|value| !value.is_null()).cloned()
}

/// Map the column list of `INSERT INTO t (a, b) VALUES (?, ?)` onto `params` by position.
///
/// Returns an empty map when the statement does not have that shape. Values written as
/// literals in the VALUES list are dropped; missing parameters become NULL, except a missing
/// `id` which is left out so the store generates the key.
#[must_use]
pub fn extract_insert(sql: &str, params: &[RowValues]) -> FieldMap {
    let mut values = FieldMap::new();
    if let Some(caps) = INSERT_RE.captures(sql) {
        for (index, column) in caps[1].split(',').map(str::trim).enumerate() {
            if column == KEY_PATH && index >= params.len() {
                continue;
            }
            values.insert(column.to_string(), param_at(params, index));
        }
    }
    values
}

/// Map the SET list of `UPDATE t SET a = ?, b = ? WHERE id = ?` onto `params` by position.
///
/// Only the left-hand side of each assignment is read. The key is the final parameter, and
/// only when the parameters run past the assignments; a NULL final parameter means no key.
#[must_use]
pub fn extract_update(sql: &str, params: &[RowValues]) -> UpdateClause {
    let Some(caps) = UPDATE_RE.captures(sql) else {
        return UpdateClause::default();
    };

    let mut updates = FieldMap::new();
    let mut assignments = 0;
    for (index, pair) in caps[1].split(',').enumerate() {
        let field = pair.trim().split('=').next().unwrap_or_default().trim();
        updates.insert(field.to_string(), param_at(params, index));
        assignments += 1;
    }

    let id = if params.len() > assignments {
        non_null_param(params, params.len() - 1)
    } else {
        None
    };
    UpdateClause { id, updates }
}

/// Key of `DELETE FROM t WHERE id = ?`: parameter 0, or `None` when absent or unmatched.
#[must_use]
pub fn extract_delete_key(sql: &str, params: &[RowValues]) -> Option<RowValues> {
    if DELETE_RE.is_match(sql) {
        non_null_param(params, 0)
    } else {
        None
    }
}

/// Collection named by the first `FROM`, `INTO` or `UPDATE` clause.
#[must_use]
pub fn resolve_table(sql: &str) -> Option<String> {
    TABLE_RE.captures(sql).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RowValues {
        RowValues::Text(s.into())
    }

    #[test]
    fn insert_maps_columns_to_params_in_order() {
        let values = extract_insert(
            "INSERT INTO t (a, b) VALUES (?, ?)",
            &[RowValues::Int(1), text("x")],
        );
        assert_eq!(values.get("a"), Some(&RowValues::Int(1)));
        assert_eq!(values.get("b"), Some(&text("x")));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn insert_ignores_literal_values() {
        let values = extract_insert("insert into t (a,b) values (5, 'y')", &[]);
        assert_eq!(values.get("a"), Some(&RowValues::Null));
        assert_eq!(values.get("b"), Some(&RowValues::Null));
    }

    #[test]
    fn insert_shape_mismatch_is_empty() {
        assert!(extract_insert("INSERT INTO t VALUES (?)", &[RowValues::Int(1)]).is_empty());
        // two spaces between keywords breaks the legacy pattern
        assert!(extract_insert("INSERT  INTO t (a) VALUES (?)", &[RowValues::Int(1)]).is_empty());
    }

    #[test]
    fn update_substitutes_by_position_and_takes_following_key() {
        let clause = extract_update(
            "UPDATE t SET a = 5, b=? WHERE id = ?",
            &[RowValues::Int(9), text("z"), RowValues::Int(3)],
        );
        assert_eq!(clause.updates.get("a"), Some(&RowValues::Int(9)));
        assert_eq!(clause.updates.get("b"), Some(&text("z")));
        assert_eq!(clause.id, Some(RowValues::Int(3)));
    }

    #[test]
    fn update_without_key_param_has_no_id() {
        let clause = extract_update("UPDATE t SET a=? WHERE id = ?", &[RowValues::Int(9)]);
        assert_eq!(clause.id, None);
        let clause = extract_update(
            "UPDATE t SET a=? WHERE id = ?",
            &[RowValues::Int(9), RowValues::Null],
        );
        assert_eq!(clause.id, None);
    }

    #[test]
    fn update_key_is_the_final_param() {
        let clause = extract_update(
            "UPDATE t SET a=? WHERE id = ?",
            &[RowValues::Int(9), RowValues::Int(3), RowValues::Null],
        );
        assert_eq!(clause.id, None);
        assert_eq!(clause.updates.get("a"), Some(&RowValues::Int(9)));

        let clause = extract_update(
            "UPDATE t SET a=? WHERE id = ?",
            &[RowValues::Int(9), RowValues::Int(3), RowValues::Int(4)],
        );
        assert_eq!(clause.id, Some(RowValues::Int(4)));
    }

    #[test]
    fn insert_leaves_out_a_missing_key_param() {
        let values = extract_insert("INSERT INTO t (a, id) VALUES (?, ?)", &[RowValues::Int(1)]);
        assert_eq!(values.get("a"), Some(&RowValues::Int(1)));
        assert!(!values.contains_key("id"));

        let values = extract_insert("INSERT INTO t (a, b) VALUES (?, ?)", &[RowValues::Int(1)]);
        assert_eq!(values.get("b"), Some(&RowValues::Null));
    }

    #[test]
    fn update_without_where_does_not_match() {
        let clause = extract_update("UPDATE t SET a=?", &[RowValues::Int(9), RowValues::Int(1)]);
        assert_eq!(clause, UpdateClause::default());
    }

    #[test]
    fn update_tolerates_missing_space_after_equals() {
        let clause = extract_update("update t set a=? where id =?", &[text("v"), RowValues::Int(2)]);
        assert_eq!(clause.id, Some(RowValues::Int(2)));
    }

    #[test]
    fn delete_key_is_first_param() {
        assert_eq!(
            extract_delete_key("DELETE FROM t WHERE id = ?", &[RowValues::Int(7)]),
            Some(RowValues::Int(7))
        );
        assert_eq!(extract_delete_key("DELETE FROM t WHERE id = ?", &[]), None);
        assert_eq!(extract_delete_key("DELETE FROM t", &[RowValues::Int(7)]), None);
    }

    #[test]
    fn table_resolution_takes_first_clause() {
        assert_eq!(resolve_table("SELECT * FROM notes"), Some("notes".into()));
        assert_eq!(resolve_table("insert into People (a) values (?)"), Some("People".into()));
        assert_eq!(resolve_table("UPDATE t SET a=? WHERE id = ?"), Some("t".into()));
        assert_eq!(resolve_table("SELECT 1"), None);
    }
}
