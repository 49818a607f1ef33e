use std::fmt;

/// The four statement kinds the adapter maps onto record-store requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Select,
    Update,
    Delete,
    Unrecognized,
}

impl StatementKind {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            StatementKind::Insert => "INSERT",
            StatementKind::Select => "SELECT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

const RECOGNIZED: [StatementKind; 4] = [
    StatementKind::Insert,
    StatementKind::Select,
    StatementKind::Update,
    StatementKind::Delete,
];

/// Classify a statement by its leading keyword, ignoring case and surrounding whitespace.
///
/// This is a prefix test: `INSERTED ...` classifies as INSERT, and comments or statement
/// separators are not understood.
#[must_use]
pub fn classify(sql: &str) -> StatementKind {
    let trimmed = sql.trim_start();
    RECOGNIZED
        .into_iter()
        .find(|kind| {
            let keyword = kind.keyword();
            trimmed
                .get(..keyword.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
        })
        .unwrap_or(StatementKind::Unrecognized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_leading_keyword_case_insensitively() {
        assert_eq!(classify("  insert into t (a) values (?)"), StatementKind::Insert);
        assert_eq!(classify("\n\tSeLeCt * from t"), StatementKind::Select);
        assert_eq!(classify("UPDATE t SET a=? WHERE id = ?"), StatementKind::Update);
        assert_eq!(classify("delete from t where id = ?"), StatementKind::Delete);
    }

    #[test]
    fn unknown_or_empty_statements_are_unrecognized() {
        assert_eq!(classify("CREATE TABLE t (a)"), StatementKind::Unrecognized);
        assert_eq!(classify(""), StatementKind::Unrecognized);
        assert_eq!(classify("   "), StatementKind::Unrecognized);
        assert_eq!(classify("-- SELECT\nSELECT 1"), StatementKind::Unrecognized);
    }

    #[test]
    fn keyword_is_a_prefix_match() {
        assert_eq!(classify("SELECTED"), StatementKind::Select);
        assert_eq!(classify("ins"), StatementKind::Unrecognized);
    }

    #[test]
    fn multibyte_leading_text_does_not_panic() {
        assert_eq!(classify("ÜPDATE t"), StatementKind::Unrecognized);
    }
}
