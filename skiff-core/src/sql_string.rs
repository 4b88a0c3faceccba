use crate::{Error, Result, single_line};

/// Top level clauses of a `SELECT` statement.
///
/// Not a parser: the text is collapsed to a single line and split on the clause keywords
/// found outside of parentheses, quotes and delimited identifiers. Keywords are matched case
/// sensitively, the way statements are written by hand and by the dialects.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SqlString {
    pub select: String,
    pub from: String,
    pub where_clause: Option<String>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub order_by: Option<String>,
}

const CLAUSES: [&str; 6] = ["SELECT", "FROM", "WHERE", "GROUP BY", "HAVING", "ORDER BY"];

/// Byte offsets of the top level occurrences of each keyword of [`CLAUSES`].
fn top_level_keywords(text: &str) -> Vec<(usize, &'static str)> {
    let bytes = text.as_bytes();
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'[' => quote = Some(b']'),
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && (i == 0 || bytes[i - 1] == b' ') => {
                let rest = &text[i..];
                if let Some(keyword) = CLAUSES.iter().find(|k| {
                    rest.starts_with(*k)
                        && rest.as_bytes().get(k.len()).is_none_or(|c| *c == b' ')
                }) {
                    result.push((i, *keyword));
                    i += keyword.len();
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    result
}

impl SqlString {
    /// Split `text` into its clauses, fails unless it is a `SELECT ... FROM ...` statement.
    pub fn parse(text: &str) -> Result<Self> {
        let text = single_line(text);
        let text = text.trim_end_matches(';').trim_end();
        let keywords = top_level_keywords(text);
        let mut result = SqlString::default();
        let mut has_select = false;
        let mut has_from = false;
        for (i, (position, keyword)) in keywords.iter().enumerate() {
            let start = position + keyword.len();
            let end = keywords.get(i + 1).map(|v| v.0).unwrap_or(text.len());
            let content = text[start..end].trim().to_string();
            match *keyword {
                "SELECT" if i == 0 && *position == 0 => {
                    has_select = true;
                    result.select = content;
                }
                "FROM" if has_select && !has_from => {
                    has_from = true;
                    result.from = content;
                }
                "WHERE" if has_from => result.where_clause = Some(content),
                "GROUP BY" if has_from => result.group_by = Some(content),
                "HAVING" if has_from => result.having = Some(content),
                "ORDER BY" if has_from => result.order_by = Some(content),
                _ => {
                    return Err(Error::Statement(format!(
                        "Unexpected {} in `{}`",
                        keyword,
                        crate::truncate_long!(text)
                    )));
                }
            }
        }
        if !has_select || !has_from || result.select.is_empty() || result.from.is_empty() {
            return Err(Error::Statement(format!(
                "Expected a SELECT ... FROM ... statement, found `{}`",
                crate::truncate_long!(text)
            )));
        }
        Ok(result)
    }

    /// Name the derived table gets when the statement is wrapped in a subquery.
    pub fn table_alias(&self) -> &str {
        let table = self.from.split(' ').next().unwrap_or(&self.from);
        table.rsplit('.').next().unwrap_or(table)
    }

    /// Select list usable outside a derived table: qualifiers removed, aliases kept.
    pub fn unqualified_select(&self) -> String {
        split_top_level(&self.select)
            .into_iter()
            .map(|column| {
                if let Some(alias) = column.rsplit_once(" AS ") {
                    return alias.1.to_string();
                }
                if column.contains('(') {
                    return column.to_string();
                }
                column.rsplit('.').next().unwrap_or(column).to_string()
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The statement without its `ORDER BY`.
    pub fn without_order_by(&self) -> String {
        let mut out = format!("SELECT {} FROM {}", self.select, self.from);
        self.write_filter(&mut out);
        out
    }

    /// Appends ` WHERE ...`, ` GROUP BY ...` and ` HAVING ...` when present.
    pub fn write_filter(&self, out: &mut String) {
        for (keyword, clause) in [
            ("WHERE", &self.where_clause),
            ("GROUP BY", &self.group_by),
            ("HAVING", &self.having),
        ] {
            if let Some(clause) = clause {
                out.push(' ');
                out.push_str(keyword);
                out.push(' ');
                out.push_str(clause);
            }
        }
    }
}

impl std::fmt::Display for SqlString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.without_order_by())?;
        if let Some(order_by) = &self.order_by {
            write!(f, " ORDER BY {}", order_by)?;
        }
        Ok(())
    }
}

/// Split on the commas found outside parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                result.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    result.push(text[start..].trim());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn splits_clauses() {
        let sql = SqlString::parse(indoc! {"
            SELECT CustomerId, Name
            FROM Customers
            WHERE Status = @p0
            ORDER BY Name
        "})
        .unwrap();
        assert_eq!(sql.select, "CustomerId, Name");
        assert_eq!(sql.from, "Customers");
        assert_eq!(sql.where_clause.as_deref(), Some("Status = @p0"));
        assert_eq!(sql.order_by.as_deref(), Some("Name"));
        assert_eq!(
            sql.to_string(),
            "SELECT CustomerId, Name FROM Customers WHERE Status = @p0 ORDER BY Name"
        );
    }

    #[test]
    fn ignores_nested_keywords() {
        let sql = SqlString::parse(
            "SELECT a, (SELECT MAX(x) FROM V) AS m FROM T WHERE id IN (SELECT x FROM U WHERE y = 1 ORDER BY x) ORDER BY a",
        )
        .unwrap();
        assert_eq!(sql.from, "T");
        assert_eq!(
            sql.where_clause.as_deref(),
            Some("id IN (SELECT x FROM U WHERE y = 1 ORDER BY x)")
        );
        assert_eq!(sql.order_by.as_deref(), Some("a"));
        assert_eq!(sql.unqualified_select(), "a, m");
    }

    #[test]
    fn ignores_keywords_in_literals() {
        let sql = SqlString::parse("SELECT [FROM], 'a WHERE b' FROM T").unwrap();
        assert_eq!(sql.select, "[FROM], 'a WHERE b'");
        assert_eq!(sql.where_clause, None);
    }

    #[test]
    fn table_alias_and_qualifiers() {
        let sql = SqlString::parse("SELECT Sales.Customers.Id, Name FROM Sales.Customers").unwrap();
        assert_eq!(sql.table_alias(), "Customers");
        assert_eq!(sql.unqualified_select(), "Id, Name");
    }

    #[test]
    fn rejects_other_statements() {
        assert!(matches!(
            SqlString::parse("DELETE FROM T"),
            Err(Error::Statement(..))
        ));
        assert!(SqlString::parse("SELECT 1").is_err());
    }
}
