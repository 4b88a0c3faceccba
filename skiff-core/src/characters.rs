/// Lexical conventions of a database product.
///
/// One `const` value per product lives in the product crate, the generic one is [`EMPTY`].
/// Values are immutable and passed around explicitly.
#[derive(Debug, PartialEq, Eq)]
pub struct SqlCharacters {
    /// Opening identifier delimiter.
    pub left_delimiter: char,
    /// Closing identifier delimiter.
    pub right_delimiter: char,
    /// Character introducing a parameter (`@`, `:`, `?`).
    pub sql_parameter: char,
    /// Named parameters are `{sql_parameter}p{position}`, otherwise the bare marker is used.
    pub supports_named_parameters: bool,
    /// Keyword used to call a stored procedure (`EXEC`, `CALL`...), empty when unsupported.
    pub stored_procedure_invocation_command: &'static str,
    /// Separator between statements of a batch.
    pub statement_separator: char,
}

/// Conventions used when no product is known.
pub const EMPTY: SqlCharacters = SqlCharacters {
    left_delimiter: '"',
    right_delimiter: '"',
    sql_parameter: '?',
    supports_named_parameters: false,
    stored_procedure_invocation_command: "",
    statement_separator: ';',
};

/// A placeholder located in some SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte offset of the marker.
    pub start: usize,
    /// Byte offset past the last digit.
    pub end: usize,
    /// Position for named placeholders (`@p3` => 3), `None` for positional markers.
    pub position: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Quoted,
    Delimited,
    LineComment,
    BlockComment,
}

impl SqlCharacters {
    /// Wrap every dot separated part of `name` in the delimiters.
    ///
    /// Parts that are already delimited are kept as they are, escaping twice is a no-op.
    pub fn escape_identifier(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 4);
        self.write_identifier(&mut out, name);
        out
    }

    /// Same as [`SqlCharacters::escape_identifier`] appending to `out`.
    pub fn write_identifier(&self, out: &mut String, name: &str) {
        if self.is_escaped(name) || name == "*" {
            out.push_str(name);
            return;
        }
        for (i, part) in name.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            if self.is_escaped(part) {
                out.push_str(part);
            } else {
                out.push(self.left_delimiter);
                out.push_str(part);
                out.push(self.right_delimiter);
            }
        }
    }

    pub fn is_escaped(&self, name: &str) -> bool {
        name.starts_with(self.left_delimiter)
    }

    /// Name of the parameter at `position`: `@p0`, `:p0` or just `?`.
    pub fn parameter_name(&self, position: usize) -> String {
        if self.supports_named_parameters {
            format!("{}p{}", self.sql_parameter, position)
        } else {
            self.sql_parameter.to_string()
        }
    }

    pub fn supports_stored_procedures(&self) -> bool {
        !self.stored_procedure_invocation_command.is_empty()
    }

    /// When `text` starts with the procedure invocation keyword, the text after it.
    pub fn strip_stored_procedure_call<'a>(&self, text: &'a str) -> Option<&'a str> {
        let command = self.stored_procedure_invocation_command;
        if command.is_empty() {
            return None;
        }
        let text = text.trim_start();
        let head = text.get(..command.len())?;
        let rest = &text[command.len()..];
        if head.eq_ignore_ascii_case(command) && rest.starts_with(char::is_whitespace) {
            Some(rest.trim_start())
        } else {
            None
        }
    }

    /// Name of the procedure when `text` calls one.
    ///
    /// The invocation keyword must be followed by a plain procedure name and an argument list
    /// made of placeholders only, they become the parameters of the call. Statements reading
    /// from a table (`SELECT a FROM t` for products invoking with `SELECT`) or passing literals
    /// (`SELECT currval('seq')`, `EXEC sp 'a'`) are not calls, their text is sent as it is.
    pub fn stored_procedure_name<'a>(&self, text: &'a str) -> Option<&'a str> {
        let call = self.strip_stored_procedure_call(text)?;
        let end = call
            .find(|c: char| c.is_whitespace() || c == '(')
            .unwrap_or(call.len());
        let name = &call[..end];
        let first = name.chars().next()?;
        let valid = (first.is_alphabetic() || first == '_' || first == self.left_delimiter)
            && name.chars().all(|c| {
                c.is_alphanumeric()
                    || matches!(c, '_' | '.' | '$')
                    || c == self.left_delimiter
                    || c == self.right_delimiter
            });
        if !valid || !self.is_placeholder_list(&call[end..]) {
            return None;
        }
        Some(name)
    }

    /// `text` holds nothing but placeholders, commas, parentheses and whitespace.
    fn is_placeholder_list(&self, text: &str) -> bool {
        let mut position = 0;
        let mut rest = String::with_capacity(text.len());
        for placeholder in self.placeholders(text) {
            rest.push_str(&text[position..placeholder.start]);
            rest.push(' ');
            position = placeholder.end;
        }
        rest.push_str(&text[position..]);
        rest.chars()
            .all(|c| c.is_whitespace() || matches!(c, ',' | '(' | ')' | ';'))
    }

    pub fn is_stored_procedure_call(&self, text: &str) -> bool {
        self.stored_procedure_name(text).is_some()
    }

    /// Every placeholder in `text`, skipping string literals, delimited identifiers and comments.
    pub fn placeholders(&self, text: &str) -> Vec<Placeholder> {
        let bytes = text.as_bytes();
        let marker = self.sql_parameter as u8;
        let left = self.left_delimiter as u8;
        let right = self.right_delimiter as u8;
        let mut result = Vec::new();
        let mut state = State::Normal;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match state {
                State::Normal => match b {
                    b'\'' => state = State::Quoted,
                    b'-' if bytes.get(i + 1) == Some(&b'-') => {
                        state = State::LineComment;
                        i += 1;
                    }
                    b'/' if bytes.get(i + 1) == Some(&b'*') => {
                        state = State::BlockComment;
                        i += 1;
                    }
                    b if b == marker => {
                        if self.supports_named_parameters {
                            let after_marker = i > 0 && bytes[i - 1] == marker;
                            let mut end = i + 2;
                            while end < bytes.len() && bytes[end].is_ascii_digit() {
                                end += 1;
                            }
                            if !after_marker && bytes.get(i + 1) == Some(&b'p') && end > i + 2 {
                                let position = text[i + 2..end].parse().ok();
                                result.push(Placeholder {
                                    start: i,
                                    end,
                                    position,
                                });
                                i = end;
                                continue;
                            }
                        } else {
                            result.push(Placeholder {
                                start: i,
                                end: i + 1,
                                position: None,
                            });
                        }
                    }
                    b if b == left && left != b'\'' => state = State::Delimited,
                    _ => {}
                },
                State::Quoted => {
                    if b == b'\'' {
                        if bytes.get(i + 1) == Some(&b'\'') {
                            i += 1;
                        } else {
                            state = State::Normal;
                        }
                    }
                }
                State::Delimited => {
                    if b == right {
                        state = State::Normal;
                    }
                }
                State::LineComment => {
                    if b == b'\n' {
                        state = State::Normal;
                    }
                }
                State::BlockComment => {
                    if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        state = State::Normal;
                        i += 1;
                    }
                }
            }
            i += 1;
        }
        result
    }

    /// Number of distinct placeholders, the same named placeholder referenced twice counts once.
    pub fn count_placeholders(&self, text: &str) -> usize {
        let placeholders = self.placeholders(text);
        if self.supports_named_parameters {
            let mut positions = placeholders
                .iter()
                .filter_map(|v| v.position)
                .collect::<Vec<_>>();
            positions.sort_unstable();
            positions.dedup();
            positions.len()
        } else {
            placeholders.len()
        }
    }

    /// First named position below the highest one that `text` never references.
    ///
    /// `a = @p0 AND b = @p2` skips `@p1`, positional markers never skip.
    pub fn missing_placeholder(&self, text: &str) -> Option<usize> {
        if !self.supports_named_parameters {
            return None;
        }
        let mut positions = self
            .placeholders(text)
            .iter()
            .filter_map(|v| v.position)
            .collect::<Vec<_>>();
        positions.sort_unstable();
        positions.dedup();
        positions
            .iter()
            .enumerate()
            .find(|(expected, position)| expected != *position)
            .map(|(expected, _)| expected)
    }

    /// Shift every named placeholder of `text` by `offset` (`@p0` => `@p{offset}`).
    ///
    /// Positional markers carry no number and are returned unchanged.
    pub fn renumber_placeholders(&self, text: &str, offset: usize) -> String {
        if !self.supports_named_parameters || offset == 0 {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len() + 8);
        let mut position = 0;
        for placeholder in self.placeholders(text) {
            let Some(index) = placeholder.position else {
                continue;
            };
            out.push_str(&text[position..placeholder.start]);
            out.push_str(&self.parameter_name(index + offset));
            position = placeholder.end;
        }
        out.push_str(&text[position..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRACKETS: SqlCharacters = SqlCharacters {
        left_delimiter: '[',
        right_delimiter: ']',
        sql_parameter: '@',
        supports_named_parameters: true,
        stored_procedure_invocation_command: "EXEC",
        statement_separator: ';',
    };

    #[test]
    fn escape_identifier_is_idempotent() {
        assert_eq!(BRACKETS.escape_identifier("Name"), "[Name]");
        assert_eq!(BRACKETS.escape_identifier("[Name]"), "[Name]");
        assert_eq!(BRACKETS.escape_identifier("Sales.Customers"), "[Sales].[Customers]");
        assert_eq!(EMPTY.escape_identifier("Name"), "\"Name\"");
    }

    #[test]
    fn parameter_names() {
        assert_eq!(BRACKETS.parameter_name(0), "@p0");
        assert_eq!(BRACKETS.parameter_name(12), "@p12");
        assert_eq!(EMPTY.parameter_name(3), "?");
    }

    #[test]
    fn count_skips_literals_and_duplicates() {
        assert_eq!(
            BRACKETS.count_placeholders(
                "SELECT * FROM T WHERE a = @p0 OR b = @p0 AND c = 'x@p7.com' AND [@p9] = @p1"
            ),
            2
        );
        assert_eq!(BRACKETS.count_placeholders("SELECT @@IDENTITY"), 0);
        assert_eq!(EMPTY.count_placeholders("a = ? AND b = ? -- ?"), 2);
    }

    #[test]
    fn positions_must_be_contiguous() {
        assert_eq!(BRACKETS.missing_placeholder("a = @p0 AND b = @p5"), Some(1));
        assert_eq!(BRACKETS.missing_placeholder("a = @p1"), Some(0));
        assert_eq!(BRACKETS.missing_placeholder("a = @p1 OR b = @p0 OR c = @p1"), None);
        assert_eq!(BRACKETS.missing_placeholder("SELECT 1"), None);
        assert_eq!(EMPTY.missing_placeholder("a = ? AND b = ?"), None);
    }

    #[test]
    fn renumber_named() {
        assert_eq!(
            BRACKETS.renumber_placeholders("a = @p0 AND b = @p1 AND c = @p10", 2),
            "a = @p2 AND b = @p3 AND c = @p12"
        );
        assert_eq!(EMPTY.renumber_placeholders("a = ?", 4), "a = ?");
    }

    #[test]
    fn stored_procedure_detection() {
        assert_eq!(
            BRACKETS.strip_stored_procedure_call("EXEC GetCustomers @p0"),
            Some("GetCustomers @p0")
        );
        assert_eq!(BRACKETS.strip_stored_procedure_call("EXECUTE x"), None);
        assert_eq!(EMPTY.strip_stored_procedure_call("EXEC x"), None);
        assert_eq!(
            BRACKETS.stored_procedure_name("exec [dbo].[GetCustomers] @p0, @p1"),
            Some("[dbo].[GetCustomers]")
        );
    }

    #[test]
    fn select_is_a_call_only_without_from() {
        const COLONS: SqlCharacters = SqlCharacters {
            left_delimiter: '"',
            right_delimiter: '"',
            sql_parameter: ':',
            supports_named_parameters: true,
            stored_procedure_invocation_command: "SELECT",
            statement_separator: ';',
        };
        assert_eq!(
            COLONS.stored_procedure_name("SELECT get_customers(:p0)"),
            Some("get_customers")
        );
        assert_eq!(COLONS.stored_procedure_name("SELECT a FROM t"), None);
        assert_eq!(COLONS.stored_procedure_name("SELECT * FROM t"), None);
        assert_eq!(COLONS.stored_procedure_name("SELECT 1"), None);
        assert!(COLONS.is_stored_procedure_call("select lastval()"));
        assert!(!BRACKETS.is_stored_procedure_call("SELECT lastval()"));
    }

    #[test]
    fn literal_arguments_keep_the_statement_as_text() {
        const COLONS: SqlCharacters = SqlCharacters {
            left_delimiter: '"',
            right_delimiter: '"',
            sql_parameter: ':',
            supports_named_parameters: true,
            stored_procedure_invocation_command: "SELECT",
            statement_separator: ';',
        };
        for text in [
            "SELECT nextval('Customers_seq')",
            "SELECT currval('Invoices_seq')",
            "SELECT upper('abc')",
            "SELECT round(:p0, 2)",
        ] {
            assert_eq!(COLONS.stored_procedure_name(text), None, "{}", text);
        }
        assert_eq!(
            COLONS.stored_procedure_name("SELECT archive(:p0, :p1);"),
            Some("archive")
        );
        assert_eq!(BRACKETS.stored_procedure_name("EXEC Archive 'a', 'b'"), None);
        assert_eq!(BRACKETS.stored_procedure_name("EXEC Archive @p0, 'b'"), None);
        assert_eq!(BRACKETS.stored_procedure_name("EXEC Archive @p0, @p1"), Some("Archive"));
    }
}
