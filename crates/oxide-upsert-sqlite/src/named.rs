//! Named bind parameter rewriting.
//!
//! SQL handed to the upsert uses `:name` placeholders. sqlx binds SQLite
//! arguments by position, so each distinct name is rewritten to a numbered
//! `?N` placeholder (numbered by first occurrence) and the values are bound
//! in that order. Placeholders inside string literals, quoted identifiers and
//! comments are left alone.

/// SQL with named placeholders rewritten to numbered ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedSql {
    /// The rewritten statement.
    pub sql: String,
    /// Parameter names; the name at index `i` is bound as `?{i + 1}`.
    pub names: Vec<String>,
}

/// Rewrites `:name` placeholders in `sql` to `?N`.
///
/// # Example
///
/// ```rust
/// use oxide_upsert_sqlite::named::number_named_params;
///
/// let numbered = number_named_params("UPDATE t SET name = :name WHERE id = :id OR parent = :id");
/// assert_eq!(numbered.sql, "UPDATE t SET name = ?1 WHERE id = ?2 OR parent = ?2");
/// assert_eq!(numbered.names, ["name", "id"]);
/// ```
#[must_use]
pub fn number_named_params(sql: &str) -> NumberedSql {
    let mut scanner = Scanner::new(sql);
    scanner.run();
    NumberedSql {
        sql: scanner.output,
        names: scanner.names,
    }
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    output: String,
    names: Vec<String>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            output: String::with_capacity(input.len()),
            names: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Copies the current character to the output.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        self.output.push(c);
        Some(c)
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' | '`' => self.copy_quoted(c, c),
                '[' => self.copy_quoted('[', ']'),
                '-' if self.peek_next() == Some('-') => self.copy_line_comment(),
                '/' if self.peek_next() == Some('*') => self.copy_block_comment(),
                ':' if self.peek_next() == Some(':') => {
                    self.advance();
                    self.advance();
                }
                ':' if self.peek_next().is_some_and(is_name_start) => self.rewrite_placeholder(),
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Copies a quoted section. A doubled closing quote is an escape and
    /// does not end the section.
    fn copy_quoted(&mut self, open: char, close: char) {
        self.advance();
        loop {
            while let Some(c) = self.advance() {
                if c == close {
                    break;
                }
            }
            if open != close || self.peek() != Some(close) {
                break;
            }
            self.advance();
        }
    }

    fn copy_line_comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    fn copy_block_comment(&mut self) {
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    break;
                }
                None => break,
                _ => {}
            }
        }
    }

    fn rewrite_placeholder(&mut self) {
        self.pos += 1; // ':'
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += self.peek().map_or(0, char::len_utf8);
        }
        let name = &self.input[start..self.pos];

        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| {
                self.names.push(name.to_string());
                self.names.len() - 1
            });
        self.output.push('?');
        self.output.push_str(&(index + 1).to_string());
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
