//! Turns a raw user query into FTS5 match expressions.
//!
//! ```text
//! "frank  apple (x)"  →  tokens ["frank", "apple"]
//!   exact  : "frank" AND "apple"
//!   prefix : "frank"* AND "apple"*
//! ```
//!
//! Each token is emitted as an FTS5 string so that bare operators and column
//! filters typed by the user (`OR`, `NOT`, `:`, `-`, `^`) stay literal text.

/// Characters removed from the raw query before tokenizing.
pub const STRIP_CHARS: &[char] = &['&', '|', '(', ')', '\t', '\n', '"', '\'', '\\'];

/// Exact and prefix expressions for one request, plus the name to leave out
/// of the ranked phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpression {
    pub exact: String,
    pub prefix: String,
    pub exclude: Option<String>,
}

impl QueryExpression {
    /// An empty expression matches nothing and must not reach the store.
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    strip: &'static [char],
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self { strip: STRIP_CHARS }
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `raw` into search terms.
    ///
    /// Stripped characters vanish, the rest is split on single spaces.
    /// Terms of one character or less are dropped, as are terms with no
    /// letter or digit, which FTS5 would parse as an empty phrase.
    pub fn tokens(&self, raw: &str) -> Vec<String> {
        let cleaned: String = raw.chars().filter(|c| !self.strip.contains(c)).collect();
        cleaned
            .split(' ')
            .filter(|t| t.chars().count() > 1)
            .filter(|t| t.chars().any(char::is_alphanumeric))
            .map(str::to_string)
            .collect()
    }

    pub fn build(&self, raw: &str, exclude: Option<String>) -> QueryExpression {
        let tokens = self.tokens(raw);
        let exact = tokens
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" AND ");
        let prefix = tokens
            .iter()
            .map(|t| format!("\"{}\"*", t))
            .collect::<Vec<_>>()
            .join(" AND ");
        QueryExpression {
            exact,
            prefix,
            exclude,
        }
    }
}
