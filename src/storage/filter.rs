//! Structured WHERE-clause builder
//!
//! Conditions name their columns with `&'static str` and carry their
//! values separately, so caller-supplied text only ever reaches SQLite as a
//! bound parameter:
//!
//! ```
//! use imsg::storage::filter::{Condition, Predicate};
//!
//! let predicate = Predicate::new()
//!     .and(Condition::contains("m.text", "lunch"))
//!     .and(Condition::equals("h.id", "+15551234567".to_string()));
//! let (sql, params) = predicate.to_sql();
//! assert_eq!(sql, r"WHERE 1=1 AND m.text LIKE ? ESCAPE '\' AND h.id = ?");
//! assert_eq!(params.len(), 2);
//! ```

use rusqlite::types::Value;

/// A single typed condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive substring match
    Contains { column: &'static str, needle: String },
    /// Exact equality
    Equals { column: &'static str, value: Value },
    /// `column >= value`
    AtLeast { column: &'static str, value: Value },
    /// `column <= value`
    AtMost { column: &'static str, value: Value },
    /// Column holds a value
    NotNull { column: &'static str },
    /// Every nested condition holds
    All(Vec<Condition>),
    /// At least one nested condition holds
    Any(Vec<Condition>),
}

impl Condition {
    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Condition::Contains {
            column,
            needle: needle.into(),
        }
    }

    pub fn equals(column: &'static str, value: impl Into<Value>) -> Self {
        Condition::Equals {
            column,
            value: value.into(),
        }
    }

    pub fn at_least(column: &'static str, value: impl Into<Value>) -> Self {
        Condition::AtLeast {
            column,
            value: value.into(),
        }
    }

    pub fn at_most(column: &'static str, value: impl Into<Value>) -> Self {
        Condition::AtMost {
            column,
            value: value.into(),
        }
    }

    pub fn not_null(column: &'static str) -> Self {
        Condition::NotNull { column }
    }

    fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            Condition::Contains { column, needle } => {
                params.push(Value::Text(format!("%{}%", escape_like(needle))));
                format!(r"{} LIKE ? ESCAPE '\'", column)
            }
            Condition::Equals { column, value } => {
                params.push(value.clone());
                format!("{} = ?", column)
            }
            Condition::AtLeast { column, value } => {
                params.push(value.clone());
                format!("{} >= ?", column)
            }
            Condition::AtMost { column, value } => {
                params.push(value.clone());
                format!("{} <= ?", column)
            }
            Condition::NotNull { column } => format!("{} IS NOT NULL", column),
            Condition::All(conditions) => render_group(conditions, " AND ", "1=1", params),
            Condition::Any(conditions) => render_group(conditions, " OR ", "1=0", params),
        }
    }
}

fn render_group(
    conditions: &[Condition],
    joiner: &str,
    empty: &str,
    params: &mut Vec<Value>,
) -> String {
    if conditions.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = conditions.iter().map(|c| c.render(params)).collect();
    format!("({})", parts.join(joiner))
}

/// Escape LIKE wildcards so caller text matches literally
pub fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// An always-true base predicate with conditions ANDed onto it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// AND a condition only when one is given
    #[must_use]
    pub fn and_some(self, condition: Option<Condition>) -> Self {
        match condition {
            Some(c) => self.and(c),
            None => self,
        }
    }

    /// Number of top-level conditions
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// Render as a `WHERE` clause plus its bound parameters, in placeholder order
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = String::from("WHERE 1=1");
        for condition in &self.conditions {
            sql.push_str(" AND ");
            sql.push_str(&condition.render(&mut params));
        }
        (sql, params)
    }
}
