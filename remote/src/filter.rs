//! Predicate-string query filters (§4.3 "Filtering"): the client does
//! not hide this syntax from callers, it only assembles it.

use std::fmt;

/// One `field OP value` clause, joined with `&&` by [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clause(String);

impl Clause {
    pub fn eq(field: &str, value: impl fmt::Display) -> Self {
        Clause(format!("{field} = '{value}'"))
    }

    pub fn eq_bool(field: &str, value: bool) -> Self {
        Clause(format!("{field} = {value}"))
    }

    pub fn eq_raw(field: &str, value: impl fmt::Display) -> Self {
        Clause(format!("{field} = {value}"))
    }
}

/// A conjunction of [`Clause`]s, rendered as `field = 'val' && field2 = false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<&str> = self.clauses.iter().map(|c| c.0.as_str()).collect();
        write!(f, "{}", rendered.join(" && "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_conjunction_in_insertion_order() {
        let filter = Filter::new()
            .and(Clause::eq("field", "val"))
            .and(Clause::eq_bool("field2", false));
        assert_eq!(filter.to_string(), "field = 'val' && field2 = false");
    }

    #[test]
    fn empty_filter_renders_empty_string() {
        assert_eq!(Filter::new().to_string(), "");
        assert!(Filter::new().is_empty());
    }
}
