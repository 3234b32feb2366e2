use crate::error::DataError;
use crate::query::value::{ParamValue, Params, Value};

/// A query expression: SQL text plus parameter bindings.
///
/// The backend binds positionally, so named expressions are compiled down
/// to `?` placeholders before execution. List parameters expand in place
/// and must appear inside parentheses (`... IN (:names)`).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryExpr {
    sql: String,
    params: Params,
}

impl QueryExpr {
    /// An expression with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::None,
        }
    }

    /// An expression with `?` placeholders bound in order.
    pub fn positional(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::Positional(values),
        }
    }

    /// An expression with `:name` placeholders; bind values with
    /// [`bind`](Self::bind) and [`bind_list`](Self::bind_list).
    pub fn named(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::Named(Vec::new()),
        }
    }

    /// Binds a single named value.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push_named(name.into(), ParamValue::One(value.into()));
        self
    }

    /// Binds a named list, expanded to one placeholder per element.
    pub fn bind_list(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.push_named(name.into(), ParamValue::Many(values));
        self
    }

    fn push_named(&mut self, name: String, value: ParamValue) {
        if let Params::Named(bindings) = &mut self.params {
            bindings.push((name, value));
        } else {
            // Plain expressions become named; mixed styles are rejected
            // when the expression is compiled.
            self.params = Params::Named(vec![(name, value)]);
        }
    }

    /// Compiles the expression into positional SQL and an ordered value
    /// list, validating that placeholders and bindings agree.
    pub fn compile(&self) -> Result<(String, Vec<Value>), DataError> {
        match &self.params {
            Params::None => {
                if count_positional(&self.sql) != 0 || has_named_placeholder(&self.sql) {
                    return Err(DataError::InvalidQuery(
                        "expression has placeholders but no bindings".to_string(),
                    ));
                }
                Ok((self.sql.clone(), Vec::new()))
            }
            Params::Positional(values) => {
                let expected = count_positional(&self.sql);
                if expected != values.len() {
                    return Err(DataError::InvalidQuery(format!(
                        "expected {} positional values, got {}",
                        expected,
                        values.len()
                    )));
                }
                Ok((self.sql.clone(), values.clone()))
            }
            Params::Named(bindings) => compile_named(&self.sql, bindings),
        }
    }
}

fn compile_named(
    sql: &str,
    bindings: &[(String, ParamValue)],
) -> Result<(String, Vec<Value>), DataError> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut used = vec![false; bindings.len()];

    let mut chars = sql.char_indices().peekable();
    let mut in_string = false;

    while let Some((_, c)) = chars.next() {
        if c == '\'' {
            in_string = !in_string;
            out.push(c);
            continue;
        }
        if in_string {
            out.push(c);
            continue;
        }
        if c == '?' {
            return Err(DataError::InvalidQuery(
                "positional placeholder in a named expression".to_string(),
            ));
        }
        if c != ':' {
            out.push(c);
            continue;
        }

        let mut name = String::new();
        while let Some((_, n)) = chars.peek() {
            if n.is_ascii_alphanumeric() || *n == '_' {
                name.push(*n);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            out.push(c);
            continue;
        }

        let index = bindings
            .iter()
            .position(|(bound, _)| *bound == name)
            .ok_or_else(|| DataError::InvalidQuery(format!("no value bound for :{name}")))?;
        used[index] = true;

        match &bindings[index].1 {
            ParamValue::One(value) => {
                out.push('?');
                values.push(value.clone());
            }
            ParamValue::Many(list) => {
                if list.is_empty() {
                    return Err(DataError::InvalidQuery(format!(
                        "list parameter :{name} is empty"
                    )));
                }
                for (i, value) in list.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push('?');
                    values.push(value.clone());
                }
            }
        }
    }

    if let Some(unused) = used.iter().position(|u| !u) {
        return Err(DataError::InvalidQuery(format!(
            "parameter :{} is never referenced",
            bindings[unused].0
        )));
    }

    Ok((out, values))
}

fn count_positional(sql: &str) -> usize {
    let mut count = 0;
    let mut in_string = false;
    for c in sql.chars() {
        match c {
            '\'' => in_string = !in_string,
            '?' if !in_string => count += 1,
            _ => {}
        }
    }
    count
}

fn has_named_placeholder(sql: &str) -> bool {
    let mut in_string = false;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => in_string = !in_string,
            ':' if !in_string => {
                if chars
                    .peek()
                    .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_')
                {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_placeholders_become_positional() {
        let expr = QueryExpr::named("SELECT * FROM members WHERE username = :name AND age = :age")
            .bind("name", "aaa")
            .bind("age", 10);

        let (sql, values) = expr.compile().expect("compiles");
        assert_eq!(sql, "SELECT * FROM members WHERE username = ? AND age = ?");
        assert_eq!(values, vec![Value::from("aaa"), Value::from(10)]);
    }

    #[test]
    fn repeated_name_binds_each_occurrence() {
        let expr = QueryExpr::named("SELECT * FROM members WHERE age = :age OR age > :age")
            .bind("age", 10);

        let (sql, values) = expr.compile().expect("compiles");
        assert_eq!(sql, "SELECT * FROM members WHERE age = ? OR age > ?");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn list_parameter_expands_inside_parens() {
        let expr = QueryExpr::named("SELECT * FROM members WHERE username IN (:names)")
            .bind_list("names", vec![Value::from("aaa"), Value::from("bbb")]);

        let (sql, values) = expr.compile().expect("compiles");
        assert_eq!(sql, "SELECT * FROM members WHERE username IN (?, ?)");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn empty_list_parameter_is_rejected() {
        let expr = QueryExpr::named("SELECT * FROM members WHERE username IN (:names)")
            .bind_list("names", Vec::new());
        assert!(matches!(expr.compile(), Err(DataError::InvalidQuery(_))));
    }

    #[test]
    fn missing_binding_is_rejected() {
        let expr = QueryExpr::named("SELECT * FROM members WHERE username = :name");
        assert!(matches!(expr.compile(), Err(DataError::InvalidQuery(_))));
    }

    #[test]
    fn unused_binding_is_rejected() {
        let expr = QueryExpr::named("SELECT * FROM members")
            .bind("name", "aaa");
        assert!(matches!(expr.compile(), Err(DataError::InvalidQuery(_))));
    }

    #[test]
    fn placeholders_inside_string_literals_are_ignored() {
        let expr = QueryExpr::new("SELECT ':fake?' FROM members");
        let (sql, values) = expr.compile().expect("compiles");
        assert_eq!(sql, "SELECT ':fake?' FROM members");
        assert!(values.is_empty());
    }

    #[test]
    fn positional_arity_mismatch_is_rejected() {
        let expr = QueryExpr::positional(
            "SELECT * FROM members WHERE id = ?",
            vec![Value::from(1), Value::from(2)],
        );
        assert!(matches!(expr.compile(), Err(DataError::InvalidQuery(_))));
    }

    #[test]
    fn positional_values_pass_through() {
        let expr = QueryExpr::positional(
            "SELECT * FROM members WHERE id = ?",
            vec![Value::from(7)],
        );
        let (sql, values) = expr.compile().expect("compiles");
        assert_eq!(sql, "SELECT * FROM members WHERE id = ?");
        assert_eq!(values, vec![Value::Integer(7)]);
    }
}
