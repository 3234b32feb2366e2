use crate::domain::page::{Direction, PageRequest};
use crate::error::DataError;
use crate::query::expr::QueryExpr;
use crate::query::value::Value;

/// Comparison operator applied by a derived-query predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Operator {
    fn sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
        }
    }
}

/// One column comparison in a derived query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    column: &'static str,
    op: Operator,
}

impl Predicate {
    pub fn new(column: &'static str, op: Operator) -> Self {
        Self { column, op }
    }

    pub fn eq(column: &'static str) -> Self {
        Self::new(column, Operator::Eq)
    }

    pub fn gt(column: &'static str) -> Self {
        Self::new(column, Operator::Gt)
    }
}

/// A declarative finder definition: a predicate table over one entity
/// table, combined with AND semantics in declaration order.
///
/// This replaces method-name parsing: each repository finder owns one
/// validated `DerivedQuery`, built when the repository is constructed.
/// Execution binds one value per predicate, in predicate order.
#[derive(Debug, Clone)]
pub struct DerivedQuery {
    table: &'static str,
    columns: &'static [&'static str],
    predicates: Vec<Predicate>,
}

impl DerivedQuery {
    /// Validates and builds a finder definition.
    ///
    /// Fails with [`DataError::InvalidQuery`] when the table or a column
    /// is not a plain identifier, the column list is empty, or a predicate
    /// references a column outside the entity's column list.
    pub fn new(
        table: &'static str,
        columns: &'static [&'static str],
        predicates: Vec<Predicate>,
    ) -> Result<Self, DataError> {
        if !is_identifier(table) {
            return Err(DataError::InvalidQuery(format!(
                "invalid table name {table:?}"
            )));
        }
        if columns.is_empty() {
            return Err(DataError::InvalidQuery(format!(
                "no columns declared for table {table}"
            )));
        }
        for column in columns {
            if !is_identifier(column) {
                return Err(DataError::InvalidQuery(format!(
                    "invalid column name {column:?}"
                )));
            }
        }
        for predicate in &predicates {
            if !columns.contains(&predicate.column) {
                return Err(DataError::InvalidQuery(format!(
                    "predicate column {} is not a column of {}",
                    predicate.column, table
                )));
            }
        }
        Ok(Self {
            table,
            columns,
            predicates,
        })
    }

    /// Renders the full finder query for the given predicate values.
    pub fn select(&self, values: Vec<Value>) -> Result<QueryExpr, DataError> {
        self.check_arity(&values)?;
        Ok(QueryExpr::positional(self.select_sql(), values))
    }

    /// Renders one page of the finder query, with a separate
    /// [`count`](Self::count) query expected to supply the total.
    pub fn select_page(
        &self,
        mut values: Vec<Value>,
        page: &PageRequest,
    ) -> Result<QueryExpr, DataError> {
        self.check_arity(&values)?;

        let mut sql = self.select_sql();
        if let Some(sort) = page.sort() {
            if !self.columns.iter().any(|c| *c == sort.property()) {
                return Err(DataError::InvalidQuery(format!(
                    "sort property {} is not a column of {}",
                    sort.property(),
                    self.table
                )));
            }
            let direction = match sort.direction() {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", sort.property(), direction));
        }
        sql.push_str(" LIMIT ? OFFSET ?");
        values.push(Value::from(page.size()));
        values.push(Value::from(page.offset()));

        Ok(QueryExpr::positional(sql, values))
    }

    /// Renders the companion count query for the same predicates.
    pub fn count(&self, values: Vec<Value>) -> Result<QueryExpr, DataError> {
        self.check_arity(&values)?;
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        self.push_where(&mut sql);
        Ok(QueryExpr::positional(sql, values))
    }

    fn select_sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);
        self.push_where(&mut sql);
        sql
    }

    fn push_where(&self, sql: &mut String) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(predicate.column);
            sql.push(' ');
            sql.push_str(predicate.op.sql());
            sql.push_str(" ?");
        }
    }

    fn check_arity(&self, values: &[Value]) -> Result<(), DataError> {
        if values.len() != self.predicates.len() {
            return Err(DataError::InvalidQuery(format!(
                "finder on {} takes {} values, got {}",
                self.table,
                self.predicates.len(),
                values.len()
            )));
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
