use indexmap::IndexMap;
use sea_orm::{
    Condition as SeaCondition,
    sea_query::{Alias, Expr, SimpleExpr},
};
use std::fmt;
use uuid::Uuid;

use crate::params::ParamValue;

/// Quote a backing-store identifier with back-quotes, doubling embedded ones
#[must_use]
pub fn quote_key(field: &str) -> String {
    format!("`{}`", field.replace('`', "``"))
}

/// Render a literal: numbers stay bare, everything else is single-quoted with `''` escaping
#[must_use]
pub fn quote_value(value: &str) -> String {
    if is_number(value) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

fn is_number(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && digits.bytes().filter(|&b| b == b'.').count() <= 1
        && !digits.starts_with('.')
        && !digits.ends_with('.')
}

/// Typed binding for a raw value: Uuid, then integer, then decimal, then string
fn bind_value(value: &str) -> SimpleExpr {
    if let Ok(uuid) = Uuid::parse_str(value) {
        return uuid.into();
    }
    if let Ok(int) = value.parse::<i64>() {
        return int.into();
    }
    if is_number(value)
        && let Ok(float) = value.parse::<f64>()
    {
        return float.into();
    }
    value.to_string().into()
}

/// Operator of a bound comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Comparison {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
        }
    }
}

/// One fragment of the restriction clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Equality shorthand; a list value means `IN`
    Equals { field: String, value: ParamValue },
    /// `field <op> value` with the value bound as a parameter
    Compare {
        field: String,
        op: Comparison,
        value: String,
    },
    /// `field LIKE pattern` with the pattern bound as a parameter
    Like { field: String, pattern: String },
    /// Free-form comparison expression, used verbatim
    Expr(String),
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<String>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn expr(sql: impl Into<String>) -> Self {
        Self::Expr(sql.into())
    }

    /// Readable SQL-like rendering for logs and listings.
    ///
    /// Only `Expr` conditions reach the database as text; see [`Condition::to_expr`].
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Expr(sql) => sql.clone(),
            Self::Compare { field, op, value } => {
                format!("{} {} {}", quote_key(field), op.as_sql(), quote_value(value))
            }
            Self::Like { field, pattern } => {
                format!(r#"{} LIKE ("{}")"#, quote_key(field), pattern.replace('"', "\"\""))
            }
            Self::Equals {
                field,
                value: ParamValue::Single(value),
            } => format!("{} = {}", quote_key(field), quote_value(value)),
            Self::Equals {
                field,
                value: ParamValue::List(values),
            } => {
                let list: Vec<String> = values.iter().map(|v| quote_value(v)).collect();
                format!("{} IN ({})", quote_key(field), list.join(", "))
            }
        }
    }

    /// Sea-ORM expression with typed value binding; identifiers are quoted by the backend
    #[must_use]
    pub fn to_expr(&self) -> SimpleExpr {
        match self {
            Self::Expr(sql) => SimpleExpr::Custom(sql.clone()),
            Self::Compare { field, op, value } => {
                let column = Expr::col(Alias::new(field));
                let value = bind_value(value);
                match op {
                    Comparison::Greater => column.gt(value),
                    Comparison::GreaterOrEqual => column.gte(value),
                    Comparison::Less => column.lt(value),
                    Comparison::LessOrEqual => column.lte(value),
                }
            }
            Self::Like { field, pattern } => Expr::col(Alias::new(field)).like(pattern.as_str()),
            Self::Equals {
                field,
                value: ParamValue::Single(value),
            } => Expr::col(Alias::new(field)).eq(bind_value(value)),
            Self::Equals {
                field,
                value: ParamValue::List(values),
            } => Expr::col(Alias::new(field)).is_in(values.iter().map(|v| bind_value(v))),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Self::expr(sql)
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Self::Expr(sql)
    }
}

/// Key of a condition entry: positional, or the backing field it constrains
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionKey {
    Index(usize),
    Field(String),
}

/// Ordered, keyed set of conditions, all of which must hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    entries: IndexMap<ConditionKey, Condition>,
    next_index: usize,
}

impl ConditionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append under the next positional key
    pub fn push(&mut self, condition: impl Into<Condition>) -> &mut Self {
        let key = ConditionKey::Index(self.next_index);
        self.next_index += 1;
        self.entries.insert(key, condition.into());
        self
    }

    /// Insert under `key`; an existing entry is replaced in place
    pub fn insert(&mut self, key: impl Into<String>, condition: impl Into<Condition>) -> &mut Self {
        self.entries
            .insert(ConditionKey::Field(key.into()), condition.into());
        self
    }

    /// Positional append when `key` is `None`, keyed insert otherwise
    pub fn add(&mut self, condition: impl Into<Condition>, key: Option<&str>) -> &mut Self {
        match key {
            Some(key) => self.insert(key, condition),
            None => self.push(condition),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Condition> {
        self.entries.get(&ConditionKey::Field(key.to_string()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_index = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConditionKey, &Condition)> {
        self.entries.iter()
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.entries.values()
    }

    /// `self` followed by `other`: positional entries of `other` are appended, keyed entries
    /// overwrite a same-key entry of `self` in place
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (key, condition) in &other.entries {
            match key {
                ConditionKey::Index(_) => {
                    out.push(condition.clone());
                }
                ConditionKey::Field(field) => {
                    out.insert(field.clone(), condition.clone());
                }
            }
        }
        out
    }

    /// Every condition rendered as SQL, in order
    #[must_use]
    pub fn to_sql_list(&self) -> Vec<String> {
        self.conditions().map(Condition::to_sql).collect()
    }

    /// Conjunction of every condition; an empty set matches everything
    #[must_use]
    pub fn to_condition(&self) -> SeaCondition {
        self.conditions()
            .fold(SeaCondition::all(), |acc, c| acc.add(c.to_expr()))
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_list().join(" AND "))
    }
}

impl<C: Into<Condition>> FromIterator<C> for ConditionSet {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        let mut set = Self::new();
        for condition in iter {
            set.push(condition);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("10"), "10");
        assert_eq!(quote_value("-3.5"), "-3.5");
        assert_eq!(quote_value("1.2.3"), "'1.2.3'");
        assert_eq!(quote_value("abc"), "'abc'");
        assert_eq!(quote_value("O'Brien"), "'O''Brien'");
        assert_eq!(quote_value(""), "''");
    }

    #[test]
    fn test_quote_key() {
        assert_eq!(quote_key("id"), "`id`");
        assert_eq!(quote_key("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_equals_rendering() {
        assert_eq!(Condition::equals("status", "open").to_sql(), "`status` = 'open'");
        assert_eq!(
            Condition::equals("id", vec!["1", "2"]).to_sql(),
            "`id` IN (1, 2)"
        );
    }

    #[test]
    fn test_keyed_insert_replaces_in_place() {
        let mut set = ConditionSet::new();
        set.push("`id` > 7");
        set.insert("status", Condition::equals("status", "open"));
        set.push("`id` < 100");
        set.insert("status", Condition::equals("status", "closed"));

        assert_eq!(
            set.to_sql_list(),
            ["`id` > 7", "`status` = 'closed'", "`id` < 100"]
        );
    }

    #[test]
    fn test_merge_appends_positional_and_overwrites_keyed() {
        let mut defaults = ConditionSet::new();
        defaults.push("`id` > 7");
        defaults.insert("status", Condition::equals("status", "open"));

        let mut filters = ConditionSet::new();
        filters.push("`id` > 10");
        filters.insert("status", Condition::equals("status", "closed"));

        let merged = defaults.merged(&filters);
        assert_eq!(
            merged.to_sql_list(),
            ["`id` > 7", "`status` = 'closed'", "`id` > 10"]
        );
        // Inputs are untouched
        assert_eq!(defaults.len(), 2);
    }

    #[test]
    fn test_clear_resets_indices() {
        let mut set = ConditionSet::new();
        set.push("a");
        set.clear();
        set.push("b");
        assert_eq!(set.iter().next().map(|(k, _)| k.clone()), Some(ConditionKey::Index(0)));
    }

    #[test]
    fn test_to_condition_uses_typed_values() {
        let mut set = ConditionSet::new();
        set.insert("id", Condition::equals("id", "5"));
        set.push("`name` LIKE 'a%'");
        let debug = format!("{:?}", set.to_condition());

        assert!(debug.contains("BigInt(Some(5))"), "{debug}");
        assert!(debug.contains("Custom("), "{debug}");
    }

    #[test]
    fn test_compare_rendering() {
        assert_eq!(
            Condition::compare("id", Comparison::GreaterOrEqual, "10").to_sql(),
            "`id` >= 10"
        );
        assert_eq!(
            Condition::compare("d", Comparison::Less, "2024-01-01 00:00:00").to_sql(),
            "`d` < '2024-01-01 00:00:00'"
        );
        assert_eq!(Condition::like("addr", "при%").to_sql(), r#"`addr` LIKE ("при%")"#);
    }

    #[test]
    fn test_compare_binds_value_instead_of_inlining() {
        let condition = Condition::compare("id", Comparison::Greater, "x' OR 1=1 -- ");
        let debug = format!("{:?}", condition.to_expr());

        assert!(!debug.contains("Custom("), "{debug}");
        assert!(debug.contains("String(Some(\"x' OR 1=1 -- \"))"), "{debug}");
    }

    #[test]
    fn test_bind_value_types() {
        let debug = |value: &str| format!("{:?}", bind_value(value));
        assert!(debug("42").contains("BigInt(Some(42))"));
        assert!(debug("2.5").contains("Double(Some(2.5))"));
        assert!(debug("NaN").contains("String("));
        assert!(debug("1.2.3").contains("String("));
    }

    #[test]
    fn test_display_joins_with_and() {
        let set: ConditionSet = ["`a` > 1", "`b` < 2"].into_iter().collect();
        assert_eq!(set.to_string(), "`a` > 1 AND `b` < 2");
    }
}
