use regex::Regex;

use super::{
    conditions::{Condition, quote_key},
    filter::{Filter, FilterContext},
};

/// Wildcard inserted between kept runs of the search term
const WILDCARD: char = '%';

/// Default template: prefix match on the quoted field
pub const DEFAULT_TEMPLATE: &str = r#"{field} LIKE ("{term}%")"#;

/// Letters and digits of the Latin and Cyrillic alphabets
fn is_default_alphabet(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '\u{0410}'..='\u{044F}' | '\u{0401}' | '\u{0451}')
}

/// How disallowed characters are found in a raw search value
#[derive(Debug, Clone, Default)]
pub enum Cleaner {
    /// Keep Latin and Cyrillic letters and ASCII digits
    #[default]
    Alphabet,
    /// Every match of the expression is a disallowed run
    Pattern(Regex),
}

/// Configuration of a pattern search filter
#[derive(Debug, Clone)]
pub struct SearchOptions {
    template: String,
    cleaner: Cleaner,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            cleaner: Cleaner::default(),
        }
    }
}

impl SearchOptions {
    /// Template with `{field}` (quoted backing field) and `{term}` placeholders; `{term}` may
    /// appear more than once
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    #[must_use]
    pub fn cleaner(mut self, cleaner: Cleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    #[must_use]
    pub fn template_str(&self) -> &str {
        &self.template
    }

    /// Collapse every disallowed run into one wildcard and trim wildcards at both ends
    #[must_use]
    pub fn clean_term(&self, raw: &str) -> String {
        let replaced = match &self.cleaner {
            Cleaner::Alphabet => {
                let mut out = String::with_capacity(raw.len());
                let mut in_run = false;
                for c in raw.chars() {
                    if is_default_alphabet(c) {
                        out.push(c);
                        in_run = false;
                    } else if !in_run {
                        out.push(WILDCARD);
                        in_run = true;
                    }
                }
                out
            }
            Cleaner::Pattern(regex) => regex
                .replace_all(raw, WILDCARD.to_string().as_str())
                .into_owned(),
        };

        replaced.trim_matches(WILDCARD).to_string()
    }

    /// Condition for `raw` against `field`, or `None` when nothing searchable is left.
    ///
    /// The default template becomes a bound `LIKE`; a custom template is rendered as SQL text.
    #[must_use]
    pub fn condition_for(&self, field: &str, raw: &str) -> Option<Condition> {
        let term = self.clean_term(raw);
        if term.is_empty() {
            return None;
        }
        if self.template == DEFAULT_TEMPLATE {
            return Some(Condition::like(field, format!("{term}{WILDCARD}")));
        }

        let sql = self
            .template
            .replace("{field}", &quote_key(field))
            .replace("{term}", &term);
        Some(Condition::Expr(sql))
    }

    pub(crate) fn process(&self, filter: &Filter, ctx: &mut FilterContext<'_>) {
        let Some(value) = filter.clean_value(ctx.parameters()) else {
            return;
        };
        let Some(raw) = value.as_str() else {
            return;
        };

        if let Some(condition) = self.condition_for(filter.field_name(), raw) {
            ctx.add_condition(condition, None);
        }
    }
}
