use chrono::{NaiveDate, NaiveDateTime};

use super::{
    conditions::{Comparison, Condition},
    filter::{Filter, FilterContext},
};
use crate::params::{ParamValue, ParameterSource};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date, accepting a trailing time of day
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|dt| dt.date())
        })
}

/// Which bound of a range a parameter feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSide {
    From,
    To,
}

/// Configuration of a range filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOptions {
    greater_or_equal: bool,
    less_or_equal: bool,
    from_is_date: bool,
    to_is_date: bool,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            greater_or_equal: true,
            less_or_equal: true,
            from_is_date: false,
            to_is_date: false,
        }
    }
}

impl RangeOptions {
    /// Lower bound compares with `>=` when true, `>` otherwise
    #[must_use]
    pub fn greater_or_equal(mut self, inclusive: bool) -> Self {
        self.greater_or_equal = inclusive;
        self
    }

    /// Upper bound compares with `<=` when true, `<` otherwise
    #[must_use]
    pub fn less_or_equal(mut self, inclusive: bool) -> Self {
        self.less_or_equal = inclusive;
        self
    }

    /// Treat both bounds as calendar dates
    #[must_use]
    pub fn date(self, is_date: bool) -> Self {
        self.from_date(is_date).to_date(is_date)
    }

    #[must_use]
    pub fn from_date(mut self, is_date: bool) -> Self {
        self.from_is_date = is_date;
        self
    }

    #[must_use]
    pub fn to_date(mut self, is_date: bool) -> Self {
        self.to_is_date = is_date;
        self
    }

    #[must_use]
    pub fn column_from(column: &str) -> String {
        format!("{column}_from")
    }

    #[must_use]
    pub fn column_to(column: &str) -> String {
        format!("{column}_to")
    }

    fn parameter(column: &str, side: RangeSide) -> String {
        match side {
            RangeSide::From => Self::column_from(column),
            RangeSide::To => Self::column_to(column),
        }
    }

    fn operator(&self, side: RangeSide) -> Comparison {
        match (side, self.greater_or_equal, self.less_or_equal) {
            (RangeSide::From, true, _) => Comparison::GreaterOrEqual,
            (RangeSide::From, false, _) => Comparison::Greater,
            (RangeSide::To, _, true) => Comparison::LessOrEqual,
            (RangeSide::To, _, false) => Comparison::Less,
        }
    }

    /// Value used in the comparison; dates become start or end of day
    fn bound(&self, side: RangeSide, raw: &str) -> Option<String> {
        let is_date = match side {
            RangeSide::From => self.from_is_date,
            RangeSide::To => self.to_is_date,
        };
        if !is_date {
            return Some(raw.to_string());
        }

        let date = parse_date(raw)?;
        Some(match side {
            RangeSide::From => format!("{date} 00:00:00"),
            RangeSide::To => format!("{date} 23:59:59"),
        })
    }

    /// Condition for one side, if its parameter is set and valid
    #[must_use]
    pub fn condition(&self, filter: &Filter, params: &ParameterSource, side: RangeSide) -> Option<Condition> {
        let name = Self::parameter(filter.column(), side);
        let value = filter.clean_parameter(params, &name)?;
        if value.is_blank() {
            return None;
        }

        let raw = value.as_str()?;
        let Some(bound) = self.bound(side, raw) else {
            tracing::debug!(filter = %filter.column(), parameter = %name, "Unparseable date bound");
            return None;
        };

        Some(Condition::compare(filter.field_name(), self.operator(side), bound))
    }

    pub(crate) fn process(&self, filter: &Filter, ctx: &mut FilterContext<'_>) {
        for side in [RangeSide::From, RangeSide::To] {
            if let Some(condition) = self.condition(filter, ctx.parameters(), side) {
                ctx.add_condition(condition, None);
            }
        }
    }
}

impl Filter {
    /// Validated value of the lower bound parameter
    #[must_use]
    pub fn clean_value_from(&self, params: &ParameterSource) -> Option<ParamValue> {
        self.clean_parameter(params, &RangeOptions::column_from(self.column()))
    }

    /// Validated value of the upper bound parameter
    #[must_use]
    pub fn clean_value_to(&self, params: &ParameterSource) -> Option<ParamValue> {
        self.clean_parameter(params, &RangeOptions::column_to(self.column()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filtering::{conditions::ConditionSet, validator::Validator},
        params::PathUrl,
    };

    fn run(filter: &Filter, uri: &str) -> Vec<String> {
        let params = ParameterSource::from_url(PathUrl::parse(uri));
        let mut conditions = ConditionSet::new();
        filter.process(&mut FilterContext::new(&params, &mut conditions));
        conditions.to_sql_list()
    }

    #[test]
    fn test_both_sides_inclusive_by_default() {
        let filter = Filter::range("id", RangeOptions::default());
        assert_eq!(
            run(&filter, "/x/id_from:10/id_to:20/"),
            ["`id` >= 10", "`id` <= 20"]
        );
    }

    #[test]
    fn test_strict_lower_bound() {
        let filter = Filter::range("id", RangeOptions::default().greater_or_equal(false))
            .validator(Validator::numeric());
        assert_eq!(
            run(&filter, "/x/id_from:10/id_to:20/"),
            ["`id` > 10", "`id` <= 20"]
        );
    }

    #[test]
    fn test_sides_are_independent() {
        let filter = Filter::range("id", RangeOptions::default().less_or_equal(false))
            .validator(Validator::numeric());
        assert_eq!(run(&filter, "/x/id_to:5/"), ["`id` < 5"]);
        assert_eq!(run(&filter, "/x/id_from:abc/id_to:5/"), ["`id` < 5"]);
        assert!(run(&filter, "/x/id:5/").is_empty());
    }

    #[test]
    fn test_date_bounds_cover_whole_days() {
        let filter = Filter::range("created", RangeOptions::default().date(true)).field("created_at");
        assert_eq!(
            run(&filter, "/x/created_from:2024-03-01/created_to:05.03.2024/"),
            [
                "`created_at` >= '2024-03-01 00:00:00'",
                "`created_at` <= '2024-03-05 23:59:59'"
            ]
        );
    }

    #[test]
    fn test_date_flag_per_side() {
        let filter = Filter::range("d", RangeOptions::default().to_date(true));
        assert_eq!(
            run(&filter, "/x/d_from:7/d_to:2024-01-31 10:15/"),
            ["`d` >= 7", "`d` <= '2024-01-31 23:59:59'"]
        );
    }

    #[test]
    fn test_unparseable_date_is_skipped() {
        let filter = Filter::range("d", RangeOptions::default().date(true));
        assert!(run(&filter, "/x/d_from:yesterday/").is_empty());
    }

    #[test]
    fn test_unvalidated_bound_stays_a_bound_value() {
        let filter = Filter::range("id", RangeOptions::default());
        let params = ParameterSource::from_url(PathUrl::parse("/x/id_from:x%5C%27%20OR%201=1%20--%20/"));
        let condition = RangeOptions::default()
            .condition(&filter, &params, RangeSide::From)
            .unwrap();

        assert_eq!(
            condition,
            Condition::compare("id", Comparison::GreaterOrEqual, "x\\' OR 1=1 -- ")
        );
    }

    #[test]
    fn test_clean_side_values() {
        let filter = Filter::range("id", RangeOptions::default()).validator(Validator::numeric());
        let params = ParameterSource::from_url(PathUrl::parse("/x/id_from:3/id_to:z/"));
        assert_eq!(filter.clean_value_from(&params), Some("3".into()));
        assert_eq!(filter.clean_value_to(&params), None);
    }
}
