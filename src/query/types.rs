use std::ops::Bound;
use serde::{Deserialize, Serialize};

/// Requirement of one clause inside a boolean group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occur {
    Must,
    #[default]
    Should,
    MustNot,
}

/// Range limits; a missing side is open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub lower: Option<T>,
    pub upper: Option<T>,
    pub include_lower: bool,
    pub include_upper: bool,
}

impl<T: Clone> Bounds<T> {
    /// Both ends included
    pub fn new(lower: Option<T>, upper: Option<T>) -> Self {
        Bounds {
            lower,
            upper,
            include_lower: true,
            include_upper: true,
        }
    }

    pub fn lower_bound<U>(&self, convert: impl Fn(T) -> U) -> Bound<U> {
        Self::bound(&self.lower, self.include_lower, convert)
    }

    pub fn upper_bound<U>(&self, convert: impl Fn(T) -> U) -> Bound<U> {
        Self::bound(&self.upper, self.include_upper, convert)
    }

    fn bound<U>(value: &Option<T>, inclusive: bool, convert: impl Fn(T) -> U) -> Bound<U> {
        match value {
            None => Bound::Unbounded,
            Some(v) if inclusive => Bound::Included(convert(v.clone())),
            Some(v) => Bound::Excluded(convert(v.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterKind {
    Equal(String),          // Exact term, or pattern when it holds * or ?
    IntRange(Bounds<i32>),
    LongRange(Bounds<i64>),
    FloatRange(Bounds<f32>),
    DoubleRange(Bounds<f64>),
    TextRange(Bounds<String>),
}

/// Unanalyzed exact/range condition on one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterAttribute {
    pub column: String,
    pub kind: FilterKind,
    pub essential: bool,
}

impl FilterAttribute {
    pub fn new(column: &str, kind: FilterKind) -> Self {
        FilterAttribute {
            column: column.to_string(),
            kind,
            essential: false,
        }
    }

    pub fn equal(column: &str, value: &str) -> Self {
        Self::new(column, FilterKind::Equal(value.to_string()))
    }

    pub fn int_range(column: &str, lower: Option<i32>, upper: Option<i32>) -> Self {
        Self::new(column, FilterKind::IntRange(Bounds::new(lower, upper)))
    }

    pub fn long_range(column: &str, lower: Option<i64>, upper: Option<i64>) -> Self {
        Self::new(column, FilterKind::LongRange(Bounds::new(lower, upper)))
    }

    pub fn float_range(column: &str, lower: Option<f32>, upper: Option<f32>) -> Self {
        Self::new(column, FilterKind::FloatRange(Bounds::new(lower, upper)))
    }

    pub fn double_range(column: &str, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self::new(column, FilterKind::DoubleRange(Bounds::new(lower, upper)))
    }

    pub fn text_range(column: &str, lower: Option<&str>, upper: Option<&str>) -> Self {
        Self::new(
            column,
            FilterKind::TextRange(Bounds::new(lower.map(String::from), upper.map(String::from))),
        )
    }

    /// Required clause instead of optional
    pub fn essential(mut self) -> Self {
        self.essential = true;
        self
    }

    /// Set bound inclusiveness; no effect on EQUAL
    pub fn inclusive(mut self, include_lower: bool, include_upper: bool) -> Self {
        macro_rules! set {
            ($bounds:expr) => {{
                $bounds.include_lower = include_lower;
                $bounds.include_upper = include_upper;
            }};
        }
        match &mut self.kind {
            FilterKind::Equal(_) => {}
            FilterKind::IntRange(b) => set!(b),
            FilterKind::LongRange(b) => set!(b),
            FilterKind::FloatRange(b) => set!(b),
            FilterKind::DoubleRange(b) => set!(b),
            FilterKind::TextRange(b) => set!(b),
        }
        self
    }
}

/// Analyzed free-text condition on one tokenized column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAttribute {
    pub column: String,
    pub keyword: Option<String>,  // Falls back to the shared query text
    pub occur: Option<Occur>,     // Falls back to Should
}

impl QueryAttribute {
    pub fn new(column: &str) -> Self {
        QueryAttribute {
            column: column.to_string(),
            keyword: None,
            occur: None,
        }
    }

    pub fn keyword(mut self, keyword: &str) -> Self {
        self.keyword = Some(keyword.to_string());
        self
    }

    pub fn occur(mut self, occur: Occur) -> Self {
        self.occur = Some(occur);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_inclusiveness() {
        let filter = FilterAttribute::long_range("views", Some(10), None).inclusive(false, true);
        let FilterKind::LongRange(bounds) = &filter.kind else {
            panic!("expected long range");
        };

        assert_eq!(bounds.lower_bound(|v| v), Bound::Excluded(10));
        assert_eq!(bounds.upper_bound(|v| v), Bound::Unbounded);
    }

    #[test]
    fn filters_are_optional_by_default() {
        assert!(!FilterAttribute::equal("status", "draft").essential);
        assert!(FilterAttribute::equal("status", "draft").essential().essential);
    }
}
