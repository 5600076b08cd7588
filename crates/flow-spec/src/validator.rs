use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::answers::{Answer, AnswerView, format_number};

static WHOLE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("whole-number pattern is valid"));
static DECIMAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("decimal pattern is valid"));

/// Function of the flow's answers used as a derived bound.
pub type DeriveFn = Arc<dyn Fn(&AnswerView<'_>) -> Option<f64> + Send + Sync>;

/// One side of a numeric range.
#[derive(Clone)]
pub enum Bound {
    /// A fixed number.
    Literal(f64),
    /// The answer to another step of the same flow, named by suffix.
    Reference(String),
    /// Computed from the flow's answers at validation time.
    Derived(DeriveFn),
}

impl Bound {
    pub fn reference(suffix: impl Into<String>) -> Self {
        Bound::Reference(suffix.into())
    }

    pub fn derived<F>(derive: F) -> Self
    where
        F: Fn(&AnswerView<'_>) -> Option<f64> + Send + Sync + 'static,
    {
        Bound::Derived(Arc::new(derive))
    }

    /// Resolves the bound against the current answers; `None` when it
    /// depends on a step that has no numeric answer yet.
    pub fn resolve(&self, view: &AnswerView<'_>) -> Option<f64> {
        match self {
            Bound::Literal(value) => Some(*value),
            Bound::Reference(suffix) => view.number(suffix),
            Bound::Derived(derive) => derive(view),
        }
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Bound::Reference(suffix) => f.debug_tuple("Reference").field(suffix).finish(),
            Bound::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl From<i32> for Bound {
    fn from(value: i32) -> Self {
        Bound::Literal(f64::from(value))
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Bound::Literal(value)
    }
}

impl From<&str> for Bound {
    fn from(suffix: &str) -> Self {
        Bound::Reference(suffix.to_string())
    }
}

/// Inclusive range checked after an answer has been coerced.
#[derive(Debug, Clone)]
pub struct Range {
    pub min: Bound,
    pub max: Bound,
}

impl Range {
    pub fn new(min: impl Into<Bound>, max: impl Into<Bound>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    fn check(&self, value: f64, view: &AnswerView<'_>) -> Result<(), Rejection> {
        let min = self
            .min
            .resolve(view)
            .ok_or_else(|| Rejection::unresolved(&self.min))?;
        let max = self
            .max
            .resolve(view)
            .ok_or_else(|| Rejection::unresolved(&self.max))?;
        if value < min || value > max {
            return Err(Rejection::OutOfRange {
                min: format_number(min),
                max: format_number(max),
            });
        }
        Ok(())
    }

    fn references(&self) -> impl Iterator<Item = &str> {
        [&self.min, &self.max]
            .into_iter()
            .filter_map(|bound| match bound {
                Bound::Reference(suffix) => Some(suffix.as_str()),
                _ => None,
            })
    }
}

/// User-facing reason an answer was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Expected a whole number.")]
    NotWholeNumber,
    #[error("Expected a number.")]
    NotNumber,
    #[error("Number must be between {min} and {max}.")]
    OutOfRange { min: String, max: String },
    #[error("This answer depends on an earlier question that has not been answered yet.")]
    UnresolvedBound { bound: String },
}

impl Rejection {
    fn unresolved(bound: &Bound) -> Self {
        Rejection::UnresolvedBound {
            bound: format!("{bound:?}"),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Rejection::NotWholeNumber => "not_whole_number",
            Rejection::NotNumber => "not_number",
            Rejection::OutOfRange { .. } => "out_of_range",
            Rejection::UnresolvedBound { .. } => "unresolved_bound",
        }
    }
}

/// Coerces raw text input into an [`Answer`] or rejects it.
#[derive(Debug, Clone)]
pub enum Validator {
    FreeText,
    Integer(Option<Range>),
    Decimal(Option<Range>),
}

impl Validator {
    pub fn free_text() -> Self {
        Validator::FreeText
    }

    pub fn integer() -> Self {
        Validator::Integer(None)
    }

    pub fn integer_in_range(min: impl Into<Bound>, max: impl Into<Bound>) -> Self {
        Validator::Integer(Some(Range::new(min, max)))
    }

    pub fn decimal_in_range(min: impl Into<Bound>, max: impl Into<Bound>) -> Self {
        Validator::Decimal(Some(Range::new(min, max)))
    }

    /// Step suffixes this validator reads through `Reference` bounds.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Validator::Integer(Some(range)) | Validator::Decimal(Some(range)) => {
                range.references().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Checks `raw` and coerces it into an [`Answer`].
    ///
    /// Whole numbers beyond `i64` are still checked against the range, and
    /// on an unbounded step they are kept verbatim as [`Answer::Text`].
    pub fn validate(&self, raw: &str, view: &AnswerView<'_>) -> Result<Answer, Rejection> {
        let input = raw.trim();
        match self {
            Validator::FreeText => Ok(Answer::Text(input.to_string())),
            Validator::Integer(range) => {
                if !WHOLE_NUMBER.is_match(input) {
                    return Err(Rejection::NotWholeNumber);
                }
                match input.parse::<i64>() {
                    Ok(value) => {
                        if let Some(range) = range {
                            range.check(value as f64, view)?;
                        }
                        Ok(Answer::Integer(value))
                    }
                    // Too many digits for i64: the range still decides, and
                    // an unbounded code keeps its digits as text.
                    Err(_) => {
                        let value: f64 = input.parse().map_err(|_| Rejection::NotWholeNumber)?;
                        if let Some(range) = range {
                            range.check(value, view)?;
                        }
                        Ok(Answer::Text(input.to_string()))
                    }
                }
            }
            Validator::Decimal(range) => {
                if !DECIMAL_NUMBER.is_match(input) {
                    return Err(Rejection::NotNumber);
                }
                let value: f64 = input.parse().map_err(|_| Rejection::NotNumber)?;
                if !value.is_finite() {
                    return Err(Rejection::NotNumber);
                }
                if let Some(range) = range {
                    range.check(value, view)?;
                }
                Ok(Answer::Decimal(value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerStore;

    #[test]
    fn free_text_trims_input() {
        let store = AnswerStore::new();
        let answer = Validator::free_text()
            .validate("  12345 ", &store.view("p:"))
            .expect("accepted");
        assert_eq!(answer, Answer::Text("12345".into()));
    }

    #[test]
    fn unbounded_integer_accepts_any_whole_number() {
        let store = AnswerStore::new();
        let view = store.view("p:");
        assert_eq!(
            Validator::integer().validate("987654", &view),
            Ok(Answer::Integer(987654))
        );
        assert_eq!(
            Validator::integer().validate("12345678901234567890", &view),
            Ok(Answer::Text("12345678901234567890".into()))
        );
    }

    #[test]
    fn oversized_whole_number_reports_the_range() {
        let store = AnswerStore::new();
        let view = store.view("p:");
        assert_eq!(
            Validator::integer_in_range(1, 31).validate("99999999999999999999", &view),
            Err(Rejection::OutOfRange {
                min: "1".into(),
                max: "31".into(),
            })
        );
        let referenced = Validator::integer_in_range(0, "days_in_session");
        assert!(matches!(
            referenced.validate("99999999999999999999", &view),
            Err(Rejection::UnresolvedBound { .. })
        ));
    }

    #[test]
    fn negative_input_is_a_format_failure() {
        let store = AnswerStore::new();
        let view = store.view("p:");
        assert_eq!(
            Validator::integer_in_range(0, 10).validate("-1", &view),
            Err(Rejection::NotWholeNumber)
        );
        assert_eq!(
            Validator::decimal_in_range(0, 10).validate("-1", &view),
            Err(Rejection::NotNumber)
        );
    }

    #[test]
    fn missing_reference_is_rejected_not_panicking() {
        let store = AnswerStore::new();
        let result = Validator::integer_in_range(0, "days_in_session").validate("3", &store.view("p:"));
        assert!(matches!(result, Err(Rejection::UnresolvedBound { .. })));
    }

    #[test]
    fn bound_debug_hides_closure() {
        let bound = Bound::derived(|_| Some(1.0));
        assert_eq!(format!("{bound:?}"), "Derived(..)");
        assert_eq!(format!("{:?}", Bound::from("x")), "Reference(\"x\")");
    }
}
