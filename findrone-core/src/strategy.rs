//! Strategy parameter keys (`alpha`/`beta` in producer output).
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Opaque numeric identifier of the assignment strategy that produced a result.
///
/// Matching is exact equality on the stored value: producers are expected to
/// write the same literal for every iteration.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyParam(f64);

impl StrategyParam {
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl From<f64> for StrategyParam {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for StrategyParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug keeps the trailing ".0" so labels read "0.0", "0.5", "1.0".
        write!(f, "{:?}", self.0)
    }
}

/// Caller-supplied ordered list of strategy parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategySet(SmallVec<[StrategyParam; 4]>);

impl StrategySet {
    pub fn new<I>(params: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<StrategyParam>,
    {
        Self(params.into_iter().map(Into::into).collect())
    }

    /// First index whose parameter equals `param` exactly.
    #[must_use]
    pub fn index_of(&self, param: StrategyParam) -> Option<usize> {
        self.0.iter().position(|candidate| *candidate == param)
    }

    #[must_use]
    pub fn contains(&self, param: StrategyParam) -> bool {
        self.index_of(param).is_some()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<StrategyParam> {
        self.0.get(index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = StrategyParam> + '_ {
        self.0.iter().copied()
    }

    /// First value that appears more than once, if any.
    #[must_use]
    pub fn first_duplicate(&self) -> Option<StrategyParam> {
        self.0
            .iter()
            .enumerate()
            .find(|(idx, param)| self.0[..*idx].contains(param))
            .map(|(_, param)| *param)
    }
}

impl FromIterator<StrategyParam> for StrategySet {
    fn from_iter<T: IntoIterator<Item = StrategyParam>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_of_returns_first_exact_match() {
        let set = StrategySet::new([0.0, 0.5, 1.0, 0.5]);
        assert_eq!(set.index_of(StrategyParam::new(0.5)), Some(1));
        assert_eq!(set.index_of(StrategyParam::new(0.2)), None);
        assert_eq!(set.first_duplicate(), Some(StrategyParam::new(0.5)));
    }

    #[test]
    fn display_keeps_fraction_digit() {
        assert_eq!(StrategyParam::new(1.0).to_string(), "1.0");
        assert_eq!(StrategyParam::new(0.5).to_string(), "0.5");
    }

    #[test]
    fn set_deserializes_from_plain_list() {
        let set: StrategySet = serde_json::from_str("[0.0, 0.5, 1.0]").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(2), Some(StrategyParam::new(1.0)));
        assert!(set.first_duplicate().is_none());
    }
}
