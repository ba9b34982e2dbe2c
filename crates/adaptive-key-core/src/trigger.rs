// Adaptive Key Triggers
// Rules mapping a preceding key and idle window to an output binding list

use std::fmt;

use smallvec::SmallVec;

use crate::binding::BindingList;
use crate::event::Timestamp;
use crate::key::KeyIdentity;
use crate::state::TimestampedKey;

/// Maximum number of candidate keys in one trigger
pub const MAX_CONDITIONS: usize = 16;

/// Errors from building a trigger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error("trigger needs at least one candidate key")]
    NoCandidates,

    #[error("trigger has {count} candidate keys, at most {max} are allowed")]
    TooManyCandidates { count: usize, max: usize },

    #[error("idle bound cannot be negative: {0}ms")]
    NegativeIdle(i64),

    #[error("min idle {min}ms exceeds max idle {max}ms")]
    InvertedWindow { min: i64, max: i64 },
}

/// Inclusive bounds on the time elapsed since the last key press.
/// `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdleWindow {
    min_ms: Option<i64>,
    max_ms: Option<i64>,
}

impl IdleWindow {
    pub const UNBOUNDED: IdleWindow = IdleWindow {
        min_ms: None,
        max_ms: None,
    };

    pub fn new(min_ms: Option<i64>, max_ms: Option<i64>) -> Result<Self, TriggerError> {
        for bound in [min_ms, max_ms].into_iter().flatten() {
            if bound < 0 {
                return Err(TriggerError::NegativeIdle(bound));
            }
        }
        if let (Some(min), Some(max)) = (min_ms, max_ms) {
            if min > max {
                return Err(TriggerError::InvertedWindow { min, max });
            }
        }
        Ok(Self { min_ms, max_ms })
    }

    /// Window with only an upper bound
    pub fn within(max_ms: i64) -> Result<Self, TriggerError> {
        Self::new(None, Some(max_ms))
    }

    pub fn min_ms(&self) -> Option<i64> {
        self.min_ms
    }

    pub fn max_ms(&self) -> Option<i64> {
        self.max_ms
    }

    pub fn contains(&self, elapsed: i64) -> bool {
        if let Some(min) = self.min_ms {
            if elapsed < min {
                return false;
            }
        }
        if let Some(max) = self.max_ms {
            if elapsed > max {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for IdleWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min_ms, self.max_ms) {
            (None, None) => write!(f, "any"),
            (Some(min), None) => write!(f, ">={}ms", min),
            (None, Some(max)) => write!(f, "<={}ms", max),
            (Some(min), Some(max)) => write!(f, "{}..={}ms", min, max),
        }
    }
}

/// One adaptive rule: if the last key is one of `candidates` and it was
/// pressed within `idle`, play `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    candidates: SmallVec<[KeyIdentity; MAX_CONDITIONS]>,
    idle: IdleWindow,
    strict_modifiers: bool,
    output: BindingList,
}

impl Trigger {
    pub fn new(
        candidates: impl IntoIterator<Item = KeyIdentity>,
        idle: IdleWindow,
        strict_modifiers: bool,
        output: BindingList,
    ) -> Result<Self, TriggerError> {
        let candidates: SmallVec<[KeyIdentity; MAX_CONDITIONS]> = candidates.into_iter().collect();
        if candidates.is_empty() {
            return Err(TriggerError::NoCandidates);
        }
        if candidates.len() > MAX_CONDITIONS {
            return Err(TriggerError::TooManyCandidates {
                count: candidates.len(),
                max: MAX_CONDITIONS,
            });
        }
        Ok(Self {
            candidates,
            idle,
            strict_modifiers,
            output,
        })
    }

    pub fn candidates(&self) -> &[KeyIdentity] {
        &self.candidates
    }

    pub fn idle(&self) -> IdleWindow {
        self.idle
    }

    pub fn strict_modifiers(&self) -> bool {
        self.strict_modifiers
    }

    pub fn output(&self) -> &BindingList {
        &self.output
    }

    /// Whether this trigger fires for `last` at time `now`
    pub fn is_satisfied(&self, last: &TimestampedKey, now: Timestamp) -> bool {
        if !self.idle.contains(last.elapsed(now)) {
            return false;
        }

        self.candidates
            .iter()
            .any(|candidate| candidate.matches(&last.identity, self.strict_modifiers))
    }
}

/// Which output list of an instance was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Default,
    /// Index into the trigger table
    Trigger(usize),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Default => write!(f, "default"),
            Selection::Trigger(i) => write!(f, "trigger #{}", i),
        }
    }
}

/// Ordered trigger rules and the fallback output of one adaptive key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerTable {
    default_output: BindingList,
    triggers: Vec<Trigger>,
}

impl TriggerTable {
    pub fn new(default_output: BindingList, triggers: Vec<Trigger>) -> Self {
        Self {
            default_output,
            triggers,
        }
    }

    pub fn default_output(&self) -> &BindingList {
        &self.default_output
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// First trigger in declaration order that fires, else the default.
    ///
    /// The sentinel last key is matched like any other identity.
    pub fn evaluate(&self, last: &TimestampedKey, now: Timestamp) -> Selection {
        self.triggers
            .iter()
            .position(|trigger| trigger.is_satisfied(last, now))
            .map(Selection::Trigger)
            .unwrap_or(Selection::Default)
    }

    /// Resolve a selection to its output list
    pub fn output(&self, selection: Selection) -> &BindingList {
        match selection {
            Selection::Default => &self.default_output,
            Selection::Trigger(index) => self
                .triggers
                .get(index)
                .map(Trigger::output)
                .unwrap_or(&self.default_output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use crate::modifier::Modifier;

    fn list(key: &str) -> BindingList {
        BindingList::single(Binding::key_press(key.parse().unwrap()))
    }

    fn key(name: &str) -> KeyIdentity {
        name.parse().unwrap()
    }

    fn trigger(candidates: &[&str], idle: IdleWindow, strict: bool, out: &str) -> Trigger {
        Trigger::new(candidates.iter().map(|c| key(c)), idle, strict, list(out)).unwrap()
    }

    #[test]
    fn test_idle_window_is_inclusive() {
        let window = IdleWindow::new(Some(100), Some(300)).unwrap();
        assert!(!window.contains(99));
        assert!(window.contains(100));
        assert!(window.contains(300));
        assert!(!window.contains(301));
        assert!(IdleWindow::UNBOUNDED.contains(i64::MAX));
    }

    #[test]
    fn test_idle_window_validation() {
        assert_eq!(
            IdleWindow::new(Some(-1), None),
            Err(TriggerError::NegativeIdle(-1))
        );
        assert_eq!(
            IdleWindow::new(Some(500), Some(100)),
            Err(TriggerError::InvertedWindow { min: 500, max: 100 })
        );
        assert_eq!(IdleWindow::new(Some(0), Some(0)).unwrap().to_string(), "0..=0ms");
        assert_eq!(IdleWindow::within(-3), Err(TriggerError::NegativeIdle(-3)));
        assert_eq!(IdleWindow::within(300).unwrap().max_ms(), Some(300));
    }

    #[test]
    fn test_trigger_candidate_bounds() {
        let none: Vec<KeyIdentity> = vec![];
        assert_eq!(
            Trigger::new(none, IdleWindow::UNBOUNDED, false, list("A")),
            Err(TriggerError::NoCandidates)
        );

        let many = (0..=MAX_CONDITIONS as u16).map(|i| KeyIdentity::keyboard(4 + i));
        assert!(matches!(
            Trigger::new(many, IdleWindow::UNBOUNDED, false, list("A")),
            Err(TriggerError::TooManyCandidates { .. })
        ));
    }

    #[test]
    fn test_first_matching_trigger_wins() {
        let table = TriggerTable::new(
            list("B"),
            vec![
                trigger(&["SPACE"], IdleWindow::within(300).unwrap(), false, "X"),
                trigger(&["SPACE", "DOT"], IdleWindow::UNBOUNDED, false, "Y"),
            ],
        );
        let last = TimestampedKey::new(key("SPACE"), 0);

        assert_eq!(table.evaluate(&last, 50), Selection::Trigger(0));
        // Outside the first window, the second trigger still applies.
        assert_eq!(table.evaluate(&last, 1000), Selection::Trigger(1));

        let reordered = TriggerTable::new(
            list("B"),
            table.triggers().iter().rev().cloned().collect(),
        );
        assert_eq!(reordered.evaluate(&last, 50), Selection::Trigger(0));
        assert_eq!(reordered.output(Selection::Trigger(0)), &list("Y"));
    }

    #[test]
    fn test_falls_back_to_default() {
        let table = TriggerTable::new(
            list("B"),
            vec![trigger(&["SPACE"], IdleWindow::within(300).unwrap(), false, "X")],
        );
        let last = TimestampedKey::new(key("DOT"), 0);

        assert_eq!(table.evaluate(&last, 10), Selection::Default);
        assert_eq!(table.output(Selection::Default), &list("B"));
    }

    #[test]
    fn test_strict_modifiers_per_trigger() {
        let loose = TriggerTable::new(
            list("B"),
            vec![trigger(&["LS(A)"], IdleWindow::UNBOUNDED, false, "X")],
        );
        let strict = TriggerTable::new(
            list("B"),
            vec![trigger(&["LS(A)"], IdleWindow::UNBOUNDED, true, "X")],
        );
        let observed = key("LS(A)").with_modifier(Modifier::LeftAlt);
        let last = TimestampedKey::new(observed, 0);

        assert_eq!(loose.evaluate(&last, 0), Selection::Trigger(0));
        assert_eq!(strict.evaluate(&last, 0), Selection::Default);
    }

    #[test]
    fn test_sentinel_is_not_special_cased() {
        let page_zero = KeyIdentity::new(0, 0);
        let table = TriggerTable::new(
            list("B"),
            vec![Trigger::new([page_zero], IdleWindow::UNBOUNDED, false, list("X")).unwrap()],
        );

        assert_eq!(table.evaluate(&TimestampedKey::NONE, 10), Selection::Trigger(0));

        let plain = TriggerTable::new(
            list("B"),
            vec![trigger(&["SPACE"], IdleWindow::UNBOUNDED, false, "X")],
        );
        assert_eq!(plain.evaluate(&TimestampedKey::NONE, 10), Selection::Default);
    }

    #[test]
    fn test_min_idle_skips_fast_followups() {
        let table = TriggerTable::new(
            list("B"),
            vec![trigger(
                &["A"],
                IdleWindow::new(Some(200), None).unwrap(),
                false,
                "X",
            )],
        );
        let last = TimestampedKey::new(key("A"), 1000);

        assert_eq!(table.evaluate(&last, 1199), Selection::Default);
        assert_eq!(table.evaluate(&last, 1200), Selection::Trigger(0));
    }
}
