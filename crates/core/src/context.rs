//! Evaluation context of an index stream.

use core::fmt;

/// Classification of what an index stream can say about its predicate.
///
/// Contexts are ranked by how much of the decision they defer to
/// document-level evaluation; see [`EvaluationContext::deferral_rank`].
/// `Absent` sits outside that ranking: it is a definite "no".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvaluationContext {
    /// Concrete shard data follows and covers every possible match.
    Present,
    /// Index-backed lazy scan that has not been pulled yet. Filters like `Present`.
    Initialized,
    /// Shard data follows but does not cover every possible match.
    Variable,
    /// The predicate must be evaluated against each document.
    Delayed,
    /// The predicate is over a field that has no index.
    Unindexed,
    /// The predicate provably matches nothing.
    Absent,
}

impl EvaluationContext {
    /// Ordering key for "weakest context wins" folds. Higher defers more.
    /// `Absent` has no rank.
    pub fn deferral_rank(self) -> Option<u8> {
        match self {
            EvaluationContext::Present => Some(0),
            EvaluationContext::Initialized => Some(1),
            EvaluationContext::Variable => Some(2),
            EvaluationContext::Delayed => Some(3),
            EvaluationContext::Unindexed => Some(4),
            EvaluationContext::Absent => None,
        }
    }

    /// Returns true if a stream in this context may produce shard data.
    pub fn carries_data(self) -> bool {
        matches!(
            self,
            EvaluationContext::Present
                | EvaluationContext::Initialized
                | EvaluationContext::Variable
        )
    }

    /// Returns true if this stream's shards are a complete candidate set,
    /// so an intersection may prune on them.
    pub fn can_filter(self) -> bool {
        matches!(self, EvaluationContext::Present | EvaluationContext::Initialized)
    }

    /// Returns true if the predicate cannot be resolved from the index alone.
    pub fn is_deferred(self) -> bool {
        matches!(
            self,
            EvaluationContext::Variable | EvaluationContext::Delayed | EvaluationContext::Unindexed
        )
    }

    /// Returns the more deferred of two ranked contexts.
    ///
    /// `Absent` never wins: a definite "no" does not weaken anything.
    pub fn weaker(self, other: EvaluationContext) -> EvaluationContext {
        match (self.deferral_rank(), other.deferral_rank()) {
            (None, _) => other,
            (_, None) => self,
            (Some(a), Some(b)) if b > a => other,
            _ => self,
        }
    }

    /// Folds a set of contexts down to the weakest one.
    /// Returns `None` if every context is `Absent` or the input is empty.
    pub fn weakest<I>(contexts: I) -> Option<EvaluationContext>
    where
        I: IntoIterator<Item = EvaluationContext>,
    {
        contexts
            .into_iter()
            .filter(|c| *c != EvaluationContext::Absent)
            .reduce(EvaluationContext::weaker)
    }

    /// Upper-case label used in debug traces.
    pub fn label(self) -> &'static str {
        match self {
            EvaluationContext::Present => "PRESENT",
            EvaluationContext::Initialized => "INITIALIZED",
            EvaluationContext::Variable => "VARIABLE",
            EvaluationContext::Delayed => "DELAYED",
            EvaluationContext::Unindexed => "UNINDEXED",
            EvaluationContext::Absent => "ABSENT",
        }
    }
}

impl fmt::Display for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
