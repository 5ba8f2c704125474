//! Training weight assignment.
//!
//! An agent turn spoken before the caller says anything (greeting, legal
//! disclaimer) is scripted, so it defaults to weight 0. Every later agent
//! turn defaults to 1. An annotator override always wins. Weights are never
//! stored by the engine; they are recomputed on every export.

use callmill_core::{Turn, Weight};

/// Default-weight policy over one conversation's surviving turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightPolicy {
    first_user_position: Option<i64>,
}

impl WeightPolicy {
    /// Build the policy from surviving turns (deleted turns already removed).
    pub fn for_turns(turns: &[&Turn]) -> Self {
        let first_user_position = turns
            .iter()
            .filter(|t| t.is_user())
            .map(|t| t.position)
            .min();
        Self {
            first_user_position,
        }
    }

    /// Position of the first surviving user turn, if any.
    pub fn first_user_position(&self) -> Option<i64> {
        self.first_user_position
    }

    /// Weight for a turn with no override.
    pub fn default_weight(&self, position: i64) -> Weight {
        match self.first_user_position {
            Some(first) if position > first => Weight::One,
            _ => Weight::Zero,
        }
    }

    /// Effective weight of an agent turn: override, else default.
    pub fn weight_for(&self, turn: &Turn) -> Weight {
        turn.weight
            .unwrap_or_else(|| self.default_weight(turn.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(turns: &[Turn]) -> WeightPolicy {
        let refs: Vec<&Turn> = turns.iter().collect();
        WeightPolicy::for_turns(&refs)
    }

    #[test]
    fn greeting_before_user_is_zero() {
        let turns = vec![
            Turn::agent(0, "Thanks for calling Luigi's"),
            Turn::user(1, "Hi, I want a pizza"),
            Turn::agent(2, "Sure, which size?"),
        ];
        let p = policy(&turns);
        assert_eq!(p.weight_for(&turns[0]), Weight::Zero);
        assert_eq!(p.weight_for(&turns[2]), Weight::One);
    }

    #[test]
    fn override_wins_both_ways() {
        let turns = vec![
            Turn::agent(0, "Hello").with_weight(Weight::One),
            Turn::user(1, "Hi"),
            Turn::agent(2, "Um").with_weight(Weight::Zero),
        ];
        let p = policy(&turns);
        assert_eq!(p.weight_for(&turns[0]), Weight::One);
        assert_eq!(p.weight_for(&turns[2]), Weight::Zero);
    }

    #[test]
    fn no_user_turns_means_all_zero() {
        let turns = vec![Turn::agent(0, "Hello?"), Turn::agent(1, "Anyone there?")];
        let p = policy(&turns);
        assert_eq!(p.first_user_position(), None);
        assert!(turns.iter().all(|t| p.weight_for(t) == Weight::Zero));
    }

    #[test]
    fn first_user_is_smallest_position_not_first_in_slice() {
        let turns = vec![Turn::user(5, "later"), Turn::user(3, "first")];
        assert_eq!(policy(&turns).first_user_position(), Some(3));
        assert_eq!(policy(&turns).default_weight(4), Weight::One);
        assert_eq!(policy(&turns).default_weight(2), Weight::Zero);
    }
}
