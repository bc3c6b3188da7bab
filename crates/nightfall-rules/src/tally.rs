//! Vote counting for the werewolf kill and the day exile.

use std::collections::HashMap;

use nightfall_protocol::PlayerId;

/// Ballots in submission order. A voter who votes again replaces their
/// earlier ballot and moves to the back of the queue.
#[derive(Debug, Default, Clone)]
pub(crate) struct Ballots {
    cast: Vec<(PlayerId, PlayerId)>,
}

impl Ballots {
    pub(crate) fn cast(&mut self, voter: PlayerId, target: PlayerId) {
        self.cast.retain(|(v, _)| *v != voter);
        self.cast.push((voter, target));
    }

    pub(crate) fn clear(&mut self) {
        self.cast.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cast.is_empty()
    }

    fn counts(&self) -> HashMap<PlayerId, (usize, usize)> {
        // target -> (votes, position of the latest vote)
        let mut counts: HashMap<PlayerId, (usize, usize)> = HashMap::new();
        for (position, (_, target)) in self.cast.iter().enumerate() {
            let entry = counts.entry(*target).or_insert((0, 0));
            entry.0 += 1;
            entry.1 = position;
        }
        counts
    }

    /// Most-voted target; a tie goes to whichever tied target was voted for
    /// most recently. Used for the werewolves, who always pick someone.
    pub(crate) fn leader_or_latest(&self) -> Option<PlayerId> {
        self.counts()
            .into_iter()
            .max_by_key(|(_, (votes, latest))| (*votes, *latest))
            .map(|(target, _)| target)
    }

    /// Strict plurality winner. A tie for first place yields `None`.
    pub(crate) fn plurality(&self) -> Option<PlayerId> {
        let counts = self.counts();
        let top = counts.values().map(|(votes, _)| *votes).max()?;
        let mut leaders = counts
            .into_iter()
            .filter(|(_, (votes, _))| *votes == top)
            .map(|(target, _)| target);
        let leader = leaders.next()?;
        match leaders.next() {
            Some(_) => None,
            None => Some(leader),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<PlayerId> {
        (0..n).map(|_| PlayerId::generate()).collect()
    }

    #[test]
    fn test_majority_wins() {
        let p = ids(4);
        let mut ballots = Ballots::default();
        ballots.cast(p[0], p[3]);
        ballots.cast(p[1], p[3]);
        ballots.cast(p[2], p[0]);
        assert_eq!(ballots.leader_or_latest(), Some(p[3]));
        assert_eq!(ballots.plurality(), Some(p[3]));
    }

    #[test]
    fn test_tie_goes_to_latest_for_leader() {
        let p = ids(4);
        let mut ballots = Ballots::default();
        ballots.cast(p[0], p[2]);
        ballots.cast(p[1], p[3]);
        assert_eq!(ballots.leader_or_latest(), Some(p[3]));
        assert_eq!(ballots.plurality(), None, "ties exile nobody");
    }

    #[test]
    fn test_revote_replaces_earlier_ballot() {
        let p = ids(3);
        let mut ballots = Ballots::default();
        ballots.cast(p[0], p[1]);
        ballots.cast(p[0], p[2]);
        assert_eq!(ballots.plurality(), Some(p[2]));
    }

    #[test]
    fn test_empty_ballots() {
        let ballots = Ballots::default();
        assert!(ballots.is_empty());
        assert_eq!(ballots.leader_or_latest(), None);
        assert_eq!(ballots.plurality(), None);
    }
}
