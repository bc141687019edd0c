//! Groups candidates by discovery order and priority tier.
//!
//! Candidates arrive in groups, one per lookup step (members, then member
//! extensions, then extensions, ...). Tasks are emitted tier by tier, highest
//! first; within a tier, groups keep their discovery order, so a member
//! outranks an extension of the same tier.

use crate::candidates::{ResolutionCandidate, ResolutionTask};
use kres_common::limits::CANDIDATE_GROUP_CAPACITY;
use tracing::{debug, trace};

/// Ranks candidates into tiers `0..=max_priority()`; higher is tried first.
pub trait PriorityProvider {
    fn priority(&self, candidate: &ResolutionCandidate) -> u8;
    fn max_priority(&self) -> u8;
}

pub struct ResolutionTaskHolder<P> {
    provider: P,
    groups: Vec<Vec<(u8, ResolutionCandidate)>>,
}

impl<P: PriorityProvider> ResolutionTaskHolder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            groups: Vec::with_capacity(CANDIDATE_GROUP_CAPACITY),
        }
    }

    /// Record one group of candidates. Each candidate is ranked now.
    pub fn add_candidates(&mut self, candidates: impl IntoIterator<Item = ResolutionCandidate>) {
        let max = self.provider.max_priority();
        let group: Vec<(u8, ResolutionCandidate)> = candidates
            .into_iter()
            .map(|candidate| {
                let tier = self.provider.priority(&candidate);
                assert!(tier <= max, "priority {tier} above maximum {max}");
                (tier, candidate)
            })
            .collect();
        trace!(group = self.groups.len(), size = group.len(), "candidate group");
        self.groups.push(group);
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Tasks from the highest tier down. Groups with no candidate in a tier
    /// produce no task for it.
    pub fn into_tasks(self) -> Vec<ResolutionTask> {
        let max = self.provider.max_priority();
        let mut tasks = Vec::new();
        for tier in (0..=max).rev() {
            for group in &self.groups {
                let candidates: Vec<ResolutionCandidate> = group
                    .iter()
                    .filter(|(t, _)| *t == tier)
                    .map(|(_, candidate)| *candidate)
                    .collect();
                if !candidates.is_empty() {
                    tasks.push(ResolutionTask { tier, candidates });
                }
            }
        }
        debug!(groups = self.groups.len(), tasks = tasks.len(), "prioritized tasks");
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::ExplicitReceiverKind;
    use kres_types::CallableId;

    /// Tier is the callable id modulo four.
    struct ById;

    impl PriorityProvider for ById {
        fn priority(&self, candidate: &ResolutionCandidate) -> u8 {
            (candidate.callable.0 % 4) as u8
        }

        fn max_priority(&self) -> u8 {
            3
        }
    }

    fn candidate(id: u32) -> ResolutionCandidate {
        ResolutionCandidate::new(CallableId(id), ExplicitReceiverKind::NoExplicitReceiver)
    }

    #[test]
    fn tiers_descend_and_groups_keep_order() {
        let mut holder = ResolutionTaskHolder::new(ById);
        holder.add_candidates([candidate(1), candidate(3)]);
        holder.add_candidates([candidate(7), candidate(2)]);
        holder.add_candidates([]);
        assert_eq!(holder.group_count(), 3);

        let tasks = holder.into_tasks();
        let shape: Vec<(u8, Vec<u32>)> = tasks
            .iter()
            .map(|t| (t.tier, t.callables().map(|c| c.0).collect()))
            .collect();
        assert_eq!(
            shape,
            vec![(3, vec![3]), (3, vec![7]), (2, vec![2]), (1, vec![1])]
        );
    }

    #[test]
    fn no_groups_no_tasks() {
        let holder = ResolutionTaskHolder::new(ById);
        assert!(holder.into_tasks().is_empty());
    }
}
