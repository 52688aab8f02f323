//! Recruitment hierarchy
//!
//! A read-only view of the recruiter edges between sellers. Cycles are
//! rejected before they are written, but the walks below still stop on a
//! repeated node so a corrupted cache cannot hang them.

use std::collections::{HashMap, HashSet, VecDeque};

use super::newtypes::SellerCode;
use super::seller::Seller;

/// Recruiter edges keyed by recruit
#[derive(Debug, Clone, Default)]
pub struct RecruitmentForest {
    parents: HashMap<SellerCode, SellerCode>,
}

impl RecruitmentForest {
    pub fn from_sellers<'a, I>(sellers: I) -> Self
    where
        I: IntoIterator<Item = &'a Seller>,
    {
        let parents = sellers
            .into_iter()
            .filter_map(|s| match (&s.code, &s.recruiter) {
                (Some(code), Some(recruiter)) => Some((code.clone(), recruiter.clone())),
                _ => None,
            })
            .collect();
        Self { parents }
    }

    pub fn recruiter_of(&self, code: &SellerCode) -> Option<&SellerCode> {
        self.parents.get(code)
    }

    /// Depth of a seller in the forest (roots are level 1)
    pub fn level(&self, code: &SellerCode) -> u32 {
        let mut level = 1;
        let mut seen = HashSet::from([code]);
        let mut current = code;
        while let Some(parent) = self.parents.get(current) {
            if !seen.insert(parent) {
                break;
            }
            level += 1;
            current = parent;
        }
        level
    }

    /// Level a seller gets when recruited by `recruiter`
    pub fn level_below(&self, recruiter: Option<&SellerCode>) -> u32 {
        recruiter.map(|r| self.level(r) + 1).unwrap_or(1)
    }

    /// Returns `true` if `ancestor` appears on the recruiter chain of `code`
    /// (or is `code` itself)
    pub fn is_ancestor(&self, ancestor: &SellerCode, code: &SellerCode) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(code);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            if !seen.insert(node) {
                return false;
            }
            current = self.parents.get(node);
        }
        false
    }

    /// Everyone recruited directly or indirectly by `code`, nearest first
    pub fn descendants(&self, code: &SellerCode) -> Vec<SellerCode> {
        let mut children: HashMap<&SellerCode, Vec<&SellerCode>> = HashMap::new();
        for (recruit, recruiter) in &self.parents {
            children.entry(recruiter).or_default().push(recruit);
        }
        for list in children.values_mut() {
            list.sort();
        }

        let mut out = Vec::new();
        let mut seen = HashSet::from([code]);
        let mut queue = VecDeque::from([code]);
        while let Some(node) = queue.pop_front() {
            for child in children.get(node).into_iter().flatten() {
                if seen.insert(*child) {
                    out.push((*child).clone());
                    queue.push_back(*child);
                }
            }
        }
        out
    }

    /// Records or replaces the recruiter of `recruit`
    pub fn link(&mut self, recruit: SellerCode, recruiter: SellerCode) {
        self.parents.insert(recruit, recruiter);
    }
}
