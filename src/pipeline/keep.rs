//! Keep-sets: original-space index sets surviving a filtering stage.
//!
//! Every filtering stage in the pipelines reports survivors as indices into
//! the original region batch, never into an intermediate filtered subset.
//! Representing those sets explicitly keeps stage composition (clip, score
//! threshold, NMS) in one index universe.

/// Sorted, deduplicated set of indices into the original region batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeepSet {
    indices: Vec<usize>,
}

impl KeepSet {
    /// Builds a keep-set from indices in any order.
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// Number of surviving indices.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when nothing survived.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Surviving indices in ascending order.
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Membership test.
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Set intersection, ascending order preserved.
    pub fn intersect(&self, other: &KeepSet) -> KeepSet {
        let mut out = Vec::with_capacity(self.indices.len().min(other.indices.len()));
        let mut left = self.indices.iter().peekable();
        let mut right = other.indices.iter().peekable();
        while let (Some(&&a), Some(&&b)) = (left.peek(), right.peek()) {
            match a.cmp(&b) {
                std::cmp::Ordering::Less => {
                    left.next();
                }
                std::cmp::Ordering::Greater => {
                    right.next();
                }
                std::cmp::Ordering::Equal => {
                    out.push(a);
                    left.next();
                    right.next();
                }
            }
        }
        KeepSet { indices: out }
    }
}

#[cfg(test)]
mod tests {
    use super::KeepSet;

    #[test]
    fn from_indices_sorts_and_dedups() {
        let keep = KeepSet::from_indices(vec![4, 1, 4, 0]);
        assert_eq!(keep.as_slice(), &[0, 1, 4]);
        assert_eq!(keep.len(), 3);
    }

    #[test]
    fn intersect_keeps_common_members_in_order() {
        let a = KeepSet::from_indices(vec![0, 2, 4, 7]);
        let b = KeepSet::from_indices(vec![1, 2, 5, 7]);
        assert_eq!(a.intersect(&b).as_slice(), &[2, 7]);
    }

    #[test]
    fn intersect_with_empty_is_empty() {
        let a = KeepSet::from_indices(vec![0, 1]);
        assert!(a.intersect(&KeepSet::default()).is_empty());
    }

    #[test]
    fn contains_uses_original_indices() {
        let keep = KeepSet::from_indices(vec![3, 9]);
        assert!(keep.contains(9));
        assert!(!keep.contains(4));
    }
}
