use alloy::primitives::B256;
use thiserror::Error;

use crate::crypto::poseidon::poseidon2;

use super::identity::IdentityCommitment;

/// Depth of the Semaphore group tree (supports up to 2^20 members).
pub const DEFAULT_TREE_DEPTH: usize = 20;

/// Largest depth accepted by the tree.
pub const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("tree depth must be between 1 and {MAX_TREE_DEPTH}, got {0}")]
    DepthOutOfRange(usize),

    #[error("{leaves} leaves exceed the tree capacity of {capacity}")]
    CapacityExceeded { leaves: u64, capacity: u64 },
}

/// Inclusion proof for one leaf of a fixed-depth tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub root: B256,
    pub leaf: B256,
    pub leaf_index: u64,
    /// Sibling hashes along the path from leaf to root.
    pub siblings: Vec<B256>,
    /// 0 = node is the left child, 1 = node is the right child (LSB first).
    pub path_indices: Vec<u8>,
}

impl MerkleProof {
    /// Fold the path back up to a root.
    pub fn compute_root(&self) -> B256 {
        self.siblings
            .iter()
            .zip(&self.path_indices)
            .fold(self.leaf, |node, (sibling, &index)| {
                if index == 1 {
                    poseidon2(*sibling, node)
                } else {
                    poseidon2(node, *sibling)
                }
            })
    }

    pub fn verify(&self) -> bool {
        self.compute_root() == self.root
    }
}

/// Binary Poseidon tree of fixed depth, zero-valued empty leaves.
///
/// Only the filled prefix of each level is stored; everything to the right
/// of it is the precomputed zero subtree for that level.
#[derive(Debug, Clone)]
pub struct MembershipTree {
    depth: usize,
    /// zeros[i] is the root of an empty subtree of height i.
    zeros: Vec<B256>,
    /// levels[0] holds the leaves, levels[depth] the root once non-empty.
    levels: Vec<Vec<B256>>,
}

impl MembershipTree {
    pub fn new(depth: usize) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(TreeError::DepthOutOfRange(depth));
        }

        let mut zeros = Vec::with_capacity(depth + 1);
        zeros.push(B256::ZERO);
        for i in 0..depth {
            let z = zeros[i];
            zeros.push(poseidon2(z, z));
        }

        Ok(Self {
            depth,
            zeros,
            levels: vec![Vec::new(); depth + 1],
        })
    }

    /// Build a tree from an ordered leaf list in one pass.
    pub fn from_leaves(depth: usize, leaves: &[B256]) -> Result<Self, TreeError> {
        let mut tree = Self::new(depth)?;
        tree.check_capacity(leaves.len() as u64)?;

        tree.levels[0] = leaves.to_vec();
        for level in 0..depth {
            let zero = tree.zeros[level];
            let next: Vec<B256> = tree.levels[level]
                .chunks(2)
                .map(|pair| poseidon2(pair[0], pair.get(1).copied().unwrap_or(zero)))
                .collect();
            tree.levels[level + 1] = next;
        }

        Ok(tree)
    }

    /// Append a leaf, updating the path to the root. Returns the leaf index.
    pub fn insert(&mut self, leaf: B256) -> Result<u64, TreeError> {
        let index = self.levels[0].len();
        self.check_capacity(index as u64 + 1)?;
        self.levels[0].push(leaf);

        let mut current = index;
        for level in 0..self.depth {
            let left_idx = current & !1;
            let left = self.levels[level][left_idx];
            let right = self.levels[level]
                .get(left_idx + 1)
                .copied()
                .unwrap_or(self.zeros[level]);

            let parent = current / 2;
            let hash = poseidon2(left, right);
            let next = &mut self.levels[level + 1];
            if parent < next.len() {
                next[parent] = hash;
            } else {
                next.push(hash);
            }
            current = parent;
        }

        Ok(index as u64)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn leaves(&self) -> &[B256] {
        &self.levels[0]
    }

    /// Current root. An empty tree has the all-zero root for its depth.
    pub fn root(&self) -> B256 {
        self.levels[self.depth]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.depth])
    }

    /// Position of the first occurrence of `leaf`.
    pub fn index_of(&self, leaf: &B256) -> Option<u64> {
        self.levels[0]
            .iter()
            .position(|l| l == leaf)
            .map(|i| i as u64)
    }

    /// Generate a proof for the leaf at `leaf_index`, or None if out of range.
    pub fn generate_proof(&self, leaf_index: u64) -> Option<MerkleProof> {
        let leaf = *self.levels[0].get(leaf_index as usize)?;

        let mut siblings = Vec::with_capacity(self.depth);
        let mut path_indices = Vec::with_capacity(self.depth);
        let mut current = leaf_index as usize;

        for level in 0..self.depth {
            let is_right = current & 1;
            let sibling_idx = current ^ 1;
            path_indices.push(is_right as u8);
            siblings.push(
                self.levels[level]
                    .get(sibling_idx)
                    .copied()
                    .unwrap_or(self.zeros[level]),
            );
            current /= 2;
        }

        Some(MerkleProof {
            root: self.root(),
            leaf,
            leaf_index,
            siblings,
            path_indices,
        })
    }

    fn check_capacity(&self, leaves: u64) -> Result<(), TreeError> {
        let capacity = self.capacity();
        if leaves > capacity {
            return Err(TreeError::CapacityExceeded { leaves, capacity });
        }
        Ok(())
    }
}

/// Ordered list of member commitments as published by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSet {
    depth: usize,
    commitments: Vec<IdentityCommitment>,
}

impl MembershipSet {
    pub fn new(depth: usize, commitments: Vec<IdentityCommitment>) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(TreeError::DepthOutOfRange(depth));
        }
        let capacity = 1u64 << depth;
        if commitments.len() as u64 > capacity {
            return Err(TreeError::CapacityExceeded {
                leaves: commitments.len() as u64,
                capacity,
            });
        }
        Ok(Self { depth, commitments })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn commitments(&self) -> &[IdentityCommitment] {
        &self.commitments
    }

    pub fn contains(&self, commitment: &IdentityCommitment) -> bool {
        self.commitments.contains(commitment)
    }

    pub fn tree(&self) -> Result<MembershipTree, TreeError> {
        let leaves: Vec<B256> = self.commitments.iter().map(|c| c.0).collect();
        MembershipTree::from_leaves(self.depth, &leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> B256 {
        B256::left_padding_from(&[byte])
    }

    #[test]
    fn test_empty_root_is_zero_subtree() {
        let tree = MembershipTree::new(3).unwrap();
        let z1 = poseidon2(B256::ZERO, B256::ZERO);
        let z2 = poseidon2(z1, z1);
        let z3 = poseidon2(z2, z2);
        assert_eq!(tree.root(), z3);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_two_leaf_root() {
        let (a, b) = (leaf(1), leaf(2));
        let tree = MembershipTree::from_leaves(DEFAULT_TREE_DEPTH, &[a, b]).unwrap();

        let mut expected = poseidon2(a, b);
        let mut zero = B256::ZERO;
        for _ in 1..DEFAULT_TREE_DEPTH {
            zero = poseidon2(zero, zero);
            expected = poseidon2(expected, zero);
        }
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn test_two_leaf_proofs() {
        let (a, b) = (leaf(1), leaf(2));
        let tree = MembershipTree::from_leaves(DEFAULT_TREE_DEPTH, &[a, b]).unwrap();

        let proof_a = tree.generate_proof(0).unwrap();
        assert_eq!(proof_a.siblings.len(), DEFAULT_TREE_DEPTH);
        assert_eq!(proof_a.siblings[0], b);
        assert!(proof_a.path_indices.iter().all(|&i| i == 0));
        assert!(proof_a.verify());

        let proof_b = tree.generate_proof(1).unwrap();
        assert_eq!(proof_b.siblings[0], a);
        assert_eq!(proof_b.path_indices[0], 1);
        assert!(proof_b.verify());
    }

    #[test]
    fn test_incremental_matches_batch() {
        let leaves: Vec<B256> = (1..=5).map(leaf).collect();
        let batch = MembershipTree::from_leaves(4, &leaves).unwrap();

        let mut incremental = MembershipTree::new(4).unwrap();
        for (i, l) in leaves.iter().enumerate() {
            assert_eq!(incremental.insert(*l).unwrap(), i as u64);
        }

        assert_eq!(batch.root(), incremental.root());
        for i in 0..5 {
            assert_eq!(batch.generate_proof(i), incremental.generate_proof(i));
        }
    }

    #[test]
    fn test_tampered_proof_fails() {
        let tree = MembershipTree::from_leaves(4, &[leaf(1), leaf(2), leaf(3)]).unwrap();
        let mut proof = tree.generate_proof(2).unwrap();
        assert!(proof.verify());
        proof.leaf = leaf(9);
        assert!(!proof.verify());
    }

    #[test]
    fn test_index_of_and_out_of_range() {
        let tree = MembershipTree::from_leaves(4, &[leaf(1), leaf(2)]).unwrap();
        assert_eq!(tree.index_of(&leaf(2)), Some(1));
        assert_eq!(tree.index_of(&leaf(3)), None);
        assert!(tree.generate_proof(2).is_none());
    }

    #[test]
    fn test_capacity_enforced() {
        let leaves: Vec<B256> = (1..=5).map(leaf).collect();
        let err = MembershipTree::from_leaves(2, &leaves).unwrap_err();
        assert_eq!(err, TreeError::CapacityExceeded { leaves: 5, capacity: 4 });

        let mut tree = MembershipTree::from_leaves(1, &[leaf(1), leaf(2)]).unwrap();
        assert!(tree.insert(leaf(3)).is_err());
    }

    #[test]
    fn test_depth_bounds() {
        assert_eq!(MembershipTree::new(0).unwrap_err(), TreeError::DepthOutOfRange(0));
        assert!(MembershipTree::new(MAX_TREE_DEPTH + 1).is_err());
    }

    #[test]
    fn test_membership_set_tree() {
        let set = MembershipSet::new(
            DEFAULT_TREE_DEPTH,
            vec![IdentityCommitment(leaf(1)), IdentityCommitment(leaf(2))],
        )
        .unwrap();
        assert!(set.contains(&IdentityCommitment(leaf(2))));
        assert!(!set.contains(&IdentityCommitment(leaf(3))));
        assert_eq!(set.tree().unwrap().len(), 2);
    }
}
