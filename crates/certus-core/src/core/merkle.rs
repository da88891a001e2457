// crates/certus-core/src/core/merkle.rs
// ============================================================================
// Module: Certus Merkle Tree
// Description: Domain-separated Merkle hashing and inclusion proofs.
// Purpose: Let auditors check log inclusion without trusting the log operator.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! Leaves hash as `SHA-256(0x00 || leaf_bytes)` and interior nodes as
//! `SHA-256(0x01 || left || right)`. A level with an odd node promotes it
//! unchanged. Proofs list sibling hashes from leaf to root.
//!
//! Security posture: proofs are untrusted input; verification recomputes every
//! hash. See `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::sha256;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Domain separator for leaf hashes.
const LEAF_PREFIX: u8 = 0x00;
/// Domain separator for interior node hashes.
const NODE_PREFIX: u8 = 0x01;

/// Raw 32-byte Merkle hash.
pub type MerkleHash = [u8; 32];

// ============================================================================
// SECTION: Proof Types
// ============================================================================

/// Side on which a proof sibling sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofDirection {
    /// Sibling is the left child.
    Left,
    /// Sibling is the right child.
    Right,
}

/// One step of an inclusion proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Sibling hash at this level.
    pub sibling: HashDigest,
    /// Sibling position.
    pub direction: ProofDirection,
}

/// Merkle inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Zero-based leaf index.
    pub leaf_index: u64,
    /// Tree size the proof was computed against.
    pub tree_size: u64,
    /// Sibling path from leaf to root.
    pub path: Vec<ProofStep>,
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Hashes leaf bytes with the leaf domain separator.
#[must_use]
pub fn leaf_hash(leaf_bytes: &[u8]) -> MerkleHash {
    let mut buf = Vec::with_capacity(leaf_bytes.len() + 1);
    buf.push(LEAF_PREFIX);
    buf.extend_from_slice(leaf_bytes);
    sha256(&buf)
}

/// Hashes two children with the node domain separator.
#[must_use]
pub fn node_hash(left: &MerkleHash, right: &MerkleHash) -> MerkleHash {
    let mut buf = Vec::with_capacity(65);
    buf.push(NODE_PREFIX);
    buf.extend_from_slice(left);
    buf.extend_from_slice(right);
    sha256(&buf)
}

/// Wraps a raw Merkle hash as a digest.
#[must_use]
pub fn to_digest(hash: &MerkleHash) -> HashDigest {
    HashDigest::new(HashAlgorithm::Sha256, hash)
}

/// Decodes a digest into a raw Merkle hash.
#[must_use]
pub fn from_digest(digest: &HashDigest) -> Option<MerkleHash> {
    if digest.algorithm != HashAlgorithm::Sha256 {
        return None;
    }
    digest.to_bytes().ok()?.try_into().ok()
}

/// Folds one tree level into the next, promoting an odd trailing node.
fn next_level(level: &[MerkleHash]) -> Vec<MerkleHash> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    let mut pairs = level.chunks_exact(2);
    for pair in &mut pairs {
        next.push(node_hash(&pair[0], &pair[1]));
    }
    if let [single] = pairs.remainder() {
        next.push(*single);
    }
    next
}

// ============================================================================
// SECTION: Tree Operations
// ============================================================================

/// Computes the root over leaf hashes; `None` for an empty tree.
#[must_use]
pub fn merkle_root(leaves: &[MerkleHash]) -> Option<MerkleHash> {
    if leaves.is_empty() {
        return None;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level.first().copied()
}

/// Builds an inclusion proof for the leaf at `index`.
#[must_use]
pub fn build_inclusion_proof(leaves: &[MerkleHash], index: usize) -> Option<InclusionProof> {
    if index >= leaves.len() {
        return None;
    }
    let mut level = leaves.to_vec();
    let mut position = index;
    let mut path = Vec::new();
    while level.len() > 1 {
        if position % 2 == 0 {
            if let Some(sibling) = level.get(position + 1) {
                path.push(ProofStep {
                    sibling: to_digest(sibling),
                    direction: ProofDirection::Right,
                });
            }
        } else if let Some(sibling) = level.get(position - 1) {
            path.push(ProofStep {
                sibling: to_digest(sibling),
                direction: ProofDirection::Left,
            });
        }
        level = next_level(&level);
        position /= 2;
    }
    Some(InclusionProof {
        leaf_index: u64::try_from(index).ok()?,
        tree_size: u64::try_from(leaves.len()).ok()?,
        path,
    })
}

/// Recomputes the root implied by a proof for `leaf`.
///
/// The path must have exactly the shape implied by `leaf_index` and
/// `tree_size`, so a proof cannot be replayed under a different index.
#[must_use]
pub fn root_from_proof(leaf: &MerkleHash, proof: &InclusionProof) -> Option<MerkleHash> {
    if proof.leaf_index >= proof.tree_size {
        return None;
    }
    let mut current = *leaf;
    let mut position = proof.leaf_index;
    let mut width = proof.tree_size;
    let mut steps = proof.path.iter();
    while width > 1 {
        let expected = if position % 2 == 1 {
            Some(ProofDirection::Left)
        } else if position + 1 < width {
            Some(ProofDirection::Right)
        } else {
            None
        };
        if let Some(direction) = expected {
            let step = steps.next()?;
            if step.direction != direction {
                return None;
            }
            let sibling = from_digest(&step.sibling)?;
            current = match direction {
                ProofDirection::Left => node_hash(&sibling, &current),
                ProofDirection::Right => node_hash(&current, &sibling),
            };
        }
        position /= 2;
        width = width.div_ceil(2);
    }
    if steps.next().is_some() {
        return None;
    }
    Some(current)
}

/// Returns true when `proof` places `leaf` under `root`.
#[must_use]
pub fn verify_inclusion(leaf: &MerkleHash, proof: &InclusionProof, root: &MerkleHash) -> bool {
    root_from_proof(leaf, proof).is_some_and(|computed| computed == *root)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use super::*;

    fn leaves(count: u8) -> Vec<MerkleHash> {
        (0..count).map(|i| leaf_hash(&[i])).collect()
    }

    #[test]
    fn single_leaf_root_is_leaf_hash() {
        let tree = leaves(1);
        assert_eq!(merkle_root(&tree), Some(tree[0]));
        let proof = build_inclusion_proof(&tree, 0).unwrap();
        assert!(proof.path.is_empty());
    }

    #[test]
    fn odd_tree_promotes_last_node() {
        let tree = leaves(3);
        let expected = node_hash(&node_hash(&tree[0], &tree[1]), &tree[2]);
        assert_eq!(merkle_root(&tree), Some(expected));
    }

    #[test]
    fn proof_fails_for_wrong_leaf() {
        let tree = leaves(5);
        let root = merkle_root(&tree).unwrap();
        let proof = build_inclusion_proof(&tree, 2).unwrap();
        assert!(verify_inclusion(&tree[2], &proof, &root));
        assert!(!verify_inclusion(&tree[3], &proof, &root));
    }

    #[test]
    fn proof_is_bound_to_its_index() {
        let tree = leaves(4);
        let root = merkle_root(&tree).unwrap();
        let mut proof = build_inclusion_proof(&tree, 1).unwrap();
        proof.leaf_index = 0;
        assert!(!verify_inclusion(&tree[1], &proof, &root));
    }

    #[test]
    fn leaf_and_node_domains_differ() {
        let left = leaf_hash(b"a");
        let right = leaf_hash(b"b");
        let mut concatenated = left.to_vec();
        concatenated.extend_from_slice(&right);
        assert_ne!(leaf_hash(&concatenated), node_hash(&left, &right));
    }
}
