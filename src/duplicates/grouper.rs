use std::path::PathBuf;

use tracing::debug;

use super::perceptual::{HashBits, HashIndex};

/// A set of exact or near-duplicate images (always 2+ paths)
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    /// Hash of the bucket that opened this group
    pub anchor: HashBits,
    /// Paths in merge order: the anchor's bucket first, then every folded
    /// bucket in index order
    pub paths: Vec<PathBuf>,
    /// Largest anchor distance among folded buckets (0 for exact groups)
    pub max_distance: u32,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn is_exact(&self) -> bool {
        self.max_distance == 0
    }
}

/// Partition hash buckets into duplicate groups.
///
/// Buckets are visited in index order. Each unprocessed bucket becomes an
/// anchor; with `threshold > 0`, every later unprocessed bucket within
/// `threshold` bits of the anchor is folded into it and marked processed.
/// A bucket is folded at most once, and distances are only measured against
/// the anchor, so two members of a group may be more than `threshold` apart
/// from each other. Groups are not closed under transitivity either: a bucket
/// close to a folded member but far from the anchor can anchor its own group.
///
/// Cost is O(k²) in the number of distinct hashes, which is fine for a few
/// thousand buckets and is the intended scale ceiling.
pub fn group_duplicates(index: HashIndex, threshold: u32) -> Vec<DuplicateGroup> {
    let buckets = index.into_buckets();
    let mut processed = vec![false; buckets.len()];
    let mut groups = Vec::new();

    for i in 0..buckets.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let anchor = &buckets[i];
        let mut paths = anchor.paths.clone();
        let mut max_distance = 0;

        if threshold > 0 {
            for j in (i + 1)..buckets.len() {
                if processed[j] {
                    continue;
                }
                let distance = anchor.hash.distance(&buckets[j].hash);
                if distance <= threshold {
                    debug!(
                        "Folding {} into {} (distance {})",
                        buckets[j].hash, anchor.hash, distance
                    );
                    paths.extend(buckets[j].paths.iter().cloned());
                    max_distance = max_distance.max(distance);
                    processed[j] = true;
                }
            }
        }

        // A lone bucket with a single file is not a duplicate
        if paths.len() > 1 {
            groups.push(DuplicateGroup {
                anchor: anchor.hash.clone(),
                paths,
                max_distance,
            });
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::perceptual::ImageRecord;

    fn record(path: &str, bytes: &[u8]) -> ImageRecord {
        ImageRecord {
            path: PathBuf::from(path),
            hash: HashBits::from_bytes(bytes),
        }
    }

    #[test]
    fn test_exact_only_at_zero_threshold() {
        let index: HashIndex = vec![
            record("a.png", &[0x00]),
            record("b.png", &[0x01]),
            record("c.png", &[0x00]),
        ]
        .into_iter()
        .collect();

        let groups = group_duplicates(index, 0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].paths, vec![PathBuf::from("a.png"), PathBuf::from("c.png")]);
        assert!(groups[0].is_exact());
    }

    #[test]
    fn test_singletons_are_dropped() {
        let index: HashIndex = vec![record("a.png", &[0x00]), record("b.png", &[0xff])]
            .into_iter()
            .collect();
        assert!(group_duplicates(index, 3).is_empty());
    }

    #[test]
    fn test_anchor_relative_membership() {
        // b and c are each 2 bits from a but 4 bits from each other
        let index: HashIndex = vec![
            record("a.png", &[0b0000_0000]),
            record("b.png", &[0b0000_0011]),
            record("c.png", &[0b1100_0000]),
        ]
        .into_iter()
        .collect();

        let groups = group_duplicates(index, 2);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[0].max_distance, 2);
    }

    #[test]
    fn test_processed_bucket_is_not_reused() {
        // b joins a; c is 1 bit from b but 3 from a, so it stays alone
        let index: HashIndex = vec![
            record("a.png", &[0b0000_0000]),
            record("b.png", &[0b0000_0011]),
            record("c.png", &[0b0000_0111]),
            record("d.png", &[0b0000_0111]),
        ]
        .into_iter()
        .collect();

        let groups = group_duplicates(index, 2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].paths, vec![PathBuf::from("a.png"), PathBuf::from("b.png")]);
        assert_eq!(groups[1].paths, vec![PathBuf::from("c.png"), PathBuf::from("d.png")]);
    }
}
