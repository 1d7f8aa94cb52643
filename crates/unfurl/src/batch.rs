//! Batching of embed groups into platform-sized message payloads.
//!
//! A group is the ordered embed list produced for one work. Groups
//! with more than one record are split into dedicated batches so a
//! multi-page work is never interleaved with another work's records;
//! single-record groups pack densely into a trailing open batch.

use crate::embed::Embed;

/// Split ordered embed groups into delivery batches of at most
/// `batch_size` records.
///
/// Multi-record groups yield sealed batches of their own; later
/// single-record groups never join them. A single-record group joins
/// the current open batch when it has room, otherwise it opens a new
/// one. Relative group order is preserved throughout.
pub fn chunk_batches(groups: Vec<Vec<Embed>>, batch_size: usize) -> Vec<Vec<Embed>> {
    let mut batches: Vec<Vec<Embed>> = Vec::new();
    let mut last_is_open = false;

    for group in groups {
        if group.len() > 1 {
            let mut rest = group;
            while rest.len() > batch_size {
                let tail = rest.split_off(batch_size);
                batches.push(rest);
                rest = tail;
            }
            batches.push(rest);
            last_is_open = false;
        } else if let Some(embed) = group.into_iter().next() {
            match batches.last_mut() {
                Some(open) if last_is_open && open.len() < batch_size => open.push(embed),
                _ => {
                    batches.push(vec![embed]);
                    last_is_open = true;
                }
            }
        }
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(n: usize) -> Vec<Embed> {
        vec![Embed::default(); n]
    }

    fn sizes(batches: &[Vec<Embed>]) -> Vec<usize> {
        batches.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_large_group_splits() {
        let batches = chunk_batches(vec![group(15)], 10);
        assert_eq!(sizes(&batches), vec![10, 5]);
    }

    #[test]
    fn test_singles_pack_densely() {
        let groups: Vec<_> = (0..12).map(|_| group(1)).collect();
        let batches = chunk_batches(groups, 10);
        assert_eq!(sizes(&batches), vec![10, 2]);
    }

    #[test]
    fn test_single_never_joins_sealed_batch() {
        // The 5-record tail batch of the multi group stays sealed.
        let batches = chunk_batches(vec![group(15), group(1)], 10);
        assert_eq!(sizes(&batches), vec![10, 5, 1]);
    }

    #[test]
    fn test_multi_group_not_merged_with_singles() {
        let batches = chunk_batches(vec![group(1), group(3), group(1)], 10);
        assert_eq!(sizes(&batches), vec![1, 3, 1]);
    }

    #[test]
    fn test_singles_resume_after_multi() {
        let batches = chunk_batches(vec![group(1), group(1), group(12), group(1), group(1)], 10);
        assert_eq!(sizes(&batches), vec![2, 10, 2, 2]);
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_batches(Vec::new(), 10).is_empty());
        assert!(chunk_batches(vec![Vec::new()], 10).is_empty());
    }
}
