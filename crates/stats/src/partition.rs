//! Partitioning routines shared by the dimensions.
//!
//! - `group_by_key`: one partition per distinct key, discovered from the data
//! - `bucket_by_ranges`: fixed half-open range table
//! - `group_by_rating`: fixed rating groups (membership, not range)
//!
//! Records whose key is null are left out. Empty partitions are never returned.

use std::collections::HashMap;
use std::hash::Hash;

use cb_auction_core::config::{RangeBucket, RatingGroup};
use cb_auction_core::AuctionRecord;

/// Members of one partition.
pub type Members<'a> = Vec<&'a AuctionRecord>;

/// Group records by key, in order of first appearance.
pub fn group_by_key<'a, K, F>(records: &'a [AuctionRecord], key: F) -> Vec<(K, Members<'a>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&'a AuctionRecord) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Members<'a>)> = Vec::new();

    for record in records {
        let Some(k) = key(record) else { continue };
        match index.get(&k) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![record]));
            }
        }
    }

    groups
}

/// Assign records to range buckets, in table order.
///
/// A value lands in the first bucket that contains it; with a validated table
/// that is the only one.
pub fn bucket_by_ranges<'a, 'b, F>(
    records: &'a [AuctionRecord],
    buckets: &'b [RangeBucket],
    value: F,
) -> Vec<(&'b RangeBucket, Members<'a>)>
where
    F: Fn(&AuctionRecord) -> Option<f64>,
{
    let mut members: Vec<Members<'a>> = vec![Vec::new(); buckets.len()];

    for record in records {
        let Some(v) = value(record) else { continue };
        if let Some(i) = buckets.iter().position(|b| b.contains(v)) {
            members[i].push(record);
        }
    }

    buckets
        .iter()
        .zip(members)
        .filter(|(_, m)| !m.is_empty())
        .collect()
}

/// Assign records to rating groups, in group order.
pub fn group_by_rating<'a, 'b>(
    records: &'a [AuctionRecord],
    groups: &'b [RatingGroup],
) -> Vec<(&'b RatingGroup, Members<'a>)> {
    groups
        .iter()
        .map(|group| {
            let members: Members<'a> = records
                .iter()
                .filter(|r| r.credit_rating.as_ref().is_some_and(|rating| group.matches(rating)))
                .collect();
            (group, members)
        })
        .filter(|(_, m)| !m.is_empty())
        .collect()
}
