//! Connected-component clustering within a bucket

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;

use super::similarity::{compare_signatures, NameSignature};
use crate::config::DedupConfig;
use crate::domain::ProductRecord;

/// Group `0..len` into connected components of the `related` relation.
///
/// Every unordered pair is tested once, so membership is transitive: if
/// a~b and b~c then a, b and c share a component even when a !~ c.
/// Only components with at least two members are returned, each in
/// ascending index order, ordered by their first member.
pub fn connected_components<F>(len: usize, mut related: F) -> Vec<Vec<usize>>
where
    F: FnMut(usize, usize) -> bool,
{
    let mut sets = UnionFind::<usize>::new(len);
    for i in 0..len {
        for j in (i + 1)..len {
            if related(i, j) {
                sets.union(i, j);
            }
        }
    }

    let labels = sets.into_labeling();
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (index, root) in labels.into_iter().enumerate() {
        let group = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(index);
    }

    groups.retain(|g| g.len() >= 2);
    groups
}

/// Cluster precomputed signatures, counting every pair compared
pub(crate) fn cluster_signatures(
    signatures: &[NameSignature],
    config: &DedupConfig,
    pairs_compared: &mut usize,
) -> Vec<Vec<usize>> {
    connected_components(signatures.len(), |i, j| {
        *pairs_compared += 1;
        compare_signatures(&signatures[i], &signatures[j], config).is_some()
    })
}

/// Cluster the records of one bucket into groups of same-product records
///
/// Singletons are dropped; members keep their encounter order.
pub fn cluster_bucket<'a>(
    products: &[&'a ProductRecord],
    config: &DedupConfig,
) -> Vec<Vec<&'a ProductRecord>> {
    let signatures: Vec<NameSignature> = products.iter().map(|p| NameSignature::of(p)).collect();
    let mut pairs = 0;

    cluster_signatures(&signatures, config, &mut pairs)
        .into_iter()
        .map(|group| group.into_iter().map(|i| products[i]).collect())
        .collect()
}
