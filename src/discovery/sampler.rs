//! Random outlet sampling per target bias.

use crate::error::DiscoveryError;
use crate::models::{BiasLabel, OutletRecord, SampledOutlet};
use crate::reference::BiasReference;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;
use tracing::debug;

/// Draw `k` outlets without replacement for each bias, biases in sorted order.
///
/// Fails with [`DiscoveryError::InsufficientSources`] if any bias has fewer
/// than `k` outlets in the table.
pub fn sample<R: Rng + ?Sized>(
    reference: &BiasReference,
    biases: &BTreeSet<BiasLabel>,
    k: usize,
    rng: &mut R,
) -> Result<Vec<SampledOutlet>, DiscoveryError> {
    let mut sampled = Vec::with_capacity(biases.len() * k);
    for &bias in biases {
        let names = reference.all(bias);
        if names.len() < k {
            return Err(DiscoveryError::InsufficientSources {
                bias,
                requested: k,
                available: names.len(),
            });
        }
        let drawn: Vec<&str> = names.choose_multiple(rng, k).copied().collect();
        debug!(%bias, outlets = ?drawn, "Sampled outlets");
        sampled.extend(drawn.into_iter().filter_map(|name| {
            let homepage = reference.lookup(name)?;
            Some(SampledOutlet {
                outlet: OutletRecord {
                    name: name.to_string(),
                    homepage: homepage.to_string(),
                    bias,
                },
                bias,
            })
        }));
    }
    Ok(sampled)
}
