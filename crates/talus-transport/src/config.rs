//! Peer-table configuration.
//!
//! Serde-friendly so the embedding daemon can splice this into its own
//! config file. The table is sized once at startup and never rehashed,
//! so `bucket_bits` should be chosen for the expected number of distinct
//! peers; chains simply grow longer past that point.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerTableConfig {
    /// log2 of the hash bucket count. The default (2^16 buckets) keeps
    /// chains at one entry for any sane deployment.
    pub bucket_bits: u32,
}

impl Default for PeerTableConfig {
    fn default() -> Self {
        Self { bucket_bits: 16 }
    }
}

impl PeerTableConfig {
    /// Number of hash buckets. Always a power of two.
    pub fn bucket_count(&self) -> usize {
        1 << self.bucket_bits
    }
}
