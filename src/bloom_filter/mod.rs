pub mod bf_params;
pub mod bloom_filter;

// Réexportations pratiques pour l'utilisateur du module
pub use bf_params::{derive_bloom_params, BloomFilterParams};
pub use bloom_filter::{hash_element, BloomFilter};
