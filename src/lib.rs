// Déclaration des modules
pub mod crypto_error;
pub mod math;
pub mod bloom_filter;
pub mod el_gamal;
pub mod mpsi;
pub mod config;

// Filtre de Bloom
pub use bloom_filter::{derive_bloom_params, BloomFilter, BloomFilterParams};

// ElGamal à seuil
pub use el_gamal::{encrypt, key_gen, threshold_decrypt, Ciphertext, Keys, PublicParameters};

// Protocole
pub use mpsi::{plaintext_intersection, run_mpsi, run_mpsi_with_metrics, MpsiMetrics};

// Configuration
pub use config::MpsiConfig;

// Erreur centralisée
pub use crypto_error::MpsiError;
