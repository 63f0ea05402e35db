use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use crate::bloom_filter::{derive_bloom_params, BloomFilterParams};
use crate::crypto_error::MpsiError;
use crate::el_gamal::{key_gen, Keys};

pub const DEFAULT_KEY_BITS: u64 = 1024;
pub const DEFAULT_FALSE_POSITIVE_EXPONENT: i64 = -30;

// =========================================================
// Configuration d'une exécution MPSI
//
// key_bits                : taille du premier sûr p
// false_positive_exponent : e < 0, taux de faux positifs ε = 2^e
// =========================================================
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpsiConfig {
    pub key_bits: u64,
    pub false_positive_exponent: i64,
}

impl Default for MpsiConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            false_positive_exponent: DEFAULT_FALSE_POSITIVE_EXPONENT,
        }
    }
}

impl MpsiConfig {
    // ─────────────────────────────────────────────────────
    // Mise en place : paramètres du filtre dimensionnés sur
    // le plus grand ensemble (au moins 1), clés n-sur-n avec
    // n = clients + 1
    // ─────────────────────────────────────────────────────
    #[instrument(level = "info", skip_all, fields(key_bits = self.key_bits, clients = client_sets.len()))]
    pub fn setup<R: RngCore + CryptoRng>(
        &self,
        client_sets: &[Vec<u64>],
        coordinator_set: &[u64],
        rng: &mut R,
    ) -> Result<(BloomFilterParams, Keys), MpsiError> {
        if client_sets.is_empty() {
            return Err(MpsiError::NoClients);
        }

        let max_set_size = client_sets
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(coordinator_set.len()))
            .max()
            .unwrap_or(0)
            .max(1);

        let bf_params = derive_bloom_params(max_set_size, self.false_positive_exponent)?;
        let parties = client_sets.len() + 1;
        let keys = key_gen(self.key_bits, parties, parties, rng)?;

        info!(
            bin_count = bf_params.bin_count(),
            hash_count = bf_params.hash_count(),
            parties,
            "mise en place terminée"
        );
        Ok((bf_params, keys))
    }
}
