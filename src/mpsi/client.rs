use num_bigint::BigUint;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, instrument};
use crate::bloom_filter::{BloomFilter, BloomFilterParams};
use crate::crypto_error::MpsiError;
use crate::el_gamal::{encrypt, Ciphertext, PublicParameters};
use crate::math::random_in_range;
use crate::mpsi::fork_rngs;

// ============================================================================
// ERBF — filtre de Bloom chiffré et randomisé
//
// Case l : Enc(1) si le bit l est à 1, sinon Enc(u) avec u uniforme dans
// [2, p-1]. Produit une fois par client et par exécution, consommé par le
// coordinateur pendant la phase en ligne.
// ============================================================================
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Erbf {
    pub bins: Vec<Ciphertext>,
}

impl Erbf {
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Octets envoyés au coordinateur pour ce filtre.
    pub fn wire_size(&self) -> u64 {
        self.bins.iter().map(Ciphertext::wire_size).sum()
    }

    // Refuse tout ERBF non aligné sur les paramètres de l'exécution
    pub fn check_params(&self, bf_params: &BloomFilterParams) -> Result<(), MpsiError> {
        if self.bins.len() != bf_params.bin_count() {
            return Err(MpsiError::ParamsMismatch {
                expected: bf_params.bin_count(),
                actual: self.bins.len(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Chiffrement case par case d'un filtre déjà rempli
// ---------------------------------------------------------------------------
pub fn encode_erbf<R: RngCore + CryptoRng>(
    bf: &BloomFilter,
    params: &PublicParameters,
    rng: &mut R,
) -> Result<Erbf, MpsiError> {
    let one = BigUint::one();
    let low = BigUint::from(2u32);
    let high = &params.p - BigUint::one();

    let bins = bf
        .bits()
        .map(|bit| {
            if bit {
                encrypt(&one, params, rng)
            } else {
                let filler = random_in_range(rng, &low, &high);
                encrypt(&filler, params, rng)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Erbf { bins })
}

// ---------------------------------------------------------------------------
// Phase client : filtre de Bloom de l'ensemble puis ERBF
// ---------------------------------------------------------------------------
pub fn prepare_client<R: RngCore + CryptoRng>(
    set: &[u64],
    bf_params: &BloomFilterParams,
    params: &PublicParameters,
    rng: &mut R,
) -> Result<Erbf, MpsiError> {
    let bf = BloomFilter::from_set(bf_params, set);
    debug!(
        elements = set.len(),
        set_bits = bf.set_bits_count(),
        bin_count = bf.bin_count(),
        "filtre de Bloom client construit"
    );
    encode_erbf(&bf, params, rng)
}

/// ERBF d'un client et durée de sa préparation (ms).
pub(crate) struct PreparedClient {
    pub erbf: Erbf,
    pub elapsed_ms: f64,
}

// ---------------------------------------------------------------------------
// Préparation de tous les clients en parallèle, un flux ChaCha20 par client
// ---------------------------------------------------------------------------
#[instrument(level = "info", skip_all, fields(clients = client_sets.len(), bins = bf_params.bin_count()))]
pub(crate) fn prepare_clients_timed<R: RngCore + CryptoRng>(
    client_sets: &[Vec<u64>],
    bf_params: &BloomFilterParams,
    params: &PublicParameters,
    rng: &mut R,
) -> Result<Vec<PreparedClient>, MpsiError> {
    let rngs = fork_rngs(rng, client_sets.len());

    client_sets
        .par_iter()
        .zip(rngs)
        .map(|(set, mut task_rng)| -> Result<PreparedClient, MpsiError> {
            let start = Instant::now();
            let erbf = prepare_client(set, bf_params, params, &mut task_rng)?;
            Ok(PreparedClient {
                erbf,
                elapsed_ms: start.elapsed().as_secs_f64() * 1_000.0,
            })
        })
        .collect()
}

pub fn prepare_clients<R: RngCore + CryptoRng>(
    client_sets: &[Vec<u64>],
    bf_params: &BloomFilterParams,
    params: &PublicParameters,
    rng: &mut R,
) -> Result<Vec<Erbf>, MpsiError> {
    Ok(prepare_clients_timed(client_sets, bf_params, params, rng)?
        .into_iter()
        .map(|prepared| prepared.erbf)
        .collect())
}
