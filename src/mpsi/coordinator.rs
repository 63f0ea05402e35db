use num_bigint::BigUint;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::fmt;
use tracing::instrument;
use zeroize::Zeroizing;
use crate::crypto_error::MpsiError;
use crate::el_gamal::{encrypt, Ciphertext, PublicParameters};
use crate::math::random_in_range;
use crate::mpsi::fork_rngs;

// ============================================================================
// Élément aveuglé du coordinateur
//
// ciphertext = Enc(x+1) ⊗ Enc(r) = Enc((x+1)·r mod p)
// expected   = (x+1)·r mod p, gardé par le coordinateur pour le test final,
//              en octets big-endian effacés à la destruction.
// Le décalage x+1 évite de chiffrer 0.
// ============================================================================
#[derive(Clone)]
pub struct BlindedElement {
    pub element: u64,
    pub ciphertext: Ciphertext,
    expected: Zeroizing<Vec<u8>>,
}

impl BlindedElement {
    /// Vrai ssi le clair déchiffré égale la valeur d'aveuglement attendue.
    pub fn matches(&self, decrypted: &BigUint) -> bool {
        decrypted.to_bytes_be().as_slice() == self.expected.as_slice()
    }
}

impl fmt::Debug for BlindedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlindedElement")
            .field("element", &self.element)
            .field("ciphertext", &self.ciphertext)
            .finish_non_exhaustive()
    }
}

pub fn blind_element<R: RngCore + CryptoRng>(
    element: u64,
    params: &PublicParameters,
    rng: &mut R,
) -> Result<BlindedElement, MpsiError> {
    let p = &params.p;
    let shifted = BigUint::from(element) + BigUint::one();
    let r = random_in_range(rng, &BigUint::one(), &(p - BigUint::one()));

    let enc_x = encrypt(&shifted, params, rng)?;
    let enc_r = encrypt(&r, params, rng)?;

    Ok(BlindedElement {
        element,
        ciphertext: enc_x.mul(&enc_r, params),
        expected: Zeroizing::new(((shifted * r) % p).to_bytes_be()),
    })
}

// ---------------------------------------------------------------------------
// Phase coordinateur : aveuglement de chaque élément, en parallèle
// ---------------------------------------------------------------------------
#[instrument(level = "info", skip_all, fields(elements = coordinator_set.len()))]
pub fn blind_coordinator_set<R: RngCore + CryptoRng>(
    coordinator_set: &[u64],
    params: &PublicParameters,
    rng: &mut R,
) -> Result<Vec<BlindedElement>, MpsiError> {
    let rngs = fork_rngs(rng, coordinator_set.len());

    coordinator_set
        .par_iter()
        .zip(rngs)
        .map(|(&x, mut task_rng)| blind_element(x, params, &mut task_rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::el_gamal::{key_gen, threshold_decrypt};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn test_blinded_ciphertext_decrypts_to_expected() {
        let mut rng = ChaCha20Rng::seed_from_u64(51);
        let keys = key_gen(128, 2, 2, &mut rng).unwrap();

        let blinded = blind_element(0, &keys.params, &mut rng).unwrap();
        let m = threshold_decrypt(&blinded.ciphertext, &keys, &[1, 2]).unwrap();
        assert!(blinded.matches(&m));
        assert!(!blinded.matches(&(m.clone() + 1u32)));

        // La valeur d'aveuglement n'apparaît pas dans les journaux
        let printed = format!("{:?}", blinded);
        assert!(!printed.contains("expected"));
        assert!(!printed.contains(&m.to_string()));
    }

    #[test]
    fn test_blind_coordinator_set_keeps_order() {
        let mut rng = ChaCha20Rng::seed_from_u64(52);
        let keys = key_gen(128, 1, 1, &mut rng).unwrap();
        let set = [5u64, 1, 9, u64::MAX];

        let blinded = blind_coordinator_set(&set, &keys.params, &mut rng).unwrap();
        let elements: Vec<u64> = blinded.iter().map(|b| b.element).collect();
        assert_eq!(elements, set);

        for b in &blinded {
            let m = threshold_decrypt(&b.ciphertext, &keys, &[1]).unwrap();
            assert!(b.matches(&m));
        }
    }
}
