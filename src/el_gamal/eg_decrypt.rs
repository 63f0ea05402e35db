use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::collections::HashSet;
use crate::el_gamal::eg_encrypt::Ciphertext;
use crate::el_gamal::eg_keygen::{Keys, PublicParameters};
use crate::crypto_error::MpsiError;
use crate::math::{mod_inverse, reduce_signed};

// ============================================================================
// Déchiffrement à seuil
//
// Chaque partie i publie sh_i = c1^(λ_i · s_i mod q). Le produit des parts
// vaut c1^sk dès que Σ λ_i·s_i ≡ sk (mod q), c'est-à-dire quand les
// coefficients de Lagrange sont calculés sur l'ensemble exact des parties
// participantes. Le clair est alors c2 / Π sh_i.
// ============================================================================

/// Part de déchiffrement partielle publiée par la partie `index`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionShare {
    pub index: usize,
    pub value: BigUint,
}

// ---------------------------------------------------------------------------
// Coefficient de Lagrange en x = 0 pour les points 1..t :
//   δ_i = Π_{j≠i, 1≤j≤t} j · (j - i)^-1  mod q
// ---------------------------------------------------------------------------
pub fn compute_delta(i: usize, t: usize, q: &BigUint) -> Result<BigUint, MpsiError> {
    let points: Vec<usize> = (1..=t).collect();
    lagrange_coefficient(i, &points, q)
}

fn lagrange_coefficient(i: usize, points: &[usize], q: &BigUint) -> Result<BigUint, MpsiError> {
    let mut num = BigUint::one();
    let mut den = BigUint::one();
    for &j in points.iter().filter(|&&j| j != i) {
        num = (num * BigUint::from(j)) % q;
        den = (den * reduce_signed(j as i64 - i as i64, q)) % q;
    }
    Ok((num * mod_inverse(&den, q)?) % q)
}

// ---------------------------------------------------------------------------
// Coefficients de Lagrange restreints au sous-ensemble `indices` (1-based).
// C'est la forme à utiliser pour un vrai déchiffrement t-parmi-n.
// ---------------------------------------------------------------------------
pub fn lagrange_coefficients(indices: &[usize], q: &BigUint) -> Result<Vec<BigUint>, MpsiError> {
    indices
        .iter()
        .map(|&i| lagrange_coefficient(i, indices, q))
        .collect()
}

/// sh_i = c1^(δ_i · sk_i mod q) mod p
pub fn compute_share(c1: &BigUint, sk_i: &BigUint, delta_i: &BigUint, params: &PublicParameters) -> BigUint {
    let exponent = (delta_i * sk_i) % &params.q;
    c1.modpow(&exponent, &params.p)
}

pub fn combine_shares<'a, I>(shares: I, params: &PublicParameters) -> BigUint
where
    I: IntoIterator<Item = &'a BigUint>,
{
    shares
        .into_iter()
        .fold(BigUint::one(), |acc, s| (acc * s) % &params.p)
}

/// m = c2 · (Π sh_i)^-1 mod p
pub fn finish_decryption(ct: &Ciphertext, combined: &BigUint, params: &PublicParameters) -> Result<BigUint, MpsiError> {
    let inv = mod_inverse(combined, &params.p)?;
    Ok((&ct.c2 * inv) % &params.p)
}

// Vérifie les indices : dans [1, n], sans doublon, au moins t
fn check_participants(participants: &[usize], keys: &Keys) -> Result<(), MpsiError> {
    if participants.len() < keys.threshold {
        return Err(MpsiError::NotEnoughShares {
            required: keys.threshold,
            provided: participants.len(),
        });
    }
    let mut seen = HashSet::with_capacity(participants.len());
    for &index in participants {
        keys.check_index(index)?;
        if !seen.insert(index) {
            return Err(MpsiError::DuplicateShareIndex(index));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Part partielle d'une partie, à partir de son coefficient déjà calculé
// ---------------------------------------------------------------------------
pub fn partial_decrypt(
    ct: &Ciphertext,
    keys: &Keys,
    index: usize,
    delta: &BigUint,
) -> Result<DecryptionShare, MpsiError> {
    let value = compute_share(&ct.c1, &keys.share(index)?, delta, &keys.params);
    Ok(DecryptionShare { index, value })
}

// ---------------------------------------------------------------------------
// Déchiffrement t-parmi-n avec les parties `participants`
// ---------------------------------------------------------------------------
pub fn threshold_decrypt(ct: &Ciphertext, keys: &Keys, participants: &[usize]) -> Result<BigUint, MpsiError> {
    check_participants(participants, keys)?;
    let deltas = lagrange_coefficients(participants, &keys.params.q)?;

    let shares = participants
        .iter()
        .zip(&deltas)
        .map(|(&i, delta)| partial_decrypt(ct, keys, i, delta).map(|s| s.value))
        .collect::<Result<Vec<_>, _>>()?;

    finish_decryption(ct, &combine_shares(&shares, &keys.params), &keys.params)
}

// ---------------------------------------------------------------------------
// Reconstruction de sk = Σ λ_i·s_i mod q (tests et vérification uniquement :
// le protocole ne reconstruit jamais la clé maîtresse)
// ---------------------------------------------------------------------------
pub fn reconstruct_secret(keys: &Keys, participants: &[usize]) -> Result<BigUint, MpsiError> {
    check_participants(participants, keys)?;
    let q = &keys.params.q;
    let deltas = lagrange_coefficients(participants, q)?;

    let mut sk = BigUint::zero();
    for (&i, delta) in participants.iter().zip(&deltas) {
        sk = (sk + delta * keys.share(i)?) % q;
    }
    Ok(sk)
}

/// Déchiffrement direct avec la clé maîtresse : m = c2 · c1^-sk mod p
pub fn decrypt_with_secret(ct: &Ciphertext, sk: &BigUint, params: &PublicParameters) -> Result<BigUint, MpsiError> {
    finish_decryption(ct, &ct.c1.modpow(sk, &params.p), params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::el_gamal::eg_encrypt::encrypt;
    use crate::el_gamal::eg_keygen::key_gen;
    use proptest::prelude::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn test_compute_delta_small_field() {
        // t = 3, q = 11 : δ_1 = 3, δ_2 = -3 = 8, δ_3 = 1
        let q = BigUint::from(11u32);
        assert_eq!(compute_delta(1, 3, &q).unwrap(), BigUint::from(3u32));
        assert_eq!(compute_delta(2, 3, &q).unwrap(), BigUint::from(8u32));
        assert_eq!(compute_delta(3, 3, &q).unwrap(), BigUint::from(1u32));
    }

    #[test]
    fn test_deltas_sum_to_one() {
        // Σ δ_i ≡ 1 (mod q) : interpolation du polynôme constant 1
        let q = BigUint::from(1_000_003u32);
        let t = 5;
        let sum = (1..=t)
            .map(|i| compute_delta(i, t, &q).unwrap())
            .fold(BigUint::zero(), |acc, d| (acc + d) % &q);
        assert_eq!(sum, BigUint::one());
    }

    #[test]
    fn test_full_party_decryption() {
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        let keys = key_gen(128, 3, 3, &mut rng).unwrap();
        let m = BigUint::from(123_456u32);
        let ct = encrypt(&m, &keys.params, &mut rng).unwrap();
        assert_eq!(threshold_decrypt(&ct, &keys, &[1, 2, 3]).unwrap(), m);
    }

    #[test]
    fn test_true_threshold_subset() {
        let mut rng = ChaCha20Rng::seed_from_u64(32);
        let keys = key_gen(128, 2, 4, &mut rng).unwrap();
        let m = BigUint::from(777u32);
        let ct = encrypt(&m, &keys.params, &mut rng).unwrap();

        for subset in [[1, 2], [2, 4], [3, 1], [4, 3]] {
            assert_eq!(threshold_decrypt(&ct, &keys, &subset).unwrap(), m);
        }
        assert_eq!(threshold_decrypt(&ct, &keys, &[1, 2, 3, 4]).unwrap(), m);
    }

    #[test]
    fn test_threshold_input_checks() {
        let mut rng = ChaCha20Rng::seed_from_u64(33);
        let keys = key_gen(128, 2, 3, &mut rng).unwrap();
        let ct = encrypt(&BigUint::from(5u32), &keys.params, &mut rng).unwrap();

        assert_eq!(
            threshold_decrypt(&ct, &keys, &[1]),
            Err(MpsiError::NotEnoughShares { required: 2, provided: 1 })
        );
        assert_eq!(
            threshold_decrypt(&ct, &keys, &[2, 2]),
            Err(MpsiError::DuplicateShareIndex(2))
        );
        assert_eq!(
            threshold_decrypt(&ct, &keys, &[1, 4]),
            Err(MpsiError::ShareIndexOutOfRange { index: 4, parties: 3 })
        );
    }

    #[test]
    fn test_reconstruct_secret_matches_public_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(34);
        let keys = key_gen(128, 3, 5, &mut rng).unwrap();
        let pp = &keys.params;
        let sk = reconstruct_secret(&keys, &[5, 1, 3]).unwrap();
        assert_eq!(pp.g.modpow(&sk, &pp.p), pp.pk);
        assert_eq!(reconstruct_secret(&keys, &[2, 4, 1]).unwrap(), sk);
    }

    #[test]
    fn test_partial_decrypt_combination() {
        let mut rng = ChaCha20Rng::seed_from_u64(35);
        let keys = key_gen(128, 2, 2, &mut rng).unwrap();
        let m = BigUint::from(31u32);
        let ct = encrypt(&m, &keys.params, &mut rng).unwrap();

        let shares: Vec<BigUint> = (1..=2)
            .map(|i| {
                let delta = compute_delta(i, 2, &keys.params.q).unwrap();
                partial_decrypt(&ct, &keys, i, &delta).unwrap().value
            })
            .collect();
        let combined = combine_shares(&shares, &keys.params);
        assert_eq!(finish_decryption(&ct, &combined, &keys.params).unwrap(), m);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_homomorphic_product(seed in any::<u64>(), m1 in 1u64..u64::MAX, m2 in 1u64..u64::MAX) {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let keys = key_gen(128, 2, 3, &mut rng).unwrap();
            let pp = &keys.params;
            let (a, b) = (BigUint::from(m1), BigUint::from(m2));

            let product = encrypt(&a, pp, &mut rng).unwrap().mul(&encrypt(&b, pp, &mut rng).unwrap(), pp);
            let expected = (&a * &b) % &pp.p;
            prop_assert_eq!(threshold_decrypt(&product, &keys, &[1, 3]).unwrap(), expected);
        }

        #[test]
        fn prop_threshold_matches_direct_decryption(seed in any::<u64>(), m in 1u64..u64::MAX) {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let keys = key_gen(128, 3, 4, &mut rng).unwrap();
            let ct = encrypt(&BigUint::from(m), &keys.params, &mut rng).unwrap();

            let sk = reconstruct_secret(&keys, &[1, 2, 3]).unwrap();
            let direct = decrypt_with_secret(&ct, &sk, &keys.params).unwrap();
            prop_assert_eq!(threshold_decrypt(&ct, &keys, &[4, 2, 1]).unwrap(), direct.clone());
            prop_assert_eq!(direct, BigUint::from(m));
        }
    }
}
