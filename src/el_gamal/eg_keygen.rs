use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};
use zeroize::{Zeroize, ZeroizeOnDrop};
use crate::crypto_error::MpsiError;
use crate::math::{generate_safe_prime, random_in_range};

// ============================================================================
// Paramètres publics — pas de données secrètes, pas de zeroize nécessaire
//
//   p  = 2q + 1   safe prime
//   g             générateur du sous-groupe d'ordre q
//   pk = g^sk     clé publique agrégée
// ============================================================================
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicParameters {
    pub p:  BigUint,
    pub q:  BigUint,
    pub g:  BigUint,
    pub pk: BigUint,
}

// ============================================================================
// Part secrète d'une partie : octets big-endian de f(i) mod q
//
// Le tampon est effacé (zeroize) à la destruction et par Keys::zeroize.
// Les BigUint décodés pour le calcul ne le sont pas : num-bigint n'expose
// pas ses limbs.
// ============================================================================
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretShare(Vec<u8>);

impl SecretShare {
    fn from_biguint(value: &BigUint) -> Self {
        SecretShare(value.to_bytes_be())
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }
}

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretShare(***)")
    }
}

// ============================================================================
// Clés du protocole — parts secrètes ZEROISÉES À LA DESTRUCTION
//
// key_shares[i-1] = f(i) mod q pour la partie i ∈ [1, n], où f est un
// polynôme aléatoire de degré t-1 sur Z_q de terme constant sk.
// sk lui-même n'est jamais conservé.
// ============================================================================
#[derive(Clone, Zeroize)]
pub struct Keys {
    #[zeroize(skip)]
    pub params:     PublicParameters,
    key_shares:     Vec<SecretShare>,
    #[zeroize(skip)]
    pub threshold:  usize,
}

impl Keys {
    /// Nombre n de parties détentrices d'une part.
    pub fn party_count(&self) -> usize {
        self.key_shares.len()
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<(), MpsiError> {
        if index == 0 || index > self.key_shares.len() {
            return Err(MpsiError::ShareIndexOutOfRange {
                index,
                parties: self.key_shares.len(),
            });
        }
        Ok(())
    }

    /// Part de la partie `index` (indices 1..=n), décodée.
    pub fn share(&self, index: usize) -> Result<BigUint, MpsiError> {
        self.check_index(index)?;
        Ok(self.key_shares[index - 1].to_biguint())
    }
}

// Les parts n'apparaissent jamais dans les journaux
impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("params", &self.params)
            .field("key_shares", &format_args!("[{} parts masquées]", self.key_shares.len()))
            .field("threshold", &self.threshold)
            .finish()
    }
}

// ============================================================================
// Recherche du générateur
//
// h parcourt 2, 3, ... jusqu'à un générateur de Z_p^* : h^q != 1 et h^2 != 1
// (les seuls ordres possibles sont 1, 2, q, 2q). g = h² engendre alors le
// sous-groupe d'ordre q. Termine en quelques essais avec probabilité écrasante.
// ============================================================================
fn find_subgroup_generator(p: &BigUint, q: &BigUint) -> BigUint {
    let two = BigUint::from(2u32);
    let mut h = two.clone();
    while h.modpow(q, p).is_one() || h.modpow(&two, p).is_one() {
        h += 1u32;
    }
    h.modpow(&two, p)
}

// Évaluation de Horner de f en x, modulo q
fn eval_polynomial(coefficients: &[BigUint], x: &BigUint, q: &BigUint) -> BigUint {
    coefficients
        .iter()
        .rev()
        .fold(BigUint::zero(), |acc, a| (acc * x + a) % q)
}

// ============================================================================
// Génération des clés à seuil
//
// bit_length : taille de p (q a bit_length - 1 bits)
// threshold  : t, nombre de parts nécessaires au déchiffrement
// party_count: n, nombre de parts produites (points d'évaluation 1..n)
// ============================================================================
#[instrument(level = "info", skip(rng))]
pub fn key_gen<R: RngCore + CryptoRng>(
    bit_length: u64,
    threshold: usize,
    party_count: usize,
    rng: &mut R,
) -> Result<Keys, MpsiError> {
    if threshold == 0 || party_count == 0 || threshold > party_count {
        return Err(MpsiError::InvalidThreshold {
            threshold,
            parties: party_count,
        });
    }

    let safe = generate_safe_prime(bit_length, rng)?;
    let (p, q) = (safe.p, safe.q);
    let g = find_subgroup_generator(&p, &q);

    let q_minus_1 = &q - BigUint::one();
    let mut coefficients: Vec<BigUint> = Vec::with_capacity(threshold);
    coefficients.push(random_in_range(rng, &BigUint::one(), &q_minus_1));
    for _ in 1..threshold {
        coefficients.push(random_in_range(rng, &BigUint::zero(), &q_minus_1));
    }

    let pk = g.modpow(&coefficients[0], &p);

    let key_shares = (1..=party_count)
        .map(|i| SecretShare::from_biguint(&eval_polynomial(&coefficients, &BigUint::from(i), &q)))
        .collect();

    debug!(p_bits = p.bits(), "clés générées");

    Ok(Keys {
        params: PublicParameters { p, q, g, pk },
        key_shares,
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn test_key_gen_structure() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let keys = key_gen(128, 2, 3, &mut rng).unwrap();
        let pp = &keys.params;

        assert_eq!(pp.p, (&pp.q << 1) + BigUint::one());
        // g est d'ordre q : g != 1 et g^q = 1
        assert!(!pp.g.is_one());
        assert!(pp.g.modpow(&pp.q, &pp.p).is_one());
        assert!(pp.pk.modpow(&pp.q, &pp.p).is_one());

        assert_eq!(keys.party_count(), 3);
        assert_eq!(keys.threshold, 2);
        assert!((1..=3).all(|i| keys.share(i).unwrap() < pp.q));
    }

    #[test]
    fn test_key_gen_rejects_bad_threshold() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert_eq!(
            key_gen(128, 4, 3, &mut rng).unwrap_err(),
            MpsiError::InvalidThreshold { threshold: 4, parties: 3 }
        );
        assert!(key_gen(128, 0, 3, &mut rng).is_err());
    }

    #[test]
    fn test_key_gen_propagates_prime_failure() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(matches!(
            key_gen(32, 1, 1, &mut rng),
            Err(MpsiError::KeySizeTooSmall { requested: 32, .. })
        ));
    }

    #[test]
    fn test_share_accessor_is_one_based() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let keys = key_gen(128, 2, 2, &mut rng).unwrap();
        assert_eq!(keys.share(1).unwrap(), keys.key_shares[0].to_biguint());
        assert_eq!(
            keys.share(0),
            Err(MpsiError::ShareIndexOutOfRange { index: 0, parties: 2 })
        );
        assert!(keys.share(3).is_err());
    }

    #[test]
    fn test_eval_polynomial_horner() {
        // f(x) = 3 + 2x + x² mod 101, f(5) = 38
        let coeffs = [3u32, 2, 1].map(BigUint::from);
        let q = BigUint::from(101u32);
        assert_eq!(eval_polynomial(&coeffs, &BigUint::from(5u32), &q), BigUint::from(38u32));
    }

    #[test]
    fn test_zeroize_clears_shares() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut keys = key_gen(128, 1, 2, &mut rng).unwrap();
        assert_eq!(keys.party_count(), 2);
        keys.zeroize();
        assert_eq!(keys.party_count(), 0);
        assert!(keys.share(1).is_err());
        // Les paramètres publics restent utilisables
        assert!(!keys.params.p.is_zero());
    }

    #[test]
    fn test_secret_share_wipes_its_bytes() {
        let mut share = SecretShare::from_biguint(&BigUint::from(0xdead_beef_u32));
        assert_eq!(share.0, vec![0xde, 0xad, 0xbe, 0xef]);
        share.zeroize();
        assert!(share.0.is_empty());
        assert!(share.to_biguint().is_zero());
    }

    #[test]
    fn test_debug_hides_shares() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let keys = key_gen(128, 2, 2, &mut rng).unwrap();
        let printed = format!("{:?}", keys);
        for i in 1..=2 {
            assert!(!printed.contains(&keys.share(i).unwrap().to_string()));
        }
        assert!(printed.contains("2 parts masquées"));
        assert_eq!(format!("{:?}", keys.key_shares[0]), "SecretShare(***)");
    }
}
