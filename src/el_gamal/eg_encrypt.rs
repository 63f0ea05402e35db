use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use crate::el_gamal::eg_keygen::PublicParameters;
use crate::crypto_error::MpsiError;
use crate::math::random_in_range;

// ============================================================================
// Chiffré ElGamal : (c1, c2) = (g^r, m·pk^r) mod p
// ============================================================================
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub c1: BigUint,
    pub c2: BigUint,
}

impl Ciphertext {
    /// Chiffré trivial de 1, neutre pour le produit homomorphe.
    pub fn identity() -> Self {
        Ciphertext {
            c1: BigUint::one(),
            c2: BigUint::one(),
        }
    }

    // Produit composante par composante : Enc(m1) ⊗ Enc(m2) = Enc(m1·m2 mod p)
    pub fn mul(&self, other: &Ciphertext, params: &PublicParameters) -> Ciphertext {
        Ciphertext {
            c1: (&self.c1 * &other.c1) % &params.p,
            c2: (&self.c2 * &other.c2) % &params.p,
        }
    }

    pub fn mul_assign(&mut self, other: &Ciphertext, params: &PublicParameters) {
        self.c1 = (&self.c1 * &other.c1) % &params.p;
        self.c2 = (&self.c2 * &other.c2) % &params.p;
    }

    /// Taille sérialisée (bincode) — sert uniquement aux compteurs d'octets.
    pub fn wire_size(&self) -> u64 {
        bincode::serialized_size(self).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Chiffrement ElGamal sous la clé publique agrégée.
//
// Retourne Err(MpsiError::MessageOutOfRange) si m = 0 ou m >= p. Les valeurs
// réservées du protocole (1 = appartenance) ne sont pas vérifiées ici : le
// décalage x + 1 et le tirage des bourrages dans [2, p-1] les garantissent.
// ---------------------------------------------------------------------------
pub fn encrypt<R: RngCore + CryptoRng>(
    message: &BigUint,
    params: &PublicParameters,
    rng: &mut R,
) -> Result<Ciphertext, MpsiError> {
    if message.is_zero() || message >= &params.p {
        return Err(MpsiError::MessageOutOfRange);
    }

    let r = random_in_range(rng, &BigUint::one(), &(&params.p - 2u32));

    let c1 = params.g.modpow(&r, &params.p);
    let c2 = (message * params.pk.modpow(&r, &params.p)) % &params.p;

    Ok(Ciphertext { c1, c2 })
}
