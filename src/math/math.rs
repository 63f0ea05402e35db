use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::{One, Zero};
use num_integer::Integer;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, instrument};
use crate::crypto_error::MpsiError;

// Taille minimale de clé acceptée : p doit dépasser tout élément u64 décalé de 1
pub const MIN_KEY_BITS: u64 = 128;

// Budget de candidats par bit demandé avant d'abandonner la recherche
const PRIME_ATTEMPTS_PER_BIT: u64 = 1_000;

// ---------------------------------------------------------------------------
// Table de petits premiers (crible préliminaire, couvre jusqu'à 2999)
// ---------------------------------------------------------------------------
const SMALL_PRIMES: &[u64] = &[
      3,   5,   7,  11,  13,  17,  19,  23,  29,  31,
     37,  41,  43,  47,  53,  59,  61,  67,  71,  73,
     79,  83,  89,  97, 101, 103, 107, 109, 113, 127,
    131, 137, 139, 149, 151, 157, 163, 167, 173, 179,
    181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283,
    293, 307, 311, 313, 317, 331, 337, 347, 349, 353,
    359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467,
    479, 487, 491, 499, 503, 509, 521, 523, 541, 547,
    557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661,
    673, 677, 683, 691, 701, 709, 719, 727, 733, 739,
    743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877,
    881, 883, 887, 907, 911, 919, 929, 937, 941, 947,
    953, 967, 971, 977, 983, 991, 997,1009,1013,1021,
   1031,1033,1039,1049,1051,1061,1063,1069,1087,1091,
   1093,1097,1103,1109,1117,1123,1129,1151,1153,1163,
   1171,1181,1187,1193,1201,1213,1217,1223,1229,1231,
   1237,1249,1259,1277,1279,1283,1289,1291,1297,1301,
   1303,1307,1319,1321,1327,1361,1367,1373,1381,1399,
   1409,1423,1427,1429,1433,1439,1447,1451,1453,1459,
   1471,1481,1483,1487,1489,1493,1499,1511,1523,1531,
   1543,1549,1553,1559,1567,1571,1579,1583,1597,1601,
   1607,1609,1613,1619,1621,1627,1637,1657,1663,1667,
   1669,1693,1697,1699,1709,1721,1723,1733,1741,1747,
   1753,1759,1777,1783,1787,1789,1801,1811,1823,1831,
   1847,1861,1867,1871,1873,1877,1879,1889,1901,1907,
   1913,1931,1933,1949,1951,1973,1979,1987,1993,1997,
   1999,2003,2011,2017,2027,2029,2039,2053,2063,2069,
   2081,2083,2087,2089,2099,2111,2113,2129,2131,2137,
   2141,2143,2153,2161,2179,2203,2207,2213,2221,2237,
   2239,2243,2251,2267,2269,2273,2281,2287,2293,2297,
   2309,2311,2333,2339,2341,2347,2351,2357,2371,2377,
   2381,2383,2389,2393,2399,2411,2417,2423,2437,2441,
   2447,2459,2467,2473,2477,2503,2521,2531,2539,2543,
   2549,2551,2557,2579,2591,2593,2609,2617,2621,2633,
   2647,2657,2659,2663,2671,2677,2683,2687,2689,2693,
   2699,2707,2711,2713,2719,2729,2731,2741,2749,2753,
   2767,2777,2789,2791,2797,2801,2803,2819,2833,2837,
   2843,2851,2857,2861,2879,2887,2897,2903,2909,2917,
   2927,2939,2953,2957,2963,2969,2971,2999,
];

// ---------------------------------------------------------------------------
// Nombre de rounds Miller-Rabin (erreur <= 4^-rounds par candidat)
// ---------------------------------------------------------------------------
fn miller_rabin_rounds(nbits: u64) -> u32 {
    if nbits >= 512 { 20 } else { 32 }
}

/// Safe prime p = 2q + 1 et son premier de Sophie Germain q.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafePrime {
    pub p: BigUint,
    pub q: BigUint,
}

// ---------------------------------------------------------------------------
// Génère q premier de `nbits - 1` bits tel que p = 2q + 1 soit premier.
//
// Les deux bits hauts de q sont forcés à 1 : p a donc exactement `nbits`
// bits. Le crible combiné rejette q si q ou 2q+1 a un petit facteur, avant
// tout Miller-Rabin.
// ---------------------------------------------------------------------------
#[instrument(level = "debug", skip(rng))]
pub fn generate_safe_prime<R: RngCore + CryptoRng>(
    nbits: u64,
    rng: &mut R,
) -> Result<SafePrime, MpsiError> {
    if nbits < MIN_KEY_BITS {
        return Err(MpsiError::KeySizeTooSmall {
            requested: nbits,
            minimum: MIN_KEY_BITS,
        });
    }

    let rounds = miller_rabin_rounds(nbits);
    let max_attempts = nbits * PRIME_ATTEMPTS_PER_BIT;

    for attempt in 1..=max_attempts {
        let mut sophie_germain = rng.gen_biguint(nbits - 1);
        sophie_germain.set_bit(nbits - 2, true);
        sophie_germain.set_bit(nbits - 3, true);
        sophie_germain.set_bit(0, true);

        if combined_sieve(&sophie_germain) {
            continue;
        }
        if !is_probable_prime(&sophie_germain, rounds, rng) {
            continue;
        }

        let safe_prime = (&sophie_germain << 1) + BigUint::one();
        if is_probable_prime(&safe_prime, rounds, rng) {
            debug_assert_eq!(safe_prime.bits(), nbits);
            debug!(attempt, "safe prime trouvé");
            return Ok(SafePrime { p: safe_prime, q: sophie_germain });
        }
    }

    Err(MpsiError::PrimeGenerationFailed {
        bits: nbits,
        attempts: max_attempts,
    })
}

// Vrai si q ou 2q+1 est divisible par un petit premier (candidat rejeté)
fn combined_sieve(sophie_germain: &BigUint) -> bool {
    for &sp in SMALL_PRIMES {
        let bp = BigUint::from(sp);
        if sophie_germain == &bp {
            return false;
        }

        let r = (sophie_germain % &bp).iter_u64_digits().next().unwrap_or(0);
        if r == 0 || (2 * r + 1) % sp == 0 {
            return true;
        }
    }
    false
}

pub fn is_probable_prime<R: RngCore + CryptoRng>(n: &BigUint, rounds: u32, rng: &mut R) -> bool {
    let two = BigUint::from(2u32);
    if n < &two { return false; }
    if n == &two || n == &BigUint::from(3u32) { return true; }
    if n.is_even() { return false; }
    for &p in SMALL_PRIMES {
        let bp = BigUint::from(p);
        if n == &bp { return true; }
        if (n % &bp).is_zero() { return false; }
    }

    let n_minus_1 = n - BigUint::one();
    let mut d = n_minus_1.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 0..r.saturating_sub(1) {
            x = (&x * &x) % n;
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Tirage uniforme dans [low, high] (bornes incluses)
// ---------------------------------------------------------------------------
pub fn random_in_range<R: RngCore + CryptoRng>(
    rng: &mut R,
    low: &BigUint,
    high: &BigUint,
) -> BigUint {
    rng.gen_biguint_range(low, &(high + BigUint::one()))
}

// ---------------------------------------------------------------------------
// Calcule l'inverse modulaire de a mod n.
// Retourne Err(MpsiError::NoModularInverse) si gcd(a,n) != 1.
// ---------------------------------------------------------------------------
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Result<BigUint, MpsiError> {
    let (g, x) = extended_gcd(a, n);
    if !g.is_one() {
        return Err(MpsiError::NoModularInverse);
    }

    let n_big = BigInt::from(n.clone());
    let mut x_mod = x % &n_big;
    if x_mod < BigInt::zero() {
        x_mod += &n_big;
    }

    x_mod.to_biguint().ok_or(MpsiError::NegativeConversion)
}

// Retourne (pgcd, s) avec a·s ≡ pgcd (mod b)
fn extended_gcd(a: &BigUint, b: &BigUint) -> (BigUint, BigInt) {
    let (mut old_r, mut r) = (BigInt::from(a.clone()), BigInt::from(b.clone()));
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let quotient = &old_r / &r;

        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &quotient * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    (old_r.to_biguint().unwrap_or_default(), old_s)
}

// ---------------------------------------------------------------------------
// Réduction d'un entier signé dans [0, m)
// ---------------------------------------------------------------------------
pub fn reduce_signed(value: i64, m: &BigUint) -> BigUint {
    let m_big = BigInt::from(m.clone());
    let mut r = BigInt::from(value) % &m_big;
    if r < BigInt::zero() {
        r += &m_big;
    }
    // r est dans [0, m) : la conversion ne peut pas échouer
    r.to_biguint().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn test_safe_prime_structure() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let sp = generate_safe_prime(128, &mut rng).unwrap();
        assert_eq!(sp.p.bits(), 128);
        assert_eq!(sp.p, (&sp.q << 1) + BigUint::one());
        assert!(is_probable_prime(&sp.q, 16, &mut rng));
        assert!(is_probable_prime(&sp.p, 16, &mut rng));
    }

    #[test]
    fn test_safe_prime_rejects_small_size() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert_eq!(
            generate_safe_prime(64, &mut rng),
            Err(MpsiError::KeySizeTooSmall { requested: 64, minimum: MIN_KEY_BITS })
        );
    }

    #[test]
    fn test_is_probable_prime_small_values() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let primes = [2u32, 3, 5, 7919, 104_729];
        let composites = [0u32, 1, 4, 561, 7917, 104_727];
        for p in primes {
            assert!(is_probable_prime(&BigUint::from(p), 8, &mut rng), "{p}");
        }
        for c in composites {
            assert!(!is_probable_prime(&BigUint::from(c), 8, &mut rng), "{c}");
        }
    }

    #[test]
    fn test_mod_inverse() {
        let n = BigUint::from(1_000_003u32);
        let a = BigUint::from(12_345u32);
        let inv = mod_inverse(&a, &n).unwrap();
        assert_eq!((&a * &inv) % &n, BigUint::one());

        assert_eq!(
            mod_inverse(&BigUint::from(6u32), &BigUint::from(9u32)),
            Err(MpsiError::NoModularInverse)
        );
    }

    #[test]
    fn test_reduce_signed() {
        let m = BigUint::from(11u32);
        assert_eq!(reduce_signed(-3, &m), BigUint::from(8u32));
        assert_eq!(reduce_signed(25, &m), BigUint::from(3u32));
        assert_eq!(reduce_signed(0, &m), BigUint::zero());
    }

    #[test]
    fn test_random_in_range_is_inclusive() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let low = BigUint::from(2u32);
        let high = BigUint::from(3u32);
        let mut seen_high = false;
        for _ in 0..200 {
            let v = random_in_range(&mut rng, &low, &high);
            assert!(v >= low && v <= high);
            seen_high |= v == high;
        }
        assert!(seen_high);
    }
}
