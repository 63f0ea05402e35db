use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::LN_2;
use crate::bloom_filter::bloom_filter::hash_element;
use crate::crypto_error::MpsiError;

// ============================================================================
// Paramètres du filtre de Bloom
//
// Pour un taux de faux positifs ε = 2^e (e < 0) et une charge attendue n :
//   k = -e                    fonctions de hachage (graines 0..k-1)
//   m = ceil(-(n·e) / ln 2)   cases
//
// C'est l'optimum fermé m = -n·ln ε / (ln 2)², avec ln ε = e·ln 2.
// Tous les filtres d'une même exécution partagent ces paramètres : les
// cases sont alignées d'une partie à l'autre.
//
// Invariants : m >= 1, k >= 1, graines distinctes. Ils sont vérifiés à la
// construction comme à la désérialisation (champs privés).
// ============================================================================
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBloomFilterParams")]
pub struct BloomFilterParams {
    bin_count: usize,
    seeds: Vec<u64>,
}

// Forme sérialisée brute, validée par TryFrom
#[derive(Deserialize)]
struct RawBloomFilterParams {
    bin_count: usize,
    seeds: Vec<u64>,
}

impl TryFrom<RawBloomFilterParams> for BloomFilterParams {
    type Error = MpsiError;

    fn try_from(raw: RawBloomFilterParams) -> Result<Self, Self::Error> {
        BloomFilterParams::from_parts(raw.bin_count, raw.seeds)
    }
}

impl BloomFilterParams {
    pub fn new(element_count: usize, false_positive_exponent: i64) -> Result<Self, MpsiError> {
        if element_count == 0 || false_positive_exponent >= 0 {
            return Err(MpsiError::InvalidBloomParams {
                element_count,
                exponent: false_positive_exponent,
            });
        }

        let hash_count = false_positive_exponent.unsigned_abs();
        let n = element_count as f64;
        let e = false_positive_exponent as f64;
        let bin_count = (-(n * e) / LN_2).ceil().max(1.0) as usize;

        Ok(BloomFilterParams {
            bin_count,
            seeds: (0..hash_count).collect(),
        })
    }

    // -----------------------------------------------------------------------
    // Paramètres explicites (graines choisies par l'appelant).
    // Refuse m = 0, k = 0 et les graines répétées.
    // -----------------------------------------------------------------------
    pub fn from_parts(bin_count: usize, seeds: Vec<u64>) -> Result<Self, MpsiError> {
        let mut seen = HashSet::with_capacity(seeds.len());
        let distinct = seeds.iter().all(|s| seen.insert(*s));
        if bin_count == 0 || seeds.is_empty() || !distinct {
            return Err(MpsiError::InvalidBloomLayout {
                bin_count,
                hash_count: seeds.len(),
            });
        }
        Ok(BloomFilterParams { bin_count, seeds })
    }

    /// Nombre m de cases.
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    /// Nombre k de fonctions de hachage.
    pub fn hash_count(&self) -> usize {
        self.seeds.len()
    }

    /// Les k cases associées à un élément, dans l'ordre des graines.
    pub fn bin_indices(&self, element: u64) -> impl Iterator<Item = usize> + '_ {
        self.seeds
            .iter()
            .map(move |&seed| (hash_element(element, seed) % self.bin_count as u64) as usize)
    }
}

/// Dérive les paramètres à partir de la plus grande taille d'ensemble et de
/// l'exposant du taux de faux positifs visé.
pub fn derive_bloom_params(
    max_set_size: usize,
    false_positive_exponent: i64,
) -> Result<BloomFilterParams, MpsiError> {
    BloomFilterParams::new(max_set_size, false_positive_exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_params_closed_form() {
        // m = ceil(10 · 100 / ln 2) = ceil(1442.69...) = 1443
        let params = derive_bloom_params(100, -10).unwrap();
        assert_eq!(params.bin_count(), 1443);
        assert_eq!(params.seeds(), (0..10).collect::<Vec<u64>>().as_slice());
        assert_eq!(params.hash_count(), 10);
    }

    #[test]
    fn test_params_reject_invalid_inputs() {
        assert_eq!(
            BloomFilterParams::new(0, -10),
            Err(MpsiError::InvalidBloomParams { element_count: 0, exponent: -10 })
        );
        assert!(BloomFilterParams::new(10, 0).is_err());
        assert!(BloomFilterParams::new(10, 3).is_err());
    }

    #[test]
    fn test_from_parts_enforces_layout() {
        let params = BloomFilterParams::from_parts(16, vec![3, 7]).unwrap();
        assert_eq!(params.bin_count(), 16);
        assert_eq!(params.hash_count(), 2);

        assert_eq!(
            BloomFilterParams::from_parts(16, vec![]),
            Err(MpsiError::InvalidBloomLayout { bin_count: 16, hash_count: 0 })
        );
        assert_eq!(
            BloomFilterParams::from_parts(0, vec![1]),
            Err(MpsiError::InvalidBloomLayout { bin_count: 0, hash_count: 1 })
        );
        assert_eq!(
            BloomFilterParams::from_parts(16, vec![4, 4]),
            Err(MpsiError::InvalidBloomLayout { bin_count: 16, hash_count: 2 })
        );
    }

    #[test]
    fn test_deserialize_validates_layout() {
        let params = derive_bloom_params(20, -6).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(serde_json::from_str::<BloomFilterParams>(&json).unwrap(), params);

        assert!(serde_json::from_str::<BloomFilterParams>(r#"{"bin_count":16,"seeds":[]}"#).is_err());
        assert!(serde_json::from_str::<BloomFilterParams>(r#"{"bin_count":0,"seeds":[0,1]}"#).is_err());
        assert!(serde_json::from_str::<BloomFilterParams>(r#"{"bin_count":8,"seeds":[2,2]}"#).is_err());
    }

    #[test]
    fn test_bin_indices_are_in_range_and_deterministic() {
        let params = derive_bloom_params(5, -8).unwrap();
        let a: Vec<usize> = params.bin_indices(42).collect();
        let b: Vec<usize> = params.bin_indices(42).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.iter().all(|&i| i < params.bin_count()));
    }

    proptest! {
        #[test]
        fn prop_params_law(n in 1usize..100_000, e in -60i64..=-1) {
            let params = derive_bloom_params(n, e).unwrap();
            prop_assert!(params.bin_count() >= 1);
            prop_assert_eq!(params.seeds().len() as i64, -e);
        }
    }
}
