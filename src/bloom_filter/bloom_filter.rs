use xxhash_rust::xxh3::xxh3_64_with_seed;
use crate::bloom_filter::bf_params::BloomFilterParams;
use crate::crypto_error::MpsiError;

const WORD_BITS: usize = 64;

// ---------------------------------------------------------------------------
// Hachage d'un élément : XXH3-64 de ses 8 octets little-endian, avec graine.
// Les k fonctions du filtre ne diffèrent que par la graine.
// ---------------------------------------------------------------------------
pub fn hash_element(element: u64, seed: u64) -> u64 {
    xxh3_64_with_seed(&element.to_le_bytes(), seed)
}

// ============================================================================
// Filtre de Bloom — tableau de `bin_count` bits empaquetés en mots de 64 bits
//
// Une case n'est remise à zéro que par clear(). Un filtre appartient à une
// seule partie pour une exécution du protocole.
// ============================================================================
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    words: Vec<u64>,
    bin_count: usize,
    seeds: Vec<u64>,
}

impl BloomFilter {
    /// Filtre vide aligné sur `params`.
    pub fn build(params: &BloomFilterParams) -> Self {
        BloomFilter {
            words: vec![0u64; params.bin_count().div_ceil(WORD_BITS)],
            bin_count: params.bin_count(),
            seeds: params.seeds().to_vec(),
        }
    }

    /// Filtre construit puis rempli avec tous les éléments de `set`.
    pub fn from_set(params: &BloomFilterParams, set: &[u64]) -> Self {
        let mut bf = Self::build(params);
        for &x in set {
            bf.insert(x);
        }
        bf
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    fn bin_of(&self, element: u64, seed: u64) -> usize {
        (hash_element(element, seed) % self.bin_count as u64) as usize
    }

    fn get(&self, index: usize) -> bool {
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    fn put(&mut self, index: usize, val: bool) {
        let mask = 1u64 << (index % WORD_BITS);
        if val {
            self.words[index / WORD_BITS] |= mask;
        } else {
            self.words[index / WORD_BITS] &= !mask;
        }
    }

    pub fn insert(&mut self, element: u64) {
        let bin_count = self.bin_count as u64;
        for &seed in &self.seeds {
            let bin = (hash_element(element, seed) % bin_count) as usize;
            self.words[bin / WORD_BITS] |= 1u64 << (bin % WORD_BITS);
        }
    }

    /// Vrai ssi les k cases de l'élément sont à 1 (faux positifs possibles).
    pub fn contains(&self, element: u64) -> bool {
        self.seeds.iter().all(|&seed| self.get(self.bin_of(element, seed)))
    }

    pub fn bit_at(&self, index: usize) -> Result<bool, MpsiError> {
        self.check_index(index)?;
        Ok(self.get(index))
    }

    pub fn set_bit(&mut self, index: usize, val: bool) -> Result<(), MpsiError> {
        self.check_index(index)?;
        self.put(index, val);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), MpsiError> {
        if index >= self.bin_count {
            return Err(MpsiError::BinOutOfRange {
                index,
                bin_count: self.bin_count,
            });
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Itère sur les cases dans l'ordre 0..bin_count.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bin_count).map(move |i| self.get(i))
    }

    // -----------------------------------------------------------------------
    // ET bit à bit avec un autre filtre — intersection en clair (référence).
    // Les deux filtres doivent avoir le même nombre de cases.
    // -----------------------------------------------------------------------
    pub fn bitwise_and(&mut self, other: &BloomFilter) -> Result<(), MpsiError> {
        if self.bin_count != other.bin_count {
            return Err(MpsiError::ParamsMismatch {
                expected: self.bin_count,
                actual: other.bin_count,
            });
        }
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w &= o;
        }
        Ok(())
    }

    pub fn size_in_bytes(&self) -> usize {
        self.bin_count.div_ceil(8)
    }

    pub fn set_bits_count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
