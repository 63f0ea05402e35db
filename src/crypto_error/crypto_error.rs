// ===========================================================================
// Gestion centralisée des erreurs du protocole MPSI
//
// Tous les modules utilisent ce type au lieu de panic!/assert!/unwrap().
// Chaque erreur est terminale pour l'exécution en cours : rien n'est
// réessayé, l'appelant reçoit une Err(...) et abandonne le run.
// ===========================================================================

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MpsiError {
    // --- Erreurs de paramètres d'entrée ---
    /// La taille de clé demandée est trop petite (< MIN_KEY_BITS)
    #[error("Taille de clé {requested} bits insuffisante, minimum requis : {minimum} bits")]
    KeySizeTooSmall { requested: u64, minimum: u64 },

    /// Seuil t ou nombre de parties n invalide (t = 0, n = 0 ou t > n)
    #[error("Seuil invalide : t = {threshold} pour n = {parties} parties")]
    InvalidThreshold { threshold: usize, parties: usize },

    /// Paramètres de filtre de Bloom invalides (n = 0 ou e >= 0)
    #[error("Paramètres de Bloom invalides : n = {element_count}, e = {exponent}")]
    InvalidBloomParams { element_count: usize, exponent: i64 },

    /// Filtre sans case, sans graine ou avec des graines répétées
    #[error("Structure de filtre invalide : m = {bin_count}, k = {hash_count} (graines distinctes requises)")]
    InvalidBloomLayout { bin_count: usize, hash_count: usize },

    /// Le message est nul ou >= p (hors domaine plaintext ElGamal)
    #[error("Le message doit être dans [1, p)")]
    MessageOutOfRange,

    // --- Incohérences structurelles (échec immédiat) ---
    /// Filtres ou ERBF construits avec des bin_count différents
    #[error("Paramètres incompatibles : {expected} cases attendues, {actual} reçues")]
    ParamsMismatch { expected: usize, actual: usize },

    /// Accès direct à une case hors du filtre
    #[error("Case {index} hors du filtre ({bin_count} cases)")]
    BinOutOfRange { index: usize, bin_count: usize },

    /// Aucun client fourni au protocole
    #[error("Le protocole requiert au moins un client")]
    NoClients,

    /// Clés générées pour un nombre de parties différent de clients + 1
    #[error("Clés générées pour {actual} parties, {expected} attendues")]
    PartyCountMismatch { expected: usize, actual: usize },

    // --- Erreurs de déchiffrement à seuil ---
    /// Indice de partie hors de [1, n]
    #[error("Indice de part {index} hors de [1, {parties}]")]
    ShareIndexOutOfRange { index: usize, parties: usize },

    /// Le même indice de partie apparaît deux fois
    #[error("Indice de part {0} fourni deux fois")]
    DuplicateShareIndex(usize),

    /// Moins de t parts partielles fournies
    #[error("Parts insuffisantes : {required} requises, {provided} fournies")]
    NotEnoughShares { required: usize, provided: usize },

    // --- Erreurs mathématiques internes ---
    /// La recherche de safe prime a épuisé son budget de tentatives
    #[error("Aucun safe prime de {bits} bits trouvé après {attempts} tentatives")]
    PrimeGenerationFailed { bits: u64, attempts: u64 },

    /// L'inverse modulaire n'existe pas (gcd != 1)
    #[error("Impossible de calculer l'inverse modulaire (gcd != 1)")]
    NoModularInverse,

    /// Conversion BigInt -> BigUint échouée (résultat négatif — invariant interne)
    #[error("Conversion interne BigInt -> BigUint : résultat négatif inattendu")]
    NegativeConversion,
}
