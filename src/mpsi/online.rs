use num_bigint::BigUint;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{instrument, trace};
use crate::bloom_filter::BloomFilterParams;
use crate::crypto_error::MpsiError;
use crate::el_gamal::{combine_shares, compute_delta, finish_decryption, partial_decrypt, Ciphertext, Keys};
use crate::mpsi::client::Erbf;
use crate::mpsi::coordinator::BlindedElement;

// ============================================================================
// Phase en ligne
//
// Pour chaque élément x_j du coordinateur :
//   c_j = w_j ⊗ (⊗_{clients} ⊗_{graines} ERBF[h_s(x_j) mod m])
// puis déchiffrement par les n parties. Si x_j est dans tous les filtres,
// chaque facteur chiffre 1 et c_j déchiffre exactement en (x_j+1)·r_j.
// Sinon un facteur aléatoire uniforme dans [2, p-1] fausse l'égalité.
// ============================================================================

// ---------------------------------------------------------------------------
// Coefficients de Lagrange δ_1..δ_n sur les points 1..n, calculés une fois
// par exécution (ils ne dépendent que de n et q).
// ---------------------------------------------------------------------------
pub fn party_deltas(keys: &Keys) -> Result<Vec<BigUint>, MpsiError> {
    let n = keys.party_count();
    (1..=n).map(|i| compute_delta(i, n, &keys.params.q)).collect()
}

/// Agrégation homomorphe des cases de x_j dans chaque ERBF avec w_j.
/// Tout ERBF non aligné sur `bf_params` est refusé.
pub fn aggregate(
    blinded: &BlindedElement,
    erbfs: &[Erbf],
    bf_params: &BloomFilterParams,
    keys: &Keys,
) -> Result<Ciphertext, MpsiError> {
    let mut c_j = blinded.ciphertext.clone();
    for erbf in erbfs {
        erbf.check_params(bf_params)?;
        for idx in bf_params.bin_indices(blinded.element) {
            c_j.mul_assign(&erbf.bins[idx], &keys.params);
        }
    }
    Ok(c_j)
}

/// Issue du test d'appartenance d'un élément, avec ses mesures.
#[derive(Clone, Debug)]
pub struct ElementOutcome {
    pub element: u64,
    pub member: bool,
    /// Taille de c_j, diffusé à chaque client.
    pub aggregate_bytes: u64,
    /// Octets des parts envoyées par les clients.
    pub client_share_bytes: u64,
    /// Temps cumulé des parts clients (ms).
    pub client_share_ms: f64,
    /// Temps coordinateur : agrégation, sa part, combinaison, test (ms).
    pub coordinator_ms: f64,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}

// ---------------------------------------------------------------------------
// Agrégation, déchiffrement par toutes les parties et test d'égalité.
// Les parties 1..=clients sont les clients, la partie n le coordinateur.
// `deltas` doit contenir un coefficient par partie détentrice d'une part.
// ---------------------------------------------------------------------------
pub fn evaluate_element(
    blinded: &BlindedElement,
    erbfs: &[Erbf],
    bf_params: &BloomFilterParams,
    keys: &Keys,
    deltas: &[BigUint],
) -> Result<ElementOutcome, MpsiError> {
    let clients = erbfs.len();
    if deltas.len() != keys.party_count() {
        return Err(MpsiError::PartyCountMismatch {
            expected: keys.party_count(),
            actual: deltas.len(),
        });
    }

    let start = Instant::now();
    let c_j = aggregate(blinded, erbfs, bf_params, keys)?;
    let mut coordinator_ms = elapsed_ms(start);

    let mut client_share_ms = 0.0;
    let mut client_share_bytes = 0;
    let mut shares = Vec::with_capacity(deltas.len());
    for (i, delta) in (1..=deltas.len()).zip(deltas) {
        let start = Instant::now();
        let share = partial_decrypt(&c_j, keys, i, delta)?;
        if i <= clients {
            client_share_ms += elapsed_ms(start);
            client_share_bytes += bincode::serialized_size(&share.value).unwrap_or(0);
        } else {
            coordinator_ms += elapsed_ms(start);
        }
        shares.push(share.value);
    }

    let start = Instant::now();
    let decrypted = finish_decryption(&c_j, &combine_shares(&shares, &keys.params), &keys.params)?;
    let member = blinded.matches(&decrypted);
    coordinator_ms += elapsed_ms(start);

    Ok(ElementOutcome {
        element: blinded.element,
        member,
        aggregate_bytes: c_j.wire_size(),
        client_share_bytes,
        client_share_ms,
        coordinator_ms,
    })
}

// ---------------------------------------------------------------------------
// Phase en ligne complète, en parallèle sur les éléments du coordinateur.
// Les ERBF et les clés sont partagés en lecture seule.
// ---------------------------------------------------------------------------
#[instrument(level = "info", skip_all, fields(elements = blinded.len(), clients = erbfs.len()))]
pub fn online_phase(
    blinded: &[BlindedElement],
    erbfs: &[Erbf],
    bf_params: &BloomFilterParams,
    keys: &Keys,
) -> Result<Vec<ElementOutcome>, MpsiError> {
    if erbfs.is_empty() {
        return Err(MpsiError::NoClients);
    }
    if keys.party_count() != erbfs.len() + 1 {
        return Err(MpsiError::PartyCountMismatch {
            expected: erbfs.len() + 1,
            actual: keys.party_count(),
        });
    }
    for erbf in erbfs {
        erbf.check_params(bf_params)?;
    }

    let deltas = party_deltas(keys)?;

    blinded
        .par_iter()
        .enumerate()
        .map(|(j, b)| -> Result<ElementOutcome, MpsiError> {
            let outcome = evaluate_element(b, erbfs, bf_params, keys, &deltas)?;
            trace!(index = j, member = outcome.member, "élément évalué");
            Ok(outcome)
        })
        .collect()
}
