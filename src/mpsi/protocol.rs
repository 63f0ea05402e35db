// =========================================================
// MPSI — intersection privée multi-parties par filtres de Bloom
// chiffrés (ERBF) et ElGamal à seuil
//
//   Phase 1 : chaque client construit son filtre et son ERBF
//   Phase 2 : le coordinateur aveugle chacun de ses éléments
//   Phase 3 : agrégation homomorphe par élément, déchiffrement
//             par les n parties, test d'égalité
//
// Faux positifs : un élément absent peut être retenu avec une
// probabilité bornée par ε = 2^e par client (inhérent au filtre).
// =========================================================

use rand_core::{CryptoRng, RngCore};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{info, instrument};
use crate::bloom_filter::BloomFilterParams;
use crate::crypto_error::MpsiError;
use crate::el_gamal::Keys;
use crate::mpsi::client::prepare_clients_timed;
use crate::mpsi::coordinator::blind_coordinator_set;
use crate::mpsi::metrics::MpsiMetrics;
use crate::mpsi::online::online_phase;

fn check_inputs(client_sets: &[Vec<u64>], keys: &Keys) -> Result<(), MpsiError> {
    if client_sets.is_empty() {
        return Err(MpsiError::NoClients);
    }
    if keys.party_count() != client_sets.len() + 1 {
        return Err(MpsiError::PartyCountMismatch {
            expected: client_sets.len() + 1,
            actual: keys.party_count(),
        });
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Exécution complète avec compteurs de temps et d'octets.
//
// Le résultat conserve l'ordre relatif de `coordinator_set`.
// ─────────────────────────────────────────────────────────
#[instrument(
    level = "info",
    skip_all,
    fields(clients = client_sets.len(), coordinator_elements = coordinator_set.len())
)]
pub fn run_mpsi_with_metrics<R: RngCore + CryptoRng>(
    client_sets: &[Vec<u64>],
    coordinator_set: &[u64],
    bf_params: &BloomFilterParams,
    keys: &Keys,
    rng: &mut R,
) -> Result<(Vec<u64>, MpsiMetrics), MpsiError> {
    check_inputs(client_sets, keys)?;
    let n_clients = client_sets.len() as u64;
    let mut metrics = MpsiMetrics::default();

    // Phase 1 — clients
    let prepared = prepare_clients_timed(client_sets, bf_params, &keys.params, rng)?;
    metrics.client_prep_ms =
        prepared.iter().map(|c| c.elapsed_ms).sum::<f64>() / n_clients as f64;
    let erbfs: Vec<_> = prepared.into_iter().map(|c| c.erbf).collect();

    let erbf_bytes: u64 = erbfs.iter().map(|e| e.wire_size()).sum();
    metrics.client_sent_bytes += erbf_bytes / n_clients;
    metrics.coordinator_received_bytes += erbf_bytes;

    // Phase 2 — coordinateur
    let start = Instant::now();
    let blinded = blind_coordinator_set(coordinator_set, &keys.params, rng)?;
    metrics.coordinator_prep_ms = start.elapsed().as_secs_f64() * 1_000.0;

    // Phase 3 — en ligne
    let outcomes = online_phase(&blinded, &erbfs, bf_params, keys)?;

    let mut intersection = Vec::new();
    for outcome in &outcomes {
        metrics.coordinator_online_ms += outcome.coordinator_ms;
        metrics.client_online_ms += outcome.client_share_ms / n_clients as f64;

        // c_j diffusé à chaque client, une part renvoyée par client
        metrics.coordinator_sent_bytes += outcome.aggregate_bytes * n_clients;
        metrics.client_received_bytes += outcome.aggregate_bytes;
        metrics.client_sent_bytes += outcome.client_share_bytes / n_clients;
        metrics.coordinator_received_bytes += outcome.client_share_bytes;

        if outcome.member {
            intersection.push(outcome.element);
        }
    }

    info!(
        intersection = intersection.len(),
        coordinator_online_ms = metrics.coordinator_online_ms,
        "MPSI terminé"
    );
    Ok((intersection, metrics))
}

/// Intersection de `coordinator_set` avec tous les ensembles clients.
pub fn run_mpsi<R: RngCore + CryptoRng>(
    client_sets: &[Vec<u64>],
    coordinator_set: &[u64],
    bf_params: &BloomFilterParams,
    keys: &Keys,
    rng: &mut R,
) -> Result<Vec<u64>, MpsiError> {
    run_mpsi_with_metrics(client_sets, coordinator_set, bf_params, keys, rng)
        .map(|(intersection, _)| intersection)
}

// ─────────────────────────────────────────────────────────
// Intersection en clair (non privée), triée et sans doublon.
// Vérité terrain pour les tests et la démonstration.
// ─────────────────────────────────────────────────────────
pub fn plaintext_intersection(client_sets: &[Vec<u64>], coordinator_set: &[u64]) -> Vec<u64> {
    let Some((first, rest)) = client_sets.split_first() else {
        return Vec::new();
    };

    let mut current: BTreeSet<u64> = first.iter().copied().collect();
    for set in rest {
        let next: BTreeSet<u64> = set.iter().copied().collect();
        current = current.intersection(&next).copied().collect();
    }

    let coordinator: BTreeSet<u64> = coordinator_set.iter().copied().collect();
    current.intersection(&coordinator).copied().collect()
}
