pub mod client;
pub mod coordinator;
pub mod metrics;
pub mod online;
pub mod protocol;

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};

// ── Types ─────────────────────────────────────────────────

pub use client::Erbf;
pub use coordinator::BlindedElement;
pub use metrics::MpsiMetrics;
pub use online::ElementOutcome;

// ── Phases protocole ──────────────────────────────────────

pub use client::{encode_erbf, prepare_client, prepare_clients};
pub use coordinator::{blind_coordinator_set, blind_element};
pub use online::{aggregate, evaluate_element, online_phase, party_deltas};
pub use protocol::{plaintext_intersection, run_mpsi, run_mpsi_with_metrics};

// ─────────────────────────────────────────────────────────
// Un flux ChaCha20 indépendant par tâche parallèle.
// Les graines sont tirées séquentiellement du générateur de
// l'appelant : une exécution sous graine fixe est reproductible.
// ─────────────────────────────────────────────────────────
pub(crate) fn fork_rngs<R: RngCore + CryptoRng>(rng: &mut R, count: usize) -> Vec<ChaCha20Rng> {
    (0..count)
        .map(|_| ChaCha20Rng::from_seed(rng.gen::<[u8; 32]>()))
        .collect()
}
