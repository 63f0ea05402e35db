// =========================================================
// Démonstration — Intersection privée multi-parties (MPSI)
// Filtres de Bloom chiffrés & ElGamal à seuil
//
// Usage : bf_mpsi [config.json]
// Verbosité via RUST_LOG (défaut : info)
// =========================================================

use bf_mpsi::{plaintext_intersection, run_mpsi_with_metrics, MpsiConfig, MpsiError};
use rand_core::OsRng;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ─────────────────────────────────────────────────────────
// Erreur applicative centrale
//
// Unifie MpsiError, io::Error et serde_json::Error pour
// propager toutes les erreurs via ?
// ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
enum AppError {
    #[error("Erreur protocole : {0}")]
    Mpsi(#[from] MpsiError),

    #[error("Erreur I/O : {0}")]
    Io(#[from] std::io::Error),

    #[error("Erreur JSON : {0}")]
    Json(#[from] serde_json::Error),
}

// ── Scénarios de démonstration ────────────────────────────

struct Scenario {
    name:        &'static str,
    clients:     Vec<Vec<u64>>,
    coordinator: Vec<u64>,
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name:        "deux clients, intersection {1,3}",
            clients:     vec![vec![1, 2, 3], vec![1, 3, 4]],
            coordinator: vec![1, 3, 5],
        },
        Scenario {
            name:        "deux clients, intersection vide",
            clients:     vec![vec![10, 11], vec![12, 13]],
            coordinator: vec![14, 15],
        },
        Scenario {
            name:        "ensembles identiques, intersection {7,8,9}",
            clients:     vec![vec![7, 8, 9], vec![7, 8, 9]],
            coordinator: vec![7, 8, 9],
        },
        Scenario {
            name:        "trois clients, intersection {5}",
            clients:     vec![vec![1, 2, 3, 4, 5], vec![5, 6, 7, 8, 9], vec![2, 5, 8, 10, 12]],
            coordinator: vec![5, 12, 100, 200],
        },
    ]
}

// ─────────────────────────────────────────────────────────
// Point d'entrée
// ─────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config() -> Result<MpsiConfig, AppError> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let config = serde_json::from_str(&raw)?;
            info!(path = %path, "configuration chargée");
            Ok(config)
        }
        None => Ok(MpsiConfig::default()),
    }
}

fn run() -> Result<(), AppError> {
    let config = load_config()?;
    info!(
        key_bits = config.key_bits,
        false_positive_exponent = config.false_positive_exponent,
        "démarrage"
    );

    let mut rng = OsRng;

    for scenario in scenarios() {
        println!("\n==============================================");
        println!("  {}", scenario.name);
        println!("==============================================");

        let t = Instant::now();
        let (bf_params, keys) = config.setup(&scenario.clients, &scenario.coordinator, &mut rng)?;
        let duree_setup = t.elapsed();

        let (result, metrics) = run_mpsi_with_metrics(
            &scenario.clients,
            &scenario.coordinator,
            &bf_params,
            &keys,
            &mut rng,
        )?;

        let expected = plaintext_intersection(&scenario.clients, &scenario.coordinator);
        let mut sorted = result.clone();
        sorted.sort_unstable();

        println!("  Cases du filtre   : {}", bf_params.bin_count());
        println!("  Hachages          : {}", bf_params.hash_count());
        println!("  Mise en place     : {:.3?}", duree_setup);
        println!("  Résultat MPSI     : {:?}", result);
        println!("  Attendu (en clair): {:?}", expected);

        if sorted == expected {
            println!("  Intersection vérifiée");
        } else {
            // Possible uniquement par faux positif du filtre
            warn!(?result, ?expected, "résultat différent de l'intersection en clair");
        }

        println!("\n--- MÉTRIQUES ---");
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_wraps_sources() {
        let e: AppError = MpsiError::NoClients.into();
        assert_eq!(e.to_string(), "Erreur protocole : Le protocole requiert au moins un client");

        let json = serde_json::from_str::<MpsiConfig>("{").unwrap_err();
        assert!(AppError::from(json).to_string().starts_with("Erreur JSON : "));
    }
}
