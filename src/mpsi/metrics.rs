use serde::{Deserialize, Serialize};

// ============================================================================
// Compteurs d'observation d'une exécution MPSI
//
// Purement informatifs : aucune décision du protocole n'en dépend.
// Temps en millisecondes ; les valeurs "client" sont des moyennes par client.
// ============================================================================
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MpsiMetrics {
    pub client_prep_ms:          f64,
    pub client_online_ms:        f64,
    pub coordinator_prep_ms:     f64,
    pub coordinator_online_ms:   f64,
    pub client_sent_bytes:       u64,
    pub client_received_bytes:   u64,
    pub coordinator_sent_bytes:     u64,
    pub coordinator_received_bytes: u64,
}

impl MpsiMetrics {
    /// Volume total échangé, vu du coordinateur.
    pub fn coordinator_total_bytes(&self) -> u64 {
        self.coordinator_sent_bytes + self.coordinator_received_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_json_round_trip() {
        let m = MpsiMetrics {
            client_prep_ms: 1.5,
            coordinator_sent_bytes: 40,
            coordinator_received_bytes: 2,
            ..Default::default()
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"coordinator_sent_bytes\":40"));
        assert_eq!(serde_json::from_str::<MpsiMetrics>(&json).unwrap(), m);
        assert_eq!(m.coordinator_total_bytes(), 42);
    }
}
