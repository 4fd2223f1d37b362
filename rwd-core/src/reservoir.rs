use serde::{Deserialize, Serialize};

/// A tracked water-storage facility. Identity is immutable; observations
/// reference it through `station_id`.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct Reservoir {
    /// Reservoir code (e.g. "S19")
    pub station_id: String,
    /// Human-readable name (e.g. "CASASOLA")
    pub name: String,
    /// Administrative region / province
    pub region: String,
}

impl Reservoir {
    pub fn new(station_id: &str, name: &str, region: &str) -> Self {
        Reservoir {
            station_id: station_id.trim().to_string(),
            name: name.trim().to_string(),
            region: region.trim().to_string(),
        }
    }

    /// Name for reports; falls back to the code when no name was supplied.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.station_id
        } else {
            &self.name
        }
    }
}
