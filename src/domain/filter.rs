// Plant / machine selection
use serde::{Deserialize, Serialize};

/// Filter selection sent by the UI shell. The identifiers are opaque: they only
/// decide when a new snapshot is requested, never what it contains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub plant: String,
    pub machine: String,
}

impl DashboardFilter {
    pub fn new(plant: impl Into<String>, machine: impl Into<String>) -> Self {
        Self {
            plant: plant.into(),
            machine: machine.into(),
        }
    }
}

/// Options offered by the filter selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCatalog {
    #[serde(default = "default_plants")]
    pub plants: Vec<String>,
    #[serde(default = "default_machines")]
    pub machines: Vec<String>,
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self {
            plants: default_plants(),
            machines: default_machines(),
        }
    }
}

impl FilterCatalog {
    /// Fills missing parts of a selection, preferring `current`, then the first catalog entry.
    pub fn resolve(
        &self,
        plant: Option<String>,
        machine: Option<String>,
        current: Option<&DashboardFilter>,
    ) -> DashboardFilter {
        let plant = plant
            .or_else(|| current.map(|c| c.plant.clone()))
            .or_else(|| self.plants.first().cloned())
            .unwrap_or_default();
        let machine = machine
            .or_else(|| current.map(|c| c.machine.clone()))
            .or_else(|| self.machines.first().cloned())
            .unwrap_or_default();
        DashboardFilter::new(plant, machine)
    }
}

fn default_plants() -> Vec<String> {
    ["Plant A", "Plant B", "Plant C"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_machines() -> Vec<String> {
    (1..=4).map(|n| format!("Machine {}", n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_first_options() {
        let catalog = FilterCatalog::default();
        let filter = catalog.resolve(None, None, None);
        assert_eq!(filter, DashboardFilter::new("Plant A", "Machine 1"));
    }

    #[test]
    fn test_resolve_keeps_current_selection_for_missing_parts() {
        let catalog = FilterCatalog::default();
        let current = DashboardFilter::new("Plant C", "Machine 3");

        let filter = catalog.resolve(None, Some("Machine 2".to_string()), Some(&current));
        assert_eq!(filter, DashboardFilter::new("Plant C", "Machine 2"));
    }

    #[test]
    fn test_resolve_accepts_unknown_identifiers() {
        let catalog = FilterCatalog::default();
        let filter = catalog.resolve(Some("Plant Z".to_string()), None, None);
        assert_eq!(filter.plant, "Plant Z");
    }
}
