//! Model plans: a JSON description of a diagram, replayed through the editor
//! gestures (add factor, select two, link selected, edit link).

use std::collections::HashMap;
use std::path::Path;

use aimm_client::FactorCatalog;
use aimm_diagram::{DiagramController, LinkEdit, NodeId};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use tracing::debug;

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannedLink {
    pub from: String,
    pub to: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub trainable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelPlan {
    pub name: String,
    #[serde(default)]
    pub target: Option<String>,
    pub factors: Vec<String>,
    #[serde(default)]
    pub links: Vec<PlannedLink>,
}

impl ModelPlan {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading plan {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing plan {}", path.display()))
    }

    /// Build the plan on `ctl` using factors from `catalog`.
    pub fn apply(&self, catalog: &FactorCatalog, ctl: &mut DiagramController) -> anyhow::Result<()> {
        ctl.set_model_name(self.name.clone());
        ctl.set_target(self.target.clone());

        let mut nodes: HashMap<&str, NodeId> = HashMap::new();
        for name in &self.factors {
            let factor = catalog
                .find_factor(name)
                .ok_or_else(|| anyhow!("unknown factor '{}'", name))?;
            let node = ctl.add_factor(factor);
            nodes.entry(name.as_str()).or_insert(node.id);
        }

        for link in &self.links {
            let from = *nodes
                .get(link.from.as_str())
                .ok_or_else(|| anyhow!("link source '{}' is not in the plan", link.from))?;
            let to = *nodes
                .get(link.to.as_str())
                .ok_or_else(|| anyhow!("link target '{}' is not in the plan", link.to))?;
            ctl.reset_selection();
            ctl.select_node(from)?;
            ctl.select_node(to)?;
            let id = ctl.link_selected(link.weight)?;
            if link.trainable {
                ctl.commit_link_edit(
                    id,
                    LinkEdit {
                        weight: Some(link.weight),
                        trainable: true,
                    },
                )?;
            }
            debug!("Planned link {} -> {}", link.from, link.to);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimm_core::Factor;

    fn catalog() -> FactorCatalog {
        let mut catalog = FactorCatalog::default();
        catalog.targets = vec![Factor::new("Yield")];
        catalog.set_factors(vec![Factor::new("Rain"), Factor::new("Sun")]);
        catalog
    }

    fn plan(json: &str) -> ModelPlan {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_apply_builds_graph() {
        let plan = plan(
            r#"{"name": "Harvest", "target": "Yield",
                "factors": ["Rain", "Sun", "Yield"],
                "links": [{"from": "Rain", "to": "Yield", "weight": 3},
                          {"from": "Sun", "to": "Yield", "trainable": true},
                          {"from": "Yield", "to": "Rain", "weight": -0.5}]}"#,
        );
        let mut ctl = DiagramController::new(1000.0, 800.0);
        plan.apply(&catalog(), &mut ctl).unwrap();

        let record = ctl.to_record(None).unwrap();
        assert_eq!(record.name, "Harvest");
        assert_eq!(record.target_factor, "Yield");
        assert_eq!(record.links.len(), 3);
        assert_eq!(record.links[1].weight, 1.0);
        assert_eq!(record.links[2].weight, -0.5);
        assert!(ctl.store().get_cells().links().nth(1).unwrap().trainable);
        assert!(ctl.selection().is_empty());
    }

    #[test]
    fn test_apply_rejects_unknown_names() {
        let mut ctl = DiagramController::new(1000.0, 800.0);
        let bad_factor = plan(r#"{"name": "m", "factors": ["Nope"]}"#);
        assert!(bad_factor.apply(&catalog(), &mut ctl).is_err());

        let bad_link = plan(r#"{"name": "m", "factors": ["Rain"], "links": [{"from": "Rain", "to": "Sun"}]}"#);
        assert!(bad_link.apply(&catalog(), &mut ctl).is_err());
    }
}
