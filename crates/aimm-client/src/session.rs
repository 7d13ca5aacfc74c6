//! Editor session: the diagram controller wired to the backend.

use aimm_core::{AimmConfig, Error, LoggedUser, Quality, Result, SaveResponse};
use aimm_diagram::{DiagramController, Node};
use tracing::{error, info};

use crate::catalog::FactorCatalog;
use crate::client::ApiClient;

/// One editing session: configuration, logged-in user, catalog and canvas.
pub struct EditorSession {
    config: AimmConfig,
    client: ApiClient,
    user: Option<LoggedUser>,
    catalog: FactorCatalog,
    controller: DiagramController,
}

impl EditorSession {
    pub fn new(config: AimmConfig) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        let user = LoggedUser::load(&config.session_file);
        match &user {
            Some(u) => info!("Session user: {}", u.username),
            None => info!("No logged-in user; models will be saved without a creator"),
        }
        let controller = DiagramController::from_config(&config);
        Ok(Self {
            config,
            client,
            user,
            catalog: FactorCatalog::default(),
            controller,
        })
    }

    pub fn config(&self) -> &AimmConfig {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn user(&self) -> Option<&LoggedUser> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Forget the logged-in user and remove the session file.
    pub fn logout(&mut self) -> Result<()> {
        self.user = None;
        LoggedUser::clear(&self.config.session_file)
    }

    pub fn catalog(&self) -> &FactorCatalog {
        &self.catalog
    }

    pub fn controller(&self) -> &DiagramController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut DiagramController {
        &mut self.controller
    }

    /// (Re)load targets, factors and models from the backend.
    pub async fn load_catalog(&mut self) {
        self.catalog = FactorCatalog::load(&self.client).await;
    }

    /// Place a catalog factor on the canvas by name.
    pub fn add_factor_by_name(&mut self, name: &str) -> Result<Node> {
        let factor = self
            .catalog
            .find_factor(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("factor '{}'", name)))?;
        Ok(self.controller.add_factor(&factor))
    }

    /// Serialize the canvas and post it. The canvas is never modified; the
    /// outcome is raised as an alert either way.
    pub async fn save(&mut self) -> Result<SaveResponse> {
        let record = self.controller.to_record(self.user.as_ref())?;
        match self.client.save_model(&record).await {
            Ok(response) => {
                info!(
                    "Model '{}' saved ({} links)",
                    record.name,
                    record.links.len()
                );
                self.controller.alert("Model saved successfully!");
                Ok(response)
            }
            Err(e) => {
                let message = match &e {
                    Error::Api { message, .. } => message.clone(),
                    _ => "An error occurred while saving models.".to_string(),
                };
                self.controller.alert(message);
                Err(e)
            }
        }
    }

    /// Ask the backend to retrain the current model and record the quality.
    pub async fn retrain(&mut self) -> Result<Quality> {
        let request = self.controller.retrain_request();
        let quality = self.client.retrain(&request).await?;
        info!("Model '{}' retrained: quality {}", request.name, quality);
        self.controller.set_quality(quality.clone());
        Ok(quality)
    }

    /// Load a saved model from the catalog onto the canvas.
    pub fn open_model(&mut self, name: &str) -> Result<()> {
        let model = self
            .catalog
            .find_model(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("model '{}'", name)))?;
        let graph = model.graph_json().ok_or_else(|| {
            error!("Model '{}' has no stored graph", name);
            Error::InvalidSnapshot(format!("model '{}' has no graph data", name))
        })?;
        self.controller.load_graph(&graph)?;
        self.controller.set_model_name(model.name.clone());
        self.controller.set_target(model.target_factor.clone());
        self.controller.set_quality(model.quality.clone());
        Ok(())
    }
}
