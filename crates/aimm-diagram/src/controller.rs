//! Diagram controller: one per editor session.
//!
//! Owns the graph store, the selection set, the position allocator and the
//! popovers, and exposes one method per user gesture. All mutation happens
//! through `&mut self`, so handlers run to completion one at a time.

use aimm_core::{
    AimmConfig, Error, Factor, LoggedUser, ModelRecord, Quality, Result, RetrainRequest,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::graph::GraphStore;
use crate::link;
use crate::node::create_node;
use crate::popover::PopoverController;
use crate::position::PositionAllocator;
use crate::selection::SelectionTracker;
use crate::serialize::{self, ModelMeta};
use crate::types::*;

pub struct DiagramController {
    store: GraphStore,
    positions: PositionAllocator,
    selection: SelectionTracker,
    popovers: PopoverController,
    hovered_link: Option<LinkId>,
    target: Option<String>,
    /// Factors added this session, one entry per factor identity.
    selected_factors: Vec<Factor>,
    model_name: String,
    quality: Quality,
    listeners: Vec<mpsc::UnboundedSender<EditorEvent>>,
}

impl DiagramController {
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            store: GraphStore::new(),
            positions: PositionAllocator::new(),
            selection: SelectionTracker::new(),
            popovers: PopoverController::new(viewport_width, viewport_height),
            hovered_link: None,
            target: None,
            selected_factors: Vec::new(),
            model_name: String::new(),
            quality: Quality::default(),
            listeners: Vec::new(),
        }
    }

    pub fn from_config(config: &AimmConfig) -> Self {
        Self::new(config.viewport_width, config.viewport_height)
    }

    // ---------------------------------------------------------------
    // Observation
    // ---------------------------------------------------------------

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Store change notifications, for the render layer.
    pub fn subscribe_graph(&mut self) -> mpsc::UnboundedReceiver<GraphEvent> {
        self.store.subscribe()
    }

    /// Presentation notifications (link tools, edit requests, alerts, popovers).
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EditorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    fn notify(&mut self, event: EditorEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Raise a user-visible message.
    pub fn alert(&mut self, message: impl Into<String>) {
        self.notify(EditorEvent::Alert(message.into()));
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn popovers(&self) -> &PopoverController {
        &self.popovers
    }

    pub fn hovered_link(&self) -> Option<LinkId> {
        self.hovered_link
    }

    pub fn selected_factors(&self) -> &[Factor] {
        &self.selected_factors
    }

    // ---------------------------------------------------------------
    // Model metadata
    // ---------------------------------------------------------------

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn set_model_name(&mut self, name: impl Into<String>) {
        self.model_name = name.into();
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn quality(&self) -> &Quality {
        &self.quality
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    pub fn is_target(&self, factor: &Factor) -> bool {
        self.target.as_deref() == Some(factor.name.as_str())
    }

    /// Choose the target factor and recolor nodes already on the canvas.
    pub fn set_target(&mut self, name: Option<String>) {
        self.target = name;
        for id in self.store.node_ids() {
            let should = match self.store.node(id) {
                Some(node) => {
                    let should = self.is_target(&node.factor);
                    if node.is_target == should {
                        continue;
                    }
                    should
                }
                None => continue,
            };
            if let Err(e) = self.store.update_node(id, |n| n.is_target = should) {
                warn!("Failed to recolor {}: {}", id, e);
            }
        }
        info!("Target factor set to {:?}", self.target);
    }

    // ---------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------

    /// Add a factor to the canvas (search result click or drag).
    ///
    /// Always places a new node; the selected-factor list keeps one entry per
    /// factor.
    pub fn add_factor(&mut self, factor: &Factor) -> Node {
        if !self
            .selected_factors
            .iter()
            .any(|f| f.key() == factor.key())
        {
            self.selected_factors.push(factor.clone());
        }
        let is_target = self.is_target(factor);
        let node = create_node(&mut self.store, &mut self.positions, factor, is_target);
        info!("Placed '{}' as {}", factor.name, node.id);
        node
    }

    /// Context-menu removal. A selected node being removed clears the selection.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        if self.selection.contains(id) {
            self.reset_selection();
        }
        let node = self.store.remove_node(id)?;
        self.forget_missing_hover();
        Ok(node)
    }

    /// Node click: open an inspector popover next to it.
    pub fn click_node(&mut self, id: NodeId) -> Result<Uuid> {
        let node = self
            .store
            .node(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let (factor, anchor) = (node.factor.clone(), node.position);
        let popover = self.popovers.open(&factor, Some(id), anchor).id;
        self.notify(EditorEvent::PopoverOpened(popover));
        Ok(popover)
    }

    pub fn close_popover(&mut self, id: Uuid) -> bool {
        let closed = self.popovers.close(id);
        if closed {
            self.notify(EditorEvent::PopoverClosed(id));
        }
        closed
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.popovers.set_viewport(width, height);
    }

    // ---------------------------------------------------------------
    // Selection & linking
    // ---------------------------------------------------------------

    pub fn select_node(&mut self, id: NodeId) -> Result<()> {
        if !self.store.contains_node(id) {
            return Err(Error::NotFound(id.to_string()));
        }
        if self.selection.select(id) {
            self.store.update_node(id, |n| n.highlighted = true)?;
        }
        Ok(())
    }

    pub fn reset_selection(&mut self) {
        for id in self.selection.nodes() {
            if let Err(e) = self.store.update_node(id, |n| n.highlighted = false) {
                warn!("Failed to clear highlight on {}: {}", id, e);
            }
        }
        self.selection.reset();
    }

    /// Link the two selected nodes. On a wrong selection size nothing changes
    /// and an alert is raised.
    pub fn link_selected(&mut self, weight: f64) -> Result<LinkId> {
        let selected = self.selection.nodes();
        match link::link_nodes(&mut self.store, &selected, weight) {
            Ok(id) => {
                self.reset_selection();
                Ok(id)
            }
            Err(e) => {
                warn!("Link from selection refused: {}", e);
                if matches!(e, Error::SelectionSize(_)) {
                    self.notify(EditorEvent::Alert(
                        "Please select exactly two nodes to create a link.".into(),
                    ));
                }
                Err(e)
            }
        }
    }

    /// Pointer-drag connection between two connection points.
    pub fn connect(&mut self, source: ConnectionPoint, target: ConnectionPoint) -> Result<LinkId> {
        link::connect(&mut self.store, source, target)
    }

    /// Context-menu removal of a link.
    pub fn remove_link(&mut self, id: LinkId) -> Result<Link> {
        let link = self.store.remove_link(id)?;
        self.forget_missing_hover();
        Ok(link)
    }

    // ---------------------------------------------------------------
    // Link inspector
    // ---------------------------------------------------------------

    pub fn hover_link(&mut self, id: LinkId) -> Result<()> {
        if self.store.link(id).is_none() {
            return Err(Error::NotFound(id.to_string()));
        }
        if let Some(prev) = self.hovered_link.replace(id) {
            if prev != id {
                self.notify(EditorEvent::LinkToolsHidden(prev));
            }
        }
        self.notify(EditorEvent::LinkToolsShown(id));
        Ok(())
    }

    pub fn leave_link(&mut self, id: LinkId) {
        if self.hovered_link == Some(id) {
            self.hovered_link = None;
            self.notify(EditorEvent::LinkToolsHidden(id));
        }
    }

    /// Invoke the inspector control of the hovered link; emits
    /// [`EditorEvent::LinkEditRequested`] for the presentation layer.
    pub fn invoke_link_tools(&mut self) -> Result<LinkId> {
        let id = self
            .hovered_link
            .ok_or_else(|| Error::NotFound("no hovered link".into()))?;
        let current = link::edit_state(&self.store, id)?;
        self.notify(EditorEvent::LinkEditRequested { link: id, current });
        Ok(id)
    }

    /// Confirmation from the link editor.
    pub fn commit_link_edit(&mut self, id: LinkId, edit: LinkEdit) -> Result<()> {
        link::commit_edit(&mut self.store, id, edit)
    }

    fn forget_missing_hover(&mut self) {
        if let Some(id) = self.hovered_link {
            if self.store.link(id).is_none() {
                self.hovered_link = None;
            }
        }
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    pub fn model_meta(&self, user: Option<&LoggedUser>) -> ModelMeta {
        ModelMeta {
            name: self.model_name.clone(),
            description: None,
            target_factor: self.target.clone().unwrap_or_default(),
            creator: user.map(|u| u.id.clone()),
        }
    }

    /// Serialize the current graph for `POST /api/models`.
    pub fn to_record(&self, user: Option<&LoggedUser>) -> Result<ModelRecord> {
        serialize::serialize(&self.store.get_cells(), &self.model_meta(user))
    }

    pub fn retrain_request(&self) -> RetrainRequest {
        RetrainRequest {
            name: self.model_name.clone(),
            factors: self.selected_factors.clone(),
            target: self.target.clone().unwrap_or_default(),
        }
    }

    /// Replace the canvas with a saved graph. Transient state is dropped.
    pub fn load_graph(&mut self, graph_data: &str) -> Result<()> {
        let snapshot = serialize::deserialize_graph(graph_data)?;
        self.store.restore(&snapshot)?;
        self.selection.reset();
        self.hovered_link = None;
        self.popovers.close_all();
        self.selected_factors.clear();
        for node in snapshot.nodes() {
            if !self
                .selected_factors
                .iter()
                .any(|f| f.key() == node.factor.key())
            {
                self.selected_factors.push(node.factor.clone());
            }
        }
        debug!("Loaded graph with {} nodes", self.selected_factors.len());
        Ok(())
    }
}
