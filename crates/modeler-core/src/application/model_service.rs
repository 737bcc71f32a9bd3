use crate::{
    config::EngineConfig,
    domain::edge::{Edge, EdgeId, EdgeType},
    domain::handle::{Connection, HandleRole},
    domain::introspection::{node_relations, RelationListing},
    domain::materializer::apply_relations,
    domain::node::{Aspect, Node, NodeId, NodeType},
    domain::policy::{check_connection, evaluate, ConnectionCheck},
    domain::repository::{ChangeSet, EdgeRepository, NodeRepository, UnitOfWork},
    domain::retype::retype,
    domain::store::{removed_edges, NodeSet, StagedNodes},
    domain::teardown::teardown_into,
    error::Rejection,
    notification::Notifier,
    CoreError,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of a connect gesture
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    /// The edge was created and its relations written
    Connected(Edge),
    /// The connection policy refused the gesture
    Rejected(Rejection),
    /// An endpoint no longer exists; nothing was written
    Abandoned(NodeId),
    /// An existing edge already holds the same relation; nothing was written
    Duplicate(EdgeId),
}

#[derive(Debug, Default)]
struct Graph {
    nodes: NodeSet,
    edges: Vec<Edge>,
}

impl Graph {
    fn edge(&self, id: &EdgeId) -> Result<&Edge, CoreError> {
        self.edges
            .iter()
            .find(|edge| &edge.id == id)
            .ok_or_else(|| CoreError::EdgeNotFound(id.0.clone()))
    }
}

/// Service applying editing gestures to the model while keeping both sides
/// of every relation consistent.
///
/// Operations are serialized: a gesture sees the graph as left by the
/// previous one.
pub struct ModelService {
    /// Repository for nodes
    node_repo: Arc<dyn NodeRepository>,

    /// Repository for edges
    edge_repo: Arc<dyn EdgeRepository>,

    /// Committer for multi-entity writes
    unit_of_work: Arc<dyn UnitOfWork>,

    /// Channel for user-facing errors
    notifier: Arc<dyn Notifier>,

    config: EngineConfig,

    graph: Mutex<Graph>,
}

impl ModelService {
    /// Create a new model service with an empty working graph
    pub fn new(
        node_repo: Arc<dyn NodeRepository>,
        edge_repo: Arc<dyn EdgeRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            node_repo,
            edge_repo,
            unit_of_work,
            notifier,
            config,
            graph: Mutex::new(Graph::default()),
        }
    }

    /// Engine configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the working graph with what the repositories hold
    pub async fn load(&self) -> Result<(), CoreError> {
        let nodes = self.node_repo.find_all().await?;
        let edges = self.edge_repo.find_all().await?;

        tracing::info!(nodes = nodes.len(), edges = edges.len(), "Model loaded");

        let mut graph = self.graph.lock().await;
        graph.nodes = NodeSet::new(nodes);
        graph.edges = edges;
        Ok(())
    }

    /// Snapshot of the current nodes
    pub async fn nodes(&self) -> NodeSet {
        self.graph.lock().await.nodes.clone()
    }

    /// Snapshot of the current edges
    pub async fn edges(&self) -> Vec<Edge> {
        self.graph.lock().await.edges.clone()
    }

    /// Create a node with the next free id and no relations
    pub async fn add_node(&self, node_type: NodeType, aspect: Aspect) -> Result<Node, CoreError> {
        let mut graph = self.graph.lock().await;
        let node = Node::new(graph.nodes.next_id(), node_type, aspect);

        let created = self.node_repo.create(&node).await?;
        tracing::info!(node_id = %created.id, node_type = %created.node_type, "Node added");

        graph.nodes = graph.nodes.with_node(created.clone());
        Ok(created)
    }

    /// Report whether a connection would be accepted, without writing anything.
    /// Rejections are sent to the notifier.
    pub async fn check(&self, connection: &Connection, edge_type: Option<EdgeType>) -> ConnectionCheck {
        let graph = self.graph.lock().await;
        check_connection(
            connection,
            edge_type.unwrap_or(self.config.default_edge_type),
            &graph.nodes,
            self.notifier.as_ref(),
        )
    }

    /// Create an edge for `connection` and write the relations it implies.
    ///
    /// The edge and every touched node are committed together.
    pub async fn connect(
        &self,
        connection: &Connection,
        edge_type: Option<EdgeType>,
    ) -> Result<ConnectOutcome, CoreError> {
        let mut graph = self.graph.lock().await;
        let requested = edge_type.unwrap_or(self.config.default_edge_type);

        let plan = match evaluate(connection, requested, &graph.nodes) {
            Ok(plan) => plan,
            Err(rejection) => {
                self.reject(&rejection);
                return Ok(ConnectOutcome::Rejected(rejection));
            }
        };

        for endpoint in [&connection.source, &connection.target] {
            if !graph.nodes.contains(&endpoint.node) {
                tracing::debug!(node_id = %endpoint.node, "Connection endpoint missing, abandoning");
                return Ok(ConnectOutcome::Abandoned(endpoint.node.clone()));
            }
        }

        if plan.has_relations() {
            if let Some(existing) = graph.edges.iter().find(|edge| {
                edge.source == connection.source.node
                    && edge.target == connection.target.node
                    && edge.edge_type == plan.connection_type
            }) {
                tracing::debug!(edge_id = %existing.id, "Relation already held, nothing to write");
                return Ok(ConnectOutcome::Duplicate(existing.id.clone()));
            }
        }

        let materialized = apply_relations(&graph.nodes, &plan.new_node_relations);
        if let Some(missing) = materialized.aborted_at {
            return Ok(ConnectOutcome::Abandoned(missing));
        }

        let edge = Edge::from_connection(
            EdgeId::generate(),
            connection,
            plan.connection_type,
            plan.lock_connection,
        );

        let changes = ChangeSet::new()
            .with_edge(edge.clone())
            .with_nodes(materialized.staged.changed());
        self.commit(changes).await?;

        tracing::info!(
            edge_id = %edge.id,
            edge_type = ?edge.edge_type,
            locked = edge.is_locked(),
            touched = materialized.staged.touched().len(),
            "Connection created"
        );

        graph.nodes = materialized.staged.into_nodes();
        graph.edges.push(edge.clone());
        Ok(ConnectOutcome::Connected(edge))
    }

    /// Remove an edge and clear the relations it held
    pub async fn disconnect(&self, edge_id: &EdgeId) -> Result<(), CoreError> {
        let mut graph = self.graph.lock().await;
        let edge = graph.edge(edge_id)?.clone();

        let mut staged = StagedNodes::new(&graph.nodes);
        teardown_into(&mut staged, &edge, None, &self.config.detached_parent_id());

        let changes = ChangeSet::new()
            .with_nodes(staged.changed())
            .without_edge(edge.id.clone());
        self.commit(changes).await?;

        tracing::info!(edge_id = %edge.id, touched = staged.touched().len(), "Connection removed");

        graph.nodes = staged.into_nodes();
        graph.edges.retain(|existing| existing.id != edge.id);
        Ok(())
    }

    /// Change an edge between Part and Fulfilled, moving the relation
    /// entries on both endpoints.
    ///
    /// Returns `false` when the change is refused; the reason goes to the
    /// notifier.
    pub async fn retype_edge(&self, edge_id: &EdgeId, edge_type: EdgeType) -> Result<bool, CoreError> {
        let mut graph = self.graph.lock().await;
        let edge = graph.edge(edge_id)?.clone();

        if edge.edge_type == edge_type {
            return Ok(true);
        }

        if edge.is_locked() {
            self.reject(&Rejection::LockedEdge {
                edge: edge.id.0.clone(),
            });
            return Ok(false);
        }

        if let Some(holder) = graph.edges.iter().find(|other| {
            other.id != edge.id
                && other.source == edge.source
                && other.target == edge.target
                && other.edge_type == edge_type
        }) {
            self.reject(&Rejection::RelationTaken {
                edge: holder.id.0.clone(),
                edge_type,
            });
            return Ok(false);
        }

        // Edges outside block pairs carry no relations to move
        let between_blocks = edge.roles() == (Some(HandleRole::Block), Some(HandleRole::Block));
        let staged = if !between_blocks && edge.edge_type.retyped() == Some(edge_type) {
            StagedNodes::new(&graph.nodes)
        } else {
            match retype(
                &graph.nodes,
                &edge.source,
                &edge.target,
                edge.edge_type,
                edge_type,
                &self.config.detached_parent_id(),
            ) {
                Ok(staged) => staged,
                Err(rejection) => {
                    self.reject(&rejection);
                    return Ok(false);
                }
            }
        };

        let retyped = Edge {
            edge_type,
            ..edge.clone()
        };
        let changes = ChangeSet::new()
            .with_nodes(staged.changed())
            .with_edge(retyped.clone());
        self.commit(changes).await?;

        tracing::info!(edge_id = %edge.id, from = ?edge.edge_type, to = ?edge_type, "Connection retyped");

        graph.nodes = staged.into_nodes();
        if let Some(slot) = graph.edges.iter_mut().find(|existing| existing.id == edge.id) {
            *slot = retyped;
        }
        Ok(true)
    }

    /// Delete a node together with every edge touching it.
    ///
    /// Relations held by the other endpoints are cleared; the deleted
    /// node's own fields are not rewritten.
    pub async fn delete_node(&self, id: &NodeId) -> Result<(), CoreError> {
        let mut graph = self.graph.lock().await;
        if !graph.nodes.contains(id) {
            return Err(CoreError::NodeNotFound(id.0.clone()));
        }

        let touching: Vec<Edge> = graph
            .edges
            .iter()
            .filter(|edge| edge.involves(id))
            .cloned()
            .collect();

        let detached = self.config.detached_parent_id();
        let mut staged = StagedNodes::new(&graph.nodes);
        for edge in &touching {
            teardown_into(&mut staged, edge, Some(id), &detached);
        }
        staged.remove(id);

        let changes = touching
            .iter()
            .fold(ChangeSet::new().with_nodes(staged.changed()), |changes, edge| {
                changes.without_edge(edge.id.clone())
            })
            .without_node(id.clone());
        self.commit(changes).await?;

        tracing::info!(node_id = %id, edges_removed = touching.len(), "Node deleted");

        graph.nodes = staged.into_nodes();
        graph.edges.retain(|edge| !edge.involves(id));
        Ok(())
    }

    /// Reconcile with an edge list edited elsewhere: every current edge
    /// missing from `next` is torn down and deleted. Returns the removed edges.
    pub async fn sync_edges(&self, next: &[Edge]) -> Result<Vec<Edge>, CoreError> {
        let mut graph = self.graph.lock().await;
        let removed = removed_edges(&graph.edges, next);
        if removed.is_empty() {
            return Ok(removed);
        }

        let detached = self.config.detached_parent_id();
        let mut staged = StagedNodes::new(&graph.nodes);
        for edge in &removed {
            teardown_into(&mut staged, edge, None, &detached);
        }

        let changes = removed
            .iter()
            .fold(ChangeSet::new().with_nodes(staged.changed()), |changes, edge| {
                changes.without_edge(edge.id.clone())
            });
        self.commit(changes).await?;

        tracing::info!(edges_removed = removed.len(), "Edges synchronized");

        graph.nodes = staged.into_nodes();
        graph
            .edges
            .retain(|edge| !removed.iter().any(|gone| gone.id == edge.id));
        Ok(removed)
    }

    /// Populated relations of a node, in display order
    pub async fn relations(&self, id: &NodeId) -> Result<Vec<RelationListing>, CoreError> {
        let graph = self.graph.lock().await;
        graph
            .nodes
            .get(id)
            .map(|node| node_relations(&node.data))
            .ok_or_else(|| CoreError::NodeNotFound(id.0.clone()))
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), CoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        self.unit_of_work.commit(changes).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit model changes");
            e
        })
    }

    fn reject(&self, rejection: &Rejection) {
        tracing::warn!(reason = %rejection, "Gesture rejected");
        self.notifier.notify(&rejection.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::handle::HandleId;
    use crate::domain::node::NodeRef;
    use crate::domain::repository::memory::MemoryModelRepository;
    use crate::notification::testing::RecordingNotifier;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub Committer {}

        #[async_trait]
        impl UnitOfWork for Committer {
            async fn commit(&self, changes: ChangeSet) -> Result<(), CoreError>;
        }
    }

    struct Fixture {
        service: ModelService,
        repo: MemoryModelRepository,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let repo = MemoryModelRepository::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = ModelService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            notifier.clone(),
            EngineConfig::default(),
        );
        Fixture {
            service,
            repo,
            notifier,
        }
    }

    fn handle(role: HandleRole) -> HandleId {
        HandleId::for_role(role, "1")
    }

    fn link(source: &Node, source_role: HandleRole, target: &Node, target_role: HandleRole) -> Connection {
        Connection::new(
            source.id.clone(),
            handle(source_role),
            target.id.clone(),
            handle(target_role),
        )
    }

    fn connected(outcome: ConnectOutcome) -> Edge {
        match outcome {
            ConnectOutcome::Connected(edge) => edge,
            other => panic!("Expected a connection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_node_assigns_sequential_ids() {
        let f = fixture();
        let first = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let second = f.service.add_node(NodeType::Terminal, Aspect::Product).await.unwrap();

        assert_eq!(first.id, NodeId::from("0"));
        assert_eq!(second.id, NodeId::from("1"));
        assert_eq!(second.data.label, "terminal_1");
        assert_eq!(NodeRepository::find_all(&f.repo).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_connect_persists_edge_and_relations() {
        let f = fixture();
        let block = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let terminal = f.service.add_node(NodeType::Terminal, Aspect::Function).await.unwrap();

        let edge = connected(
            f.service
                .connect(&link(&block, HandleRole::Block, &terminal, HandleRole::Terminal), None)
                .await
                .unwrap(),
        );
        assert_eq!(edge.edge_type, EdgeType::Connected);
        assert!(edge.is_locked());

        let stored_terminal = NodeRepository::find_by_id(&f.repo, &terminal.id).await.unwrap().unwrap();
        let stored_block = NodeRepository::find_by_id(&f.repo, &block.id).await.unwrap().unwrap();
        assert_eq!(stored_terminal.data.terminal_of, Some(block.id.clone()));
        assert_eq!(stored_block.data.terminals, vec![NodeRef::new(terminal.id.clone())]);
        assert_eq!(EdgeRepository::find_all(&f.repo).await.unwrap(), vec![edge]);
    }

    #[tokio::test]
    async fn test_rejection_writes_nothing_and_notifies() {
        let f = fixture();
        let first = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let second = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let terminal = f.service.add_node(NodeType::Terminal, Aspect::Function).await.unwrap();

        connected(
            f.service
                .connect(&link(&first, HandleRole::Block, &terminal, HandleRole::Terminal), None)
                .await
                .unwrap(),
        );
        let before = f.service.nodes().await;

        let outcome = f
            .service
            .connect(&link(&second, HandleRole::Block, &terminal, HandleRole::Terminal), None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ConnectOutcome::Rejected(Rejection::TerminalAlreadyOwned {
                terminal: "2".to_string(),
                owner: "0".to_string(),
            })
        );
        assert_eq!(f.service.nodes().await, before);
        assert_eq!(f.service.edges().await.len(), 1);
        assert_eq!(
            f.notifier.messages(),
            vec!["Terminal 2 is already a terminal of 0".to_string()]
        );
    }

    #[tokio::test]
    async fn test_connect_to_missing_node_is_abandoned() {
        let f = fixture();
        let block = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();

        let connection = Connection::new(block.id.clone(), "block-1", "42", "terminal-1");
        let outcome = f.service.connect(&connection, None).await.unwrap();

        assert_eq!(outcome, ConnectOutcome::Abandoned(NodeId::from("42")));
        assert!(f.service.edges().await.is_empty());
        assert!(f.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_gesture_keeps_one_edge_per_relation() {
        let f = fixture();
        let connector = f.service.add_node(NodeType::Connector, Aspect::Function).await.unwrap();
        let block = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let gesture = link(&connector, HandleRole::Connector, &block, HandleRole::Block);

        let edge = connected(f.service.connect(&gesture, None).await.unwrap());
        let again = f.service.connect(&gesture, None).await.unwrap();
        assert_eq!(again, ConnectOutcome::Duplicate(edge.id.clone()));
        assert_eq!(EdgeRepository::find_all(&f.repo).await.unwrap().len(), 1);

        f.service.disconnect(&edge.id).await.unwrap();
        let stored = NodeRepository::find_by_id(&f.repo, &connector.id).await.unwrap().unwrap();
        assert!(stored.data.connected_to.is_empty());
        assert!(f.service.edges().await.is_empty());
        assert!(f.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_fulfilled_gesture_is_duplicate() {
        let f = fixture();
        let source = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let target = f.service.add_node(NodeType::Block, Aspect::Product).await.unwrap();

        let first = connected(
            f.service
                .connect(&link(&source, HandleRole::Block, &target, HandleRole::Block), Some(EdgeType::Fulfilled))
                .await
                .unwrap(),
        );
        let other_handles = Connection::new(source.id.clone(), "block-r", target.id.clone(), "block-l");
        let outcome = f
            .service
            .connect(&other_handles, Some(EdgeType::Fulfilled))
            .await
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::Duplicate(first.id));
        assert_eq!(f.service.edges().await.len(), 1);
    }

    #[tokio::test]
    async fn test_textbox_annotation_uses_default_type() {
        let f = fixture();
        let note = f.service.add_node(NodeType::TextBox, Aspect::Function).await.unwrap();
        let block = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let before = f.service.nodes().await;

        let gesture = link(&note, HandleRole::TextBox, &block, HandleRole::Block);
        let first = connected(f.service.connect(&gesture, None).await.unwrap());
        let second = connected(f.service.connect(&gesture, None).await.unwrap());

        assert_eq!(first.edge_type, EdgeType::Part);
        assert!(!first.is_locked());
        assert_ne!(first.id, second.id);
        assert_eq!(f.service.nodes().await, before);
        assert!(f.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_restores_relations() {
        let f = fixture();
        let part = f.service.add_node(NodeType::Block, Aspect::Product).await.unwrap();
        let whole = f.service.add_node(NodeType::Block, Aspect::Product).await.unwrap();
        let before: Vec<_> = f.service.nodes().await.iter().map(|n| node_relations(&n.data)).collect();

        let edge = connected(
            f.service
                .connect(&link(&part, HandleRole::Block, &whole, HandleRole::Block), Some(EdgeType::Part))
                .await
                .unwrap(),
        );
        assert_eq!(f.service.relations(&part.id).await.unwrap()[0].key.label(), "Part of");

        f.service.disconnect(&edge.id).await.unwrap();

        let after: Vec<_> = f.service.nodes().await.iter().map(|n| node_relations(&n.data)).collect();
        assert_eq!(before, after);
        assert!(EdgeRepository::find_all(&f.repo).await.unwrap().is_empty());

        let stored_part = NodeRepository::find_by_id(&f.repo, &part.id).await.unwrap().unwrap();
        assert_eq!(stored_part.data.parent, Some(NodeId::from("void")));
    }

    #[tokio::test]
    async fn test_disconnect_unknown_edge() {
        let f = fixture();
        let result = f.service.disconnect(&EdgeId::from("nope")).await;
        assert_eq!(result, Err(CoreError::EdgeNotFound("nope".to_string())));
    }

    #[tokio::test]
    async fn test_retype_part_to_fulfilled() {
        let f = fixture();
        let part = f.service.add_node(NodeType::Block, Aspect::Product).await.unwrap();
        let whole = f.service.add_node(NodeType::Block, Aspect::Product).await.unwrap();
        let edge = connected(
            f.service
                .connect(&link(&part, HandleRole::Block, &whole, HandleRole::Block), Some(EdgeType::Part))
                .await
                .unwrap(),
        );

        assert!(f.service.retype_edge(&edge.id, EdgeType::Fulfilled).await.unwrap());

        let nodes = f.service.nodes().await;
        assert_eq!(
            nodes.get(&whole.id).unwrap().data.fulfilled_by,
            vec![NodeRef::new(part.id.clone())]
        );
        assert_eq!(nodes.get(&part.id).unwrap().data.fulfills, vec![NodeRef::new(whole.id.clone())]);
        let stored = EdgeRepository::find_by_id(&f.repo, &edge.id).await.unwrap().unwrap();
        assert_eq!(stored.edge_type, EdgeType::Fulfilled);
    }

    #[tokio::test]
    async fn test_retype_onto_held_relation_refused() {
        let f = fixture();
        let part = f.service.add_node(NodeType::Block, Aspect::Product).await.unwrap();
        let whole = f.service.add_node(NodeType::Block, Aspect::Product).await.unwrap();
        let gesture = link(&part, HandleRole::Block, &whole, HandleRole::Block);
        let structural = connected(f.service.connect(&gesture, Some(EdgeType::Part)).await.unwrap());
        let fulfilled = connected(f.service.connect(&gesture, Some(EdgeType::Fulfilled)).await.unwrap());
        let before = f.service.nodes().await;

        assert!(!f.service.retype_edge(&structural.id, EdgeType::Fulfilled).await.unwrap());
        assert_eq!(f.service.nodes().await, before);
        assert_eq!(
            f.notifier.messages(),
            vec![format!(
                "Connection {} already holds a Fulfilled relation between these nodes",
                fulfilled.id
            )]
        );
    }

    #[tokio::test]
    async fn test_retype_annotation_writes_no_relations() {
        let f = fixture();
        let note = f.service.add_node(NodeType::TextBox, Aspect::Function).await.unwrap();
        let block = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let edge = connected(
            f.service
                .connect(&link(&note, HandleRole::TextBox, &block, HandleRole::Block), Some(EdgeType::Part))
                .await
                .unwrap(),
        );
        let before = f.service.nodes().await;

        assert!(f.service.retype_edge(&edge.id, EdgeType::Fulfilled).await.unwrap());
        assert_eq!(f.service.nodes().await, before);
        assert_eq!(f.service.edges().await[0].edge_type, EdgeType::Fulfilled);

        f.service.disconnect(&edge.id).await.unwrap();
        assert_eq!(f.service.nodes().await, before);
    }

    #[tokio::test]
    async fn test_retype_locked_edge_refused() {
        let f = fixture();
        let block = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let terminal = f.service.add_node(NodeType::Terminal, Aspect::Function).await.unwrap();
        let edge = connected(
            f.service
                .connect(&link(&block, HandleRole::Block, &terminal, HandleRole::Terminal), None)
                .await
                .unwrap(),
        );

        assert!(!f.service.retype_edge(&edge.id, EdgeType::Part).await.unwrap());
        assert_eq!(f.notifier.messages().len(), 1);
        assert!(f.service.retype_edge(&edge.id, EdgeType::Connected).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_node_tears_down_neighbours() {
        let f = fixture();
        let block = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let terminal = f.service.add_node(NodeType::Terminal, Aspect::Function).await.unwrap();
        let whole = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();

        connected(
            f.service
                .connect(&link(&block, HandleRole::Block, &terminal, HandleRole::Terminal), None)
                .await
                .unwrap(),
        );
        connected(
            f.service
                .connect(&link(&block, HandleRole::Block, &whole, HandleRole::Block), Some(EdgeType::Part))
                .await
                .unwrap(),
        );

        f.service.delete_node(&block.id).await.unwrap();

        let nodes = f.service.nodes().await;
        assert!(!nodes.contains(&block.id));
        assert!(nodes.get(&terminal.id).unwrap().data.terminal_of.is_none());
        assert!(nodes.get(&whole.id).unwrap().data.direct_parts.is_empty());
        assert!(f.service.edges().await.is_empty());
        assert!(NodeRepository::find_by_id(&f.repo, &block.id).await.unwrap().is_none());
        assert!(EdgeRepository::find_all(&f.repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_edges_tears_down_missing_edges() {
        let f = fixture();
        let a = f.service.add_node(NodeType::Block, Aspect::Location).await.unwrap();
        let b = f.service.add_node(NodeType::Block, Aspect::Location).await.unwrap();
        let c = f.service.add_node(NodeType::Block, Aspect::Location).await.unwrap();

        let keep = connected(
            f.service
                .connect(&link(&a, HandleRole::Block, &b, HandleRole::Block), Some(EdgeType::Fulfilled))
                .await
                .unwrap(),
        );
        connected(
            f.service
                .connect(&link(&c, HandleRole::Block, &b, HandleRole::Block), Some(EdgeType::Fulfilled))
                .await
                .unwrap(),
        );

        let removed = f.service.sync_edges(&[keep.clone()]).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(f.service.edges().await, vec![keep]);

        let nodes = f.service.nodes().await;
        assert_eq!(nodes.get(&b.id).unwrap().data.fulfilled_by, vec![NodeRef::new(a.id.clone())]);
        assert!(nodes.get(&c.id).unwrap().data.fulfills.is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_graph_untouched() {
        let repo = MemoryModelRepository::with_model(
            vec![
                Node::new(NodeId::from("0"), NodeType::Block, Aspect::Function),
                Node::new(NodeId::from("1"), NodeType::Terminal, Aspect::Function),
            ],
            Vec::new(),
        );
        let mut committer = MockCommitter::new();
        committer
            .expect_commit()
            .times(1)
            .returning(|_| Err(CoreError::StateStoreError("offline".to_string())));

        let service = ModelService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(committer),
            Arc::new(RecordingNotifier::default()),
            EngineConfig::default(),
        );
        service.load().await.unwrap();
        let before = service.nodes().await;

        let connection = Connection::new("0", "block-1", "1", "terminal-1");
        let result = service.connect(&connection, None).await;

        assert_eq!(result, Err(CoreError::StateStoreError("offline".to_string())));
        assert_eq!(service.nodes().await, before);
        assert!(service.edges().await.is_empty());
    }

    #[tokio::test]
    async fn test_check_does_not_write() {
        let f = fixture();
        let block = f.service.add_node(NodeType::Block, Aspect::Function).await.unwrap();
        let terminal = f.service.add_node(NodeType::Terminal, Aspect::Function).await.unwrap();
        let before = f.service.nodes().await;

        let check = f
            .service
            .check(&link(&block, HandleRole::Block, &terminal, HandleRole::Terminal), None)
            .await;

        assert!(check.can_connect);
        assert_eq!(check.connection_type, Some(EdgeType::Connected));
        assert_eq!(f.service.nodes().await, before);
    }
}
