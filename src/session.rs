//! Editor session: the composition root for the action catalog and the
//! function compiler.
//!
//! An [`EditorSession`] owns everything that outlives a single query: the
//! catalog of actions, the node type table and the lowering handlers. The
//! reflection data stays with the caller and is passed into each call, so a
//! session never holds a borrow of it between calls.
//!
//! # Example
//!
//! ```
//! use kismet::{
//!     ClassInfo, EditorSession, FilterContext, FunctionFlags, FunctionInfo, MetadataRegistry,
//!     SessionConfig,
//! };
//!
//! let mut metadata = MetadataRegistry::new();
//! let actor = metadata.add_class(ClassInfo::new("Actor"));
//! metadata.add_function(
//!     FunctionInfo::new(actor, "Jump").with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
//! );
//!
//! let mut session = EditorSession::new(SessionConfig::default());
//! session.refresh_all(&metadata);
//! let menu = session.menu_actions(&metadata, FilterContext::new());
//! assert!(!menu.is_empty());
//! ```

use std::time::Duration;

use kismet_compiler::{CompiledFunction, CompilerOptions, FunctionCompiler, HandlerRegistry};
use kismet_core::{
    Blueprint, Graph, GraphId, Location, MetadataProvider, NodeKind, NodeRef, NodeTypeRegistry,
    ObjectId, TypeHash,
};
use kismet_registry::{
    Action, ActionCatalog, ActionEnv, ActionFilter, Clock, FilterContext, IncrementalPrimer,
    PrimerConfig,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from session operations that act on a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("blueprint has no graph {0:?}")]
    UnknownGraph(GraphId),

    #[error("{0} action placed no node")]
    NothingSpawned(&'static str),
}

/// Tunables for an [`EditorSession`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionConfig {
    pub primer: PrimerConfig,
    pub compiler: CompilerOptions,
}

impl SessionConfig {
    pub fn with_primer(mut self, primer: PrimerConfig) -> Self {
        self.primer = primer;
        self
    }

    pub fn with_compiler(mut self, compiler: CompilerOptions) -> Self {
        self.compiler = compiler;
        self
    }
}

/// Owns the action catalog, node type table and lowering handlers for one
/// editor.
pub struct EditorSession {
    config: SessionConfig,
    node_types: NodeTypeRegistry,
    catalog: ActionCatalog,
    handlers: HandlerRegistry,
}

impl EditorSession {
    /// A session with the built-in node types and handlers and an empty
    /// catalog.
    pub fn new(config: SessionConfig) -> Self {
        Self::from_primer(config, IncrementalPrimer::new(config.primer))
    }

    /// Like [`EditorSession::new`], but priming budgets are measured with
    /// `clock`.
    pub fn with_clock(config: SessionConfig, clock: impl Clock + 'static) -> Self {
        Self::from_primer(config, IncrementalPrimer::with_clock(config.primer, clock))
    }

    fn from_primer(config: SessionConfig, primer: IncrementalPrimer) -> Self {
        Self {
            config,
            node_types: NodeTypeRegistry::with_defaults(),
            catalog: ActionCatalog::with_primer(primer),
            handlers: HandlerRegistry::with_defaults(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn node_types(&self) -> &NodeTypeRegistry {
        &self.node_types
    }

    /// Node type table, for marking kinds deprecated.
    pub fn node_types_mut(&mut self) -> &mut NodeTypeRegistry {
        &mut self.node_types
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Lowering handler table, for registering project-specific handlers.
    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Borrowed view handed to discovery, filtering and spawning.
    pub fn env<'a>(&'a self, metadata: &'a dyn MetadataProvider) -> ActionEnv<'a> {
        ActionEnv::new(metadata, &self.node_types)
    }

    // ==========================================================================
    // Catalog maintenance
    // ==========================================================================

    /// Rebuild every catalog entry.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn refresh_all(&mut self, metadata: &dyn MetadataProvider) {
        let env = ActionEnv::new(metadata, &self.node_types);
        self.catalog.refresh_all(&env);
        info!(
            keys = self.catalog.len(),
            actions = self.catalog.action_count(),
            "session catalog rebuilt"
        );
    }

    /// A native or generated class was added or changed.
    pub fn class_changed(&mut self, metadata: &dyn MetadataProvider, class: TypeHash) {
        let env = ActionEnv::new(metadata, &self.node_types);
        self.catalog.refresh_class_actions(&env, class);
    }

    /// A class is going away; its actions go with it.
    pub fn class_removed(&mut self, class: TypeHash) -> bool {
        let removed = self.catalog.clear_class_actions(class);
        debug!(?class, removed, "class removed");
        removed
    }

    /// A blueprint finished compiling, so its skeleton class may have new
    /// members.
    pub fn blueprint_compiled(&mut self, metadata: &dyn MetadataProvider, blueprint: TypeHash) {
        let env = ActionEnv::new(metadata, &self.node_types);
        self.catalog.refresh_blueprint_actions(&env, blueprint);
    }

    /// A node type was registered or its discovery inputs changed.
    pub fn node_type_changed(&mut self, metadata: &dyn MetadataProvider, kind: NodeKind) {
        let env = ActionEnv::new(metadata, &self.node_types);
        self.catalog.refresh_node_type_actions(&env, kind);
    }

    /// A function or property was renamed; cached menu signatures naming it
    /// are rebuilt on next use.
    pub fn field_renamed(&self, field: TypeHash) {
        self.catalog.invalidate_signatures(field);
    }

    /// Per-frame update. Returns the number of actions primed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn tick(&mut self, metadata: &dyn MetadataProvider, delta: Duration) -> usize {
        let env = ActionEnv::new(metadata, &self.node_types);
        self.catalog.tick(&env, delta)
    }

    /// Drop every catalog entry and pending priming work.
    pub fn teardown(&mut self) {
        self.catalog.clear();
        debug!("session torn down");
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// Actions that survive `filter`, populating the catalog on first use.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn filtered_actions<'s>(
        &'s mut self,
        metadata: &dyn MetadataProvider,
        filter: &ActionFilter,
    ) -> Vec<&'s Action> {
        let env = ActionEnv::new(metadata, &self.node_types);
        self.catalog.get_all_actions(&env);
        filter.filtered_actions(&env, &self.catalog)
    }

    /// Actions offered by a context menu opened in `context`.
    pub fn menu_actions<'s>(
        &'s mut self,
        metadata: &dyn MetadataProvider,
        context: FilterContext,
    ) -> Vec<&'s Action> {
        self.filtered_actions(metadata, &ActionFilter::new(context))
    }

    // ==========================================================================
    // Editing
    // ==========================================================================

    /// Place `action`'s node in `graph`. Bound actions spawn one node per
    /// compatible object in `bindings`; the last one is returned.
    pub fn spawn(
        &self,
        metadata: &dyn MetadataProvider,
        action: &Action,
        blueprint: &mut Blueprint,
        graph: GraphId,
        bindings: &[ObjectId],
        location: Location,
    ) -> Result<NodeRef, SessionError> {
        if blueprint.graph(graph).is_none() {
            return Err(SessionError::UnknownGraph(graph));
        }
        let env = ActionEnv::new(metadata, &self.node_types);
        let spawned = if action.is_bound() {
            action.invoke_bound(&env, blueprint, graph, bindings, location)
        } else {
            action.invoke(&env, blueprint, graph, location)
        };
        spawned.ok_or(SessionError::NothingSpawned(action.node_kind().display_name()))
    }

    /// Lower one graph with the session's compiler options.
    pub fn compile_graph(&self, metadata: &dyn MetadataProvider, graph: &Graph) -> CompiledFunction {
        self.compile_graph_with(metadata, graph, self.config.compiler)
    }

    pub fn compile_graph_with(
        &self,
        metadata: &dyn MetadataProvider,
        graph: &Graph,
        options: CompilerOptions,
    ) -> CompiledFunction {
        let compiled = FunctionCompiler::new(&self.handlers, metadata, options).compile(graph);
        if compiled.has_errors() {
            warn!(
                graph = %graph.name,
                errors = compiled.diagnostics.error_count(),
                "graph compiled with errors"
            );
        }
        compiled
    }

    /// Lower every graph of `blueprint`, in graph order.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_blueprint(
        &self,
        metadata: &dyn MetadataProvider,
        blueprint: &Blueprint,
    ) -> Vec<CompiledFunction> {
        blueprint
            .graphs()
            .iter()
            .map(|graph| self.compile_graph(metadata, graph))
            .collect()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("config", &self.config)
            .field("catalog", &self.catalog.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
