use kismet_core::{MetadataProvider, NodeTypeRegistry};

/// Read-only environment shared by discovery, filtering and spawning.
#[derive(Clone, Copy)]
pub struct ActionEnv<'a> {
    pub metadata: &'a dyn MetadataProvider,
    pub node_types: &'a NodeTypeRegistry,
}

impl<'a> ActionEnv<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider, node_types: &'a NodeTypeRegistry) -> Self {
        Self {
            metadata,
            node_types,
        }
    }
}
