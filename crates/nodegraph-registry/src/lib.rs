//! Node catalog for nodegraph.
//!
//! This crate maps stable string identifiers to node definitions and back.
//! Codecs use it to persist which definition an instance was created from,
//! and front ends use it to list what can be placed in a graph.
//!
//! # Features
//!
//! - **Node Discovery**: List all registered nodes with metadata
//! - **Factory Pattern**: Create instances by identifier at runtime
//! - **Reverse Lookup**: Find the identifier of a shared definition
//! - **Category System**: Nodes organized by role (sources, math, stateful)
//!
//! # Example
//!
//! ```rust
//! use nodegraph_registry::{NodeCategory, NodeRegistry};
//!
//! let registry = NodeRegistry::<()>::with_builtins();
//!
//! for node in registry.all() {
//!     println!("{}: {}", node.id, node.description);
//! }
//!
//! let add = registry.instantiate("add").unwrap();
//! assert_eq!(registry.id_of(add.definition()), Some("add"));
//!
//! assert_eq!(registry.in_category(NodeCategory::Math).count(), 4);
//! ```

pub mod builtin;

use nodegraph_core::{Definition, NodeDefinition, NodeInstance};
use thiserror::Error;

pub use builtin::{Accumulator, Add, Constant, Counter, Divide, Multiply, Subtract};

/// Category of node for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Nodes that introduce values into a graph.
    Source,
    /// Pure arithmetic.
    Math,
    /// Nodes whose outputs depend on persistent state.
    Stateful,
    /// Anything else.
    Utility,
}

impl NodeCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Source => "Source",
            NodeCategory::Math => "Math",
            NodeCategory::Stateful => "Stateful",
            NodeCategory::Utility => "Utility",
        }
    }
}

/// Describes a node type in the registry.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Unique identifier (lowercase, no spaces). Persisted by codecs.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// Category for organization.
    pub category: NodeCategory,
}

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Another definition is already registered under this identifier.
    #[error("node id '{0}' is already registered")]
    DuplicateId(&'static str),
}

/// Read-only mapping between identifiers and definitions.
///
/// This is the view serializers need: resolve a persisted identifier to a
/// definition, and find the identifier of a definition being persisted.
pub trait NodeLookup<E> {
    /// Definition registered under `id`.
    fn definition(&self, id: &str) -> Option<Definition<E>>;

    /// Identifier of a definition, compared by identity.
    fn id_of_definition(&self, definition: &Definition<E>) -> Option<&str>;
}

struct RegistryEntry<E> {
    descriptor: NodeDescriptor,
    definition: Definition<E>,
}

/// Registry of node definitions for graphs with environment `E`.
pub struct NodeRegistry<E> {
    entries: Vec<RegistryEntry<E>>,
}

impl<E: 'static> Default for NodeRegistry<E> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<E: 'static> NodeRegistry<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a registry with all built-in nodes registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(7),
        };
        registry.register_builtin_nodes();
        registry
    }

    fn register_builtin_nodes(&mut self) {
        let builtins: [(NodeDescriptor, Definition<E>); 7] = [
            (
                NodeDescriptor {
                    id: "constant",
                    name: "Constant",
                    description: "Emits its value input unchanged",
                    category: NodeCategory::Source,
                },
                Definition::new(Constant::new()),
            ),
            (
                NodeDescriptor {
                    id: "add",
                    name: "Add",
                    description: "Sum of two numbers",
                    category: NodeCategory::Math,
                },
                Definition::new(Add::new()),
            ),
            (
                NodeDescriptor {
                    id: "subtract",
                    name: "Subtract",
                    description: "Difference of two numbers",
                    category: NodeCategory::Math,
                },
                Definition::new(Subtract::new()),
            ),
            (
                NodeDescriptor {
                    id: "multiply",
                    name: "Multiply",
                    description: "Product of two numbers",
                    category: NodeCategory::Math,
                },
                Definition::new(Multiply::new()),
            ),
            (
                NodeDescriptor {
                    id: "divide",
                    name: "Divide",
                    description: "Quotient of two numbers, fails on division by zero",
                    category: NodeCategory::Math,
                },
                Definition::new(Divide::new()),
            ),
            (
                NodeDescriptor {
                    id: "counter",
                    name: "Counter",
                    description: "Counts how often it is pulled, never cached",
                    category: NodeCategory::Stateful,
                },
                Definition::new(Counter::new()),
            ),
            (
                NodeDescriptor {
                    id: "accumulator",
                    name: "Accumulator",
                    description: "Running sum of its input across evaluations",
                    category: NodeCategory::Stateful,
                },
                Definition::new(Accumulator::new()),
            ),
        ];

        for (descriptor, definition) in builtins {
            self.entries.push(RegistryEntry {
                descriptor,
                definition,
            });
        }
    }

    /// Registers a shared definition under a new identifier.
    pub fn register(
        &mut self,
        descriptor: NodeDescriptor,
        definition: Definition<E>,
    ) -> Result<(), RegistryError> {
        if self.entry(descriptor.id).is_some() {
            return Err(RegistryError::DuplicateId(descriptor.id));
        }
        self.entries.push(RegistryEntry {
            descriptor,
            definition,
        });
        Ok(())
    }

    /// Wraps and registers a definition.
    pub fn register_node<T: NodeDefinition<E>>(
        &mut self,
        descriptor: NodeDescriptor,
        node: T,
    ) -> Result<(), RegistryError> {
        self.register(descriptor, Definition::new(node))
    }

    /// Definition registered under `id`.
    pub fn get(&self, id: &str) -> Option<&Definition<E>> {
        self.entry(id).map(|e| &e.definition)
    }

    /// Concrete definition registered under `id`, for reaching its socket handles.
    pub fn get_as<T: NodeDefinition<E>>(&self, id: &str) -> Option<&T> {
        self.get(id).and_then(|d| d.downcast_ref::<T>())
    }

    /// Descriptor registered under `id`.
    pub fn descriptor(&self, id: &str) -> Option<&NodeDescriptor> {
        self.entry(id).map(|e| &e.descriptor)
    }

    /// Identifier of a definition, compared by identity.
    pub fn id_of(&self, definition: &Definition<E>) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.definition.ptr_eq(definition))
            .map(|e| e.descriptor.id)
    }

    /// New instance of the definition registered under `id`.
    pub fn instantiate(&self, id: &str) -> Option<NodeInstance<E>> {
        self.get(id).map(|d| NodeInstance::new(d.clone()))
    }

    /// Descriptors in registration order.
    pub fn all(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Descriptors in one category.
    pub fn in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeDescriptor> {
        self.all().filter(move |d| d.category == category)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: &str) -> Option<&RegistryEntry<E>> {
        self.entries.iter().find(|e| e.descriptor.id == id)
    }
}

impl<E: 'static> NodeLookup<E> for NodeRegistry<E> {
    fn definition(&self, id: &str) -> Option<Definition<E>> {
        self.get(id).cloned()
    }

    fn id_of_definition(&self, definition: &Definition<E>) -> Option<&str> {
        self.id_of(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = NodeRegistry::<()>::with_builtins();
        assert_eq!(registry.len(), 7);
        for id in [
            "constant",
            "add",
            "subtract",
            "multiply",
            "divide",
            "counter",
            "accumulator",
        ] {
            assert!(registry.get(id).is_some(), "missing builtin '{id}'");
            assert_eq!(registry.descriptor(id).map(|d| d.id), Some(id));
        }
    }

    #[test]
    fn test_categories() {
        let registry = NodeRegistry::<()>::with_builtins();
        assert_eq!(registry.in_category(NodeCategory::Math).count(), 4);
        assert_eq!(registry.in_category(NodeCategory::Stateful).count(), 2);
        assert_eq!(registry.in_category(NodeCategory::Utility).count(), 0);
        assert_eq!(NodeCategory::Stateful.name(), "Stateful");
    }

    #[test]
    fn test_reverse_lookup_by_identity() {
        let registry = NodeRegistry::<()>::with_builtins();
        let add = registry.instantiate("add").unwrap();
        assert_eq!(registry.id_of(add.definition()), Some("add"));

        // Same type, different definition object.
        let stray = Definition::<()>::new(Add::new());
        assert_eq!(registry.id_of(&stray), None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = NodeRegistry::<()>::with_builtins();
        let result = registry.register_node(
            NodeDescriptor {
                id: "add",
                name: "Another Add",
                description: "",
                category: NodeCategory::Math,
            },
            Add::new(),
        );
        assert_eq!(result, Err(RegistryError::DuplicateId("add")));
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = NodeRegistry::<()>::new();
        assert!(registry.is_empty());
        registry
            .register_node(
                NodeDescriptor {
                    id: "sum",
                    name: "Sum",
                    description: "Alias of add",
                    category: NodeCategory::Utility,
                },
                Add::new(),
            )
            .unwrap();
        assert!(registry.get_as::<Add>("sum").is_some());
        assert!(registry.get_as::<Multiply>("sum").is_none());
        assert!(registry.instantiate("missing").is_none());
    }

    #[test]
    fn test_lookup_trait() {
        let registry = NodeRegistry::<()>::with_builtins();
        let lookup: &dyn NodeLookup<()> = &registry;
        let def = lookup.definition("divide").unwrap();
        assert_eq!(lookup.id_of_definition(&def), Some("divide"));
    }
}
