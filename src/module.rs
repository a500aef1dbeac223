use alloc::{format, string::String, vec::Vec};
use core::{any::type_name, panic::Location};

use crate::{
    annotate::{annotate, Annotated},
    dependency_resolver::DependencyResolver,
    errors::ResolveErrorKind,
    instantiator::{instance, Instantiator},
    invoker::{boxed_invoker, BoxedCloneInvoker, Invoker},
    scope::Scope,
};

/// One declaration inside a module: a constructor, a supplied value, a
/// decorator, a function to invoke, or a nested module.
pub enum ModuleOption {
    Provide(ProvideEntry),
    Invoke(InvokeEntry),
    Decorate(DecorateEntry),
    Module(ModuleDecl),
}

pub struct ProvideEntry {
    pub(crate) annotated: Annotated,
    pub(crate) is_supply: bool,
    pub(crate) origin: &'static Location<'static>,
}

pub struct DecorateEntry {
    pub(crate) annotated: Annotated,
    pub(crate) origin: &'static Location<'static>,
}

pub struct InvokeEntry {
    pub(crate) invoker: BoxedCloneInvoker,
    pub(crate) function: &'static str,
    pub(crate) origin: &'static Location<'static>,
}

pub struct ModuleDecl {
    name: &'static str,
    options: Vec<ModuleOption>,
}

/// Accepts either a plain constructor or an already [`annotate`]d one.
pub trait IntoProvide<Marker> {
    #[doc(hidden)]
    fn into_annotated(self) -> Annotated;
}

impl IntoProvide<()> for Annotated {
    fn into_annotated(self) -> Annotated {
        self
    }
}

impl<Inst, Deps> IntoProvide<(Deps,)> for Inst
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver<Error = ResolveErrorKind>,
{
    fn into_annotated(self) -> Annotated {
        annotate(self, [])
    }
}

/// Declares a constructor whose result is registered application-wide,
/// while its own parameters resolve in the declaring module's scope.
#[track_caller]
#[must_use]
pub fn provide<P, Marker>(provider: P) -> ModuleOption
where
    P: IntoProvide<Marker>,
{
    ModuleOption::Provide(ProvideEntry {
        annotated: provider.into_annotated(),
        is_supply: false,
        origin: Location::caller(),
    })
}

/// Registers a value built outside the runtime.
#[track_caller]
#[must_use]
pub fn supply<T: Clone + Send + Sync + 'static>(value: T) -> ModuleOption {
    let mut annotated = annotate(instance(value), []);
    annotated.constructor = type_name::<T>();
    ModuleOption::Provide(ProvideEntry {
        annotated,
        is_supply: true,
        origin: Location::caller(),
    })
}

/// Declares a function run when the application starts.
#[track_caller]
#[must_use]
pub fn invoke<F, Deps>(function: F) -> ModuleOption
where
    F: Invoker<Deps> + Send + Sync,
    Deps: DependencyResolver<Error = ResolveErrorKind>,
{
    ModuleOption::Invoke(InvokeEntry {
        invoker: boxed_invoker(function),
        function: type_name::<F>(),
        origin: Location::caller(),
    })
}

/// Declares a decorator, replacing the value of its result type for this
/// module and its descendants only.
#[track_caller]
#[must_use]
pub fn decorate<P, Marker>(decorator: P) -> ModuleOption
where
    P: IntoProvide<Marker>,
{
    ModuleOption::Decorate(DecorateEntry {
        annotated: decorator.into_annotated(),
        origin: Location::caller(),
    })
}

/// Declares a named child module.
#[must_use]
pub fn module(name: &'static str, options: impl IntoIterator<Item = ModuleOption>) -> ModuleOption {
    ModuleOption::Module(ModuleDecl {
        name,
        options: options.into_iter().collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

pub(crate) struct ModuleNode {
    pub(crate) name: &'static str,
    // Dotted path from the root, e.g. "app.redis". Module names aren't
    // required to be unique; the path disambiguates diagnostics.
    pub(crate) path: String,
    pub(crate) parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) provides: Vec<ProvideEntry>,
    pub(crate) invokes: Vec<InvokeEntry>,
    pub(crate) decorators: Vec<DecorateEntry>,
    pub(crate) scope: Option<Scope>,
}

impl ModuleNode {
    fn new(name: &'static str, path: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            path,
            parent,
            children: Vec::new(),
            provides: Vec::new(),
            invokes: Vec::new(),
            decorators: Vec::new(),
            scope: None,
        }
    }
}

pub(crate) struct ModuleTree {
    nodes: Vec<ModuleNode>,
}

impl ModuleTree {
    pub(crate) const ROOT: NodeId = NodeId(0);

    pub(crate) fn from_options(name: &'static str, options: impl IntoIterator<Item = ModuleOption>) -> Self {
        let mut tree = Self {
            nodes: alloc::vec![ModuleNode::new(name, String::from(name), None)],
        };
        for option in options {
            tree.apply(Self::ROOT, option);
        }
        tree
    }

    fn apply(&mut self, node: NodeId, option: ModuleOption) {
        match option {
            ModuleOption::Provide(entry) => self.nodes[node.0].provides.push(entry),
            ModuleOption::Invoke(entry) => self.nodes[node.0].invokes.push(entry),
            ModuleOption::Decorate(entry) => self.nodes[node.0].decorators.push(entry),
            ModuleOption::Module(decl) => {
                let child = self.push_child(node, decl.name);
                for option in decl.options {
                    self.apply(child, option);
                }
            }
        }
    }

    fn push_child(&mut self, parent: NodeId, name: &'static str) -> NodeId {
        let path = format!("{}.{}", self.nodes[parent.0].path, name);
        let id = NodeId(self.nodes.len());
        self.nodes.push(ModuleNode::new(name, path, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn node(&self, id: NodeId) -> &ModuleNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ModuleNode {
        &mut self.nodes[id.0]
    }

    /// Node ids in declaration order, parents before children.
    pub(crate) fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = alloc::vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{invoke, module, supply, ModuleOption, ModuleTree};
    use crate::errors::InvokeErrorKind;

    use alloc::{string::String, vec::Vec};

    #[test]
    fn test_tree_shape_and_order() {
        let options = [
            supply(1u8),
            module(
                "storage",
                [
                    supply(String::from("dsn")),
                    module("redis", [invoke(|| Ok::<_, InvokeErrorKind>(()))]),
                ],
            ),
            module("http", [] as [ModuleOption; 0]),
        ];
        let tree = ModuleTree::from_options("app", options);

        let paths: Vec<&str> = tree.pre_order().into_iter().map(|id| tree.node(id).path.as_str()).collect();
        assert_eq!(paths, ["app", "app.storage", "app.storage.redis", "app.http"]);

        assert_eq!(tree.node(ModuleTree::ROOT).provides.len(), 1);
        let redis = tree.pre_order()[2];
        assert_eq!(tree.node(redis).invokes.len(), 1);
    }
}
