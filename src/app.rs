use alloc::{
    boxed::Box,
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::panic::Location;

use crate::{
    errors::{AppErrorKind, RegisterErrorKind},
    event::{Event, EventHandler, TracingLogger},
    invoker::BoxedCloneInvoker,
    module::{ModuleOption, ModuleTree},
    scope::Scope,
    service::Service as _,
};

/// Lifecycle of an application. Start walks the states in order and parks
/// in `Ready` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Applying,
    Building,
    Registering,
    Invoking,
    Ready,
    Error,
}

// Keeps the first error of the registration phase; later failures are
// still reported through events but don't replace it.
struct ErrorSink {
    first: Option<AppErrorKind>,
}

impl ErrorSink {
    fn record(&mut self, err: AppErrorKind) {
        if self.first.is_none() {
            self.first = Some(err);
        }
    }
}

/// An application assembled from module options.
///
/// Construction only shapes the module tree; scopes are built and bindings
/// installed when [`App::start`] runs. The first error anywhere in the
/// pipeline halts it and moves the application into [`AppState::Error`].
pub struct App {
    tree: ModuleTree,
    state: AppState,
    handler: Box<dyn EventHandler>,
}

impl App {
    #[must_use]
    pub fn new(options: impl IntoIterator<Item = ModuleOption>) -> Self {
        Self {
            tree: ModuleTree::from_options("app", options),
            state: AppState::Applying,
            handler: Box::new(TracingLogger),
        }
    }

    #[must_use]
    pub fn with_event_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> AppState {
        self.state
    }

    /// Root module scope, available once the application has started.
    #[must_use]
    pub fn scope(&self) -> Option<&Scope> {
        self.tree.node(ModuleTree::ROOT).scope.as_ref()
    }

    /// Builds the scope tree, installs every binding and decorator, then
    /// runs the invoke functions in declaration order, parents first.
    pub fn start(&mut self) -> Result<(), AppErrorKind> {
        if self.state != AppState::Applying {
            return Err(AppErrorKind::AlreadyStarted(self.state));
        }

        self.state = AppState::Building;
        self.build_scopes();

        self.state = AppState::Registering;
        let mut sink = ErrorSink { first: None };
        self.register_bindings(&mut sink);
        if let Some(err) = sink.first.take() {
            self.state = AppState::Error;
            return Err(err);
        }

        self.state = AppState::Invoking;
        if let Err(err) = self.execute_invokes() {
            self.state = AppState::Error;
            return Err(err);
        }

        self.state = AppState::Ready;
        Ok(())
    }

    fn build_scopes(&mut self) {
        let runtime = Scope::root("runtime");
        for id in self.tree.pre_order() {
            let parent_scope = match self.tree.node(id).parent {
                Some(parent) => self
                    .tree
                    .node(parent)
                    .scope
                    .clone()
                    .expect("parent scope built before child in pre-order"),
                None => runtime.clone(),
            };
            let node = self.tree.node_mut(id);
            node.scope = Some(parent_scope.child(node.name));
        }
    }

    fn register_bindings(&mut self, sink: &mut ErrorSink) {
        for id in self.tree.pre_order() {
            let node = self.tree.node(id);
            let scope = node.scope.clone().expect("scopes built before registration");
            let module = node.path.clone();

            for entry in &node.provides {
                let result = entry
                    .annotated
                    .result
                    .clone()
                    .map_err(RegisterErrorKind::Annotation)
                    .and_then(|registration| scope.register(registration, true));

                let (outputs, error) = match &result {
                    Ok(info) => (vec![info.key.to_string()], None),
                    Err(err) => (Vec::new(), Some(err.to_string())),
                };
                let event = if entry.is_supply {
                    Event::Supplied {
                        type_name: entry.annotated.constructor,
                        module: module.clone(),
                        error,
                    }
                } else {
                    Event::Provided {
                        constructor: entry.annotated.constructor,
                        outputs,
                        module: module.clone(),
                        error,
                    }
                };
                self.handler.handle(&event);

                if let Err(source) = result {
                    sink.record(AppErrorKind::Provide {
                        constructor: entry.annotated.constructor,
                        module: module.clone(),
                        origin: entry.origin,
                        source,
                    });
                }
            }

            for entry in &node.decorators {
                let result = entry
                    .annotated
                    .result
                    .clone()
                    .map_err(RegisterErrorKind::Annotation)
                    .and_then(|registration| scope.register_decorator(registration));

                self.handler.handle(&Event::Decorated {
                    decorator: entry.annotated.constructor,
                    module: module.clone(),
                    error: result.as_ref().err().map(ToString::to_string),
                });

                if let Err(source) = result {
                    sink.record(AppErrorKind::Decorate {
                        decorator: entry.annotated.constructor,
                        module: module.clone(),
                        origin: entry.origin,
                        source,
                    });
                }
            }
        }
    }

    fn execute_invokes(&mut self) -> Result<(), AppErrorKind> {
        for id in self.tree.pre_order() {
            let node = self.tree.node(id);
            let scope = node.scope.clone().expect("scopes built before invokes");
            let module = node.path.clone();
            let entries: Vec<(BoxedCloneInvoker, &'static str, &'static Location<'static>)> = node
                .invokes
                .iter()
                .map(|entry| (entry.invoker.clone(), entry.function, entry.origin))
                .collect();

            for (mut invoker, function, origin) in entries {
                self.handler.handle(&Event::Invoking {
                    function,
                    module: module.clone(),
                });

                let result = invoker.call(scope.clone());

                self.handler.handle(&Event::Invoked {
                    function,
                    module: module.clone(),
                    error: result.as_ref().err().map(ToString::to_string),
                    trace: origin.to_string(),
                });

                if let Err(source) = result {
                    return Err(AppErrorKind::Invoke {
                        function,
                        module,
                        origin,
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{App, AppState};
    use crate::module::{module, ModuleOption, ModuleTree};

    #[test]
    fn test_scopes_built_parent_first() {
        let mut app = App::new([
            module("storage", [module("redis", [] as [ModuleOption; 0])]),
            module("http", [] as [ModuleOption; 0]),
        ]);
        app.start().unwrap();
        assert_eq!(app.state(), AppState::Ready);

        let order = app.tree.pre_order();
        assert_eq!(order.first().copied(), Some(ModuleTree::ROOT));

        for id in order {
            let node = app.tree.node(id);
            let scope = node.scope.as_ref().unwrap();
            assert_eq!(scope.name(), node.name);

            // Every module scope hangs off its parent module's scope; the
            // root module hangs off the runtime scope.
            let parent_name = scope.parent().unwrap().name();
            match node.parent {
                Some(parent) => assert_eq!(parent_name, app.tree.node(parent).name),
                None => assert_eq!(parent_name, "runtime"),
            }
        }
    }
}
