use alloc::{string::String, vec::Vec};
use tracing::{debug, error};

/// Lifecycle notifications emitted while the application starts.
#[derive(Debug, Clone)]
pub enum Event {
    Supplied {
        type_name: &'static str,
        module: String,
        error: Option<String>,
    },
    Provided {
        constructor: &'static str,
        outputs: Vec<String>,
        module: String,
        error: Option<String>,
    },
    Decorated {
        decorator: &'static str,
        module: String,
        error: Option<String>,
    },
    Invoking {
        function: &'static str,
        module: String,
    },
    Invoked {
        function: &'static str,
        module: String,
        error: Option<String>,
        trace: String,
    },
}

pub trait EventHandler: Send {
    fn handle(&mut self, event: &Event);
}

/// Default handler forwarding every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl EventHandler for TracingLogger {
    fn handle(&mut self, event: &Event) {
        match event {
            Event::Supplied { type_name, module, error } => match error {
                Some(error) => error!(module = %module, "Error after supplying {type_name}: {error}"),
                None => debug!(module = %module, "Supplied {type_name}"),
            },
            Event::Provided {
                constructor,
                outputs,
                module,
                error,
            } => match error {
                Some(error) => error!(module = %module, "Error providing {constructor}: {error}"),
                None => debug!(module = %module, "Provided {outputs:?} from {constructor}"),
            },
            Event::Decorated { decorator, module, error } => match error {
                Some(error) => error!(module = %module, "Error decorating with {decorator}: {error}"),
                None => debug!(module = %module, "Decorated with {decorator}"),
            },
            Event::Invoking { function, module } => debug!(module = %module, "Invoking {function}"),
            Event::Invoked {
                function,
                module,
                error,
                trace,
            } => match error {
                Some(error) => error!(module = %module, "Invoke failed: {function} ({trace}): {error}"),
                None => debug!(module = %module, "Invoked {function}"),
            },
        }
    }
}
