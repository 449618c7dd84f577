//! Built-in numeric node definitions.
//!
//! All sockets carry `f64`. Every definition works with any environment
//! type, so the same catalog serves every graph.

use nodegraph_core::{
    EvalError, InputSocket, NodeDefinition, OutputSocket, PortList, ProcessContext,
};

/// Emits its `value` input unchanged. Useful as an editable source.
pub struct Constant {
    ports: PortList,
    /// Value to emit.
    pub value: InputSocket<f64>,
    /// Emitted value.
    pub out: OutputSocket<f64>,
}

impl Constant {
    /// Creates the definition.
    pub fn new() -> Self {
        let mut ports = PortList::builder();
        let value = ports.input("value", 0.0);
        let out = ports.output("out");
        Self {
            ports: ports.build(),
            value,
            out,
        }
    }
}

impl Default for Constant {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> NodeDefinition<E> for Constant {
    type State = ();

    fn ports(&self) -> &PortList {
        &self.ports
    }

    fn init_state(&self) {}

    fn label(&self) -> &str {
        "constant"
    }

    fn process(&self, ctx: &mut ProcessContext<'_, (), E>) -> Result<(), EvalError> {
        let value = ctx.get(self.value)?;
        ctx.set(self.out, value)
    }
}

/// Declares a two-input arithmetic node with inputs `a`, `b` and output `out`.
macro_rules! binary_node {
    ($(#[$doc:meta])* $name:ident, $label:literal, |$ctx:ident, $a:ident, $b:ident| $body:expr) => {
        $(#[$doc])*
        pub struct $name {
            ports: PortList,
            /// Left operand.
            pub a: InputSocket<f64>,
            /// Right operand.
            pub b: InputSocket<f64>,
            /// Result.
            pub out: OutputSocket<f64>,
        }

        impl $name {
            /// Creates the definition.
            pub fn new() -> Self {
                let mut ports = PortList::builder();
                let a = ports.input("a", 0.0);
                let b = ports.input("b", 0.0);
                let out = ports.output("out");
                Self {
                    ports: ports.build(),
                    a,
                    b,
                    out,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<E: 'static> NodeDefinition<E> for $name {
            type State = ();

            fn ports(&self) -> &PortList {
                &self.ports
            }

            fn init_state(&self) {}

            fn label(&self) -> &str {
                $label
            }

            fn process(&self, $ctx: &mut ProcessContext<'_, (), E>) -> Result<(), EvalError> {
                let $a = $ctx.get(self.a)?;
                let $b = $ctx.get(self.b)?;
                let result: Result<f64, EvalError> = $body;
                $ctx.set(self.out, result?)
            }
        }
    };
}

binary_node!(
    /// `out = a + b`
    Add,
    "add",
    |ctx, a, b| Ok(a + b)
);

binary_node!(
    /// `out = a - b`
    Subtract,
    "subtract",
    |ctx, a, b| Ok(a - b)
);

binary_node!(
    /// `out = a * b`
    Multiply,
    "multiply",
    |ctx, a, b| Ok(a * b)
);

binary_node!(
    /// `out = a / b`, failing when `b` is zero.
    Divide,
    "divide",
    |ctx, a, b| if b == 0.0 {
        Err(ctx.fail("division by zero"))
    } else {
        Ok(a / b)
    }
);

/// Emits how many times it has been pulled in the current round.
///
/// Not cached: every read of its output processes it again.
pub struct Counter {
    ports: PortList,
    /// Amount added per pull.
    pub step: InputSocket<f64>,
    /// Running count.
    pub out: OutputSocket<f64>,
}

impl Counter {
    /// Creates the definition.
    pub fn new() -> Self {
        let mut ports = PortList::builder();
        let step = ports.input("step", 1.0);
        let out = ports.output("out");
        Self {
            ports: ports.build(),
            step,
            out,
        }
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> NodeDefinition<E> for Counter {
    type State = f64;

    fn ports(&self) -> &PortList {
        &self.ports
    }

    fn init_state(&self) -> f64 {
        0.0
    }

    fn should_cache(&self) -> bool {
        false
    }

    fn label(&self) -> &str {
        "counter"
    }

    fn process(&self, ctx: &mut ProcessContext<'_, f64, E>) -> Result<(), EvalError> {
        let step = ctx.get(self.step)?;
        let count = ctx.state();
        *count += step;
        let count = *count;
        ctx.set(self.out, count)
    }
}

/// Running sum of its input over every evaluation in a round.
pub struct Accumulator {
    ports: PortList,
    /// Value added on each evaluation.
    pub value: InputSocket<f64>,
    /// Sum so far.
    pub total: OutputSocket<f64>,
}

impl Accumulator {
    /// Creates the definition.
    pub fn new() -> Self {
        let mut ports = PortList::builder();
        let value = ports.input("value", 0.0);
        let total = ports.output("total");
        Self {
            ports: ports.build(),
            value,
            total,
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> NodeDefinition<E> for Accumulator {
    type State = f64;

    fn ports(&self) -> &PortList {
        &self.ports
    }

    fn init_state(&self) -> f64 {
        0.0
    }

    fn label(&self) -> &str {
        "accumulator"
    }

    fn process(&self, ctx: &mut ProcessContext<'_, f64, E>) -> Result<(), EvalError> {
        let value = ctx.get(self.value)?;
        let total = ctx.state();
        *total += value;
        let total = *total;
        ctx.set(self.total, total)
    }
}
