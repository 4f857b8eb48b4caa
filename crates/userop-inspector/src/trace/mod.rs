//! Call tracing and call-tree decoding.
//!
//! - `requestor`: issues `debug_traceCall` with the `callTracer` against the
//!   EntryPoint for a UserOperation and returns the raw [`CallTraceNode`] tree.
//! - `decoder`: walks the tree and labels each node's input and output with
//!   ABI-decoded text, falling back to raw hex wherever decoding is impossible.
//! - `render`: value formatting and an indented text view of the tree.

mod decoder;
mod render;
mod requestor;
mod types;

pub use decoder::CallTreeDecoder;
pub use render::{format_call, format_value, render_tree};
pub(crate) use requestor::parse_endpoint;
pub use requestor::{
    DEFAULT_TRACE_TIMEOUT, TraceError, TraceOptions, TraceRequestor, TraceTarget,
    trace_simulation,
};
pub use types::CallTraceNode;
