#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/base/userop-inspector/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod abi;
pub use abi::{
    AbiCache, AbiLookup, AbiResolver, AbiSource, CacheError, FileStore, KeyValueStore,
    LookupError, MemoryStore, ResolvedAbi, SourcifyClient, StaticRegistry,
};

pub mod chains;
pub use chains::{ChainError, SupportedChain};

mod config;
pub use config::{ConfigError, InspectorArgs, parse_block_id};

pub mod contracts;
pub use contracts::{ENTRYPOINT_V06_ADDRESS, SENDER_CREATOR_V06_ADDRESS};

pub mod encoding;
pub use encoding::{EncodeError, encode_handle_op, encode_simulate_handle_op, post_op_target};

pub mod endpoint;
pub use endpoint::{EndpointError, EndpointValidator};

pub mod simulation;
pub use simulation::{DEFAULT_SIMULATION_URL, build_simulation_link};

pub mod trace;
pub use trace::{
    CallTraceNode, CallTreeDecoder, TraceError, TraceOptions, TraceRequestor, TraceTarget,
    render_tree, trace_simulation,
};

pub mod userop;
pub use userop::{
    AnnotatedOperation, ParseError, SignatureNotice, SignaturePlaceholder, UserOperation,
};
