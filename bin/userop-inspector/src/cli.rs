//! Contains the CLI arguments for the userop-inspector binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use userop_inspector::{InspectorArgs, SignaturePlaceholder, TraceTarget};

use crate::logging::LoggingArgs;

/// ERC-4337 v0.6 UserOperation inspector.
#[derive(Debug, Parser)]
#[command(name = "userop-inspector")]
#[command(about = "Inspect, encode, link and trace ERC-4337 v0.6 UserOperations")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingArgs,

    #[command(flatten)]
    pub(crate) inspector: InspectorArgs,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Where the UserOperation JSON is read from.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct InputArgs {
    /// File holding the UserOperation JSON. Reads stdin when omitted.
    #[arg(short = 'f', long = "file")]
    pub(crate) file: Option<PathBuf>,

    /// Use the 65-byte ECDSA placeholder instead of the passkey one for unsigned operations
    #[arg(long = "ecdsa")]
    pub(crate) ecdsa: bool,
}

impl InputArgs {
    /// Placeholder inserted when the operation has no signature
    pub(crate) const fn placeholder(&self) -> SignaturePlaceholder {
        if self.ecdsa { SignaturePlaceholder::Ecdsa } else { SignaturePlaceholder::Passkey }
    }
}

/// Subcommands for the userop-inspector CLI.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Print the normalized UserOperation
    #[command(visible_alias = "p")]
    Parse {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print EntryPoint calldata for the UserOperation
    #[command(visible_alias = "e")]
    Encode {
        #[command(flatten)]
        input: InputArgs,

        /// Encode `handleOps` instead of `simulateHandleOp`
        #[arg(long = "handle-ops")]
        handle_ops: bool,
    },
    /// Print a transaction simulator link for the UserOperation
    #[command(visible_alias = "l")]
    Link {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Trace the UserOperation through the EntryPoint and print the decoded call tree
    #[command(visible_alias = "t")]
    Trace {
        #[command(flatten)]
        input: InputArgs,

        /// Trace `handleOps` instead of `simulateHandleOp`
        #[arg(long = "handle-ops")]
        handle_ops: bool,

        /// Skip ABI decoding
        #[arg(long = "raw")]
        raw: bool,

        /// Print the call tree as JSON
        #[arg(long = "json")]
        json: bool,
    },
}

/// EntryPoint function selected by `--handle-ops`
pub(crate) const fn trace_target(handle_ops: bool) -> TraceTarget {
    if handle_ops { TraceTarget::HandleOps } else { TraceTarget::SimulateHandleOp }
}
