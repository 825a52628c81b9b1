//! # Story Graph
//!
//! Static knot-flow graph extraction from compiled story bytecode.
//!
//! ## Architecture
//!
//! ```text
//! CompiledStory (JSON)
//!     │
//!     ├──> Bytecode accessors
//!     │      ├─ Locate trailing named-content map
//!     │      └─ Filter compiler metadata / reserved keys
//!     │
//!     ├──> Graph Builder (recursive body traversal)
//!     │      ├─ Track preceding text fragments (edge labels)
//!     │      ├─ Resolve divert targets
//!     │      ├─ Descend into choice branches and nested containers
//!     │      └─ Collect dangling diverts as diagnostics
//!     │
//!     └──> Story Graph (petgraph)
//!            ├─ Nodes: author-named knots
//!            ├─ Edges: labeled flow transitions (main line / choice)
//!            └─ Queries: reachability, dead ends, shortest paths
//! ```

mod builder;
mod bytecode;
mod queries;
mod types;

pub use builder::{BuildOutcome, GraphBuilder};
pub use bytecode::{named_content, is_reserved_key};
pub use types::{
    DanglingDivert, FlowEdge, FlowKind, FlowLink, GraphSnapshot, KnotNode, StoryGraph,
};
