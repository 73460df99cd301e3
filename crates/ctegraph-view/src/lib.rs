//! Layout and live-update pipeline for ctegraph lineage graphs.
//!
//! [`layout`] turns a lineage graph into positioned nodes through a pluggable
//! [`LayoutEngine`]; [`coordinator`] re-runs parse, build and layout whenever
//! the host hands over new query text and pushes the result to a
//! [`RenderSurface`].

pub mod coordinator;
pub mod layout;

pub use coordinator::{
    rebuild, CoordinatorConfig, CoordinatorHandle, CoordinatorState, RebuildError, RenderSurface,
    Snapshot, UpdateCoordinator,
};
pub use layout::{
    layout_graph, Direction, LaidOutNode, LayeredLayout, LayoutEdge, LayoutEngine, LayoutError,
    LayoutGraph, LayoutNode, LayoutOptions, LayoutResult, Point, PositionedNode,
};
