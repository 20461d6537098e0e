//! Render graph compilation.
//!
//! This module turns a [`RenderGraph`](crate::graph::RenderGraph) into an
//! execution plan ([`CompiledGraph`]). It performs:
//!
//! 1. **Topological Sort** - Order passes respecting dependencies
//! 2. **Cycle Detection** - Validate the graph is a DAG
//! 3. **Barrier Placement** - Walk the sorted passes against a
//!    [`ResourceStateTracker`] and record the transitions each pass needs
//!
//! Within a single graph, passes execute sequentially in one command stream,
//! so a barrier placed before a pass orders it after everything recorded
//! earlier.
//!
//! # Example
//!
//! ```ignore
//! let mut tracker = ResourceStateTracker::new();
//! let compiled = graph.compile(&mut tracker)?;
//! for (handle, barriers) in compiled.steps() {
//!     // transition, then encode the pass
//! }
//! ```

use std::collections::VecDeque;

use crate::graph::{
    BarrierBatch, PassHandle, RenderGraph, ResourceStateTracker, TextureBarrier,
};

/// A compiled render graph ready for execution.
///
/// Contains a topologically sorted pass order and, for each position in that
/// order, the barriers to place before the pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompiledGraph {
    pass_order: Vec<PassHandle>,
    barriers: Vec<BarrierBatch>,
}

impl CompiledGraph {
    /// Get the pass execution order as handles.
    pub fn pass_order(&self) -> &[PassHandle] {
        &self.pass_order
    }

    /// Barriers placed before the pass at `position` in [`Self::pass_order`].
    pub fn barriers(&self, position: usize) -> Option<&BarrierBatch> {
        self.barriers.get(position)
    }

    /// Each pass in execution order with the barriers that precede it.
    pub fn steps(&self) -> impl Iterator<Item = (PassHandle, &BarrierBatch)> {
        self.pass_order.iter().copied().zip(self.barriers.iter())
    }

    /// Total number of barriers across all passes.
    pub fn barrier_count(&self) -> usize {
        self.barriers.iter().map(BarrierBatch::len).sum()
    }

    /// Get the number of passes in the compiled graph.
    pub fn pass_count(&self) -> usize {
        self.pass_order.len()
    }

    /// Check if the compiled graph is empty.
    pub fn is_empty(&self) -> bool {
        self.pass_order.is_empty()
    }
}

/// Errors that can occur during graph compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The graph contains a cyclic dependency.
    CyclicDependency,

    /// An invalid pass handle was encountered.
    InvalidPassHandle(PassHandle),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CyclicDependency => write!(f, "render graph contains cyclic dependency"),
            Self::InvalidPassHandle(handle) => {
                write!(f, "invalid pass handle: {:?}", handle)
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Compile a render graph into an execution plan.
///
/// The tracker is only advanced when sorting succeeds, so a rejected graph
/// leaves every tracked state untouched.
pub fn compile(
    graph: &RenderGraph,
    tracker: &mut ResourceStateTracker,
) -> Result<CompiledGraph, GraphError> {
    let pass_order = topological_order(graph.pass_count(), graph.edges())?;

    let mut barriers = Vec::with_capacity(pass_order.len());
    for &handle in &pass_order {
        let usage = graph.usage(handle)?;
        let mut batch = BarrierBatch::new();
        for decl in &usage.texture_usages {
            let to = decl.access.required_state();
            let from = tracker.transition(decl.texture.id(), to);
            batch.push(TextureBarrier {
                texture: decl.texture.id(),
                label: decl.texture.debug_name(),
                from,
                to,
            });
        }
        if !batch.is_empty() {
            log::trace!(
                "compile: {} barriers before {}",
                batch.len(),
                graph.pass(handle)?.name()
            );
        }
        barriers.push(batch);
    }

    Ok(CompiledGraph {
        pass_order,
        barriers,
    })
}

/// Kahn's algorithm over (dependent, dependency) edges.
///
/// Passes without ordering constraints keep insertion order.
fn topological_order(
    n: usize,
    edges: &[(PassHandle, PassHandle)],
) -> Result<Vec<PassHandle>, GraphError> {
    let mut order = Vec::with_capacity(n);
    if n == 0 {
        return Ok(order);
    }

    // Edge (dependent, dependency) means dependent has one more in-degree
    let mut in_degree = vec![0u32; n];
    for &(dependent, _dependency) in edges {
        in_degree[dependent.index()] += 1;
    }

    let mut queue: VecDeque<PassHandle> = (0..n as u32)
        .map(PassHandle::new)
        .filter(|&h| in_degree[h.index()] == 0)
        .collect();

    while let Some(handle) = queue.pop_front() {
        order.push(handle);

        for &(dependent, dependency) in edges {
            if dependency == handle {
                in_degree[dependent.index()] -= 1;
                if in_degree[dependent.index()] == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if order.len() != n {
        return Err(GraphError::CyclicDependency);
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::test_support::*;
    use crate::graph::{BoundTable, ComputePass, ResourceState};
    use crate::instance::GraphicsInstance;

    fn handles(n: u32) -> Vec<PassHandle> {
        (0..n).map(PassHandle::new).collect()
    }

    #[test]
    fn test_compile_empty_graph() {
        let graph = RenderGraph::new();
        let compiled = compile(&graph, &mut ResourceStateTracker::new()).unwrap();
        assert!(compiled.is_empty());
        assert_eq!(compiled.pass_count(), 0);
    }

    #[test]
    fn test_linear_chain() {
        // A -> B -> C
        let h = handles(3);
        let edges = [(h[1], h[0]), (h[2], h[1])];
        assert_eq!(topological_order(3, &edges).unwrap(), h);
    }

    #[test]
    fn test_reverse_insertion_order() {
        // The first pass added depends on the second
        let h = handles(2);
        let edges = [(h[0], h[1])];
        assert_eq!(topological_order(2, &edges).unwrap(), vec![h[1], h[0]]);
    }

    #[test]
    fn test_diamond_dependency() {
        //     A
        //    / \
        //   B   C
        //    \ /
        //     D
        let h = handles(4);
        let edges = [(h[1], h[0]), (h[2], h[0]), (h[3], h[1]), (h[3], h[2])];
        let order = topological_order(4, &edges).unwrap();

        assert_eq!(order[0], h[0]);
        assert_eq!(order[3], h[3]);
        assert_ne!(order[1], order[2]);
    }

    #[test]
    fn test_independent_passes_keep_insertion_order() {
        let h = handles(3);
        assert_eq!(topological_order(3, &[]).unwrap(), h);
    }

    #[test]
    fn test_cycle_two_nodes() {
        let h = handles(2);
        let edges = [(h[1], h[0]), (h[0], h[1])];
        assert_eq!(
            topological_order(2, &edges),
            Err(GraphError::CyclicDependency)
        );
    }

    #[test]
    fn test_partial_cycle() {
        // D is independent, but A-B-C form a cycle
        let h = handles(4);
        let edges = [(h[1], h[0]), (h[2], h[1]), (h[0], h[2])];
        assert_eq!(
            topological_order(4, &edges),
            Err(GraphError::CyclicDependency)
        );
    }

    #[test]
    fn test_ping_pong_barriers() {
        let device = GraphicsInstance::dummy().create_device().unwrap();
        let material = copy_material(&device);
        let a = scratch(&device, "a");
        let b = scratch(&device, "b");
        let forward = copy_table(&device, &a, &b);
        let backward = copy_table(&device, &b, &a);

        let mut graph = RenderGraph::new();
        let mut first = ComputePass::new("forward".into(), Arc::clone(&material));
        first.add_dispatch([8, 8, 1], vec![BoundTable::new(0, &forward, 0)]);
        graph.add_compute_pass(first);
        let mut second = ComputePass::new("backward".into(), material);
        second.add_dispatch([8, 8, 1], vec![BoundTable::new(0, &backward, 0)]);
        graph.add_compute_pass(second);

        let mut tracker = ResourceStateTracker::new();
        let compiled = compile(&graph, &mut tracker).unwrap();

        let first_batch: Vec<_> = compiled.barriers(0).unwrap().iter().cloned().collect();
        assert_eq!(first_batch.len(), 2);
        assert_eq!(first_batch[0].label, "a");
        assert_eq!(first_batch[0].to, ResourceState::ShaderResource);
        assert_eq!(first_batch[1].label, "b");
        assert_eq!(first_batch[1].to, ResourceState::UnorderedAccess);

        let second_batch: Vec<_> = compiled.barriers(1).unwrap().iter().cloned().collect();
        assert_eq!(second_batch[0].label, "b");
        assert_eq!(second_batch[0].from, ResourceState::UnorderedAccess);
        assert_eq!(second_batch[0].to, ResourceState::ShaderResource);
        assert_eq!(second_batch[1].from, ResourceState::ShaderResource);
        assert_eq!(second_batch[1].to, ResourceState::UnorderedAccess);

        assert_eq!(tracker.state(a.id()), ResourceState::UnorderedAccess);

        // Recompiling starts from the states the first compile left behind.
        let again = compile(&graph, &mut tracker).unwrap();
        assert_eq!(again.barrier_count(), 4);
    }

    #[test]
    fn test_cycle_leaves_tracker_untouched() {
        let device = GraphicsInstance::dummy().create_device().unwrap();
        let material = copy_material(&device);
        let a = scratch(&device, "a");
        let b = scratch(&device, "b");
        let table = copy_table(&device, &a, &b);

        let mut graph = RenderGraph::new();
        let mut pass = ComputePass::new("copy".into(), Arc::clone(&material));
        pass.add_dispatch([1, 1, 1], vec![BoundTable::new(0, &table, 0)]);
        let first = graph.add_compute_pass(pass);
        let second = graph.add_compute_pass(ComputePass::new("other".into(), material));
        graph.add_dependency(first, second);
        graph.add_dependency(second, first);

        let mut tracker = ResourceStateTracker::new();
        assert_eq!(
            graph.compile(&mut tracker),
            Err(GraphError::CyclicDependency)
        );
        assert!(tracker.is_empty());
    }
}
