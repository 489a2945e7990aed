//! Static dependency graph between pipeline stages.
//!
//! The graph is built once from an edge table and answers three questions:
//! which stages must be `Ready` before a stage may run, which stages consume
//! a stage's artifact directly, and which stages are transitively downstream
//! of it (the set that must be invalidated when it is regenerated).

use crate::core::StageKind;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::OnceLock;

/// How a downstream stage consumes an upstream artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// The upstream artifact must be `Ready` before the downstream stage runs.
    Required,
    /// The upstream artifact is consumed when present; regenerating it still
    /// invalidates the downstream stage.
    Optional,
}

/// A directed edge `upstream -> downstream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The stage whose artifact is consumed.
    pub upstream: StageKind,
    /// The stage consuming it.
    pub downstream: StageKind,
    /// Whether the edge gates execution.
    pub kind: EdgeKind,
}

impl DependencyEdge {
    /// Creates a required edge.
    #[must_use]
    pub const fn required(upstream: StageKind, downstream: StageKind) -> Self {
        Self {
            upstream,
            downstream,
            kind: EdgeKind::Required,
        }
    }

    /// Creates an optional edge.
    #[must_use]
    pub const fn optional(upstream: StageKind, downstream: StageKind) -> Self {
        Self {
            upstream,
            downstream,
            kind: EdgeKind::Optional,
        }
    }
}

/// The edges of the media pipeline.
///
/// Assembly consumes the lip-synced video, never the raw video, so the raw
/// video reaches Assembly only through LipSync.
pub const MEDIA_PIPELINE_EDGES: [DependencyEdge; 7] = [
    DependencyEdge::required(StageKind::Image, StageKind::Video),
    DependencyEdge::required(StageKind::Video, StageKind::LipSync),
    DependencyEdge::required(StageKind::Speech, StageKind::LipSync),
    DependencyEdge::required(StageKind::LipSync, StageKind::Assembly),
    DependencyEdge::required(StageKind::Speech, StageKind::Assembly),
    DependencyEdge::optional(StageKind::Music, StageKind::Assembly),
    DependencyEdge::optional(StageKind::Sfx, StageKind::Assembly),
];

/// Adjacency lists over the fixed stage set.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
    upstream: HashMap<StageKind, Vec<DependencyEdge>>,
    downstream: HashMap<StageKind, Vec<StageKind>>,
}

impl DependencyGraph {
    /// Returns the shared graph of the media pipeline.
    pub fn media_pipeline() -> &'static Self {
        static GRAPH: OnceLock<DependencyGraph> = OnceLock::new();
        GRAPH.get_or_init(|| Self::build(&MEDIA_PIPELINE_EDGES))
    }

    fn build(edges: &[DependencyEdge]) -> Self {
        let mut upstream: HashMap<StageKind, Vec<DependencyEdge>> = HashMap::new();
        let mut downstream: HashMap<StageKind, Vec<StageKind>> = HashMap::new();

        for edge in edges {
            let ups = upstream.entry(edge.downstream).or_default();
            if !ups.iter().any(|e| e.upstream == edge.upstream) {
                ups.push(*edge);
            }
            let downs = downstream.entry(edge.upstream).or_default();
            if !downs.contains(&edge.downstream) {
                downs.push(edge.downstream);
            }
        }

        Self {
            edges: edges.to_vec(),
            upstream,
            downstream,
        }
    }

    /// Returns the edge table.
    #[must_use]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Returns every stage whose artifact `stage` consumes, with the edge kind.
    #[must_use]
    pub fn upstream_of(&self, stage: StageKind) -> &[DependencyEdge] {
        self.upstream.get(&stage).map_or(&[], Vec::as_slice)
    }

    /// Returns the stages that must be `Ready` before `stage` may run.
    #[must_use]
    pub fn required_upstream(&self, stage: StageKind) -> Vec<StageKind> {
        self.upstream_of(stage)
            .iter()
            .filter(|e| e.kind == EdgeKind::Required)
            .map(|e| e.upstream)
            .collect()
    }

    /// Returns the stages that directly consume `stage`'s artifact.
    #[must_use]
    pub fn downstream_of(&self, stage: StageKind) -> &[StageKind] {
        self.downstream.get(&stage).map_or(&[], Vec::as_slice)
    }

    /// Returns every stage transitively downstream of `stage`, excluding
    /// `stage` itself, in breadth-first order.
    ///
    /// Stages reachable along several paths appear once.
    #[must_use]
    pub fn downstream_closure(&self, stage: StageKind) -> Vec<StageKind> {
        let mut visited = HashSet::from([stage]);
        let mut queue = VecDeque::from([stage]);
        let mut closure = Vec::new();

        while let Some(current) = queue.pop_front() {
            for &next in self.downstream_of(current) {
                if visited.insert(next) {
                    closure.push(next);
                    queue.push_back(next);
                }
            }
        }

        closure
    }

    /// Returns all stages ordered so that every stage follows its upstream
    /// stages.
    #[must_use]
    pub fn topological_order(&self) -> Vec<StageKind> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();

        fn visit(
            node: StageKind,
            graph: &DependencyGraph,
            visited: &mut HashSet<StageKind>,
            result: &mut Vec<StageKind>,
        ) {
            if !visited.insert(node) {
                return;
            }
            for edge in graph.upstream_of(node) {
                visit(edge.upstream, graph, visited, result);
            }
            result.push(node);
        }

        // Visit in declaration order for determinism
        for stage in StageKind::ALL {
            visit(stage, self, &mut visited, &mut result);
        }

        result
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph() -> &'static DependencyGraph {
        DependencyGraph::media_pipeline()
    }

    #[test]
    fn test_root_stages_have_no_required_upstream() {
        for stage in [StageKind::Image, StageKind::Speech, StageKind::Music, StageKind::Sfx] {
            assert!(graph().required_upstream(stage).is_empty(), "{stage}");
        }
    }

    #[test]
    fn test_required_upstream() {
        assert_eq!(graph().required_upstream(StageKind::Video), vec![StageKind::Image]);
        assert_eq!(
            graph().required_upstream(StageKind::LipSync),
            vec![StageKind::Video, StageKind::Speech]
        );
        assert_eq!(
            graph().required_upstream(StageKind::Assembly),
            vec![StageKind::LipSync, StageKind::Speech]
        );
    }

    #[test]
    fn test_assembly_does_not_consume_video_directly() {
        assert!(!graph()
            .upstream_of(StageKind::Assembly)
            .iter()
            .any(|e| e.upstream == StageKind::Video));
    }

    #[test]
    fn test_image_closure_is_full_chain() {
        assert_eq!(
            graph().downstream_closure(StageKind::Image),
            vec![StageKind::Video, StageKind::LipSync, StageKind::Assembly]
        );
    }

    #[test]
    fn test_sibling_closures_skip_lipsync() {
        assert_eq!(graph().downstream_closure(StageKind::Music), vec![StageKind::Assembly]);
        assert_eq!(graph().downstream_closure(StageKind::Sfx), vec![StageKind::Assembly]);
    }

    #[test]
    fn test_speech_closure_visits_assembly_once() {
        assert_eq!(
            graph().downstream_closure(StageKind::Speech),
            vec![StageKind::LipSync, StageKind::Assembly]
        );
    }

    #[test]
    fn test_assembly_closure_is_empty() {
        assert!(graph().downstream_closure(StageKind::Assembly).is_empty());
    }

    #[test]
    fn test_topological_order_respects_every_edge() {
        let order = graph().topological_order();
        assert_eq!(order.len(), StageKind::ALL.len());

        let pos = |s: StageKind| order.iter().position(|&n| n == s).unwrap();
        for edge in graph().edges() {
            assert!(pos(edge.upstream) < pos(edge.downstream), "{edge:?}");
        }
    }

    #[test]
    fn test_self_dependency_absent() {
        assert!(MEDIA_PIPELINE_EDGES.iter().all(|e| e.upstream != e.downstream));
    }

    #[test]
    fn test_build_merges_duplicate_edges() {
        let edges = [
            DependencyEdge::required(StageKind::Image, StageKind::Video),
            DependencyEdge::required(StageKind::Image, StageKind::Video),
        ];
        let graph = DependencyGraph::build(&edges);
        assert_eq!(graph.upstream_of(StageKind::Video).len(), 1);
        assert_eq!(graph.downstream_of(StageKind::Image), &[StageKind::Video]);
    }
}
