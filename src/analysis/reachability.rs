//! 可达图构建
//!
//! 从初始标识出发做广度优先探索, 用 Karp–Miller 式 ω 加速把沿环无界增长的
//! 库所折叠为 ω, 并以节点数上限保证在无界网上也能终止. 上限截断时按
//! [`WideningPolicy`] 对最后加入的标识做加宽, 而不是静默丢弃.
use std::collections::{BTreeSet, VecDeque};

use indexmap::IndexMap;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::marking::Marking;
use crate::net::structure::Weight;
use crate::net::token::Token;
use crate::net::Net;

pub const DEFAULT_MAX_MARKINGS: usize = 10;

/// 达到节点上限后对最后加入的标识的加宽规则.
///
/// 只有当前有限值大于初始值且大于 1 的库所才可能被加宽.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WideningPolicy {
    /// 不加宽, 图只标记为截断.
    Disabled,
    /// 相对初始标识增长的库所置为 ω.
    RecentGrowth,
    /// 相对初始标识增长, 且等于所有已探索标识中该库所最大值的库所置为 ω.
    #[default]
    RecentAtMaximum,
}

impl WideningPolicy {
    fn widens(self, initial: Weight, last: Weight, observed_max: Weight) -> bool {
        let grew = last > initial && last > 1;
        match self {
            WideningPolicy::Disabled => false,
            WideningPolicy::RecentGrowth => grew,
            WideningPolicy::RecentAtMaximum => grew && last == observed_max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachabilityConfig {
    /// 探索的标识数上限.
    pub max_markings: usize,
    pub widening: WideningPolicy,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            max_markings: DEFAULT_MAX_MARKINGS,
            widening: WideningPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityEdge {
    pub transition: TransitionId,
    pub target: Marking,
}

/// 探索中未能发生的边. 可发生性刚检查过, 出现即说明逻辑不一致.
#[derive(Debug, Clone)]
pub struct OmittedEdge {
    pub source: Marking,
    pub transition: TransitionId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exploration {
    /// 前沿已清空, 图包含全部 (加速后的) 可达标识.
    Complete,
    /// 在 `limit` 个标识处截断; `widened` 为加宽合成的标识 (若有).
    Capped {
        limit: usize,
        widened: Option<Marking>,
    },
}

#[derive(Debug, Clone)]
pub struct ReachabilityGraph {
    nodes: IndexMap<Marking, Vec<ReachabilityEdge>>,
    initial: Marking,
    exploration: Exploration,
    omitted: Vec<OmittedEdge>,
}

impl ReachabilityGraph {
    pub fn initial(&self) -> &Marking {
        &self.initial
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(Vec::len).sum()
    }

    /// 按加入顺序遍历所有标识.
    pub fn markings(&self) -> impl Iterator<Item = &Marking> {
        self.nodes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Marking, &[ReachabilityEdge])> {
        self.nodes
            .iter()
            .map(|(marking, edges)| (marking, edges.as_slice()))
    }

    pub fn edges(&self, marking: &Marking) -> Option<&[ReachabilityEdge]> {
        self.nodes.get(marking).map(Vec::as_slice)
    }

    pub fn contains(&self, marking: &Marking) -> bool {
        self.nodes.contains_key(marking)
    }

    pub fn index_of(&self, marking: &Marking) -> Option<usize> {
        self.nodes.get_index_of(marking)
    }

    pub fn exploration(&self) -> &Exploration {
        &self.exploration
    }

    pub fn is_capped(&self) -> bool {
        matches!(self.exploration, Exploration::Capped { .. })
    }

    pub fn widened(&self) -> Option<&Marking> {
        match &self.exploration {
            Exploration::Capped { widened, .. } => widened.as_ref(),
            Exploration::Complete => None,
        }
    }

    pub fn omitted(&self) -> &[OmittedEdge] {
        &self.omitted
    }

    /// 作为边标签出现过的迁移.
    pub fn fired_transitions(&self) -> BTreeSet<TransitionId> {
        self.nodes
            .values()
            .flatten()
            .map(|edge| edge.transition)
            .collect()
    }

    pub fn to_petgraph(&self) -> DiGraph<Marking, TransitionId> {
        let mut graph = DiGraph::with_capacity(self.node_count(), self.edge_count());
        let indices: Vec<NodeIndex> = self
            .nodes
            .keys()
            .map(|marking| graph.add_node(marking.clone()))
            .collect();
        for (source, edges) in self.nodes.values().enumerate() {
            for edge in edges {
                if let Some(target) = self.index_of(&edge.target) {
                    graph.add_edge(indices[source], indices[target], edge.transition);
                }
            }
        }
        graph
    }

    /// Graphviz DOT 文本, 节点标签为 `库所:token`, 边标签为迁移名.
    pub fn to_dot(&self, net: &Net) -> String {
        let graph = self.to_petgraph().map(
            |_, marking| {
                marking
                    .iter_named()
                    .map(|(place, token)| format!("{}:{}", place, token))
                    .collect::<Vec<_>>()
                    .join(", ")
            },
            |_, &transition| net.transition_name(transition).to_string(),
        );
        format!("{}", Dot::with_config(&graph, &[]))
    }
}

pub struct ReachabilityGraphBuilder<'a> {
    net: &'a Net,
    config: ReachabilityConfig,
}

impl<'a> ReachabilityGraphBuilder<'a> {
    pub fn new(net: &'a Net) -> Self {
        Self::with_config(net, ReachabilityConfig::default())
    }

    pub fn with_config(net: &'a Net, config: ReachabilityConfig) -> Self {
        Self { net, config }
    }

    pub fn build(&self) -> ReachabilityGraph {
        let limit = self.config.max_markings.max(1);
        let initial = self.net.initial_marking().clone();
        let mut nodes: IndexMap<Marking, Vec<ReachabilityEdge>> = IndexMap::new();
        nodes.insert(initial.clone(), Vec::new());
        let mut queue = VecDeque::from([initial.clone()]);
        let mut omitted = Vec::new();

        while nodes.len() < limit {
            let Some(current) = queue.pop_front() else {
                break;
            };

            let mut edges = Vec::new();
            for transition in self.net.enabled_transitions(&current) {
                let next = match self.net.fire(&current, transition) {
                    Ok(next) => next,
                    Err(err) => {
                        log::debug!("edge omitted: {} from {}: {}", transition.raw(), current, err);
                        omitted.push(OmittedEdge {
                            source: current.clone(),
                            transition,
                            reason: err.to_string(),
                        });
                        continue;
                    }
                };

                let next = accelerate(&nodes, &current, next);
                if !nodes.contains_key(&next) {
                    log::debug!(
                        "new marking {} via {}",
                        next,
                        self.net.transition_name(transition)
                    );
                    nodes.insert(next.clone(), Vec::new());
                    queue.push_back(next.clone());
                }
                edges.push(ReachabilityEdge {
                    transition,
                    target: next,
                });
            }

            if let Some(list) = nodes.get_mut(&current) {
                list.extend(edges);
            }
        }

        let exploration = if queue.is_empty() {
            Exploration::Complete
        } else {
            log::warn!(
                "reachability exploration capped at {} markings with {} unexplored",
                limit,
                queue.len()
            );
            Exploration::Capped {
                limit,
                widened: self.widen(&mut nodes),
            }
        };

        log::info!(
            "reachability graph: {} markings, {} edges ({:?})",
            nodes.len(),
            nodes.values().map(Vec::len).sum::<usize>(),
            exploration
        );

        ReachabilityGraph {
            nodes,
            initial,
            exploration,
            omitted,
        }
    }

    /// 按加宽策略合成终端标识, 并把指向最后加入标识的边改指向它.
    fn widen(&self, nodes: &mut IndexMap<Marking, Vec<ReachabilityEdge>>) -> Option<Marking> {
        let last = nodes.last().map(|(marking, _)| marking.clone())?;
        let initial = self.net.initial_marking();

        let mut maxima = vec![0 as Weight; last.len()];
        for marking in nodes.keys() {
            for (idx, token) in marking.values().iter().enumerate() {
                if let Token::Finite(n) = token {
                    maxima[idx] = maxima[idx].max(*n);
                }
            }
        }

        let tokens: IndexVec<PlaceId, Token> = last
            .iter()
            .map(|(place, token)| match (token, initial.tokens(place)) {
                (Token::Finite(now), Token::Finite(start))
                    if self.config.widening.widens(start, now, maxima[place.index()]) =>
                {
                    Token::Omega
                }
                _ => token,
            })
            .collect();
        let widened = last.with_tokens(tokens);
        if widened == last {
            return None;
        }

        log::warn!(
            "widening {} to {} ({:?})",
            last,
            widened,
            self.config.widening
        );
        nodes.entry(widened.clone()).or_default();
        for edge in nodes.values_mut().flatten() {
            if edge.target == last {
                edge.target = widened.clone();
            }
        }
        Some(widened)
    }
}

/// ω 加速: 若存在已有标识 `e ≠ candidate` 同时被 `source` 与 `candidate` 覆盖,
/// 则 `candidate` 中严格大于 `e` 的库所置为 ω. 已含 ω 的候选不再加速.
fn accelerate(
    nodes: &IndexMap<Marking, Vec<ReachabilityEdge>>,
    source: &Marking,
    candidate: Marking,
) -> Marking {
    if candidate.has_omega() {
        return candidate;
    }

    for existing in nodes.keys() {
        if existing == &candidate
            || !matches!(source.covers(existing), Ok(true))
            || !matches!(candidate.covers(existing), Ok(true))
        {
            continue;
        }

        let tokens: IndexVec<PlaceId, Token> = existing
            .values()
            .iter()
            .zip(candidate.values())
            .map(|(old, new)| match (old, new) {
                (Token::Finite(a), Token::Finite(b)) if b > a => Token::Omega,
                _ => *new,
            })
            .collect();
        let accelerated = candidate.with_tokens(tokens);
        log::debug!("accelerated {} to {} over {}", candidate, accelerated, existing);
        return accelerated;
    }

    candidate
}
