//! Petri 网性质分析
//!
//! 在可达图 (可能含 ω, 可能被截断) 上回答有界性、安全性、守恒性、
//! 活性近似与并发见证等问题, 并在声明的网结构上做子类判定.
use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::analysis::reachability::{
    Exploration, ReachabilityConfig, ReachabilityGraph, ReachabilityGraphBuilder,
};
use crate::net::ids::{PlaceId, TransitionId};
use crate::net::marking::Marking;
use crate::net::Net;

/// 有界性结论, 区分已证明与因截断而未知.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum Boundedness {
    /// 探索完整且没有 ω.
    Bounded,
    /// ω 加速证明这些库所无界.
    Unbounded { places: Vec<String> },
    /// 探索在 `explored` 个标识处截断; `suspected` 为加宽得到的 ω 库所.
    Unknown {
        explored: usize,
        suspected: Vec<String>,
    },
}

impl fmt::Display for Boundedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundedness::Bounded => write!(f, "Petri网是有界的"),
            Boundedness::Unbounded { places } => {
                write!(f, "Petri网是无界的，无界库所: {}", places.join(", "))
            }
            Boundedness::Unknown {
                explored,
                suspected,
            } => {
                write!(f, "无法确定有界性: 探索在 {} 个标识处截断", explored)?;
                if !suspected.is_empty() {
                    write!(f, "，疑似无界库所: {}", suspected.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// 网的结构子类.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// 状态机: 每个迁移至多一个输入、至多一个输出.
    pub automaton: bool,
    /// 标记图: 每个库所恰有一个生产迁移和一个消费迁移.
    pub marked_graph: bool,
    /// 自由选择: 共享输入库所的两个迁移都只有一个输入.
    pub free_choice: bool,
}

pub struct PetriNetAnalyzer<'a> {
    net: &'a Net,
    graph: ReachabilityGraph,
    markings: Vec<Marking>,
}

impl<'a> PetriNetAnalyzer<'a> {
    pub fn new(net: &'a Net) -> Self {
        Self::with_config(net, ReachabilityConfig::default())
    }

    pub fn with_config(net: &'a Net, config: ReachabilityConfig) -> Self {
        let graph = ReachabilityGraphBuilder::with_config(net, config).build();
        let markings = graph.markings().cloned().collect();
        Self {
            net,
            graph,
            markings,
        }
    }

    pub fn net(&self) -> &Net {
        self.net
    }

    pub fn graph(&self) -> &ReachabilityGraph {
        &self.graph
    }

    /// 所有已发现标识, 按加入顺序.
    pub fn markings(&self) -> &[Marking] {
        &self.markings
    }

    pub fn is_bounded(&self) -> bool {
        self.markings.iter().all(|marking| !marking.has_omega())
    }

    pub fn is_safe(&self) -> bool {
        self.markings.iter().all(|marking| {
            marking
                .values()
                .iter()
                .filter_map(|token| token.finite())
                .all(|tokens| tokens <= 1)
        })
    }

    pub fn is_conservative(&self) -> bool {
        self.is_bounded() && self.markings.iter().map(Marking::finite_sum).all_equal()
    }

    /// 活性近似: 每个迁移都至少在图中发生过一次.
    pub fn is_liveness(&self) -> bool {
        self.graph.fired_transitions().len() == self.net.transitions_len()
    }

    /// 是否存在某个标识同时使能两个输入集、输出集都不相交的迁移.
    pub fn has_parallel_firing(&self) -> bool {
        self.parallel_witness().is_some()
    }

    pub fn parallel_witness(&self) -> Option<(Marking, TransitionId, TransitionId)> {
        let transitions = self.net.transitions();
        for marking in &self.markings {
            let enabled = self.net.enabled_transitions(marking);
            for [a, b] in enabled.iter().copied().array_combinations() {
                let (ta, tb) = (&transitions[a], &transitions[b]);
                if disjoint(&ta.preset(), &tb.preset()) && disjoint(&ta.postset(), &tb.postset()) {
                    log::debug!(
                        "{} and {} fire concurrently at {}",
                        ta.name,
                        tb.name,
                        marking
                    );
                    return Some((marking.clone(), a, b));
                }
            }
        }
        None
    }

    pub fn classify(&self) -> Classification {
        let net = self.net;
        let transitions = net.transitions();
        let (pre, post) = net.incidence();

        let automaton = transitions
            .iter()
            .all(|transition| transition.inputs.len() <= 1 && transition.outputs.len() <= 1);

        let marked_graph = net
            .places()
            .indices()
            .all(|place| post.row(place).count() == 1 && pre.row(place).count() == 1);

        let free_choice = transitions
            .iter()
            .array_combinations()
            .all(|[ta, tb]| {
                disjoint(&ta.preset(), &tb.preset())
                    || (ta.inputs.len() <= 1 && tb.inputs.len() <= 1)
            });

        Classification {
            automaton,
            marked_graph,
            free_choice,
        }
    }

    /// 目标标识是否与某个已发现标识完全相等 (不按覆盖).
    pub fn is_reachable(&self, target: &Marking) -> bool {
        self.graph.contains(target)
    }

    pub fn boundedness(&self) -> Boundedness {
        let widened = self.graph.widened();
        let accelerated: HashSet<PlaceId> = self
            .markings
            .iter()
            .filter(|marking| Some(*marking) != widened)
            .flat_map(Marking::omega_places)
            .collect();

        if !accelerated.is_empty() {
            return Boundedness::Unbounded {
                places: self.place_names(accelerated.into_iter().sorted()),
            };
        }
        match self.graph.exploration() {
            Exploration::Complete => Boundedness::Bounded,
            Exploration::Capped { widened, .. } => Boundedness::Unknown {
                explored: self.graph.node_count(),
                suspected: widened
                    .as_ref()
                    .map(|marking| self.place_names(marking.omega_places()))
                    .unwrap_or_default(),
            },
        }
    }

    /// 没有任何可发生迁移的标识.
    pub fn dead_markings(&self) -> Vec<&Marking> {
        self.markings
            .iter()
            .filter(|marking| self.net.enabled_transitions(marking).is_empty())
            .collect()
    }

    fn place_names(&self, places: impl IntoIterator<Item = PlaceId>) -> Vec<String> {
        places
            .into_iter()
            .map(|place| self.net.places()[place].name.clone())
            .collect()
    }
}

fn disjoint(left: &[PlaceId], right: &[PlaceId]) -> bool {
    left.iter().all(|place| !right.contains(place))
}
