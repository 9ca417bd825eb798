//! 单路径模拟
//!
//! 从初始标识出发, 每步由 [`FiringPolicy`] 选出一个可发生迁移并发生,
//! 直到死锁、步数用尽或回到本路径上已出现过的标识.
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::net::ids::TransitionId;
use crate::net::marking::Marking;
use crate::net::{FireError, Net};

pub const DEFAULT_MAX_STEPS: usize = 10;

/// 在若干可发生迁移中选出下一个发生的迁移.
pub trait FiringPolicy {
    /// `enabled` 按声明顺序给出; 返回 `None` 时模拟停止.
    fn choose(
        &mut self,
        net: &Net,
        marking: &Marking,
        enabled: &[TransitionId],
    ) -> Option<TransitionId>;
}

/// 选名字字典序最小的迁移.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicPolicy;

impl FiringPolicy for LexicographicPolicy {
    fn choose(
        &mut self,
        net: &Net,
        _marking: &Marking,
        enabled: &[TransitionId],
    ) -> Option<TransitionId> {
        enabled
            .iter()
            .copied()
            .min_by(|&a, &b| net.transition_name(a).cmp(net.transition_name(b)))
    }
}

/// 用固定种子的随机数均匀选择, 同一种子得到同一条路径.
#[derive(Debug, Clone)]
pub struct SeededRandomPolicy {
    rng: StdRng,
}

impl SeededRandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl FiringPolicy for SeededRandomPolicy {
    fn choose(
        &mut self,
        _net: &Net,
        _marking: &Marking,
        enabled: &[TransitionId],
    ) -> Option<TransitionId> {
        if enabled.is_empty() {
            return None;
        }
        Some(enabled[self.rng.random_range(0..enabled.len())])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    Lexicographic,
    SeededRandom { seed: u64 },
}

impl PolicyKind {
    pub fn into_policy(self) -> Box<dyn FiringPolicy> {
        match self {
            PolicyKind::Lexicographic => Box::new(LexicographicPolicy),
            PolicyKind::SeededRandom { seed } => Box::new(SeededRandomPolicy::new(seed)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub max_steps: usize,
    pub policy: PolicyKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            policy: PolicyKind::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// 没有可发生迁移.
    Deadlock,
    StepLimit,
    /// 回到了路径上出现过的标识.
    Cycle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRun {
    /// 以初始标识开头; 成环时最后一个标识重复出现.
    pub path: Vec<Marking>,
    /// `fired[i]` 把 `path[i]` 变为 `path[i + 1]`.
    pub fired: Vec<TransitionId>,
    pub is_cyclic: bool,
    pub stop: StopReason,
}

impl SimulationRun {
    pub fn steps(&self) -> usize {
        self.fired.len()
    }
}

pub struct PetriNetSimulator {
    policy: Box<dyn FiringPolicy>,
}

impl Default for PetriNetSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl PetriNetSimulator {
    pub fn new() -> Self {
        Self::with_policy(LexicographicPolicy)
    }

    pub fn with_policy(policy: impl FiringPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            policy: config.policy.into_policy(),
        }
    }

    pub fn simulate_one_path(
        &mut self,
        net: &Net,
        max_steps: usize,
    ) -> Result<SimulationRun, FireError> {
        let mut current = net.initial_marking().clone();
        let mut path = vec![current.clone()];
        let mut fired = Vec::new();
        let mut seen = HashSet::from([current.clone()]);
        let mut stop = StopReason::StepLimit;

        for _ in 0..max_steps {
            let enabled = net.enabled_transitions(&current);
            let Some(transition) = self.policy.choose(net, &current, &enabled) else {
                stop = StopReason::Deadlock;
                break;
            };
            let next = net.fire(&current, transition)?;
            log::debug!(
                "simulate: {} --{}--> {}",
                current,
                net.transition_name(transition),
                next
            );
            path.push(next.clone());
            fired.push(transition);
            if !seen.insert(next.clone()) {
                stop = StopReason::Cycle;
                break;
            }
            current = next;
        }

        Ok(SimulationRun {
            path,
            fired,
            is_cyclic: stop == StopReason::Cycle,
            stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::core::tests::mutex_net;
    use crate::net::NetBuilder;

    const NONE: [&str; 0] = [];

    #[test]
    fn mutex_net_cycles_after_two_steps() {
        let net = mutex_net();
        let run = PetriNetSimulator::new().simulate_one_path(&net, 5).unwrap();

        let counts: Vec<String> = run.path.iter().map(ToString::to_string).collect();
        assert_eq!(counts, ["(1, 0)", "(0, 1)", "(1, 0)"]);
        assert!(run.is_cyclic);
        assert_eq!(run.stop, StopReason::Cycle);
        let names: Vec<&str> = run.fired.iter().map(|&t| net.transition_name(t)).collect();
        assert_eq!(names, ["t1", "t2"]);
    }

    #[test]
    fn smallest_name_wins_regardless_of_declaration_order() {
        let net = NetBuilder::new()
            .place("p", 1)
            .place("x", 0)
            .place("y", 0)
            .transition("zeta", ["p"], ["x"])
            .transition("alpha", ["p"], ["y"])
            .build()
            .unwrap();
        let run = PetriNetSimulator::new().simulate_one_path(&net, 5).unwrap();

        assert_eq!(net.transition_name(run.fired[0]), "alpha");
        assert_eq!(run.stop, StopReason::Deadlock);
        assert!(!run.is_cyclic);
        assert_eq!(run.path.len(), 2);
    }

    #[test]
    fn step_limit_bounds_an_unbounded_run() {
        let net = NetBuilder::new()
            .place("p1", 0)
            .transition("t1", NONE, ["p1"])
            .build()
            .unwrap();
        let run = PetriNetSimulator::new().simulate_one_path(&net, 4).unwrap();

        assert_eq!(run.steps(), 4);
        assert_eq!(run.path.len(), 5);
        assert_eq!(run.stop, StopReason::StepLimit);
        assert!(!run.is_cyclic);
        assert_eq!(run.path[4].to_string(), "(4)");
    }

    #[test]
    fn zero_steps_returns_initial_marking_only() {
        let net = mutex_net();
        let run = PetriNetSimulator::new().simulate_one_path(&net, 0).unwrap();

        assert_eq!(run.path, vec![net.initial_marking().clone()]);
        assert!(run.fired.is_empty());
    }

    #[test]
    fn seeded_policy_is_reproducible() {
        let net = NetBuilder::new()
            .place("p", 1)
            .transition("a", ["p"], ["p"])
            .transition("b", ["p"], ["p"])
            .transition("c", ["p"], ["p"])
            .build()
            .unwrap();
        let config = SimulationConfig {
            max_steps: 1,
            policy: PolicyKind::SeededRandom { seed: 7 },
        };

        let first = PetriNetSimulator::from_config(&config)
            .simulate_one_path(&net, config.max_steps)
            .unwrap();
        let second = PetriNetSimulator::from_config(&config)
            .simulate_one_path(&net, config.max_steps)
            .unwrap();
        assert_eq!(first, second);
        // 自环立刻回到初始标识
        assert!(first.is_cyclic);
    }
}
