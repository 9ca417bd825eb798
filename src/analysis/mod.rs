//! # 行为分析
//!
//! * [`reachability`]: 带 ω 加速与节点上限的可达图构建;
//! * [`properties`]: 基于可达图的性质判定与结构子类划分;
//! * [`simulation`]: 按发生策略走出的单条执行路径.

pub mod properties;
pub mod reachability;
pub mod simulation;

pub use properties::{Boundedness, Classification, PetriNetAnalyzer};
pub use reachability::{
    DEFAULT_MAX_MARKINGS, Exploration, OmittedEdge, ReachabilityConfig, ReachabilityEdge,
    ReachabilityGraph, ReachabilityGraphBuilder, WideningPolicy,
};
pub use simulation::{
    DEFAULT_MAX_STEPS, FiringPolicy, LexicographicPolicy, PetriNetSimulator, PolicyKind,
    SeededRandomPolicy, SimulationConfig, SimulationRun, StopReason,
};
