use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::analysis::properties::{Boundedness, Classification, PetriNetAnalyzer};
use crate::analysis::simulation::{SimulationRun, StopReason};
use crate::net::io::IoError;
use crate::net::{Marking, Net, PlaceId};

#[derive(Debug, Clone, Serialize)]
pub struct TransitionSummary {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub places: Vec<String>,
    pub transitions: Vec<TransitionSummary>,
    pub initial_marking: Marking,
}

impl NetworkSummary {
    pub fn new(net: &Net) -> Self {
        let name = |place: PlaceId| net.places()[place].name.clone();
        Self {
            places: net.place_order().to_vec(),
            transitions: net
                .transitions()
                .iter()
                .map(|transition| TransitionSummary {
                    name: transition.name.clone(),
                    inputs: transition.inputs.iter().copied().map(name).collect(),
                    outputs: transition.outputs.iter().copied().map(name).collect(),
                })
                .collect(),
            initial_marking: net.initial_marking().clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertySummary {
    pub bounded: bool,
    pub safe: bool,
    pub conservative: bool,
    pub liveness: bool,
    pub parallel_firing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeReport {
    pub source: usize,
    pub target: usize,
    pub transition: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphReport {
    pub nodes: Vec<Marking>,
    pub edges: Vec<EdgeReport>,
    pub capped: bool,
    pub widened: Option<Marking>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub path: Vec<String>,
    pub fired: Vec<String>,
    pub is_cyclic: bool,
    pub stop: StopReason,
}

impl SimulationReport {
    pub fn new(net: &Net, run: &SimulationRun) -> Self {
        Self {
            path: run.path.iter().map(ToString::to_string).collect(),
            fired: run
                .fired
                .iter()
                .map(|&transition| net.transition_name(transition).to_string())
                .collect(),
            is_cyclic: run.is_cyclic,
            stop: run.stop,
        }
    }
}

/// 一次分析的完整结果, 交给外部渲染层使用.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub network: NetworkSummary,
    pub analysis: PropertySummary,
    pub classification: Classification,
    pub boundedness: Boundedness,
    pub target: Option<Marking>,
    pub reachable: Option<bool>,
    pub graph: GraphReport,
    /// 所有已发现标识, ω 以符号形式给出.
    pub all_markings: Vec<String>,
    pub dead_markings: Vec<String>,
    pub simulation: Option<SimulationReport>,
    pub analysis_time: Duration,
}

impl AnalysisReport {
    pub fn new(
        analyzer: &PetriNetAnalyzer<'_>,
        target: Option<&Marking>,
        run: Option<&SimulationRun>,
    ) -> Self {
        let net = analyzer.net();
        let graph = analyzer.graph();

        let edges = graph
            .iter()
            .enumerate()
            .flat_map(|(source, (_, edges))| {
                edges.iter().filter_map(move |edge| {
                    graph.index_of(&edge.target).map(|target| EdgeReport {
                        source,
                        target,
                        transition: net.transition_name(edge.transition).to_string(),
                    })
                })
            })
            .collect();

        Self {
            network: NetworkSummary::new(net),
            analysis: PropertySummary {
                bounded: analyzer.is_bounded(),
                safe: analyzer.is_safe(),
                conservative: analyzer.is_conservative(),
                liveness: analyzer.is_liveness(),
                parallel_firing: analyzer.has_parallel_firing(),
            },
            classification: analyzer.classify(),
            boundedness: analyzer.boundedness(),
            target: target.cloned(),
            reachable: target.map(|marking| analyzer.is_reachable(marking)),
            graph: GraphReport {
                nodes: analyzer.markings().to_vec(),
                edges,
                capped: graph.is_capped(),
                widened: graph.widened().cloned(),
            },
            all_markings: analyzer.markings().iter().map(ToString::to_string).collect(),
            dead_markings: analyzer
                .dead_markings()
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            simulation: run.map(|run| SimulationReport::new(net, run)),
            analysis_time: Duration::default(),
        }
    }

    pub fn with_analysis_time(mut self, analysis_time: Duration) -> Self {
        self.analysis_time = analysis_time;
        self
    }

    pub fn to_json(&self) -> Result<String, IoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "是" } else { "否" }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Petri网分析报告")?;
        writeln!(f, "分析时间: {:?}", self.analysis_time)?;
        writeln!(f, "库所: {}", self.network.places.join(", "))?;
        for transition in &self.network.transitions {
            writeln!(
                f,
                "迁移 {}: [{}] -> [{}]",
                transition.name,
                transition.inputs.join(", "),
                transition.outputs.join(", ")
            )?;
        }
        writeln!(f, "初始标识: {}", self.network.initial_marking)?;

        writeln!(f, "\n性质:")?;
        writeln!(f, "有界: {}", yes_no(self.analysis.bounded))?;
        writeln!(f, "安全: {}", yes_no(self.analysis.safe))?;
        writeln!(f, "守恒: {}", yes_no(self.analysis.conservative))?;
        writeln!(f, "活性 (近似): {}", yes_no(self.analysis.liveness))?;
        writeln!(f, "存在并发: {}", yes_no(self.analysis.parallel_firing))?;
        writeln!(f, "有界性结论: {}", self.boundedness)?;

        writeln!(f, "\n结构子类:")?;
        writeln!(f, "状态机: {}", yes_no(self.classification.automaton))?;
        writeln!(f, "标记图: {}", yes_no(self.classification.marked_graph))?;
        writeln!(f, "自由选择网: {}", yes_no(self.classification.free_choice))?;

        if let (Some(target), Some(reachable)) = (&self.target, self.reachable) {
            writeln!(f, "\n目标标识 {} 可达: {}", target, yes_no(reachable))?;
        }

        writeln!(f, "\n可达图:")?;
        writeln!(
            f,
            "状态数: {}, 边数: {}{}",
            self.graph.nodes.len(),
            self.graph.edges.len(),
            if self.graph.capped { " (已截断)" } else { "" }
        )?;
        for (i, marking) in self.all_markings.iter().enumerate() {
            writeln!(f, "  M{}: {}", i, marking)?;
        }
        for edge in &self.graph.edges {
            writeln!(
                f,
                "  M{} --{}--> M{}",
                edge.source, edge.transition, edge.target
            )?;
        }
        if !self.dead_markings.is_empty() {
            writeln!(f, "死标识: {}", self.dead_markings.join(", "))?;
        }

        if let Some(simulation) = &self.simulation {
            writeln!(f, "\n模拟路径: {}", simulation.path.join(" -> "))?;
            writeln!(f, "发生序列: {}", simulation.fired.join(", "))?;
            writeln!(f, "成环: {}", yes_no(simulation.is_cyclic))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::simulation::PetriNetSimulator;
    use crate::net::NetBuilder;

    fn mutex_report() -> AnalysisReport {
        let net = NetBuilder::new()
            .place("p1", 1)
            .place("p2", 0)
            .transition("t1", ["p1"], ["p2"])
            .transition("t2", ["p2"], ["p1"])
            .build()
            .unwrap();
        let analyzer = PetriNetAnalyzer::new(&net);
        let target = net.marking_from_counts(&[0, 1]).unwrap();
        let run = PetriNetSimulator::new().simulate_one_path(&net, 5).unwrap();
        AnalysisReport::new(&analyzer, Some(&target), Some(&run))
    }

    #[test]
    fn report_collects_graph_and_properties() {
        let report = mutex_report();

        assert_eq!(report.all_markings, ["(1, 0)", "(0, 1)"]);
        assert_eq!(report.graph.edges.len(), 2);
        assert_eq!(report.graph.edges[0].source, 0);
        assert_eq!(report.graph.edges[0].target, 1);
        assert_eq!(report.graph.edges[0].transition, "t1");
        assert_eq!(report.reachable, Some(true));
        assert!(report.analysis.bounded && report.analysis.liveness);
        assert_eq!(report.network.transitions[1].inputs, ["p2"]);

        let simulation = report.simulation.as_ref().unwrap();
        assert_eq!(simulation.fired, ["t1", "t2"]);
        assert!(simulation.is_cyclic);
    }

    #[test]
    fn report_serializes_omega_as_symbol() {
        let net = NetBuilder::new()
            .place("p1", 0)
            .transition("t1", [] as [&str; 0], ["p1"])
            .build()
            .unwrap();
        let analyzer = PetriNetAnalyzer::new(&net);
        let report = AnalysisReport::new(&analyzer, None, None);

        assert_eq!(report.all_markings.last().unwrap(), "(ω)");
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["analysis"]["bounded"], false);
        assert_eq!(json["graph"]["nodes"][1]["p1"], "ω");
        assert_eq!(json["boundedness"]["verdict"], "unbounded");
        assert!(json["reachable"].is_null());
    }

    #[test]
    fn text_report_mentions_every_section() {
        let text = mutex_report().to_string();
        assert!(text.contains("Petri网分析报告"));
        assert!(text.contains("有界: 是"));
        assert!(text.contains("目标标识 (0, 1) 可达: 是"));
        assert!(text.contains("M0 --t1--> M1"));
        assert!(text.contains("成环: 是"));
    }
}
