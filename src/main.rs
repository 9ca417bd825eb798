use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, info};

use pn_lab::analysis::{PetriNetAnalyzer, PetriNetSimulator};
use pn_lab::config::LabConfig;
use pn_lab::net::io::{self, LoadedNet};
use pn_lab::options::Options;
use pn_lab::report::AnalysisReport;

fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match Options::parse_from_args(&args) {
        Ok(options) => options,
        Err(err) => match err.downcast::<clap::Error>() {
            Ok(err) => err.exit(),
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(2);
            }
        },
    };
    debug!("PN options: {:?}", options);

    let mut config = LabConfig::load_from_file(&options.config)?;
    if let Some(max_markings) = options.max_markings {
        config.reachability.max_markings = max_markings;
    }
    if let Some(widening) = options.widening {
        config.reachability.widening = widening;
    }
    if let Some(steps) = options.steps {
        config.simulation.max_steps = steps;
    }
    config.validate()?;

    let LoadedNet { net, target } = io::load_net(&options.file)
        .with_context(|| format!("Failed to load net: {:?}", options.file))?;
    let target = match &options.target {
        Some(tokens) => {
            let counts = io::parse_token_vector(tokens, net.places_len(), "Target marking")?;
            let counts: Vec<u64> = counts.into_iter().map(|count| count as u64).collect();
            Some(net.marking_from_counts(&counts)?)
        }
        None => target,
    };

    let start = Instant::now();
    let analyzer = PetriNetAnalyzer::with_config(&net, config.reachability.clone());
    let run = PetriNetSimulator::from_config(&config.simulation)
        .simulate_one_path(&net, config.simulation.max_steps)?;
    let report = AnalysisReport::new(&analyzer, target.as_ref(), Some(&run))
        .with_analysis_time(start.elapsed());
    info!(
        "analysed {} markings in {:?}",
        report.graph.nodes.len(),
        report.analysis_time
    );

    if let Some(dot) = &options.dot {
        fs::write(dot, analyzer.graph().to_dot(&net))
            .with_context(|| format!("Failed to write dot file: {:?}", dot))?;
    }

    let rendered = if options.text {
        report.to_string()
    } else {
        report.to_json()?
    };
    match &options.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write report: {:?}", path))?,
        None => println!("{}", rendered),
    }
    Ok(())
}
