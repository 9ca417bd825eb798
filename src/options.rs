//! Parsing Options.
//! `pn-lab -f net.json [--target 1,0] [--max-markings N] [--steps N] [--dot graph.dot]`

use clap::{Arg, ArgAction, Command, value_parser};
use std::error::Error;
use std::path::PathBuf;

use crate::analysis::reachability::WideningPolicy;

fn make_options_parser() -> clap::Command {
    Command::new("pn-lab")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Reachability, property and simulation analysis of place/transition nets")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("NET")
                .help("Net description (.json, .ron or .toml)")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file")
                .default_value("pn-lab.toml")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the report will be stored; stdout when absent")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("target")
                .short('t')
                .long("target")
                .value_name("TOKENS")
                .help("Comma separated target marking, overrides the one in the net file"),
        )
        .arg(
            Arg::new("max-markings")
                .long("max-markings")
                .value_name("N")
                .help("Node cap of the reachability graph")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("widening")
                .long("widening")
                .help("Widening applied when the node cap is reached")
                .value_parser(["disabled", "recent-growth", "recent-at-maximum"]),
        )
        .arg(
            Arg::new("steps")
                .short('s')
                .long("steps")
                .value_name("N")
                .help("Maximum number of firings in the simulated path")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("dot")
                .long("dot")
                .value_name("FILE")
                .help("Write the reachability graph in Graphviz DOT format")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .help("Print the human readable report instead of JSON")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug, Default)]
pub struct Options {
    pub file: PathBuf,
    pub config: PathBuf,
    pub output: Option<PathBuf>,
    pub target: Option<String>,
    pub max_markings: Option<usize>,
    pub widening: Option<WideningPolicy>,
    pub steps: Option<usize>,
    pub dot: Option<PathBuf>,
    pub text: bool,
}

impl Options {
    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let widening = match matches.get_one::<String>("widening").map(String::as_str) {
            None => None,
            Some("disabled") => Some(WideningPolicy::Disabled),
            Some("recent-growth") => Some(WideningPolicy::RecentGrowth),
            Some("recent-at-maximum") => Some(WideningPolicy::RecentAtMaximum),
            Some(other) => return Err(format!("unsupported widening policy: {}", other).into()),
        };

        Ok(Options {
            file: matches
                .get_one::<PathBuf>("file")
                .cloned()
                .ok_or("missing net file")?,
            config: matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_default(),
            output: matches.get_one::<PathBuf>("output").cloned(),
            target: matches.get_one::<String>("target").cloned(),
            max_markings: matches.get_one::<usize>("max-markings").copied(),
            widening,
            steps: matches.get_one::<usize>("steps").copied(),
            dot: matches.get_one::<PathBuf>("dot").cloned(),
            text: matches.get_flag("text"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn test_parse_minimal() {
        let options = Options::parse_from_args(&args("-f net.json")).unwrap();
        assert_eq!(options.file, PathBuf::from("net.json"));
        assert_eq!(options.config, PathBuf::from("pn-lab.toml"));
        assert!(options.output.is_none());
        assert!(options.max_markings.is_none());
        assert!(!options.text);
    }

    #[test]
    fn test_parse_all_flags() {
        let options = Options::parse_from_args(&args(
            "-f net.ron -c lab.toml -o out.json --target 1,0 --max-markings 20 \
             --widening disabled -s 3 --dot graph.dot --text",
        ))
        .unwrap();
        assert_eq!(options.target.as_deref(), Some("1,0"));
        assert_eq!(options.max_markings, Some(20));
        assert_eq!(options.widening, Some(WideningPolicy::Disabled));
        assert_eq!(options.steps, Some(3));
        assert_eq!(options.dot, Some(PathBuf::from("graph.dot")));
        assert!(options.text);
    }

    #[test]
    fn test_help_and_version_are_clap_errors() {
        let help = Options::parse_from_args(&args("--help")).unwrap_err();
        let help = help.downcast::<clap::Error>().unwrap();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(help.exit_code(), 0);

        let version = Options::parse_from_args(&args("--version")).unwrap_err();
        let version = version.downcast::<clap::Error>().unwrap();
        assert_eq!(version.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_parse_from_args_err() {
        assert!(Options::parse_from_args(&args("--max-markings 3")).is_err());
        assert!(Options::parse_from_args(&args("-f n.json --widening sometimes")).is_err());
        assert!(Options::parse_from_args(&args("-f n.json --steps many")).is_err());
    }
}
