//! I/O 支持: 网描述 (`NetSpec`) 的 JSON / RON / TOML 读写与校验.
//!
//! 网描述与实验表单一致: 库所数、迁移数、初始 token 向量、可选目标向量,
//! 以及每个迁移的输入/输出库所下标 (从 1 开始). 库所命名为 `p1..pn`,
//! 迁移命名为 `t1..tm`.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::net::core::{Arcs, Net, NetError};
use crate::net::marking::{Marking, MarkingError};
use crate::net::structure::Weight;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),
    #[error("ron parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("toml parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("toml error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported net description format `{0}` (expected json, ron or toml)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// 网描述中的输入错误, 在任何探索开始前报告.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("{field} must contain integers separated by commas")]
    NotIntegers { field: String },
    #[error("{field} must have exactly {expected} values (one per place), got {found}")]
    Length {
        field: String,
        expected: usize,
        found: usize,
    },
    #[error("{field} cannot contain negative values")]
    Negative { field: String },
    #[error("{direction} place {index} for {transition} is out of range (1-{places})")]
    PlaceIndex {
        transition: String,
        direction: &'static str,
        index: i64,
        places: usize,
    },
    #[error("{found} transitions have arcs but only {declared} are declared")]
    TooManyTransitions { declared: usize, found: usize },
    #[error("invalid net: {0}")]
    Net(String),
}

impl From<NetError> for SpecError {
    fn from(err: NetError) -> Self {
        SpecError::Net(err.to_string())
    }
}

impl From<MarkingError> for SpecError {
    fn from(err: MarkingError) -> Self {
        SpecError::Net(err.to_string())
    }
}

/// 单个迁移的弧, 库所以 1 起始的下标给出.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionArcs {
    #[serde(default)]
    pub input: Vec<i64>,
    #[serde(default)]
    pub output: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetSpec {
    pub places: usize,
    pub transitions: usize,
    pub initial_marking: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_marking: Option<Vec<i64>>,
    /// 第 i 项对应迁移 `t{i+1}`; 缺省的迁移没有弧.
    #[serde(default)]
    pub arcs: Vec<TransitionArcs>,
}

/// 校验后的网及可选目标标识.
#[derive(Debug, Clone)]
pub struct LoadedNet {
    pub net: Net,
    pub target: Option<Marking>,
}

pub fn place_name(index: usize) -> String {
    format!("p{}", index)
}

pub fn transition_name(index: usize) -> String {
    format!("t{}", index)
}

impl NetSpec {
    pub fn place_names(&self) -> Vec<String> {
        (1..=self.places).map(place_name).collect()
    }

    pub fn transition_names(&self) -> Vec<String> {
        (1..=self.transitions).map(transition_name).collect()
    }

    /// 校验描述并构造网与目标标识.
    pub fn build(&self) -> Result<LoadedNet, SpecError> {
        let initial = check_tokens(&self.initial_marking, self.places, "Initial marking")?;
        let target = self
            .target_marking
            .as_deref()
            .map(|tokens| check_tokens(tokens, self.places, "Target marking"))
            .transpose()?;

        if self.arcs.len() > self.transitions {
            return Err(SpecError::TooManyTransitions {
                declared: self.transitions,
                found: self.arcs.len(),
            });
        }

        let mut input_arcs = Arcs::new();
        let mut output_arcs = Arcs::new();
        for (idx, name) in self.transition_names().into_iter().enumerate() {
            let arcs = self.arcs.get(idx).cloned().unwrap_or_default();
            let inputs = resolve_places(&name, "Input", &arcs.input, self.places)?;
            let outputs = resolve_places(&name, "Output", &arcs.output, self.places)?;
            input_arcs.insert(name.clone(), inputs);
            output_arcs.insert(name, outputs);
        }

        let initial_map: IndexMap<String, Weight> =
            self.place_names().into_iter().zip(initial).collect();
        let net = Net::new(
            self.place_names(),
            self.transition_names(),
            &input_arcs,
            &output_arcs,
            &initial_map,
        )?;
        let target = target
            .map(|counts| net.marking_from_counts(&counts))
            .transpose()?;

        log::debug!(
            "loaded net with {} places and {} transitions",
            net.places_len(),
            net.transitions_len()
        );
        Ok(LoadedNet { net, target })
    }
}

fn check_tokens(tokens: &[i64], places: usize, field: &str) -> Result<Vec<Weight>, SpecError> {
    if tokens.len() != places {
        return Err(SpecError::Length {
            field: field.to_string(),
            expected: places,
            found: tokens.len(),
        });
    }
    tokens
        .iter()
        .map(|&value| {
            Weight::try_from(value).map_err(|_| SpecError::Negative {
                field: field.to_string(),
            })
        })
        .collect()
}

fn resolve_places(
    transition: &str,
    direction: &'static str,
    indices: &[i64],
    places: usize,
) -> Result<Vec<String>, SpecError> {
    indices
        .iter()
        .map(|&index| {
            if index < 1 || index as usize > places {
                Err(SpecError::PlaceIndex {
                    transition: transition.to_string(),
                    direction,
                    index,
                    places,
                })
            } else {
                Ok(place_name(index as usize))
            }
        })
        .collect()
}

/// 解析逗号分隔的整数列表, 例如 `"0, 0,1"`. 空串得到空列表.
pub fn parse_index_list(data: &str, field: &str) -> Result<Vec<i64>, SpecError> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(Vec::new());
    }
    data.split(',')
        .map(|part| {
            part.trim().parse::<i64>().map_err(|_| SpecError::NotIntegers {
                field: field.to_string(),
            })
        })
        .collect()
}

/// 解析逗号分隔的 token 向量并校验长度与符号.
pub fn parse_token_vector(data: &str, places: usize, field: &str) -> Result<Vec<i64>, SpecError> {
    let values = parse_index_list(data, field)?;
    check_tokens(&values, places, field)?;
    Ok(values)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Ron,
    Toml,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(Format::Json),
            "ron" => Ok(Format::Ron),
            "toml" => Ok(Format::Toml),
            _ => Err(IoError::UnsupportedFormat(ext)),
        }
    }
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn to_ron_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    let mut pretty = PrettyConfig::default();
    pretty.new_line = "\n".into();
    Ok(ron::ser::to_string_pretty(value, pretty)?)
}

pub fn from_ron_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(s)?)
}

pub fn decode<T: DeserializeOwned>(content: &str, format: Format) -> Result<T, IoError> {
    match format {
        Format::Json => from_json_str(content),
        Format::Ron => from_ron_str(content),
        Format::Toml => Ok(toml::from_str(content)?),
    }
}

pub fn encode<T: Serialize>(value: &T, format: Format) -> Result<String, IoError> {
    match format {
        Format::Json => to_json_string(value),
        Format::Ron => to_ron_string(value),
        Format::Toml => Ok(toml::to_string_pretty(value)?),
    }
}

pub fn read_spec<P: AsRef<Path>>(path: P) -> Result<NetSpec, IoError> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)?;
    decode(&content, format)
}

/// 读取并校验网描述文件.
pub fn load_net<P: AsRef<Path>>(path: P) -> Result<LoadedNet, IoError> {
    Ok(read_spec(path)?.build()?)
}

pub fn write_spec<P: AsRef<Path>>(path: P, spec: &NetSpec) -> Result<(), IoError> {
    let path = path.as_ref();
    let content = encode(spec, Format::from_path(path)?)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::token::Token;

    fn mutex_spec() -> NetSpec {
        NetSpec {
            places: 2,
            transitions: 2,
            initial_marking: vec![1, 0],
            target_marking: Some(vec![0, 1]),
            arcs: vec![
                TransitionArcs {
                    input: vec![1],
                    output: vec![2],
                },
                TransitionArcs {
                    input: vec![2],
                    output: vec![1],
                },
            ],
        }
    }

    #[test]
    fn spec_builds_named_net() {
        let loaded = mutex_spec().build().unwrap();

        assert_eq!(loaded.net.place_order().to_vec(), vec!["p1", "p2"]);
        assert_eq!(loaded.net.input_arcs()["t1"], vec!["p1".to_string()]);
        assert_eq!(loaded.net.output_arcs()["t2"], vec!["p1".to_string()]);
        assert_eq!(
            loaded.target.unwrap().values(),
            &[Token::ZERO, Token::Finite(1)]
        );
    }

    #[test]
    fn missing_arc_entries_default_to_empty() {
        let spec = NetSpec {
            places: 1,
            transitions: 2,
            initial_marking: vec![0],
            target_marking: None,
            arcs: vec![TransitionArcs {
                input: vec![],
                output: vec![1],
            }],
        };
        let loaded = spec.build().unwrap();
        assert!(loaded.net.input_arcs()["t2"].is_empty());
        assert!(loaded.net.output_arcs()["t2"].is_empty());
    }

    #[test]
    fn spec_validation_errors() {
        let mut spec = mutex_spec();
        spec.initial_marking = vec![1];
        assert_eq!(
            spec.build().unwrap_err(),
            SpecError::Length {
                field: "Initial marking".into(),
                expected: 2,
                found: 1
            }
        );

        let mut spec = mutex_spec();
        spec.target_marking = Some(vec![-1, 0]);
        assert_eq!(
            spec.build().unwrap_err(),
            SpecError::Negative {
                field: "Target marking".into()
            }
        );

        let mut spec = mutex_spec();
        spec.arcs[0].output = vec![3];
        assert!(matches!(
            spec.build().unwrap_err(),
            SpecError::PlaceIndex { index: 3, .. }
        ));

        let mut spec = mutex_spec();
        spec.transitions = 1;
        assert!(matches!(
            spec.build().unwrap_err(),
            SpecError::TooManyTransitions { .. }
        ));
    }

    #[test]
    fn comma_separated_vectors() {
        assert_eq!(parse_token_vector("0, 0,1", 3, "Initial marking").unwrap(), vec![0, 0, 1]);
        assert_eq!(parse_index_list("  ", "Input").unwrap(), Vec::<i64>::new());
        assert!(matches!(
            parse_token_vector("1,x", 2, "Initial marking"),
            Err(SpecError::NotIntegers { .. })
        ));
        assert!(matches!(
            parse_token_vector("1,2", 3, "Initial marking"),
            Err(SpecError::Length { .. })
        ));
    }

    #[test]
    fn spec_formats_decode() {
        let spec = mutex_spec();
        for format in [Format::Json, Format::Ron, Format::Toml] {
            let text = encode(&spec, format).unwrap();
            let back: NetSpec = decode(&text, format).unwrap();
            assert_eq!(back, spec);
        }
        assert!(matches!(
            Format::from_path(Path::new("net.yaml")),
            Err(IoError::UnsupportedFormat(_))
        ));
    }
}
