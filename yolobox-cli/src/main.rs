use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yolobox::decode::presets::{preset, COCO_NUM_CLASSES};
use yolobox::{
    ClusterMode, Detection, DetectionParams, FrameParser, LayerData, LayerView, Letterbox,
    NetworkInfo, ParseConfig,
};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "yolobox CLI: parse raw detector tensors (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for decode and clustering steps.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
struct NetworkJson {
    width: u32,
    height: u32,
    #[serde(default = "default_channels")]
    channels: u32,
}

fn default_channels() -> u32 {
    3
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DTypeConfig {
    #[default]
    F32,
    I32,
}

#[derive(Debug, Deserialize)]
struct LayerJson {
    #[serde(default)]
    name: String,
    path: PathBuf,
    dims: Vec<usize>,
    #[serde(default)]
    dtype: DTypeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ThresholdsJson {
    num_classes: usize,
    precluster: f32,
    postcluster: f32,
    per_class_precluster: BTreeMap<u32, f32>,
    per_class_postcluster: BTreeMap<u32, f32>,
}

impl Default for ThresholdsJson {
    fn default() -> Self {
        Self {
            num_classes: COCO_NUM_CLASSES,
            precluster: 0.25,
            postcluster: 0.0,
            per_class_precluster: BTreeMap::new(),
            per_class_postcluster: BTreeMap::new(),
        }
    }
}

impl ThresholdsJson {
    fn to_params(&self) -> DetectionParams {
        let mut params =
            DetectionParams::uniform(self.num_classes, self.precluster, self.postcluster);
        apply_overrides(&mut params.per_class_precluster_threshold, &self.per_class_precluster);
        apply_overrides(&mut params.per_class_postcluster_threshold, &self.per_class_postcluster);
        params
    }
}

fn apply_overrides(thresholds: &mut [f32], overrides: &BTreeMap<u32, f32>) {
    for (&class_id, &value) in overrides {
        if let Some(slot) = thresholds.get_mut(class_id as usize) {
            *slot = value;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ClusterModeConfig {
    Nms,
    None,
}

impl From<ClusterModeConfig> for ClusterMode {
    fn from(value: ClusterModeConfig) -> Self {
        match value {
            ClusterModeConfig::Nms => ClusterMode::Nms,
            ClusterModeConfig::None => ClusterMode::None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ClusterJson {
    mode: ClusterModeConfig,
    iou_threshold: f32,
    top_k: usize,
    parallel: bool,
}

impl Default for ClusterJson {
    fn default() -> Self {
        let cfg = ParseConfig::default();
        Self {
            mode: ClusterModeConfig::Nms,
            iou_threshold: cfg.iou_threshold,
            top_k: cfg.top_k,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourceJson {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct Config {
    preset: String,
    network: NetworkJson,
    frames: Vec<Vec<LayerJson>>,
    #[serde(default)]
    thresholds: ThresholdsJson,
    #[serde(default)]
    cluster: ClusterJson,
    #[serde(default)]
    source: Option<SourceJson>,
    #[serde(default)]
    output_path: Option<String>,
}

/// Layer contents read from disk.
enum LayerBuffer {
    F32(Vec<f32>),
    I32(Vec<i32>),
}

struct LoadedLayer {
    name: String,
    dims: Vec<usize>,
    buffer: LayerBuffer,
}

impl LoadedLayer {
    fn load(layer: &LayerJson) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = fs::read(&layer.path)?;
        if bytes.len() % 4 != 0 {
            return Err(format!(
                "{}: size {} is not a multiple of 4 bytes",
                layer.path.display(),
                bytes.len()
            )
            .into());
        }
        let words = bytes.chunks_exact(4).map(|w| [w[0], w[1], w[2], w[3]]);
        let buffer = match layer.dtype {
            DTypeConfig::F32 => LayerBuffer::F32(words.map(f32::from_le_bytes).collect()),
            DTypeConfig::I32 => LayerBuffer::I32(words.map(i32::from_le_bytes).collect()),
        };
        let name = if layer.name.is_empty() {
            layer.path.display().to_string()
        } else {
            layer.name.clone()
        };
        Ok(Self {
            name,
            dims: layer.dims.clone(),
            buffer,
        })
    }

    fn view(&self) -> yolobox::YoloBoxResult<LayerView<'_>> {
        let data = match &self.buffer {
            LayerBuffer::F32(data) => LayerData::Float32(data),
            LayerBuffer::I32(data) => LayerData::Int32(data),
        };
        LayerView::new(&self.name, &self.dims, data)
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    class_id: u32,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    confidence: f32,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            class_id: value.class_id,
            left: value.left,
            top: value.top,
            width: value.width,
            height: value.height,
            confidence: value.confidence,
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameRecord {
    frame: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    detections: Vec<DetectionRecord>,
}

#[derive(Debug, Serialize)]
struct Output {
    preset: String,
    frames: Vec<FrameRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("yolobox=debug".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frames.is_empty() {
        return Err("frames must list at least one frame".into());
    }

    let decoder = preset(&config.preset)?;
    let network = NetworkInfo {
        width: config.network.width,
        height: config.network.height,
        channels: config.network.channels,
    };
    let letterbox = config
        .source
        .as_ref()
        .map(|src| Letterbox::fit(src.width, src.height, &network))
        .transpose()?;

    let loaded = config
        .frames
        .iter()
        .map(|frame| frame.iter().map(LoadedLayer::load).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;
    let frames = loaded
        .iter()
        .map(|frame| frame.iter().map(LoadedLayer::view).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;

    let parser = FrameParser::new(decoder).with_config(ParseConfig {
        cluster_mode: config.cluster.mode.into(),
        iou_threshold: config.cluster.iou_threshold,
        top_k: config.cluster.top_k,
        parallel: config.cluster.parallel,
    });
    let params = config.thresholds.to_params();
    let results = parser.parse_batch(&frames, &network, &params);

    let frames = results
        .into_iter()
        .enumerate()
        .map(|(frame, result)| match result {
            Ok(dets) => FrameRecord {
                frame,
                error: None,
                detections: dets
                    .iter()
                    .filter_map(|det| match &letterbox {
                        Some(lb) => lb.to_source(det),
                        None => Some(*det),
                    })
                    .map(DetectionRecord::from)
                    .collect(),
            },
            Err(err) => {
                tracing::warn!(frame, error = %err, "frame failed to parse");
                FrameRecord {
                    frame,
                    error: Some(err.to_string()),
                    detections: Vec::new(),
                }
            }
        })
        .collect();

    let output = Output {
        preset: config.preset,
        frames,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
