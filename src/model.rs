use std::{cmp::Ordering, path::Path};

use crate::{
    detection::{BoundingBox, Detection},
    errors::{ExtractError, Result},
    imageops_ai::{letterbox, Letterbox},
    traits::ObjectDetector,
};
use image::{DynamicImage, GenericImageView};
use ndarray::prelude::*;
use nshare::AsNdarray3;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Input size used when the model declares a dynamic spatial dimension.
pub const DEFAULT_IMAGE_SIZE: u32 = 640;
/// Proposals scoring below this are discarded before NMS.
pub const CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const IOU_THRESHOLD: f32 = 0.7;
pub const MAX_DETECTIONS: usize = 300;

/// YOLOv8 detector backed by an ONNX Runtime session.
///
/// The session is loaded once and shared; inference runs are serialized on
/// the inner mutex.
pub struct YoloModel {
    pub image_size: u32,
    pub class_names: Vec<String>,
    input_name: String,
    output_name: String,
    session: Mutex<Session>,
}

impl YoloModel {
    pub fn new(model_path: &Path, device_id: i32) -> Result<Self> {
        let mut session = SessionBuilder::new()
            .map_err(|e| ExtractError::model("session builder initialization", e.to_string()))?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| ExtractError::model("execution provider registration", e.to_string()))?
            .with_memory_pattern(true)
            .map_err(|e| ExtractError::model("memory pattern setup", e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| {
                ExtractError::model(
                    format!("model load: {}", model_path.display()),
                    e.to_string(),
                )
            })?;

        let input = session.inputs.first().ok_or_else(|| {
            ExtractError::model("model input lookup", "model declares no inputs")
        })?;
        let input_name = input.name.clone();
        let image_size = input
            .input_type
            .tensor_shape()
            .and_then(|shape| shape.get(2).copied())
            .filter(|&dim| dim > 0)
            .map_or(DEFAULT_IMAGE_SIZE, |dim| dim as u32);
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                ExtractError::model("model output lookup", "model declares no outputs")
            })?;

        let class_names = session
            .metadata()
            .ok()
            .and_then(|metadata| metadata.custom("names").ok().flatten())
            .map(|names| parse_class_names(&names))
            .filter(|names| !names.is_empty())
            .unwrap_or_else(|| COCO_CLASSES.iter().map(|name| name.to_string()).collect());

        // warm up
        let data = Array4::<f32>::zeros((1, 3, image_size as usize, image_size as usize));
        session
            .run(ort::inputs![input_name.as_str() => TensorRef::from_array_view(&data)?])
            .map_err(|e| ExtractError::model("model warm-up run", e))?;

        info!(
            model = %model_path.display(),
            image_size,
            classes = class_names.len(),
            "detection model loaded"
        );

        Ok(Self {
            image_size,
            class_names,
            input_name,
            output_name,
            session: Mutex::new(session),
        })
    }

    /// Raw model output, shaped `[batch, 4 + classes, proposals]`.
    pub fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array3<f32>> {
        let mut binding = self.session.lock();
        let outputs = binding.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?
        ])?;
        Ok(outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix3>()?
            .to_owned())
    }

    fn class_name(&self, class_id: u32) -> String {
        self.class_names
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}

impl ObjectDetector for YoloModel {
    fn detect(&self, img: &DynamicImage) -> Result<Vec<Detection>> {
        let (tensor, letterbox) = preprocess(img, self.image_size)?;
        let output = self.predict(tensor.view())?;
        let (width, height) = img.dimensions();

        let candidates = decode_predictions(output.view(), &letterbox, width, height);
        let kept = non_max_suppression(candidates, IOU_THRESHOLD, MAX_DETECTIONS);
        debug!(detections = kept.len(), "inference finished");

        Ok(kept
            .into_iter()
            .map(|candidate| Detection {
                bounding_box: candidate.bounding_box,
                class_id: candidate.class_id,
                class_name: self.class_name(candidate.class_id),
                confidence: candidate.confidence,
            })
            .collect())
    }
}

/// A decoded proposal before class names are attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub bounding_box: BoundingBox,
    pub class_id: u32,
    pub confidence: f32,
}

pub fn preprocess(img: &DynamicImage, image_size: u32) -> Result<(Array4<f32>, Letterbox)> {
    let (canvas, letterbox) = letterbox(&img.to_rgb8(), image_size);
    let tensor = canvas
        .as_ndarray3()
        .slice_move(s![NewAxis, .., .., ..])
        .mapv(|v| f32::from(v) / 255.0);

    Ok((tensor.as_standard_layout().into_owned(), letterbox))
}

/// Decode a `[1, 4 + classes, proposals]` output into candidates in original
/// image coordinates, dropping proposals below `CONFIDENCE_THRESHOLD`.
pub fn decode_predictions(
    output: ArrayView3<f32>,
    letterbox: &Letterbox,
    width: u32,
    height: u32,
) -> Vec<Candidate> {
    let Some(output) = output.outer_iter().next() else {
        return Vec::new();
    };
    if output.nrows() <= 4 {
        return Vec::new();
    }
    let (max_x, max_y) = (width as f32, height as f32);

    output
        .columns()
        .into_iter()
        .filter_map(|proposal| {
            let (class_id, confidence) = proposal
                .slice(s![4..])
                .iter()
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))?;
            if confidence < CONFIDENCE_THRESHOLD {
                return None;
            }

            let (cx, cy, w, h) = (proposal[0], proposal[1], proposal[2], proposal[3]);
            let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
            let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);

            Some(Candidate {
                bounding_box: BoundingBox::new(
                    x1.clamp(0.0, max_x),
                    y1.clamp(0.0, max_y),
                    x2.clamp(0.0, max_x),
                    y2.clamp(0.0, max_y),
                ),
                class_id: class_id as u32,
                confidence,
            })
        })
        .collect()
}

/// Per-class greedy NMS. The result is ordered by descending confidence.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id
                && k.bounding_box.iou(&candidate.bounding_box) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Parse the `names` metadata written by YOLO exporters, e.g.
/// `{0: 'person', 1: 'bicycle'}`. Ids are expected to be dense from zero.
pub fn parse_class_names(raw: &str) -> Vec<String> {
    let mut entries: Vec<(usize, String)> = raw
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
        .filter_map(|entry| {
            let (id, name) = entry.split_once(':')?;
            let id = id.trim().parse::<usize>().ok()?;
            let name = name.trim().trim_matches(|c| c == '\'' || c == '"');
            Some((id, name.to_string()))
        })
        .collect();
    entries.sort_by_key(|(id, _)| *id);

    if entries.iter().enumerate().any(|(i, (id, _))| i != *id) {
        return Vec::new();
    }
    entries.into_iter().map(|(_, name)| name).collect()
}

pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];
