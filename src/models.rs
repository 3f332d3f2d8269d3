//! Catalog of builtin backbone models.
//!
//! A backbone here is an ONNX export of a pretrained convolutional network
//! with its classification head removed, so the last output is a pooled
//! feature map with one fixed-length vector per image. Each catalog entry
//! also carries the input normalization the export was trained with, since
//! feeding a backbone differently-normalized pixels silently degrades its
//! features.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// Torchvision-style ResNet-50 trained on ImageNet, head removed;
    /// emits one pooled 2048-length feature vector per image (`[N, 2048]`)
    ResNet50,
}

/// Per-channel input normalization the backbone was trained with, applied in
/// RGB order after scaling pixel values to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct InputNormalization {
    pub mean_rgb: [f32; 3],
    pub std_rgb: [f32; 3],
}

/// Static properties of a backbone that the rest of the pipeline depends on.
#[derive(Debug, Clone)]
pub struct ModelCharacteristics {
    /// Length of the feature vector produced per image
    pub embedding_dim: usize,
    /// Side length the input images are resized to
    pub input_size: u32,
    /// Input normalization expected by the export
    pub normalization: InputNormalization,
    /// Approximate download size, used for log messages only
    pub model_size_mb: usize,
}

/// Where a builtin model is fetched from.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: &'static str,
    pub url: &'static str,
}

impl BuiltinModel {
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::ResNet50 => ModelCharacteristics {
                embedding_dim: 2048,
                input_size: 224,
                // Standard ImageNet statistics for torchvision-trained
                // models.
                normalization: InputNormalization {
                    mean_rgb: [0.485, 0.456, 0.406],
                    std_rgb: [0.229, 0.224, 0.225],
                },
                model_size_mb: 98,
            },
        }
    }

    pub fn info(&self) -> ModelInfo {
        match self {
            BuiltinModel::ResNet50 => ModelInfo {
                name: "resnet50",
                url: "https://huggingface.co/Qdrant/resnet50-onnx/resolve/main/model.onnx",
            },
        }
    }
}
