//! Model catalog - the fixed registry of downloadable models.

use super::types::{MemoryRequirements, ModelDescriptor};

/// Read-only registry of model descriptors. Supports lookup, nothing else.
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    /// Catalog with the curated built-in model list.
    pub fn builtin() -> Self {
        Self::new(builtin_models())
    }

    pub fn list(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }
}

/// Curated list of models offered for download.
pub fn builtin_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor {
            id: "tinyllama-1.1b".to_string(),
            name: "TinyLlama 1.1B".to_string(),
            description: "A small, efficient language model with 1.1B parameters".to_string(),
            url: "https://huggingface.co/TinyLlama/TinyLlama-1.1B-Chat-v1.0/resolve/main/model.safetensors".to_string(),
            size: "1.1GB".to_string(),
            format: "safetensors".to_string(),
            requirements: MemoryRequirements {
                min_memory: "4GB".to_string(),
                recommended_memory: "8GB".to_string(),
            },
        },
        ModelDescriptor {
            id: "phi-2".to_string(),
            name: "Microsoft Phi-2".to_string(),
            description: "A 2.7B parameter model with strong reasoning capabilities".to_string(),
            url: "https://huggingface.co/microsoft/phi-2/resolve/main/model.safetensors".to_string(),
            size: "2.7GB".to_string(),
            format: "safetensors".to_string(),
            requirements: MemoryRequirements {
                min_memory: "8GB".to_string(),
                recommended_memory: "16GB".to_string(),
            },
        },
        ModelDescriptor {
            id: "neural-chat-7b".to_string(),
            name: "Neural Chat 7B".to_string(),
            description: "A 7B parameter model optimized for chat interactions".to_string(),
            url: "https://huggingface.co/Intel/neural-chat-7b-v3-1/resolve/main/model.safetensors".to_string(),
            size: "7GB".to_string(),
            format: "safetensors".to_string(),
            requirements: MemoryRequirements {
                min_memory: "16GB".to_string(),
                recommended_memory: "32GB".to_string(),
            },
        },
    ]
}
