// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Supported model profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// A model this tool knows how to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProfile {
    Llama31Instruct8B,
    Llama31Instruct70B,
    Llama33Instruct70B,
    Qwen25Instruct72B,
    Qwen25CoderInstruct32B,
    GptOss120B,
}

impl ModelProfile {
    pub const ALL: [ModelProfile; 6] = [
        ModelProfile::Llama31Instruct8B,
        ModelProfile::Llama31Instruct70B,
        ModelProfile::Llama33Instruct70B,
        ModelProfile::Qwen25Instruct72B,
        ModelProfile::Qwen25CoderInstruct32B,
        ModelProfile::GptOss120B,
    ];

    /// Short name used in configuration.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Llama31Instruct8B => "llama-3.1-8b-instruct",
            Self::Llama31Instruct70B => "llama-3.1-70b-instruct",
            Self::Llama33Instruct70B => "llama-3.3-70b-instruct",
            Self::Qwen25Instruct72B => "qwen2.5-72b-instruct",
            Self::Qwen25CoderInstruct32B => "qwen2.5-coder-32b-instruct",
            Self::GptOss120B => "gpt-oss-120b",
        }
    }

    /// Hugging Face repository identifier.
    pub fn hf_id(&self) -> &'static str {
        match self {
            Self::Llama31Instruct8B => "meta-llama/Llama-3.1-8B-Instruct",
            Self::Llama31Instruct70B => "meta-llama/Llama-3.1-70B-Instruct",
            Self::Llama33Instruct70B => "meta-llama/Llama-3.3-70B-Instruct",
            Self::Qwen25Instruct72B => "Qwen/Qwen2.5-72B-Instruct",
            Self::Qwen25CoderInstruct32B => "Qwen/Qwen2.5-Coder-32B-Instruct",
            Self::GptOss120B => "openai/gpt-oss-120b",
        }
    }

    pub fn default_max_model_len(&self) -> u32 {
        match self {
            Self::Llama31Instruct8B => 32768,
            Self::Llama31Instruct70B | Self::Llama33Instruct70B => 16384,
            Self::Qwen25Instruct72B => 16384,
            Self::Qwen25CoderInstruct32B => 32768,
            Self::GptOss120B => 32768,
        }
    }

    /// Smallest tensor x pipeline product that fits the weights.
    pub fn min_gpus(&self) -> u32 {
        match self {
            Self::Llama31Instruct8B | Self::Qwen25CoderInstruct32B => 1,
            Self::Llama31Instruct70B
            | Self::Llama33Instruct70B
            | Self::Qwen25Instruct72B
            | Self::GptOss120B => 2,
        }
    }

    /// Whether the upstream repository requires an access token.
    pub fn gated(&self) -> bool {
        matches!(
            self,
            Self::Llama31Instruct8B | Self::Llama31Instruct70B | Self::Llama33Instruct70B
        )
    }
}

impl fmt::Display for ModelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for ModelProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl FromStr for ModelProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.key() == wanted || m.hf_id().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.key()).collect();
                format!("unknown model '{}', expected one of: {}", s, known.join(", "))
            })
    }
}
