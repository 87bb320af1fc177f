//! Built-in keyword presets selectable from the CLI.
//!
//! The table is data, not logic: filtering and ranking only ever see the
//! resolved keyword string. Presets cover the broad research areas the
//! tool is typically pointed at; `--keywords` overrides them entirely.

/// One selectable preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordPreset {
    /// Stable selection key used on the CLI.
    pub key: &'static str,
    /// Human-readable name shown in listings.
    pub name: &'static str,
    /// Comma-separated keyword OR-groups fed into the criteria.
    pub keywords: &'static str,
}

/// All built-in presets, in listing order.
pub const KEYWORD_PRESETS: &[KeywordPreset] = &[
    KeywordPreset {
        key: "general-ai",
        name: "General AI",
        keywords: "Artificial Intelligence, AI, Machine Learning, Deep Learning, Neural Network",
    },
    KeywordPreset {
        key: "agents",
        name: "AGI and agents",
        keywords: "Artificial General Intelligence, AGI, Autonomous Agent, Multi-agent System, Intelligent Agent",
    },
    KeywordPreset {
        key: "llm",
        name: "Large language models",
        keywords: "Large Language Model, LLM, GPT, ChatGPT, Transformer, BERT",
    },
    KeywordPreset {
        key: "vision",
        name: "Computer vision",
        keywords: "Computer Vision, CV, Image Processing, Object Detection, CNN, Vision Transformer",
    },
    KeywordPreset {
        key: "rl",
        name: "Reinforcement learning",
        keywords: "Reinforcement Learning, RL, Deep RL, Policy Learning, Q-Learning, DQN",
    },
    KeywordPreset {
        key: "nlp",
        name: "Natural language processing",
        keywords: "Natural Language Processing, NLP, Text Mining, Information Extraction, Text Generation",
    },
    KeywordPreset {
        key: "generative",
        name: "Generative models",
        keywords: "Generative AI, GAN, Diffusion Model, Text-to-Image, Stable Diffusion",
    },
    KeywordPreset {
        key: "safety",
        name: "AI safety",
        keywords: "AI Safety, Safe AI, Robust AI, AI Security, Trustworthy AI",
    },
    KeywordPreset {
        key: "interpretability",
        name: "Interpretability",
        keywords: "Explainable AI, XAI, Interpretable AI, AI Interpretation, Model Understanding",
    },
    KeywordPreset {
        key: "robotics",
        name: "Robotics",
        keywords: "Robotics AI, Robot Learning, Intelligent Robotics, Robot Intelligence",
    },
];

/// Looks up a preset by its selection key.
#[must_use]
pub fn preset(key: &str) -> Option<&'static KeywordPreset> {
    KEYWORD_PRESETS.iter().find(|p| p.key == key)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_lookup_by_key() {
        let found = preset("llm").unwrap();
        assert_eq!(found.name, "Large language models");
        assert!(found.keywords.contains("Transformer"));
    }

    #[test]
    fn test_unknown_preset_is_none() {
        assert!(preset("numerology").is_none());
    }

    #[test]
    fn test_preset_keys_are_unique() {
        let mut keys: Vec<&str> = KEYWORD_PRESETS.iter().map(|p| p.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), KEYWORD_PRESETS.len());
    }
}
