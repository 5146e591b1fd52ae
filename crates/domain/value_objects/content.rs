use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopTenItem {
    pub rank: u8,
    pub name: String,
    pub tagline: String,
    #[serde(default)]
    pub facts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchData {
    pub items: Vec<TopTenItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemScript {
    pub rank: u8,
    pub name: String,
    pub script: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoScript {
    #[serde(default)]
    pub hook: String,
    #[serde(default)]
    pub items_script: Vec<ItemScript>,
    #[serde(default)]
    pub cta: String,
}

impl VideoScript {
    /// Flattens the script into the narration text read over the video:
    /// hook, then "Number N: name. beat" per item, then the call to action.
    pub fn narration(&self) -> String {
        let mut narration = String::new();
        if !self.hook.is_empty() {
            narration.push_str(&self.hook);
            narration.push(' ');
        }
        for item in &self.items_script {
            narration.push_str(&format!(
                "Number {}: {}. {} ",
                item.rank, item.name, item.script
            ));
        }
        if !self.cta.is_empty() {
            narration.push_str(&self.cta);
        }
        narration.trim_end().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImagePrompt {
    pub rank: u8,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoContent {
    pub topic: String,
    pub research: ResearchData,
    pub script: VideoScript,
    pub image_prompts: Vec<ImagePrompt>,
}

impl VideoContent {
    /// Short description body: hook plus the first three ranks as a teaser.
    pub fn summary(&self) -> String {
        let mut summary = format!("{}\n\n", self.topic);
        if !self.script.hook.is_empty() {
            summary.push_str(&format!("{}\n\n", self.script.hook));
        }
        for item in self.script.items_script.iter().take(3) {
            summary.push_str(&format!("#{} {}\n", item.rank, item.name));
        }
        let remaining = self.script.items_script.len().saturating_sub(3);
        if remaining > 0 {
            summary.push_str(&format!("\n... and {} more!\n\n", remaining));
        }
        summary.push_str("Watch to see the complete countdown!");
        summary
    }
}

/// A generated slide image on disk, tagged with the rank it illustrates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub rank: u8,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> VideoScript {
        VideoScript {
            hook: "You won't believe number one.".to_string(),
            items_script: vec![
                ItemScript {
                    rank: 10,
                    name: "Kyoto".to_string(),
                    script: "A thousand temples.".to_string(),
                },
                ItemScript {
                    rank: 9,
                    name: "Oslo".to_string(),
                    script: "Fjords at the doorstep.".to_string(),
                },
            ],
            cta: "Subscribe for more!".to_string(),
        }
    }

    #[test]
    fn narration_orders_hook_items_cta() {
        let narration = script().narration();
        assert_eq!(
            narration,
            "You won't believe number one. Number 10: Kyoto. A thousand temples. \
             Number 9: Oslo. Fjords at the doorstep. Subscribe for more!"
        );
    }

    #[test]
    fn narration_skips_empty_sections() {
        let script = VideoScript {
            hook: String::new(),
            items_script: vec![],
            cta: String::new(),
        };
        assert_eq!(script.narration(), "");
    }

    #[test]
    fn summary_teases_first_three_items() {
        let mut s = script();
        s.items_script.push(ItemScript {
            rank: 8,
            name: "Lima".to_string(),
            script: "Coastal cuisine.".to_string(),
        });
        s.items_script.push(ItemScript {
            rank: 7,
            name: "Hanoi".to_string(),
            script: "Street food capital.".to_string(),
        });
        let content = VideoContent {
            topic: "Top 10 Cities".to_string(),
            research: ResearchData { items: vec![] },
            script: s,
            image_prompts: vec![],
        };

        let summary = content.summary();
        assert!(summary.starts_with("Top 10 Cities\n\n"));
        assert!(summary.contains("#10 Kyoto"));
        assert!(summary.contains("#8 Lima"));
        assert!(!summary.contains("#7 Hanoi"));
        assert!(summary.contains("... and 1 more!"));
    }
}
