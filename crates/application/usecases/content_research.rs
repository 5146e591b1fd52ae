use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::repositories::generation::TextGenerator;
use crate::domain::value_objects::content::{
    ImagePrompt, ResearchData, VideoContent, VideoScript,
};

const EXPECTED_ITEMS: usize = 10;

/// Turns a topic into full video content in three generation rounds:
/// research, script, image prompts. Each round expects a JSON payload in
/// the model reply and tolerates fences and surrounding prose.
pub struct ContentResearchUseCase {
    text_generator: Arc<dyn TextGenerator + Send + Sync>,
}

#[derive(Debug, Deserialize)]
struct ImagePromptPayload {
    image_prompts: Vec<ImagePrompt>,
}

impl ContentResearchUseCase {
    pub fn new(text_generator: Arc<dyn TextGenerator + Send + Sync>) -> Self {
        Self { text_generator }
    }

    pub async fn create_full_content(&self, topic: &str) -> Result<VideoContent> {
        let research = self.research_topic(topic).await?;
        let script = self.create_script(topic, &research).await?;
        let image_prompts = self.image_prompts(topic, &research).await?;

        Ok(VideoContent {
            topic: topic.to_string(),
            research,
            script,
            image_prompts,
        })
    }

    pub async fn research_topic(&self, topic: &str) -> Result<ResearchData> {
        info!(topic = %topic, "researching topic");
        let prompt = format!(
            "Research the list \"{topic}\" and rank the ten best entries.\n\n\
             For every entry give a short tagline and two or three fascinating, \
             verifiable facts that would make a viewer say \"I didn't know that!\".\n\n\
             Respond with JSON only, in this shape:\n\
             {{\"items\": [{{\"rank\": 10, \"name\": \"...\", \"tagline\": \"...\", \
             \"facts\": [\"...\"]}}]}}\n\
             Order the items from rank 10 down to rank 1.\n"
        );

        let raw = self
            .text_generator
            .generate(&prompt)
            .await
            .context("research generation failed")?;
        let research: ResearchData = parse_payload(&raw).context("failed to parse research data")?;

        if research.items.is_empty() {
            bail!("research returned no items");
        }
        if research.items.len() != EXPECTED_ITEMS {
            warn!(
                items = research.items.len(),
                "research did not return exactly ten items"
            );
        }

        Ok(research)
    }

    pub async fn create_script(&self, topic: &str, research: &ResearchData) -> Result<VideoScript> {
        info!(topic = %topic, "creating script");
        let research_json =
            serde_json::to_string_pretty(research).context("failed to serialize research data")?;
        let prompt = format!(
            "Write a 60-second countdown script for the YouTube Short \"{topic}\".\n\n\
             Research data:\n{research_json}\n\n\
             Hook the viewer in the first three seconds, keep every beat punchy and \
             conversational, and end with a call to action.\n\n\
             Respond with JSON only, in this shape:\n\
             {{\"hook\": \"...\", \"items_script\": [{{\"rank\": 10, \"name\": \"...\", \
             \"script\": \"...\"}}], \"cta\": \"...\"}}\n"
        );

        let raw = self
            .text_generator
            .generate(&prompt)
            .await
            .context("script generation failed")?;
        parse_payload(&raw).context("failed to parse script")
    }

    pub async fn image_prompts(
        &self,
        topic: &str,
        research: &ResearchData,
    ) -> Result<Vec<ImagePrompt>> {
        info!(topic = %topic, "generating image prompts");
        let research_json =
            serde_json::to_string_pretty(research).context("failed to serialize research data")?;
        let prompt = format!(
            "Create one detailed AI image-generation prompt per entry of \"{topic}\".\n\n\
             Research data:\n{research_json}\n\n\
             Each prompt must describe a vivid vertical scene (9:16) with a consistent \
             visual style across the set. No text in the images.\n\n\
             Respond with JSON only, in this shape:\n\
             {{\"image_prompts\": [{{\"rank\": 10, \"prompt\": \"...\"}}]}}\n"
        );

        let raw = self
            .text_generator
            .generate(&prompt)
            .await
            .context("image prompt generation failed")?;
        let payload: ImagePromptPayload =
            parse_payload(&raw).context("failed to parse image prompts")?;

        if payload.image_prompts.is_empty() {
            bail!("image prompt generation returned no prompts");
        }

        Ok(payload.image_prompts)
    }
}

/// Extracts and deserializes the JSON object a model reply carries,
/// tolerating ``` fences and prose around the payload.
fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let block = extract_json_block(raw)?;
    serde_json::from_str(block).with_context(|| format!("invalid JSON payload: {}", block))
}

fn extract_json_block(raw: &str) -> Result<&str> {
    let start = raw
        .find('{')
        .context("model reply contains no JSON object")?;
    let end = raw
        .rfind('}')
        .context("model reply contains no closing brace")?;
    if end < start {
        bail!("model reply contains no JSON object");
    }
    Ok(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::generation::MockTextGenerator;
    use crate::domain::value_objects::content::TopTenItem;

    fn research_reply() -> String {
        let items: Vec<TopTenItem> = (1..=10)
            .rev()
            .map(|rank| TopTenItem {
                rank,
                name: format!("Item {}", rank),
                tagline: "A tagline".to_string(),
                facts: vec!["A fact".to_string()],
            })
            .collect();
        serde_json::to_string(&ResearchData { items }).unwrap()
    }

    #[test]
    fn extracts_plain_json() {
        let parsed: ResearchData = parse_payload(&research_reply()).unwrap();
        assert_eq!(parsed.items.len(), 10);
    }

    #[test]
    fn extracts_fenced_json() {
        let raw = format!("```json\n{}\n```", research_reply());
        let parsed: ResearchData = parse_payload(&raw).unwrap();
        assert_eq!(parsed.items.len(), 10);
    }

    #[test]
    fn extracts_json_surrounded_by_prose() {
        let raw = format!(
            "Here is the ranked list you asked for:\n{}\nLet me know if you need more.",
            research_reply()
        );
        let parsed: ResearchData = parse_payload(&raw).unwrap();
        assert_eq!(parsed.items[0].rank, 10);
    }

    #[test]
    fn rejects_reply_without_json() {
        let result: Result<ResearchData> = parse_payload("no json here");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn research_rejects_empty_item_list() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("{\"items\": []}".to_string()));

        let usecase = ContentResearchUseCase::new(Arc::new(generator));
        assert!(usecase.research_topic("Top 10 Rivers").await.is_err());
    }

    #[tokio::test]
    async fn full_content_runs_three_generation_rounds() {
        let mut generator = MockTextGenerator::new();
        let research = research_reply();
        generator.expect_generate().times(3).returning(move |prompt| {
            if prompt.contains("rank the ten best entries") {
                Ok(research.clone())
            } else if prompt.contains("countdown script") {
                Ok("{\"hook\": \"Listen up.\", \"items_script\": [{\"rank\": 10, \
                    \"name\": \"Item 10\", \"script\": \"Beat.\"}], \"cta\": \"Subscribe.\"}"
                    .to_string())
            } else {
                Ok("{\"image_prompts\": [{\"rank\": 10, \"prompt\": \"A scene\"}]}".to_string())
            }
        });

        let usecase = ContentResearchUseCase::new(Arc::new(generator));
        let content = usecase.create_full_content("Top 10 Rivers").await.unwrap();

        assert_eq!(content.research.items.len(), 10);
        assert_eq!(content.script.hook, "Listen up.");
        assert_eq!(content.image_prompts.len(), 1);
    }
}
