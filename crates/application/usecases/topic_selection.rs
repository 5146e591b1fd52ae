use anyhow::{Context, Result, bail};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::repositories::generation::TextGenerator;
use crate::domain::repositories::topic_history::TopicHistoryStore;
use crate::domain::value_objects::topics::{SelectionMethod, TopicSelection};

pub const CATEGORIES: [&str; 10] = [
    "Beauty & Aesthetics",
    "Intelligence & Education",
    "Culture & Traditions",
    "Nature & Geography",
    "Food & Cuisine",
    "History & Heritage",
    "Innovation & Technology",
    "Arts & Creativity",
    "Wellness & Lifestyle",
    "Human Values & Character",
];

const TEMPLATE_TOPICS: [(&str, &str); 10] = [
    (
        "Top 10 Countries with the Most Beautiful Architecture",
        "Beauty & Aesthetics",
    ),
    (
        "Top 10 Books That Changed How People Think",
        "Intelligence & Education",
    ),
    (
        "Top 10 Cities Known for Their Kindness",
        "Human Values & Character",
    ),
    (
        "Top 10 Natural Wonders You Must See",
        "Nature & Geography",
    ),
    (
        "Top 10 Ancient Civilizations and Their Wisdom",
        "History & Heritage",
    ),
    (
        "Top 10 Foods That Improve Brain Function",
        "Wellness & Lifestyle",
    ),
    (
        "Top 10 Innovations That Transformed Daily Life",
        "Innovation & Technology",
    ),
    (
        "Top 10 Traditional Art Forms Around the World",
        "Arts & Creativity",
    ),
    (
        "Top 10 Countries with Rich Cultural Heritage",
        "Culture & Traditions",
    ),
    (
        "Top 10 Places to Find Inner Peace",
        "Wellness & Lifestyle",
    ),
];

// How many recent topics go into the avoid list of the model prompt.
const AVOID_LIST_LIMIT: usize = 10;

const HISTORY_WINDOW: usize = 30;

pub struct TopicSelectionUseCase {
    history: Arc<dyn TopicHistoryStore + Send + Sync>,
    text_generator: Arc<dyn TextGenerator + Send + Sync>,
}

impl TopicSelectionUseCase {
    pub fn new(
        history: Arc<dyn TopicHistoryStore + Send + Sync>,
        text_generator: Arc<dyn TextGenerator + Send + Sync>,
    ) -> Self {
        Self {
            history,
            text_generator,
        }
    }

    /// Picks the next topic: model-generated when possible, template
    /// fallback otherwise. History failures degrade to an empty avoid
    /// list instead of failing the run.
    pub async fn select_topic(&self) -> TopicSelection {
        let recent = match self.history.recent_topics(HISTORY_WINDOW).await {
            Ok(topics) => topics,
            Err(err) => {
                warn!(error = %err, "failed to load topic history; proceeding without it");
                Vec::new()
            }
        };

        let selection = match self.ai_topic(&recent).await {
            Ok(selection) => selection,
            Err(err) => {
                warn!(error = %err, "ai topic generation failed; falling back to templates");
                Self::template_topic(&recent)
            }
        };

        info!(
            topic = %selection.topic,
            category = %selection.category,
            method = %selection.method,
            "topic selected"
        );

        if let Err(err) = self
            .history
            .record_topic(&selection.topic, &selection.category)
            .await
        {
            warn!(error = %err, "failed to record topic in history");
        }

        selection
    }

    async fn ai_topic(&self, recent: &[String]) -> Result<TopicSelection> {
        let category = CATEGORIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(CATEGORIES[0]);

        let prompt = build_topic_prompt(category, recent);
        let raw = self
            .text_generator
            .generate(&prompt)
            .await
            .context("topic generation request failed")?;
        let topic = clean_topic(&raw)?;

        Ok(TopicSelection {
            topic,
            category: category.to_string(),
            method: SelectionMethod::AiGenerated,
        })
    }

    fn template_topic(recent: &[String]) -> TopicSelection {
        let fresh: Vec<&(&str, &str)> = TEMPLATE_TOPICS
            .iter()
            .filter(|(topic, _)| !recent.iter().any(|r| r == topic))
            .collect();

        let mut rng = rand::thread_rng();
        let picked = if fresh.is_empty() {
            // Every template was used recently; repeat one anyway.
            TEMPLATE_TOPICS.choose(&mut rng)
        } else {
            fresh.choose(&mut rng).copied()
        };

        picked
            .map(|(topic, category)| TopicSelection {
                topic: topic.to_string(),
                category: category.to_string(),
                method: SelectionMethod::TemplateGenerated,
            })
            .unwrap_or_else(Self::emergency_fallback)
    }

    fn emergency_fallback() -> TopicSelection {
        TopicSelection {
            topic: "Top 10 Amazing Facts About Human Nature".to_string(),
            category: "Human Values & Character".to_string(),
            method: SelectionMethod::Fallback,
        }
    }
}

fn build_topic_prompt(category: &str, recent: &[String]) -> String {
    let avoid_list = recent
        .iter()
        .take(AVOID_LIST_LIMIT)
        .map(|topic| format!("- {}", topic))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Generate ONE creative and engaging \"Top 10\" list topic for a YouTube Short video.\n\n\
         Category: {category}\n\n\
         Guidelines:\n\
         - Must be interesting, educational, and shareable\n\
         - Focus on: beauty, culture, intellect, human values, nature, innovation\n\
         - Examples:\n\
           * \"Top 10 Countries with the Most Beautiful Landscapes\"\n\
           * \"Top 10 Books That Will Transform Your Thinking\"\n\
           * \"Top 10 Cities with the Friendliest People\"\n\n\
         AVOID these recent topics:\n{avoid_list}\n\n\
         Return ONLY the topic title, nothing else. Make it compelling and specific.\n"
    )
}

/// Strips quoting and whitespace from the model reply and enforces the
/// "Top 10" prefix.
fn clean_topic(raw: &str) -> Result<String> {
    let topic = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();

    if topic.is_empty() {
        bail!("model returned an empty topic");
    }

    if topic.starts_with("Top 10") {
        Ok(topic.to_string())
    } else {
        Ok(format!("Top 10 {}", topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::generation::MockTextGenerator;
    use crate::domain::repositories::topic_history::MockTopicHistoryStore;

    fn quiet_history() -> MockTopicHistoryStore {
        let mut history = MockTopicHistoryStore::new();
        history.expect_recent_topics().returning(|_| Ok(Vec::new()));
        history.expect_record_topic().returning(|_, _| Ok(()));
        history
    }

    #[tokio::test]
    async fn uses_model_topic_when_generation_succeeds() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("\"Top 10 Hidden Libraries\"\n".to_string()));

        let usecase =
            TopicSelectionUseCase::new(Arc::new(quiet_history()), Arc::new(generator));
        let selection = usecase.select_topic().await;

        assert_eq!(selection.topic, "Top 10 Hidden Libraries");
        assert_eq!(selection.method, SelectionMethod::AiGenerated);
    }

    #[tokio::test]
    async fn falls_back_to_templates_when_generation_fails() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(anyhow::anyhow!("provider down")));

        let usecase =
            TopicSelectionUseCase::new(Arc::new(quiet_history()), Arc::new(generator));
        let selection = usecase.select_topic().await;

        assert_eq!(selection.method, SelectionMethod::TemplateGenerated);
        assert!(TEMPLATE_TOPICS.iter().any(|(t, _)| *t == selection.topic));
    }

    #[tokio::test]
    async fn history_failure_does_not_fail_selection() {
        let mut history = MockTopicHistoryStore::new();
        history
            .expect_recent_topics()
            .returning(|_| Err(anyhow::anyhow!("bucket unreachable")));
        history
            .expect_record_topic()
            .returning(|_, _| Err(anyhow::anyhow!("bucket unreachable")));

        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("Top 10 Remote Villages".to_string()));

        let usecase = TopicSelectionUseCase::new(Arc::new(history), Arc::new(generator));
        let selection = usecase.select_topic().await;

        assert_eq!(selection.topic, "Top 10 Remote Villages");
    }

    #[test]
    fn template_fallback_avoids_recent_topics() {
        let recent: Vec<String> = TEMPLATE_TOPICS
            .iter()
            .skip(1)
            .map(|(t, _)| t.to_string())
            .collect();

        for _ in 0..20 {
            let selection = TopicSelectionUseCase::template_topic(&recent);
            assert_eq!(selection.topic, TEMPLATE_TOPICS[0].0);
        }
    }

    #[test]
    fn template_fallback_repeats_when_everything_is_recent() {
        let recent: Vec<String> = TEMPLATE_TOPICS.iter().map(|(t, _)| t.to_string()).collect();
        let selection = TopicSelectionUseCase::template_topic(&recent);
        assert_eq!(selection.method, SelectionMethod::TemplateGenerated);
    }

    #[test]
    fn emergency_fallback_is_well_formed() {
        let selection = TopicSelectionUseCase::emergency_fallback();
        assert!(selection.topic.starts_with("Top 10"));
        assert_eq!(selection.method, SelectionMethod::Fallback);
    }

    #[test]
    fn clean_topic_strips_quotes_and_enforces_prefix() {
        assert_eq!(
            clean_topic(" \"Ancient Trade Routes\" ").unwrap(),
            "Top 10 Ancient Trade Routes"
        );
        assert_eq!(
            clean_topic("Top 10 Ancient Trade Routes").unwrap(),
            "Top 10 Ancient Trade Routes"
        );
        assert!(clean_topic("  \"\"  ").is_err());
    }

    #[test]
    fn prompt_limits_avoid_list() {
        let recent: Vec<String> = (0..20).map(|i| format!("Top 10 Old Topic {}", i)).collect();
        let prompt = build_topic_prompt("Nature & Geography", &recent);
        assert!(prompt.contains("Top 10 Old Topic 9"));
        assert!(!prompt.contains("Top 10 Old Topic 10"));
    }
}
