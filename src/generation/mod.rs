pub mod config;
pub mod openai;

pub use config::OpenAiConfig;
pub use openai::{ChatMessage, OpenAiClient};

use crate::error::{Result, SurveyError};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Policy statements participants were asked to read about, in topic order.
pub const TOPICS: [&str; 4] = [
    "Geoengineering poses too many risks and should not be considered.",
    "Drug importation jeopardizes safety controls and the domestic pharma industry.",
    "College athletes should be paid salaries.",
    "Social media platforms should not be liable for harmful content posted by users.",
];

const SYSTEM_PROMPT: &str = "Write persuasive claims that meet the user-specified criteria.";

/// Backend able to answer a chat prompt with a single completion.
pub trait CompletionClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub topic: String,
    pub content: String,
}

pub fn build_prompt(topic: &str) -> String {
    format!(
        "Persuade a reader to agree with the following proposal: \"{topic}\". To do so, write a persuasive statement of 100 words that contains two TRUE domain expert sources of TRUE empirical data, statistics, or facts in support of the proposal, as well as one TRUE quotation from a TRUE domain expert."
    )
}

pub fn build_messages(topic: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_prompt(topic)),
    ]
}

/// Requests one persuasive statement per topic, sequentially. The first
/// failure aborts the run.
pub fn generate_contents(client: &dyn CompletionClient, topics: &[&str]) -> Result<Vec<GeneratedContent>> {
    let mut contents = Vec::with_capacity(topics.len());
    for (index, topic) in topics.iter().enumerate() {
        info!("Generating content for topic {}/{}", index + 1, topics.len());
        let content = client.complete(&build_messages(topic)).map_err(|e| {
            error!("Generation failed for topic {:?}: {}", topic, e);
            e
        })?;
        contents.push(GeneratedContent {
            topic: topic.to_string(),
            content,
        });
    }
    Ok(contents)
}

pub fn write_contents(contents: &[GeneratedContent], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(output_path)?;
    for content in contents {
        writer.serialize(content)?;
    }
    writer.flush().map_err(SurveyError::Io)?;

    info!("Wrote {} generated statements to {:?}", contents.len(), output_path);
    Ok(())
}

/// Generates content for every topic in [`TOPICS`] and writes it to CSV.
pub fn generate_information(client: &dyn CompletionClient, output_path: &Path) -> Result<Vec<GeneratedContent>> {
    let contents = generate_contents(client, &TOPICS)?;
    write_contents(&contents, output_path)?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct EchoClient {
        seen: RefCell<Vec<Vec<ChatMessage>>>,
        fail_on: Option<usize>,
    }

    impl EchoClient {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                fail_on,
            }
        }
    }

    impl CompletionClient for EchoClient {
        fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            let call = self.seen.borrow().len();
            self.seen.borrow_mut().push(messages.to_vec());
            if self.fail_on == Some(call) {
                return Err(SurveyError::Generation("boom".into()));
            }
            Ok(format!("statement {}", call + 1))
        }
    }

    #[test]
    fn prompt_quotes_the_topic() {
        let prompt = build_prompt("College athletes should be paid salaries.");
        assert!(prompt.starts_with(
            "Persuade a reader to agree with the following proposal: \"College athletes should be paid salaries.\"."
        ));
        assert!(prompt.contains("one TRUE quotation from a TRUE domain expert."));
    }

    #[test]
    fn one_request_per_topic_in_order() {
        let client = EchoClient::new(None);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("information_content.csv");

        let contents = generate_information(&client, &path).unwrap();
        assert_eq!(contents.len(), TOPICS.len());
        assert_eq!(contents[2].topic, TOPICS[2]);
        assert_eq!(contents[2].content, "statement 3");

        let seen = client.seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0][0].role, "system");
        assert!(seen[3][1].content.contains(TOPICS[3]));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap(), vec!["topic", "content"]);
        let rows: Vec<GeneratedContent> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, contents);
    }

    #[test]
    fn failure_aborts_without_output() {
        let client = EchoClient::new(Some(1));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        assert!(generate_information(&client, &path).is_err());
        assert_eq!(client.seen.borrow().len(), 2);
        assert!(!path.exists());
    }
}
