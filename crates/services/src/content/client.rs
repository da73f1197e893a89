use std::env;
use std::time::Duration;

use async_trait::async_trait;
use course_core::model::{
    AudioClip, ChatRole, ChatTurn, CourseOutline, CourseRecommendation, ModuleOutline, Quiz,
    QuizQuestion, Roadmap, VideoRef,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ContentCollaborator, QUIZ_QUESTIONS, prompts};
use crate::error::ContentError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TTS_MODEL: &str = "gpt-4o-mini-tts";
const DEFAULT_VOICE: &str = "alloy";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ContentConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub tts_model: String,
    pub voice: String,
    pub timeout: Duration,
}

impl ContentConfig {
    /// Reads `LEARN_AI_*` variables. `None` when no API key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("LEARN_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("LEARN_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("LEARN_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let tts_model =
            env::var("LEARN_AI_TTS_MODEL").unwrap_or_else(|_| DEFAULT_TTS_MODEL.into());
        let voice = env::var("LEARN_AI_VOICE").unwrap_or_else(|_| DEFAULT_VOICE.into());
        let timeout = env::var("LEARN_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Some(Self {
            base_url,
            api_key,
            model,
            tts_model,
            voice,
            timeout: Duration::from_secs(timeout),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// `ContentCollaborator` backed by an OpenAI-compatible HTTP API.
///
/// Without a config every call fails with `ContentError::Disabled`, which the
/// lesson engine treats like any other outage.
#[derive(Clone)]
pub struct GenerativeClient {
    client: Client,
    config: Option<ContentConfig>,
}

impl GenerativeClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ContentConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ContentConfig>) -> Self {
        let client = config
            .as_ref()
            .and_then(|c| Client::builder().timeout(c.timeout).build().ok())
            .unwrap_or_default();
        Self { client, config }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&ContentConfig, ContentError> {
        self.config.as_ref().ok_or(ContentError::Disabled)
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        format: ResponseFormat,
    ) -> Result<String, ContentError> {
        let config = self.config()?;
        let payload = ChatRequest {
            model: config.model.clone(),
            messages,
            temperature: 0.7,
            response_format: match format {
                ResponseFormat::Text => None,
                ResponseFormat::Json => Some(JsonFormat {
                    kind: "json_object",
                }),
            },
        };

        let response = self
            .client
            .post(config.endpoint("chat/completions"))
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ContentError::EmptyResponse)?;

        Ok(content)
    }

    async fn prose(&self, prompt: String) -> Result<String, ContentError> {
        self.chat(vec![ChatMessage::user(prompt)], ResponseFormat::Text)
            .await
    }

    async fn structured<T: DeserializeOwned>(&self, prompt: String) -> Result<T, ContentError> {
        let messages = vec![
            ChatMessage::system(prompts::JSON_ONLY),
            ChatMessage::user(prompt),
        ];
        let raw = self.chat(messages, ResponseFormat::Json).await?;
        parse_json(&raw)
    }
}

#[async_trait]
impl ContentCollaborator for GenerativeClient {
    async fn step_lesson(
        &self,
        course_title: &str,
        module_title: &str,
        step_title: &str,
    ) -> Result<String, ContentError> {
        self.prose(prompts::step_lesson(course_title, module_title, step_title))
            .await
    }

    async fn checkpoint_quiz(
        &self,
        course_title: &str,
        step_titles: &[String],
    ) -> Result<Quiz, ContentError> {
        let wire: WireQuiz = self
            .structured(prompts::checkpoint_quiz(course_title, step_titles, QUIZ_QUESTIONS))
            .await?;
        wire.into_quiz()
    }

    async fn remedial_text(
        &self,
        course_title: &str,
        step_titles: &[String],
    ) -> Result<String, ContentError> {
        self.prose(prompts::remedial_text(course_title, step_titles))
            .await
    }

    async fn find_video(&self, query: &str) -> Result<VideoRef, ContentError> {
        let wire: WireVideo = self.structured(prompts::find_video(query)).await?;
        VideoRef::parse(wire.url.trim()).map_err(|e| ContentError::Malformed(e.to_string()))
    }

    async fn synthesize_audio(&self, text: &str) -> Result<AudioClip, ContentError> {
        let config = self.config()?;
        let payload = SpeechRequest {
            model: config.tts_model.clone(),
            voice: config.voice.clone(),
            input: prompts::narration(text),
            response_format: "mp3",
        };

        let response = self
            .client
            .post(config.endpoint("audio/speech"))
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ContentError::EmptyResponse);
        }
        Ok(AudioClip {
            mime_type: "audio/mpeg".into(),
            bytes: bytes.to_vec(),
        })
    }

    async fn summarize_course(
        &self,
        title: &str,
        description: &str,
    ) -> Result<String, ContentError> {
        self.prose(prompts::summarize_course(title, description))
            .await
    }

    async fn recommend_course(
        &self,
        goal: &str,
        catalog_titles: &[String],
    ) -> Result<CourseRecommendation, ContentError> {
        let rec: CourseRecommendation = self
            .structured(prompts::recommend_course(goal, catalog_titles))
            .await?;
        if rec.course_title.trim().is_empty() {
            return Err(ContentError::Malformed("recommendation has no course".into()));
        }
        Ok(rec)
    }

    async fn career_roadmap(&self, goal: &str) -> Result<Roadmap, ContentError> {
        let roadmap: Roadmap = self.structured(prompts::career_roadmap(goal)).await?;
        if roadmap.milestones.is_empty() {
            return Err(ContentError::Malformed("roadmap has no milestones".into()));
        }
        Ok(roadmap)
    }

    async fn course_outline(
        &self,
        course_title: &str,
        modules: usize,
        steps_per_module: usize,
    ) -> Result<CourseOutline, ContentError> {
        let outline: CourseOutline = self
            .structured(prompts::course_outline(course_title, modules, steps_per_module))
            .await?;
        outline
            .validate()
            .map_err(|e| ContentError::Malformed(e.to_string()))?;
        Ok(outline)
    }

    async fn remedial_module(&self, topic: &str) -> Result<ModuleOutline, ContentError> {
        let outline: ModuleOutline = self.structured(prompts::remedial_module(topic)).await?;
        outline
            .validated()
            .map_err(|e| ContentError::Malformed(e.to_string()))
    }

    async fn advanced_modules(
        &self,
        course_title: &str,
        count: usize,
    ) -> Result<CourseOutline, ContentError> {
        let outline: CourseOutline = self
            .structured(prompts::advanced_modules(course_title, count))
            .await?;
        outline
            .validate()
            .map_err(|e| ContentError::Malformed(e.to_string()))?;
        Ok(outline)
    }

    async fn tutor_reply(
        &self,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, ContentError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompts::TUTOR_PERSONA));
        messages.extend(history.iter().map(ChatMessage::from_turn));
        messages.push(ChatMessage::user(message));
        self.chat(messages, ResponseFormat::Text).await
    }
}

/// Parses a JSON body, tolerating a surrounding markdown code fence.
fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, ContentError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(body.trim())?)
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy)]
enum ResponseFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonFormat>,
}

#[derive(Debug, Serialize)]
struct JsonFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }

    fn from_turn(turn: &ChatTurn) -> Self {
        let role = match turn.role {
            ChatRole::Learner => "user",
            ChatRole::Tutor => "assistant",
        };
        Self {
            role,
            content: turn.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest {
    model: String,
    voice: String,
    input: String,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct WireVideo {
    url: String,
}

#[derive(Debug, Deserialize)]
struct WireQuiz {
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Deserialize)]
struct WireQuestion {
    #[serde(default)]
    id: Option<String>,
    text: String,
    options: Vec<String>,
    #[serde(alias = "correctAnswerIndex")]
    correct_answer_index: usize,
}

impl WireQuiz {
    fn into_quiz(self) -> Result<Quiz, ContentError> {
        if self.questions.is_empty() {
            return Err(ContentError::Malformed("quiz has no questions".into()));
        }
        let questions = self
            .questions
            .into_iter()
            .map(|q| QuizQuestion {
                id: q.id,
                text: q.text,
                options: q.options,
                correct_answer_index: q.correct_answer_index,
            })
            .collect();
        Quiz::new(questions).map_err(|e| ContentError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_strips_code_fence() {
        let wire: WireVideo =
            parse_json("```json\n{\"url\":\"https://youtu.be/abcdefghijk\"}\n```").unwrap();
        assert_eq!(wire.url, "https://youtu.be/abcdefghijk");
    }

    #[test]
    fn camel_case_quiz_is_accepted() {
        let wire: WireQuiz = parse_json(
            r#"{"questions":[{"text":"Q","options":["a","b"],"correctAnswerIndex":1}]}"#,
        )
        .unwrap();
        let quiz = wire.into_quiz().unwrap();
        assert_eq!(quiz.questions()[0].correct_answer_index, 1);
    }

    #[test]
    fn quiz_with_out_of_range_answer_is_malformed() {
        let wire: WireQuiz = parse_json(
            r#"{"questions":[{"text":"Q","options":["a","b"],"correct_answer_index":4}]}"#,
        )
        .unwrap();
        assert!(matches!(wire.into_quiz(), Err(ContentError::Malformed(_))));
    }

    #[test]
    fn empty_quiz_is_malformed() {
        let wire: WireQuiz = parse_json(r#"{"questions":[]}"#).unwrap();
        assert!(matches!(wire.into_quiz(), Err(ContentError::Malformed(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_json::<WireQuiz>("not json").unwrap_err();
        assert!(matches!(err, ContentError::Malformed(_)));
    }

    #[tokio::test]
    async fn disabled_client_refuses_every_call() {
        let client = GenerativeClient::new(None);
        assert!(!client.enabled());
        let err = client.step_lesson("c", "m", "s").await.unwrap_err();
        assert!(matches!(err, ContentError::Disabled));
        let err = client.synthesize_audio("hello").await.unwrap_err();
        assert!(matches!(err, ContentError::Disabled));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ContentConfig {
            base_url: "http://localhost:8080/v1/".into(),
            api_key: "k".into(),
            model: DEFAULT_MODEL.into(),
            tts_model: DEFAULT_TTS_MODEL.into(),
            voice: DEFAULT_VOICE.into(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            config.endpoint("chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
