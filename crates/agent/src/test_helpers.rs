//! Shared test doubles for the agent crate.

use async_trait::async_trait;
use medassist_core::conversation::Turn;
use medassist_core::dialogue::{
    Classification, ClassificationInput, Completor, QueryClassifier, Retriever,
};
use medassist_core::error::{ClassifierError, ProviderError};
use medassist_core::message::Message;
use medassist_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` returns the next result in the queue.
/// Panics if more calls are made than results provided.
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider answering each call with the next text.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        requests.push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("SequentialMockProvider: no more responses (call #{call})"))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
        metadata: serde_json::Map::new(),
    }
}

/// Owned copy of what a classifier was shown.
#[derive(Debug, Clone)]
pub struct SeenInput {
    pub last_topic: Option<String>,
    pub last_turns: Vec<Turn>,
    pub query: String,
}

/// Classifier returning scripted verdicts in order.
pub struct ScriptedClassifier {
    verdicts: Mutex<VecDeque<Result<Classification, ClassifierError>>>,
    inputs: Mutex<Vec<SeenInput>>,
}

impl ScriptedClassifier {
    pub fn new(verdicts: Vec<Result<Classification, ClassifierError>>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn inputs(&self) -> Vec<SeenInput> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        input: &ClassificationInput<'_>,
    ) -> Result<Classification, ClassifierError> {
        self.inputs.lock().unwrap().push(SeenInput {
            last_topic: input.last_topic.map(str::to_string),
            last_turns: input.last_turns.to_vec(),
            query: input.query.to_string(),
        });
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedClassifier: no more verdicts"))
    }
}

/// Retriever returning a fixed context and recording queries.
pub struct CountingRetriever {
    context: Mutex<String>,
    queries: Mutex<Vec<String>>,
}

impl CountingRetriever {
    pub fn new(context: &str) -> Self {
        Self {
            context: Mutex::new(context.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn set_context(&self, context: &str) {
        *self.context.lock().unwrap() = context.to_string();
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for CountingRetriever {
    async fn retrieve(&self, query: &str) -> String {
        self.queries.lock().unwrap().push(query.to_string());
        self.context.lock().unwrap().clone()
    }
}

/// Completor returning scripted answers and recording prompts.
pub struct ScriptedCompletor {
    answers: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletor {
    pub fn new(answers: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completor for ScriptedCompletor {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedCompletor: no more answers"))
    }
}
