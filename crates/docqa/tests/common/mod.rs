//! Scripted generative service shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use docqa::error::{Error, Result};
use docqa::generation::Prompt;
use docqa::providers::{FileUpload, GenerativeService};
use docqa::types::{Credential, RawResponse, ReadinessState, UploadHandle};

/// What the generation call does
#[derive(Clone)]
pub enum Reply {
    Body(String),
    Status(u16, String),
    Hang,
}

impl Reply {
    pub fn answer(text: &str) -> Self {
        Self::Body(
            serde_json::json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
            })
            .to_string(),
        )
    }
}

pub struct ScriptedService {
    upload_state: ReadinessState,
    poll_states: Mutex<VecDeque<ReadinessState>>,
    reply: Reply,
    fail_upload: bool,
    fail_poll: bool,
    pub uploads: AtomicU32,
    pub polls: AtomicU32,
    pub generations: AtomicU32,
    pub deletes: AtomicU32,
    pub last_prompt: Mutex<Option<Prompt>>,
    pub last_upload: Mutex<Option<FileUpload>>,
}

impl ScriptedService {
    pub fn new(reply: Reply) -> Self {
        Self {
            upload_state: ReadinessState::Active,
            poll_states: Mutex::new(VecDeque::new()),
            reply,
            fail_upload: false,
            fail_poll: false,
            uploads: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            generations: AtomicU32::new(0),
            deletes: AtomicU32::new(0),
            last_prompt: Mutex::new(None),
            last_upload: Mutex::new(None),
        }
    }

    /// Upload returns `initial`; each poll pops the next state (the last one repeats)
    pub fn with_polls(mut self, initial: ReadinessState, polls: &[ReadinessState]) -> Self {
        self.upload_state = initial;
        self.poll_states = Mutex::new(polls.iter().copied().collect());
        self
    }

    /// The upload call errors out
    pub fn with_failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    /// Every readiness check errors out
    pub fn with_failing_poll(mut self) -> Self {
        self.fail_poll = true;
        self
    }

    pub fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    fn handle(&self, state: ReadinessState, mime_type: &str) -> UploadHandle {
        UploadHandle {
            name: "files/scripted".to_string(),
            uri: "https://files.example.test/v1beta/files/scripted".to_string(),
            mime_type: mime_type.to_string(),
            state,
            error: None,
        }
    }
}

#[async_trait]
impl GenerativeService for ScriptedService {
    async fn upload_file(&self, upload: FileUpload, _credential: &Credential) -> Result<UploadHandle> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload {
            return Err(Error::transport("connection reset during upload"));
        }
        let handle = self.handle(self.upload_state, &upload.mime_type);
        *self.last_upload.lock().unwrap() = Some(upload);
        Ok(handle)
    }

    async fn get_file(&self, _name: &str, _credential: &Credential) -> Result<UploadHandle> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if self.fail_poll {
            return Err(Error::transport("connection reset"));
        }
        let mut states = self.poll_states.lock().unwrap();
        let state = if states.len() > 1 {
            states.pop_front().unwrap()
        } else {
            states.front().copied().unwrap_or(ReadinessState::Active)
        };
        Ok(self.handle(state, "text/plain"))
    }

    async fn delete_file(&self, _name: &str, _credential: &Credential) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn generate_content(&self, prompt: &Prompt, _credential: &Credential) -> Result<RawResponse> {
        self.generations.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.clone());
        match &self.reply {
            Reply::Body(body) => Ok(RawResponse::new(body.clone())),
            Reply::Status(code, body) => Err(Error::HttpStatus {
                code: *code,
                body: body.clone(),
            }),
            Reply::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
