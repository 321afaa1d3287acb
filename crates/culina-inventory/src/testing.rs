//! Test doubles for the collaborator traits.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use culina_core::error::CulinaError;
use culina_core::types::{CapturedPhoto, PLACEHOLDER_IMAGE_URL};
use culina_storage::KeyValueStore;

use crate::services::{ImageSearch, IngredientRecognizer, PhotoSource};

/// Image search answering from a fixed table, placeholder otherwise.
#[derive(Default)]
pub struct StaticImages {
    urls: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl StaticImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, url: &str) -> Self {
        self.urls.insert(name.to_string(), url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSearch for StaticImages {
    async fn image_for(&self, query: &str) -> String {
        self.calls.lock().unwrap().push(query.to_string());
        tokio::task::yield_now().await;
        self.urls
            .get(query)
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string())
    }
}

/// Recognizer returning queued answers.
#[derive(Default)]
pub struct ScriptedRecognizer {
    answers: Mutex<VecDeque<Result<Vec<String>, String>>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, names: &[&str]) -> Self {
        self.answers
            .lock()
            .unwrap()
            .push_back(Ok(names.iter().map(|n| n.to_string()).collect()));
        self
    }

    pub fn err(self, reason: &str) -> Self {
        self.answers
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
        self
    }
}

#[async_trait]
impl IngredientRecognizer for ScriptedRecognizer {
    async fn recognize(&self, _photo: &CapturedPhoto) -> Result<Vec<String>, CulinaError> {
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(names)) => Ok(names),
            Some(Err(reason)) => Err(CulinaError::Transport(reason)),
            None => Ok(Vec::new()),
        }
    }
}

/// Photo source with a fixed permission answer and capture result.
pub struct FixedPhotos {
    pub granted: bool,
    pub photo: Option<CapturedPhoto>,
}

impl FixedPhotos {
    pub fn granted() -> Self {
        Self {
            granted: true,
            photo: Some(CapturedPhoto::new("aGVsbG8=", "image/jpeg")),
        }
    }

    pub fn denied() -> Self {
        Self {
            granted: false,
            photo: None,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            granted: true,
            photo: None,
        }
    }
}

#[async_trait]
impl PhotoSource for FixedPhotos {
    async fn request_permission(&self) -> bool {
        self.granted
    }

    async fn capture(&self) -> Result<Option<CapturedPhoto>, CulinaError> {
        Ok(self.photo.clone())
    }
}

/// Store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CulinaError> {
        Err(CulinaError::Storage("disk unreadable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), CulinaError> {
        Err(CulinaError::Storage("disk full".to_string()))
    }
}
