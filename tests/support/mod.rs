#![allow(dead_code)]

use std::sync::Arc;

use chat_orchestrator::Chatter;
use chat_provider::ChatProvider;
use chat_provider_mock::MockProvider;
use prompt_store::{FsPromptStore, Strategy};
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<FsPromptStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = Arc::new(FsPromptStore::new(dir.path().join("store")));
        Self { dir, store }
    }

    pub fn pattern(&self, name: &str, text: &str) -> &Self {
        self.store.save_pattern(name, text).expect("pattern saves");
        self
    }

    pub fn context(&self, name: &str, text: &str) -> &Self {
        self.store.save_context(name, text).expect("context saves");
        self
    }

    pub fn strategy(&self, name: &str, prompt: &str) -> &Self {
        self.store
            .save_strategy(
                name,
                &Strategy {
                    description: String::new(),
                    prompt: prompt.to_owned(),
                },
            )
            .expect("strategy saves");
        self
    }

    pub fn project_root(&self) -> std::path::PathBuf {
        let root = self.dir.path().join("project");
        std::fs::create_dir_all(&root).expect("project root");
        root
    }

    pub fn chatter(&self, provider: &Arc<MockProvider>) -> Chatter {
        let provider: Arc<dyn ChatProvider> = provider.clone();
        Chatter::new(provider, self.store.clone(), self.store.clone(), "mock")
    }
}

pub fn mock(chunks: &[&str]) -> Arc<MockProvider> {
    Arc::new(MockProvider::new(
        chunks.iter().map(|chunk| (*chunk).to_owned()).collect(),
    ))
}
