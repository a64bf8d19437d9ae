#![allow(dead_code)]

use std::sync::Arc;

use futures::future::{self, BoxFuture};
use markwise_auth::{IdentityStore, Params};
use markwise_bot::session::{SessionState, SessionStore};
use markwise_bot::{Bot, BotConfig, Event, Reply};
use markwise_classroom::AssignmentRegistry;
use markwise_grading::{GradingError, Similarity, TokenCosineSimilarity};
use markwise_storage::{Bucket, RetryPolicy};

pub struct Fixed(pub f64);

impl Similarity for Fixed {
    fn similarity<'a>(
        &'a self,
        _: &'a str,
        _: &'a str,
    ) -> BoxFuture<'a, Result<f64, GradingError>> {
        Box::pin(future::ready(Ok(self.0)))
    }
}

pub struct Harness {
    _dir: tempfile::TempDir,
    pub bucket: Arc<Bucket>,
    pub bot: Arc<Bot>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(BotConfig::default(), Arc::new(TokenCosineSimilarity)).await
    }

    pub async fn with(config: BotConfig, similarity: Arc<dyn Similarity>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bucket = Bucket::open(dir.path(), RetryPolicy::default())
            .await
            .unwrap();
        let bucket = Arc::new(bucket);
        let params = Params::new(8, 1, 1, None).unwrap();
        let identity = IdentityStore::with_params(bucket.clone(), params)
            .await
            .unwrap();
        let bot = Bot::new(bucket.clone(), identity, similarity, config);
        Self {
            _dir: dir,
            bucket,
            bot: Arc::new(bot),
        }
    }

    pub async fn text(&self, who: &str, body: &str) -> Reply {
        self.bot.handle(who, Event::text(body)).await
    }

    pub async fn press(&self, who: &str, id: &str) -> Reply {
        self.bot.handle(who, Event::button(id)).await
    }

    pub async fn session(&self, who: &str) -> SessionState {
        let store = SessionStore::new(self.bucket.clone());
        store.load(who).await.unwrap()
    }

    pub fn registry(&self) -> AssignmentRegistry {
        AssignmentRegistry::new(self.bucket.clone())
    }

    /// Register `who` as a teacher and land on the dashboard.
    pub async fn register_teacher(&self, who: &str, email: &str) -> Reply {
        self.text(who, "/start").await;
        self.press(who, "teacher_register").await;
        self.text(who, "Ms Teacher").await;
        self.text(who, email).await;
        self.text(who, "correct horse").await
    }

    /// Walk the authoring flow from the dashboard and return the new code.
    pub async fn create_assignment(
        &self,
        who: &str,
        question: &str,
        label: &str,
        expected: &str,
        max_score: &str,
    ) -> String {
        self.press(who, "create_assignment").await;
        self.text(who, &format!("About {question}")).await;
        self.text(who, question).await;
        self.press(who, &format!("mode:{label}")).await;
        self.text(who, expected).await;
        self.text(who, max_score).await;
        self.press(who, "fields_done").await;
        let reply = self.press(who, "no_deadline").await;
        code_in(&reply.text)
    }

    /// An exact-match "2+2" assignment worth 10.
    pub async fn two_plus_two(&self, who: &str) -> String {
        self.create_assignment(who, "2+2", "Exact Match", "4", "10")
            .await
    }

    /// Student flow from scratch; returns the feedback reply.
    pub async fn submit(&self, who: &str, code: &str, answer: &str) -> Reply {
        self.text(who, "/start").await;
        self.press(who, "student").await;
        self.text(who, code).await;
        self.text(who, answer).await
    }
}

pub fn code_in(text: &str) -> String {
    let start = text.find("Code: ").expect("reply has a code") + "Code: ".len();
    text[start..start + 8].to_string()
}
