//! Dispatcher to worker round trips through the built-in skills
//! Run with: cargo test --test worker_test

use std::sync::Arc;

use skillgate::application::errors::ValidationError;
use skillgate::application::messaging::{job_queue, MessageDispatcher, Worker};
use skillgate::domain::entities::{Message, User, ADMINS};
use skillgate::infrastructure::adapters::memory::{MemorySense, Outbound, MEMORY_SENSE};
use skillgate::infrastructure::config::Config;
use skillgate::skills::SkillCatalog;
use skillgate::{AppContext, BotError};

struct Harness {
    app: Arc<AppContext>,
    sense: Arc<MemorySense>,
    dispatcher: MessageDispatcher,
    worker: Worker,
    queue: tokio::sync::mpsc::Receiver<skillgate::application::messaging::Job>,
}

impl Harness {
    fn new(config: Config, sense: MemorySense) -> Self {
        let app = AppContext::from_config(&config, SkillCatalog::with_builtin().unwrap())
            .unwrap()
            .with_sense(MEMORY_SENSE);
        let app = Arc::new(app);
        let sense = Arc::new(sense);
        let (sender, queue) = job_queue(16);

        Self {
            dispatcher: MessageDispatcher::new(app.clone(), sender),
            worker: Worker::new(app.clone()).with_sense(sense.clone()),
            app,
            sense,
            queue,
        }
    }

    /// Dispatch one message and run whatever got queued
    async fn say(&mut self, message: Message) -> Option<String> {
        let job = self.dispatcher.dispatch(MEMORY_SENSE, message).await.unwrap()?;
        let queued = self.queue.recv().await.unwrap();
        assert_eq!(queued.request_id, job.request_id);
        self.worker.perform(queued).await.unwrap();
        Some(job.route)
    }
}

fn config_with_admin(admin: &str) -> Config {
    let mut config = Config::default();
    config.security.encryption_key = Some("worker-test".to_string());
    config.security.admins = vec![admin.to_string()];
    config
}

fn root() -> User {
    User::new("u-0", "root@example.com").with_handle("root")
}

fn amy() -> User {
    User::new("u-1", "amy@example.com").with_handle("amy")
}

#[tokio::test]
async fn test_hello_gets_a_reply() {
    let mut harness = Harness::new(config_with_admin("root@example.com"), MemorySense::new());
    let route = harness.say(Message::new(amy(), "Hello").mentioning_bot()).await;

    assert_eq!(route.as_deref(), Some("fun#hello"));
    assert_eq!(harness.sense.texts().await.len(), 1);
}

#[tokio::test]
async fn test_configured_greeting_is_used() {
    let mut config = config_with_admin("root@example.com");
    config
        .settings
        .insert("skills.fun.greeting".to_string(), serde_yaml::Value::from("Howdy!"));
    let mut harness = Harness::new(config, MemorySense::new());

    harness.say(Message::new(amy(), "hi").private()).await;
    assert_eq!(harness.sense.texts().await, vec!["Howdy!".to_string()]);
}

#[tokio::test]
async fn test_ambient_chatter_is_never_queued() {
    let mut harness = Harness::new(config_with_admin("root@example.com"), MemorySense::new());
    assert!(harness.say(Message::new(amy(), "hello")).await.is_none());
    assert!(harness.say(Message::new(amy(), "random words")).await.is_none());
    assert!(harness.sense.sent().await.is_empty());
}

#[tokio::test]
async fn test_unknown_and_denied_replies() {
    let mut harness = Harness::new(config_with_admin("root@example.com"), MemorySense::new());

    let route = harness.say(Message::new(amy(), "make me a sandwich").mentioning_bot()).await;
    assert_eq!(route.as_deref(), Some("default"));

    let route = harness.say(Message::new(amy(), "cleanup groups").mentioning_bot()).await;
    assert_eq!(route.as_deref(), Some("permission_denied"));

    let sent = harness.sense.sent().await;
    assert!(matches!(&sent[0], Outbound::Reaction { reaction, .. } if reaction == "shrug"));
    assert!(matches!(&sent[2], Outbound::Reaction { reaction, .. } if reaction == "lock"));
    let texts = harness.sense.texts().await;
    assert!(texts.iter().all(|t| t.starts_with("@amy, ")));
    assert!(texts[1].contains("help"));
}

#[tokio::test]
async fn test_admin_manages_groups() {
    let sense = MemorySense::new().with_user(amy());
    let mut harness = Harness::new(config_with_admin("root@example.com"), sense);

    let route = harness
        .say(Message::new(root(), "add amy@example.com to ops").mentioning_bot())
        .await;
    assert_eq!(route.as_deref(), Some("groups#add_to_group"));
    assert!(harness.app.groups().group("ops").include(&amy()).await.unwrap());

    harness
        .say(Message::new(root(), "add amy@example.com to ops").mentioning_bot())
        .await;
    let texts = harness.sense.texts().await;
    assert!(texts.iter().any(|t| t == "Looks like [@amy] was already a member of ops"));

    harness.say(Message::new(amy(), "list my groups").private()).await;
    let texts = harness.sense.texts().await;
    assert!(texts.last().unwrap().contains("- ops"));

    harness
        .say(Message::new(root(), "remove amy from ops").mentioning_bot())
        .await;
    assert!(!harness.app.groups().group("ops").include(&amy()).await.unwrap());

    harness.say(Message::new(root(), "cleanup groups").mentioning_bot()).await;
    let texts = harness.sense.texts().await;
    assert_eq!(texts.last().unwrap(), "I removed these empty groups: ops");
}

#[tokio::test]
async fn test_global_admins_cannot_be_edited_from_chat() {
    let mut harness = Harness::new(config_with_admin("root@example.com"), MemorySense::new().with_user(amy()));
    harness
        .say(Message::new(root(), "add amy@example.com to global admins").mentioning_bot())
        .await;

    let texts = harness.sense.texts().await;
    assert_eq!(texts, vec!["Sorry, I can't manipulate global admins this way...".to_string()]);
    assert!(!harness.app.permissions.admins().contains(&"amy@example.com".to_string()));
}

#[tokio::test]
async fn test_group_admins_gain_group_routes() {
    let mut harness = Harness::new(config_with_admin("root@example.com"), MemorySense::new());
    harness.app.groups().group(ADMINS).add(&amy()).await.unwrap();

    let route = harness.say(Message::new(amy(), "list all groups").mentioning_bot()).await;
    assert_eq!(route.as_deref(), Some("groups#list_all_groups"));
    let texts = harness.sense.texts().await;
    assert!(texts[0].contains("global admins"));
    assert!(texts[0].contains("amy@example.com"));
}

#[tokio::test]
async fn test_help_is_sent_privately() {
    let mut harness = Harness::new(config_with_admin("root@example.com"), MemorySense::new());
    harness.say(Message::new(amy(), "help groups").mentioning_bot()).await;

    let sent = harness.sense.sent().await;
    let private: Vec<&String> = sent
        .iter()
        .filter_map(|out| match out {
            Outbound::Private { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(private.len(), 1);
    assert!(private[0].starts_with("## Help for groups:"));
    assert!(private[0].contains("list my groups"));
    assert!(!private[0].contains("cleanup groups"));
    assert!(sent.iter().any(|out| matches!(out, Outbound::Reply { .. })));
}

#[tokio::test]
async fn test_status_report() {
    let mut harness = Harness::new(config_with_admin("root@example.com"), MemorySense::new());
    harness.say(Message::new(amy(), "status").mentioning_bot()).await;

    let texts = harness.sense.texts().await;
    assert!(texts[0].contains("*Test Result:* Success"));
    assert!(texts[0].contains("  - memory"));
    assert!(texts[0].contains("  - groups"));
}

#[test]
fn test_catalog_without_default_skill_is_rejected() {
    let result = AppContext::from_config(&config_with_admin("root@example.com"), SkillCatalog::new());
    match result {
        Err(BotError::Validation(ValidationError::MissingFallback(name))) => assert_eq!(name, "default"),
        Err(other) => panic!("expected missing fallback, got {}", other),
        Ok(_) => panic!("expected missing fallback"),
    }
}
