//! Route resolution integration tests
//! Run with: cargo test --test routing_test

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::{Arc, Once};

use skillgate::application::errors::{BotError, ValidationError};
use skillgate::application::routing::{Permissions, Registry};
use skillgate::application::services::GroupDirectory;
use skillgate::domain::entities::{Condition, Message, User, ADMINS, EVERYONE};
use skillgate::infrastructure::storage::{EnvelopeCipher, MemoryStore, Storage};
use skillgate::skills::{RouteSpec, Skill, SkillCatalog, SkillContext};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Skill whose routes are supplied by the test
struct Probe {
    routes: Vec<RouteSpec>,
}

#[async_trait]
impl Skill for Probe {
    fn name(&self) -> &str {
        "probe"
    }

    fn description(&self) -> &str {
        "Test routes"
    }

    fn routes(&self) -> Result<Vec<RouteSpec>, ValidationError> {
        Ok(self.routes.clone())
    }

    async fn call(&self, _ctx: &SkillContext, _action: &str) -> Result<(), BotError> {
        Ok(())
    }
}

fn registry_with(routes: Vec<RouteSpec>) -> Registry {
    let mut catalog = SkillCatalog::new();
    catalog.register(Probe { routes }).unwrap();
    catalog.registry().unwrap()
}

fn storage() -> Arc<Storage> {
    Arc::new(Storage::new(
        Arc::new(MemoryStore::new()),
        EnvelopeCipher::from_secret(Some("routing-test")),
    ))
}

fn permissions(admins: &[&str]) -> Permissions {
    Permissions::new(admins.iter().copied(), GroupDirectory::new(storage()))
}

fn hello() -> RouteSpec {
    RouteSpec::pattern("^hello$", "hello").unwrap()
}

fn stranger() -> User {
    User::new("u-1", "stranger@example.com")
}

#[tokio::test]
async fn test_scenario_a_addressed_match_wins() {
    ensure_init();
    let registry = registry_with(vec![hello()]);
    let message = Message::new(stranger(), "hello").mentioning_bot();

    let route = registry.route(&message, &permissions(&[])).await;
    assert_eq!(route.name(), "probe#hello");
}

#[tokio::test]
async fn test_scenario_b_ambient_match_is_dropped() {
    ensure_init();
    let registry = registry_with(vec![hello()]);
    let message = Message::new(stranger(), "hello");

    let route = registry.route(&message, &permissions(&[])).await;
    assert!(Arc::ptr_eq(&route, registry.black_hole()));
}

#[tokio::test]
async fn test_scenario_c_unauthorized_match_is_denied() {
    ensure_init();
    let registry = registry_with(vec![hello().allow_groups([ADMINS])]);
    let message = Message::new(stranger(), "hello").mentioning_bot();

    let route = registry.route(&message, &permissions(&[])).await;
    assert!(Arc::ptr_eq(&route, registry.permission_denied()));
    assert_eq!(route.action(), "denied");
}

#[tokio::test]
async fn test_scenario_d_higher_priority_wins_regardless_of_order() {
    ensure_init();
    let low = hello().named("low").with_priority(10);
    let high = hello().named("high").with_priority(20);
    let message = Message::new(stranger(), "hello").mentioning_bot();

    for routes in [vec![low.clone(), high.clone()], vec![high, low]] {
        let registry = registry_with(routes);
        let route = registry.route(&message, &permissions(&[])).await;
        assert_eq!(route.name(), "high");
    }
}

#[tokio::test]
async fn test_equal_priority_earliest_registration_wins() {
    ensure_init();
    let registry = registry_with(vec![hello().named("first"), hello().named("second")]);
    let message = Message::new(stranger(), "hello").mentioning_bot();

    for _ in 0..5 {
        assert_eq!(registry.route(&message, &permissions(&[])).await.name(), "first");
    }
}

#[tokio::test]
async fn test_ambient_route_ignores_addressed_messages() {
    ensure_init();
    let registry = registry_with(vec![hello().ambient()]);
    let perms = permissions(&[]);

    let ambient = registry.route(&Message::new(stranger(), "hello"), &perms).await;
    assert_eq!(ambient.name(), "probe#hello");

    let addressed = registry
        .route(&Message::new(stranger(), "hello").mentioning_bot(), &perms)
        .await;
    assert!(Arc::ptr_eq(&addressed, registry.black_hole()));

    let private = registry.route(&Message::new(stranger(), "hello").private(), &perms).await;
    assert_eq!(private.name(), "probe#hello");
}

#[tokio::test]
async fn test_whitespace_is_trimmed_before_matching() {
    ensure_init();
    let registry = registry_with(vec![hello()]);
    let message = Message::new(stranger(), "   hello \n").mentioning_bot();
    assert_eq!(registry.route(&message, &permissions(&[])).await.name(), "probe#hello");
}

#[tokio::test]
async fn test_unmatched_message_falls_back() {
    ensure_init();
    let registry = registry_with(vec![hello()]);
    let perms = permissions(&[]);

    let addressed = registry
        .route(&Message::new(stranger(), "what?").mentioning_bot(), &perms)
        .await;
    assert!(Arc::ptr_eq(&addressed, registry.default_route()));

    let ambient = registry.route(&Message::new(stranger(), "what?"), &perms).await;
    assert!(Arc::ptr_eq(&ambient, registry.black_hole()));
}

#[tokio::test]
async fn test_global_admin_passes_every_group_check() {
    ensure_init();
    let registry = registry_with(vec![hello().allow_groups(["ops"])]);
    let perms = permissions(&["Root@Example.com"]);
    let root = User::new("u-0", "root@example.com");

    let route = registry.route(&Message::new(root, "hello").mentioning_bot(), &perms).await;
    assert_eq!(route.name(), "probe#hello");
}

#[tokio::test]
async fn test_admins_group_passes_every_group_check() {
    ensure_init();
    let registry = registry_with(vec![hello().allow_groups(["ops"])]);
    let perms = permissions(&[]);
    let amy = User::new("u-2", "amy@example.com");

    let message = Message::new(amy.clone(), "hello").mentioning_bot();
    assert_eq!(registry.route(&message, &perms).await.name(), "permission_denied");

    perms.groups().group(ADMINS).add(&amy).await.unwrap();
    assert_eq!(registry.route(&message, &perms).await.name(), "probe#hello");
}

#[tokio::test]
async fn test_group_member_is_permitted() {
    ensure_init();
    let registry = registry_with(vec![hello().allow_groups(["ops", "devs"])]);
    let perms = permissions(&[]);
    let bob = User::new("u-3", "Bob@Example.com");
    perms.groups().group("devs").add(&bob).await.unwrap();

    let route = registry.route(&Message::new(bob, "hello").mentioning_bot(), &perms).await;
    assert_eq!(route.name(), "probe#hello");
}

#[tokio::test]
async fn test_resolution_does_not_create_groups() {
    ensure_init();
    let registry = registry_with(vec![hello().allow_groups(["ops"])]);
    let perms = permissions(&[]);

    let route = registry
        .route(&Message::new(stranger(), "hello").mentioning_bot(), &perms)
        .await;
    assert_eq!(route.name(), "permission_denied");
    assert!(perms.groups().names().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_denial_stops_the_scan() {
    ensure_init();
    let registry = registry_with(vec![
        hello().named("locked").allow_groups([ADMINS]).with_priority(30),
        hello().named("open").with_priority(10),
    ]);
    let message = Message::new(stranger(), "hello").mentioning_bot();
    assert_eq!(registry.route(&message, &permissions(&[])).await.name(), "permission_denied");
}

#[tokio::test]
async fn test_help_groups_permitted_routes_by_skill() {
    ensure_init();
    let mut catalog = SkillCatalog::with_builtin().unwrap();
    catalog
        .register(Probe {
            routes: vec![
                hello().with_help("say hello"),
                RouteSpec::pattern("^secret$", "secret")
                    .unwrap()
                    .with_help("secret")
                    .allow_groups([ADMINS]),
            ],
        })
        .unwrap();
    let registry = catalog.registry().unwrap();

    let help = registry.help(&stranger(), &permissions(&[])).await;
    let probe: Vec<&str> = help["probe"].iter().map(|e| e.name.as_str()).collect();
    assert_eq!(probe, vec!["probe#hello"]);
    assert!(help.contains_key("help"));
    assert!(!help.contains_key("default"));

    let groups: Vec<&str> = help["groups"].iter().map(|e| e.name.as_str()).collect();
    assert_eq!(groups, vec!["groups#list_my_groups"]);

    let admin_help = registry.help(&stranger(), &permissions(&["stranger@example.com"])).await;
    assert_eq!(admin_help["probe"].len(), 2);
    assert_eq!(admin_help["groups"].len(), 5);
}

#[test]
fn test_register_rejects_bad_routes() {
    let mut catalog = SkillCatalog::new();
    catalog.register(Probe { routes: vec![] }).unwrap();
    let mut registry = catalog.registry().unwrap();
    let condition = || Condition::pattern("^x$", "x").unwrap().allow_groups([EVERYONE]);

    assert_eq!(
        registry.register("x", "nonexistent", condition()).unwrap_err(),
        ValidationError::UnknownSkill("nonexistent".to_string())
    );
    assert_eq!(
        registry.register("  ", "probe", condition()).unwrap_err(),
        ValidationError::EmptyRouteName
    );
    assert_eq!(
        registry.register_with_priority("x", "probe", condition(), 100).unwrap_err(),
        ValidationError::PriorityOutOfRange(100)
    );
    assert_eq!(
        registry.register_with_priority("x", "probe", condition(), -1).unwrap_err(),
        ValidationError::PriorityOutOfRange(-1)
    );
    assert!(registry.is_empty());
}

proptest! {
    #[test]
    fn prop_priority_range_is_enforced(priority in -200i64..300) {
        let mut catalog = SkillCatalog::new();
        catalog.register(Probe { routes: vec![] }).unwrap();
        let mut registry = catalog.registry().unwrap();
        let condition = Condition::pattern("^x$", "x").unwrap();

        let result = registry.register_with_priority("x", "probe", condition, priority);
        prop_assert_eq!(result.is_ok(), (0..=99).contains(&priority));
    }

    #[test]
    fn prop_resolution_order_is_priority_then_registration(priorities in proptest::collection::vec(0i64..=99, 1..12)) {
        let routes: Vec<RouteSpec> = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| hello().named(format!("r{}", i)).with_priority(*p))
            .collect();
        let registry = registry_with(routes);

        let max = *priorities.iter().max().unwrap();
        let first = priorities.iter().position(|p| *p == max).unwrap();
        prop_assert_eq!(registry.routes()[0].name(), format!("r{}", first));

        let ordered: Vec<u8> = registry.routes().iter().map(|r| r.priority()).collect();
        prop_assert!(ordered.windows(2).all(|w| w[0] >= w[1]));
    }
}
