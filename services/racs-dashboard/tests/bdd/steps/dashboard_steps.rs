//! BDD step definitions for dashboard routing

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};

use racs_dashboard::api::ApiClient;
use racs_dashboard::app::{Dashboard, TokioPlatform};
use racs_dashboard::components::Action;
use racs_dashboard::dom::{Dom, MemoryDom, NodeId};
use racs_dashboard::io::HttpClient;
use racs_dashboard::log_tail::lock;
use racs_dashboard::routes::Route;
use racs_dashboard::Config;

use super::unescape;
use crate::world::{DashboardWorld, ScriptedServer};

fn dashboard(world: &mut DashboardWorld) -> &mut Dashboard<MemoryDom, TokioPlatform> {
    world.dashboard.as_mut().expect("no dashboard")
}

fn page_text(world: &DashboardWorld) -> String {
    let root = world.root.expect("no dashboard root");
    world.dom.text_content(&root)
}

fn find_tag(world: &DashboardWorld, node: NodeId, tag: &str) -> Option<NodeId> {
    if world.dom.tag_name(&node).as_deref() == Some(tag) {
        return Some(node);
    }
    world
        .dom
        .child_nodes(&node)
        .into_iter()
        .find_map(|child| find_tag(world, child, tag))
}

#[given(expr = "a RACS server with project {string} and task log {string} in state {string}")]
fn racs_server(world: &mut DashboardWorld, project: String, log: String, state: String) {
    let projects = serde_json::json!([{
        "id": 1,
        "name": project,
        "state": "NONE",
        "tasks": [{"id": 11, "type": "BUILDING", "state": state, "time": ""}]
    }]);
    let server = Arc::new(ScriptedServer {
        projects: projects.to_string(),
        log: unescape(&log),
        task_state: state,
        ..ScriptedServer::default()
    });

    let http: Arc<dyn HttpClient> = Arc::clone(&server) as Arc<dyn HttpClient>;
    let api = Arc::new(ApiClient::new("http://racs.test", http));
    let root = world.dom.create_element("body").unwrap();
    let platform = TokioPlatform::new(api);
    let dashboard = Dashboard::new(world.dom.clone(), root, platform, &Config::default());
    dashboard.render().unwrap();

    world.server = Some(server);
    world.root = Some(root);
    world.dashboard = Some(dashboard);
}

#[when("the dashboard loads the project list")]
async fn loads_projects(world: &mut DashboardWorld) {
    dashboard(world).refresh_projects().await.unwrap();
}

#[when(expr = "I navigate to {string}")]
fn navigate_to(world: &mut DashboardWorld, path: String) {
    let route: Route = path.parse().unwrap();
    dashboard(world).navigate(route).unwrap();
}

#[when("the log has been fetched")]
async fn log_fetched(world: &mut DashboardWorld) {
    for _ in 0..400 {
        if !lock(dashboard(world).tail()).text().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    dashboard(world).refresh_text().unwrap();
}

#[when(expr = "navigation to {string} is queued twice")]
fn navigation_queued_twice(world: &mut DashboardWorld, path: String) {
    let route: Route = path.parse().unwrap();
    let mut queue = dashboard(world).actions().borrow_mut();
    queue.push_back(Action::Navigate(route.clone()));
    queue.push_back(Action::Navigate(route));
}

#[when(expr = "I choose stage {string} for the first project")]
fn choose_stage(world: &mut DashboardWorld, stage: String) {
    let root = world.root.expect("no dashboard root");
    let select = find_tag(world, root, "select").expect("no stage select on page");
    world.dom.change(&select, &stage).unwrap();
    world.select = Some(select);
}

#[when("queued actions are processed")]
async fn actions_processed(world: &mut DashboardWorld) {
    dashboard(world).process_actions().await;
}

#[then(expr = "the page shows {string}")]
fn page_shows(world: &mut DashboardWorld, text: String) {
    let page = page_text(world);
    assert!(page.contains(&text), "page text: {}", page);
}

#[then("the dashboard is tailing")]
fn is_tailing(world: &mut DashboardWorld) {
    assert!(dashboard(world).is_tailing());
}

#[then("the dashboard is not tailing")]
fn is_not_tailing(world: &mut DashboardWorld) {
    assert!(!dashboard(world).is_tailing());
}

#[then(expr = "the dashboard log tail is {string}")]
fn dashboard_tail_state(world: &mut DashboardWorld, state: String) {
    assert_eq!(lock(dashboard(world).tail()).state().to_string(), state);
}

#[then(expr = "the server received a build request for {string}")]
fn build_requested(world: &mut DashboardWorld, stage: String) {
    let server = world.server.as_ref().expect("no server");
    let posts = server.posts.lock().unwrap();
    let needle = format!("\"stage\":\"{}\"", stage);
    assert!(
        posts
            .iter()
            .any(|p| p.contains("/project/build") && p.contains(&needle)),
        "posts: {:?}",
        *posts
    );
}

#[then(expr = "the server was asked for the log at offsets {string}")]
fn log_offsets(world: &mut DashboardWorld, list: String) {
    let server = world.server.as_ref().expect("no server");
    let expected: Vec<usize> = list
        .split(',')
        .map(|offset| offset.trim().parse().unwrap())
        .collect();
    assert_eq!(*server.log_offsets.lock().unwrap(), expected);
}

#[then("the stage select is blank again")]
fn select_blank(world: &mut DashboardWorld) {
    let select = world.select.expect("no stage chosen");
    assert_eq!(world.dom.attribute(&select, "value").as_deref(), Some(""));
}
