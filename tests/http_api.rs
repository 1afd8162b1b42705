//! REST flows end to end, over an in-memory store and over the full RPC stack.

use std::sync::Arc;

use level_time::lifecycle::Shutdown;
use level_time::store::MemoryStore;
use level_time_sdk::{TimeClient, TimerQuery};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

mod common;

async fn start() -> (TimeClient, String, Shutdown) {
    let shutdown = Shutdown::new();
    let url = common::start_http(Arc::new(MemoryStore::new()), &shutdown).await;
    (TimeClient::new(&url).unwrap(), url, shutdown)
}

fn sorted_ids<'a>(timers: impl IntoIterator<Item = &'a level_time_sdk::Timer>) -> Vec<String> {
    let mut ids: Vec<String> = timers.into_iter().map(|t| t.id.clone()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn serves_docs_at_root() {
    let (client, _url, _shutdown) = start().await;
    let docs = client.docs().await.unwrap();
    assert!(docs["routes"]["POST::/timers/:group/start"].is_object());
    assert!(docs["resources"]["Consolidation"].is_object());
}

#[tokio::test]
async fn starts_and_stops_timers() {
    let (client, _url, _shutdown) = start().await;

    let timer = client.start("foo", &json!({"title": "bar"})).await.unwrap();
    assert!(!timer.id.is_empty());
    assert_eq!(timer.title, "bar");
    assert_eq!(timer.group, "foo");
    assert!(timer.is_running());

    let stopped = client.stop("foo", &timer.id).await.unwrap();
    assert_eq!(stopped.id, timer.id);
    assert!(!stopped.is_running());

    let again = client.stop("foo", &timer.id).await.unwrap();
    assert_eq!(again.end, stopped.end);
}

#[tokio::test]
async fn start_without_title_is_bad_request() {
    let (client, _url, _shutdown) = start().await;
    let err = client.start("foo", &json!({})).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let err = client.start("foo", &json!({"title": null})).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn lists_timers_by_group_and_state() {
    let (client, _url, _shutdown) = start().await;

    let mut started = Vec::new();
    for n in 1..=10 {
        started.push(
            client
                .start("foo", &json!({"title": format!("timer {}", n)}))
                .await
                .unwrap(),
        );
    }
    let other = client.start("other", &json!({"title": "elsewhere"})).await.unwrap();
    client.stop("foo", &started[0].id).await.unwrap();

    let all = client.timers(None, &TimerQuery::default()).await.unwrap();
    assert_eq!(all.len(), 11);

    let foo = client.timers(Some("foo"), &TimerQuery::default()).await.unwrap();
    assert_eq!(sorted_ids(&foo), sorted_ids(&started));

    let running = client.running(Some("foo"), &TimerQuery::default()).await.unwrap();
    assert_eq!(running.len(), 9);
    assert!(running.iter().all(|t| t.is_running()));

    let running_all = client.running(None, &TimerQuery::default()).await.unwrap();
    assert_eq!(running_all.len(), 10);
    assert!(running_all.iter().any(|t| t.id == other.id));
}

#[tokio::test]
async fn filters_by_title() {
    let (client, _url, _shutdown) = start().await;
    client.start("foo", &json!({"title": "Write Report"})).await.unwrap();
    client.start("foo", &json!({"title": "review"})).await.unwrap();

    let query = TimerQuery {
        title: Some("report".into()),
        ..TimerQuery::default()
    };
    let found = client.timers(None, &query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Write Report");
}

#[tokio::test]
async fn gets_and_updates_a_timer() {
    let (client, _url, _shutdown) = start().await;
    let timer = client.start("foo", &json!({"title": "bar"})).await.unwrap();

    let fetched = client.timer("foo", &timer.id).await.unwrap();
    assert_eq!(fetched.id, timer.id);
    assert_eq!(fetched.start, timer.start);

    let updated = client
        .update_timer(
            "foo",
            &timer.id,
            &json!({"title": "foobar", "comment": "custom", "id": "hijack", "group": "bar"}),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, timer.id);
    assert_eq!(updated.group, "foo");
    assert_eq!(updated.title, "foobar");
    assert_eq!(updated.extra["comment"], "custom");

    let fetched = client.timer("foo", &timer.id).await.unwrap();
    assert_eq!(fetched.title, "foobar");
    assert_eq!(fetched.extra["comment"], "custom");
}

#[tokio::test]
async fn consolidates_stopped_timers() {
    let (client, _url, _shutdown) = start().await;

    for n in 0..3 {
        let timer = client
            .start("foo", &json!({"title": format!("t{}", n), "hourlyPrice": "60"}))
            .await
            .unwrap();
        assert_eq!(timer.hourly_price, 60.0);
        client.stop("foo", &timer.id).await.unwrap();
    }
    client.start("foo", &json!({"title": "still running"})).await.unwrap();
    let other = client.start("bar", &json!({"title": "other"})).await.unwrap();
    client.stop("bar", &other.id).await.unwrap();

    let foo = client.consolidate(Some("foo"), &TimerQuery::default()).await.unwrap();
    assert_eq!(foo.count_timers, 3);
    assert!(foo.duration >= 0);
    assert!(foo.start.is_some() && foo.end.is_some());

    let all = client.consolidate(None, &TimerQuery::default()).await.unwrap();
    assert_eq!(all.count_timers, 4);

    let group = client.group_consolidate("foo").await.unwrap();
    assert_eq!(group.count_timers, 3);
}

#[tokio::test]
async fn empty_consolidation_has_no_bounds() {
    let (client, _url, _shutdown) = start().await;
    let empty = client.consolidate(None, &TimerQuery::default()).await.unwrap();
    assert_eq!(empty.count_timers, 0);
    assert_eq!(empty.duration, 0);
    assert!(empty.start.is_none());
}

#[tokio::test]
async fn manages_groups() {
    let (client, _url, _shutdown) = start().await;

    let group = client.create_group("foo", &json!({"color": "red"})).await.unwrap();
    assert_eq!(group.name, "foo");
    assert_eq!(group.extra["color"], "red");

    client.start("bar", &json!({"title": "auto-creates bar"})).await.unwrap();

    let mut names = client.group_names().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["bar", "foo"]);
    assert_eq!(client.groups().await.unwrap().len(), 2);

    let updated = client
        .update_group("foo", &json!({"color": "blue", "name": "renamed"}))
        .await
        .unwrap();
    assert_eq!(updated.name, "foo");
    assert_eq!(updated.extra["color"], "blue");
    assert_eq!(client.group("foo").await.unwrap().extra["color"], "blue");
}

#[tokio::test]
async fn group_timer_routes() {
    let (client, _url, _shutdown) = start().await;
    let a = client.start("foo", &json!({"title": "a"})).await.unwrap();
    client.start("foo", &json!({"title": "b"})).await.unwrap();
    client.stop("foo", &a.id).await.unwrap();

    assert_eq!(client.group_timers("foo", &TimerQuery::default()).await.unwrap().len(), 2);
    let running = client.group_running("foo").await.unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].title, "b");
}

#[tokio::test]
async fn deleting_a_group_removes_its_timers() {
    let (client, _url, _shutdown) = start().await;
    client.start("foo", &json!({"title": "a"})).await.unwrap();
    client.start("foo", &json!({"title": "b"})).await.unwrap();
    let keep = client.start("bar", &json!({"title": "c"})).await.unwrap();

    client.remove_group("foo").await.unwrap();

    let err = client.group("foo").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.code(), Some("NotFoundError"));

    let left = client.timers(None, &TimerQuery::default()).await.unwrap();
    assert_eq!(sorted_ids(&left), vec![keep.id]);
}

#[tokio::test]
async fn removes_timers() {
    let (client, _url, _shutdown) = start().await;
    let a = client.start("foo", &json!({"title": "a"})).await.unwrap();
    client.start("foo", &json!({"title": "b"})).await.unwrap();
    client.start("bar", &json!({"title": "c"})).await.unwrap();

    assert_eq!(client.remove_timer("foo", &a.id).await.unwrap()["removed"], 1);
    let err = client.remove_timer("foo", &a.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    assert_eq!(client.remove_timers(Some("foo")).await.unwrap()["removed"], 1);
    assert_eq!(client.remove_timers(None).await.unwrap()["removed"], 1);
    assert!(client.timers(None, &TimerQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_records_are_404_with_code() {
    let (client, url, _shutdown) = start().await;

    let err = client.timer("foo", "nope").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.code(), Some("NotFoundError"));

    let resp = reqwest::get(format!("{}/groups/nope", url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "NotFoundError");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (client, _url, _shutdown) = start().await;
    let resp = client
        .raw(Method::POST, "/timers/foo/start", Some(&json!(["not", "an", "object"])))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unparsable_query_is_bad_request_with_code() {
    let (_client, url, _shutdown) = start().await;

    let resp = reqwest::get(format!("{}/timers?since=yesterday", url)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "BadRequestError");
}

#[tokio::test]
async fn filters_by_start_bounds() {
    let (client, _url, _shutdown) = start().await;

    let mut started = Vec::new();
    for n in 1..=3 {
        started.push(client.start("foo", &json!({"title": format!("t{}", n)})).await.unwrap());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    let pivot = started[1].start.clone();

    let since = TimerQuery {
        since: Some(pivot.clone()),
        ..TimerQuery::default()
    };
    let later = client.timers(Some("foo"), &since).await.unwrap();
    assert_eq!(sorted_ids(&later), sorted_ids(&started[1..]));

    let until = TimerQuery {
        until: Some(pivot),
        ..TimerQuery::default()
    };
    let earlier = client.timers(Some("foo"), &until).await.unwrap();
    assert_eq!(sorted_ids(&earlier), sorted_ids(&started[..1]));
}

#[tokio::test]
async fn separator_in_group_name_is_bad_request() {
    let (client, _url, _shutdown) = start().await;
    let err = client.start("a!b", &json!({"title": "x"})).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn names_with_reserved_characters_round_trip() {
    let (client, _url, _shutdown) = start().await;

    for group in ["client work", "a/b", "50%?"] {
        let timer = client.start(group, &json!({"title": "x"})).await.unwrap();
        assert_eq!(timer.group, group);
        assert_eq!(client.timer(group, &timer.id).await.unwrap().id, timer.id);
        assert_eq!(client.group(group).await.unwrap().name, group);
    }
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (_client, url, _shutdown) = start().await;

    let resp = reqwest::get(format!("{}/health", url)).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = reqwest::Client::new()
        .get(format!("{}/timers", url))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn full_stack_over_rpc() {
    let stack = common::start_stack().await;
    let client = TimeClient::new(&stack.url).unwrap();

    let timer = client.start("work", &json!({"title": "remote"})).await.unwrap();
    client.stop("work", &timer.id).await.unwrap();
    assert_eq!(client.group_names().await.unwrap(), vec!["work"]);

    let consolidation = client.consolidate(Some("work"), &TimerQuery::default()).await.unwrap();
    assert_eq!(consolidation.count_timers, 1);

    client.remove_group("work").await.unwrap();
    assert!(client.timers(None, &TimerQuery::default()).await.unwrap().is_empty());
}
