// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Policy properties of the content gateway, exercised end to end against
//! the in-memory platform:
//! - denials never reach the platform's write endpoints
//! - subtree membership is enforced for listing and mutation
//! - the managed label gates updates regardless of space
//! - created pages read back with the body they were created with

use confluence_guard_core::application::content_gateway::{ContentGateway, GatewayError};
use confluence_guard_core::domain::access_gate::PolicyViolation;
use confluence_guard_core::domain::page::{PageId, SpaceKey};
use confluence_guard_core::domain::policy::PolicyConfig;
use confluence_guard_core::infrastructure::in_memory_platform::{InMemoryPlatform, PlatformCall, SeedPage};
use serde_json::json;
use std::sync::Arc;

const BASE: &str = "https://example.atlassian.net/wiki";

fn policy() -> Arc<PolicyConfig> {
    Arc::new(PolicyConfig::new(
        [SpaceKey::from("AR")],
        [(SpaceKey::from("AR"), vec![PageId::from("100")])],
    ))
}

fn site() -> Arc<InMemoryPlatform> {
    Arc::new(
        InMemoryPlatform::new(BASE)
            .with_page(SeedPage::new("100", "AR", "Architecture").labels(&["ai-managed"]))
            .with_page(
                SeedPage::new("200", "AR", "Campaign")
                    .ancestors(&["100"])
                    .labels(&["marketing"])
                    .body("<p>Launch plan</p>")
                    .version(3),
            )
            .with_page(
                SeedPage::new("210", "AR", "Generated notes")
                    .ancestors(&["100", "200"])
                    .labels(&["ai-generated"])
                    .body("<p>Draft</p>")
                    .version(2),
            )
            .with_page(SeedPage::new("300", "AR", "Elsewhere").ancestors(&["999"]).labels(&["ai-managed"]))
            .with_page(SeedPage::new("999", "AR", "Other root"))
            .with_page(SeedPage::new("500", "OTHER", "Foreign").labels(&["ai-managed"])),
    )
}

fn gateway(platform: &Arc<InMemoryPlatform>) -> ContentGateway {
    ContentGateway::new(platform.clone(), policy())
}

#[tokio::test]
async fn test_create_in_disallowed_space_makes_no_network_call() {
    let platform = site();
    let gateway = gateway(&platform);

    let err = gateway
        .create_page(&SpaceKey::from("OTHER"), &PageId::from("500"), "Title", "<p>x</p>")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::PolicyDenied(PolicyViolation::SpaceNotAllowed {
            space: "OTHER".to_string()
        })
    );
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn test_create_under_descendant_of_allowed_parent_is_denied() {
    let platform = site();
    let gateway = gateway(&platform);

    let err = gateway
        .create_page(&SpaceKey::from("AR"), &PageId::from("200"), "Title", "<p>x</p>")
        .await
        .unwrap_err();

    assert!(err.is_policy_denial());
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn test_out_of_subtree_page_cannot_be_listed_or_updated() {
    let platform = site();
    let gateway = gateway(&platform);

    let listing = gateway.list_children(&PageId::from("300")).await.unwrap_err();
    assert_eq!(listing.to_string(), "Parent page is not accessible under current permissions");

    let update = gateway
        .update_full_page(&PageId::from("300"), "<p>overwrite</p>")
        .await
        .unwrap_err();
    assert_eq!(
        update.to_string(),
        "Page '300' is outside the allowed parent pages for space 'AR'."
    );

    assert_eq!(platform.write_count(), 0);
}

#[tokio::test]
async fn test_missing_managed_label_denies_update_with_exact_message() {
    let platform = site();
    let gateway = gateway(&platform);

    let err = gateway
        .update_full_page(&PageId::from("200"), "<p>overwrite</p>")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Page does not have required 'ai-generated' or 'ai-managed' labels."
    );
    assert_eq!(platform.write_count(), 0);
}

#[tokio::test]
async fn test_other_space_is_denied_even_with_managed_label() {
    let platform = site();
    let gateway = gateway(&platform);

    let err = gateway
        .update_full_page(&PageId::from("500"), "<p>x</p>")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Page in space 'OTHER' cannot be modified (space not allowed)."
    );

    let err = gateway.prepare_merge_update(&PageId::from("500")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Page in space 'OTHER' cannot be prepared for merge (space not allowed)."
    );
    assert_eq!(platform.write_count(), 0);
}

#[tokio::test]
async fn test_prepare_merge_then_update_round() {
    let platform = site();
    let gateway = gateway(&platform);
    let id = PageId::from("210");

    let first = gateway.prepare_merge_update(&id).await.unwrap();
    let second = gateway.prepare_merge_update(&id).await.unwrap();
    assert_eq!(first.version, Some(2));
    assert_eq!(first.version, second.version);
    assert_eq!(first.storage_content, second.storage_content);
    assert_eq!(first.labels, Some(vec!["ai-generated".to_string()]));
    assert_eq!(platform.write_count(), 0);

    let merged = format!("{}<p>Appended</p>", first.storage_content);
    let reference = gateway.update_full_page(&id, &merged).await.unwrap();
    assert_eq!(reference.id, id);

    let after = gateway.prepare_merge_update(&id).await.unwrap();
    assert_eq!(after.version, Some(3));
    assert_eq!(after.title, "Generated notes");
    assert_eq!(after.text_content, "Draft\nAppended");
}

#[tokio::test]
async fn test_created_page_reads_back_and_is_updatable() {
    let platform = site();
    let gateway = gateway(&platform);

    let created = gateway
        .create_page(
            &SpaceKey::from("AR"),
            &PageId::from("100"),
            "Decision log",
            "<h1>Decisions</h1><p>Use &amp; keep <strong>CQL</strong> scoped.</p>",
        )
        .await
        .unwrap();
    assert_eq!(created.url, format!("{}/spaces/AR/pages/{}", BASE, created.id));

    let page = gateway.get_page(&created.id).await.unwrap();
    assert_eq!(page.title, "Decision log");
    assert_eq!(page.text_content, "Decisions\nUse & keep CQL scoped.");

    // The managed label attached on create is what allows the follow-up update.
    gateway
        .update_full_page(&created.id, "<p>Revised</p>")
        .await
        .unwrap();
    assert_eq!(platform.write_count(), 2);
}

#[tokio::test]
async fn test_children_listing_returns_direct_children_only() {
    let platform = site();
    let gateway = gateway(&platform);

    let children = gateway.list_children(&PageId::from("100")).await.unwrap();
    let ids: Vec<&str> = children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["200"]);

    // 200 sits inside the allowed subtree, so its own children are listable.
    let grandchildren = gateway.list_children(&PageId::from("200")).await.unwrap();
    assert_eq!(grandchildren[0].title, "Generated notes");
}

#[tokio::test]
async fn test_search_scoping_and_filtering() {
    let platform = site();
    platform.set_search_results(vec![
        json!({"content": {"id": "200", "ancestors": [{"id": "100"}]}, "title": "Campaign", "url": "/spaces/AR/pages/200"}),
        json!({"content": {"id": "300", "ancestors": [{"id": "999"}]}, "title": "Elsewhere", "url": "/spaces/AR/pages/300"}),
        json!({"content": {"id": "500", "space": {"key": "OTHER"}}, "title": "Foreign", "url": "/x/500"}),
        json!({"content": {"id": "100"}, "title": "Architecture", "url": "/spaces/AR/pages/100"}),
    ]);
    let gateway = gateway(&platform);

    let results = gateway.search("space = AR AND title ~ \"plan\"").await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["200", "100"]);

    match &platform.calls()[0] {
        PlatformCall::Search { cql, limit } => {
            assert!(cql.starts_with("(space = AR AND title ~ \"plan\") AND type=page"));
            assert!(cql.contains("(space = \"AR\")"));
            assert!(cql.contains("ancestor in (\"100\")"));
            assert_eq!(*limit, 50);
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_policy_denies_everything_but_reads() {
    let platform = site();
    let gateway = ContentGateway::new(platform.clone(), Arc::new(PolicyConfig::default()));

    assert!(gateway.search("anything").await.unwrap().is_empty());
    assert!(gateway
        .create_page(&SpaceKey::from("AR"), &PageId::from("100"), "t", "b")
        .await
        .unwrap_err()
        .is_policy_denial());
    assert!(gateway.list_children(&PageId::from("100")).await.unwrap_err().is_policy_denial());
    assert!(gateway
        .update_full_page(&PageId::from("210"), "b")
        .await
        .unwrap_err()
        .is_policy_denial());

    // Reads by id stay open.
    assert!(gateway.get_page(&PageId::from("500")).await.is_ok());
    assert_eq!(platform.write_count(), 0);
}
