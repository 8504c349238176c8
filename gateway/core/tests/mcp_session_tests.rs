// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! A complete MCP stdio session: handshake, discovery and tool calls, with the
//! policy loaded from a file the way the binary does it.

use confluence_guard_core::application::content_gateway::ContentGateway;
use confluence_guard_core::domain::policy::{PolicyConfig, PolicySource};
use confluence_guard_core::infrastructure::in_memory_platform::{InMemoryPlatform, SeedPage};
use confluence_guard_core::presentation::{McpServer, ToolDispatcher};
use serde_json::{json, Value};
use std::sync::Arc;

fn request(id: u64, method: &str, params: Value) -> String {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string()
}

fn tool_payload(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn test_session_over_file_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.yaml");
    std::fs::write(
        &path,
        "allowed_spaces: [AR]\nallowed_parents:\n  AR: [100]\n",
    )
    .unwrap();

    let loaded = PolicyConfig::load_layered(Some(path.clone()));
    assert_eq!(loaded.source, PolicySource::Explicit(path));

    let platform = Arc::new(
        InMemoryPlatform::new("https://wiki")
            .with_page(SeedPage::new("100", "AR", "Home"))
            .with_page(SeedPage::new("200", "AR", "Copy").ancestors(&["100"]).labels(&["marketing"])),
    );
    let gateway = Arc::new(ContentGateway::new(platform.clone(), Arc::new(loaded.config)));
    let server = McpServer::new(Arc::new(ToolDispatcher::new(gateway)));

    let input = [
        request(1, "initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}})),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        request(2, "tools/list", json!({})),
        request(
            3,
            "tools/call",
            json!({"name": "create_confluence_page", "arguments": {
                "space_key": "AR", "parent_id": 100, "title": "Notes", "body": "<p>n</p>"
            }}),
        ),
        request(
            4,
            "tools/call",
            json!({"name": "update_confluence_page_full", "arguments": {"page_id": "200", "body": "<p/>"}}),
        ),
        request(5, "ping", json!({})),
    ]
    .join("\n");

    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let ids: Vec<u64> = responses.iter().map(|r| r["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));

    assert_eq!(responses[2]["result"]["isError"], false);
    let created = tool_payload(&responses[2]);
    assert_eq!(created["spaceKey"], "AR");
    assert!(created.get("error").is_none());

    assert_eq!(responses[3]["result"]["isError"], true);
    assert_eq!(
        tool_payload(&responses[3]),
        json!({"error": "Page does not have required 'ai-generated' or 'ai-managed' labels."})
    );

    assert_eq!(platform.write_count(), 1);
}
