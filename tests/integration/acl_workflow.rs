//! Access-list editing against a mocked Command API

use std::io::Cursor;
use std::sync::Arc;

use assert_matches::assert_matches;
use eos_ops::{
    acl::{
        AclEditor, AclError,
        menu::{Console, Menu},
    },
    eapi::{EapiClient, EapiError},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn access_lists() -> Value {
    json!({
        "aclList": [
            {
                "name": "default-control-plane-acl",
                "readonly": true,
                "sequence": [{ "sequenceNumber": 10, "text": "permit icmp any any" }]
            },
            {
                "name": "MGMT",
                "readonly": false,
                "sequence": [
                    { "sequenceNumber": 10, "text": "permit tcp 10.0.0.0/8 any eq ssh" },
                    { "sequenceNumber": 20, "text": "deny ip any any log" }
                ]
            }
        ]
    })
}

async fn editor(server: &MockServer) -> AclEditor {
    mount_commands(
        server,
        &["enable", "show ip access-lists"],
        vec![json!({}), access_lists()],
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/command-api"))
        .and(ConfigureSession)
        .respond_with(EmptyResults)
        .mount(server)
        .await;

    AclEditor::new(Arc::new(EapiClient::new(&switch_config(server)).unwrap()))
}

/// Matches batches that enter configuration mode
struct ConfigureSession;

impl wiremock::Match for ConfigureSession {
    fn matches(&self, request: &wiremock::Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .is_ok_and(|body| body["params"]["cmds"][1] == "configure")
    }
}

/// Answers one empty result per command
struct EmptyResults;

impl wiremock::Respond for EmptyResults {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        let count = request_cmds(request).len();
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "eos-ops-1",
            "result": vec![json!({}); count],
        }))
    }
}

async fn configured_batches(server: &MockServer) -> Vec<Vec<String>> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(request_cmds)
        .filter(|cmds| cmds.get(1).map(String::as_str) == Some("configure"))
        .collect()
}

#[tokio::test]
async fn test_list_skips_readonly_acls() {
    let server = MockServer::start().await;
    let editor = editor(&server).await;

    let acls = editor.list().await.unwrap();

    assert_eq!(acls.len(), 1);
    assert_eq!(acls[0].name, "MGMT");
    assert_eq!(acls[0].rules[0].text, "permit tcp 10.0.0.0/8 any eq ssh");
}

#[tokio::test]
async fn test_editing_sends_configuration_sessions() {
    let server = MockServer::start().await;
    let editor = editor(&server).await;

    editor
        .add_rules("MGMT", &["permit udp any any eq snmp".to_string()])
        .await
        .unwrap();
    editor
        .replace_rule("MGMT", 20, "20 deny ip any any")
        .await
        .unwrap();
    editor.delete_rule("MGMT", 10).await.unwrap();
    editor.delete_acl("MGMT").await.unwrap();

    let expected: Vec<Vec<&str>> = vec![
        vec!["enable", "configure", "ip access-list MGMT", "permit udp any any eq snmp"],
        vec!["enable", "configure", "ip access-list MGMT", "no 20", "20 deny ip any any"],
        vec!["enable", "configure", "ip access-list MGMT", "no 10"],
        vec!["enable", "configure", "no ip access-list MGMT"],
    ];
    assert_eq!(configured_batches(&server).await, expected);
}

#[tokio::test]
async fn test_switch_rejection_carries_cli_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/command-api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "eos-ops-1",
            "error": {
                "code": 1002,
                "message": "CLI command 4 of 4 'bogus rule' failed: invalid command",
                "data": [{}, {}, {}, { "errors": ["Invalid input (at token 0: 'bogus')"] }]
            }
        })))
        .mount(&server)
        .await;

    let editor = AclEditor::new(Arc::new(EapiClient::new(&switch_config(&server)).unwrap()));
    let result = editor.add_rules("MGMT", &["bogus rule".to_string()]).await;

    assert_matches!(
        result,
        Err(AclError::Eapi(EapiError::Rpc { code: 1002, detail: Some(detail), .. }))
            if detail == "Invalid input (at token 0: 'bogus')"
    );
}

#[tokio::test]
async fn test_menu_session_end_to_end() {
    let server = MockServer::start().await;
    let editor = editor(&server).await;

    let script = "1\n2\nWEB\npermit tcp any any eq 443\n3\nMGMT\n4\n20\n5\n4\nWEB\n5\n";
    let console = Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
    let mut menu = Menu::new(&editor, console);
    menu.run().await.unwrap();

    let output = String::from_utf8(menu.into_console().into_output()).unwrap();
    assert!(output.contains("  20 : deny ip any any log"));
    assert!(output.contains("Added ACL: WEB"));
    assert!(output.contains("Edited ACL: MGMT Deleted rule: 20"));
    assert!(output.contains("Removed ACL: WEB"));
    assert!(output.contains("--- Exiting ACL Editor ---"));

    let expected: Vec<Vec<&str>> = vec![
        vec!["enable", "configure", "ip access-list WEB", "permit tcp any any eq 443"],
        vec!["enable", "configure", "ip access-list MGMT", "no 20"],
        vec!["enable", "configure", "no ip access-list WEB"],
    ];
    assert_eq!(configured_batches(&server).await, expected);
}
