// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `challenge.rs`

use super::*;
use serde_json::json;

#[test]
fn test_decode_present_payload() {
    let payload: ChallengePayload = serde_json::from_value(json!({
        "apiVersion": "acme.example.com/v1alpha1",
        "kind": "ChallengePayload",
        "request": {
            "uid": "c0ffee",
            "action": "Present",
            "type": "dns-01",
            "dnsName": "example.com",
            "key": "txt-value",
            "resourceNamespace": "cert-manager",
            "resolvedFQDN": "_acme-challenge.example.com.",
            "resolvedZone": "example.com.",
            "allowAmbientCredentials": false,
            "config": { "zoneID": 112900000001_i64 }
        }
    }))
    .unwrap();

    let request = payload.request.unwrap();
    assert_eq!(request.uid, "c0ffee");
    assert_eq!(request.action, ChallengeAction::Present);
    assert_eq!(request.challenge_type, "dns-01");
    assert_eq!(request.resolved_fqdn, "_acme-challenge.example.com.");
    assert_eq!(request.resolved_zone, "example.com.");
    assert_eq!(request.resource_namespace, "cert-manager");
    assert_eq!(request.config, Some(json!({ "zoneID": 112900000001_i64 })));
}

#[test]
fn test_decode_cleanup_without_config() {
    let request: ChallengeRequest = serde_json::from_value(json!({
        "uid": "1",
        "action": "CleanUp",
        "resolvedFQDN": "_acme-challenge.example.com.",
        "resolvedZone": "example.com."
    }))
    .unwrap();

    assert_eq!(request.action, ChallengeAction::CleanUp);
    assert!(request.config.is_none());
    assert!(request.key.is_empty());
}

#[test]
fn test_unknown_action_decodes_to_unknown() {
    let request: ChallengeRequest =
        serde_json::from_value(json!({ "uid": "1", "action": "Renew" })).unwrap();
    assert_eq!(request.action, ChallengeAction::Unknown);
    assert_eq!(request.action.as_label(), "unknown");
}

#[test]
fn test_failure_response_carries_message() {
    let response = ChallengeResponse::failure("abc", "invalid zone");
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["uid"], "abc");
    assert_eq!(value["success"], false);
    assert_eq!(value["status"]["status"], "Failure");
    assert_eq!(value["status"]["message"], "invalid zone");
    assert_eq!(value["status"]["code"], 500);
}

#[test]
fn test_success_response_omits_status() {
    let value = serde_json::to_value(ChallengeResponse::success("abc")).unwrap();
    assert_eq!(value["success"], true);
    assert!(value.get("status").is_none());
}

#[test]
fn test_into_reply_keeps_request_and_defaults_type_meta() {
    let payload = ChallengePayload {
        request: Some(ChallengeRequest {
            uid: "42".to_string(),
            action: ChallengeAction::Present,
            ..ChallengeRequest::default()
        }),
        ..ChallengePayload::default()
    };

    let reply = payload.into_reply(
        "acme.example.com/v1alpha1",
        ChallengeResponse::success("42"),
    );

    assert_eq!(reply.api_version, "acme.example.com/v1alpha1");
    assert_eq!(reply.kind, "ChallengePayload");
    assert_eq!(reply.request.unwrap().uid, "42");
    assert!(reply.response.unwrap().success);
}
