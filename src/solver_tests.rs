// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `solver.rs`
//!
//! In-memory fakes stand in for the secret store and the SakuraCloud API so the
//! tests can assert on exactly which updates were submitted.

use super::*;
use crate::errors::ProviderError;
use crate::provider_config::SecretKeySelector;
use crate::sakuracloud::RecordType;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

const ZONE_ID: i64 = 112_900_000_001;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeSecretStore {
    values: HashMap<(String, String, String), String>,
}

impl FakeSecretStore {
    fn with_credentials() -> Self {
        let mut values = HashMap::new();
        for (key, value) in [("token", "my-token"), ("secret", "my-secret")] {
            values.insert(
                (
                    "cert-manager".to_string(),
                    "sakuracloud".to_string(),
                    key.to_string(),
                ),
                value.to_string(),
            );
        }
        Self { values }
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn secret_value(
        &self,
        namespace: &str,
        selector: &SecretKeySelector,
    ) -> Result<String, SolverError> {
        self.values
            .get(&(
                namespace.to_string(),
                selector.name.clone(),
                selector.key.clone(),
            ))
            .cloned()
            .ok_or_else(|| SolverError::SecretNotFound {
                namespace: namespace.to_string(),
                name: selector.name.clone(),
            })
    }
}

struct ZoneState {
    zone: DnsZone,
    update_calls: usize,
    credentials: Vec<Credentials>,
    revision: usize,
    read_failure: Option<u16>,
}

#[derive(Clone)]
struct FakeZones {
    state: Arc<Mutex<ZoneState>>,
}

impl FakeZones {
    fn new(name: &str, records: Vec<DnsRecord>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ZoneState {
                zone: DnsZone {
                    id: ZONE_ID,
                    name: name.to_string(),
                    records,
                    settings_hash: "hash-0".to_string(),
                },
                update_calls: 0,
                credentials: Vec::new(),
                revision: 0,
                read_failure: None,
            })),
        }
    }

    fn records(&self) -> Vec<DnsRecord> {
        self.state.lock().unwrap().zone.records.clone()
    }

    fn fail_reads_with(&self, status: u16) {
        self.state.lock().unwrap().read_failure = Some(status);
    }

    fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }
}

impl ZoneClientFactory for FakeZones {
    fn zone_client(&self, credentials: Credentials) -> Result<Box<dyn ZoneClient>, SolverError> {
        self.state.lock().unwrap().credentials.push(credentials);
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl ZoneClient for FakeZones {
    async fn read_zone(&self, zone_id: i64) -> Result<DnsZone, ProviderError> {
        let state = self.state.lock().unwrap();
        if let Some(status) = state.read_failure {
            return Err(ProviderError::Api {
                status,
                code: "service_unavailable".to_string(),
                message: "maintenance".to_string(),
            });
        }
        if zone_id != state.zone.id {
            return Err(ProviderError::Api {
                status: 404,
                code: "not_found".to_string(),
                message: format!("zone {zone_id} not found"),
            });
        }
        Ok(state.zone.clone())
    }

    async fn update_records(
        &self,
        zone_id: i64,
        records: &[DnsRecord],
        settings_hash: &str,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.update_calls += 1;
        assert_eq!(zone_id, state.zone.id);
        if settings_hash != state.zone.settings_hash {
            return Err(ProviderError::Api {
                status: 409,
                code: "conflict".to_string(),
                message: "settings hash mismatch".to_string(),
            });
        }
        state.revision += 1;
        state.zone.records = records.to_vec();
        state.zone.settings_hash = format!("hash-{}", state.revision);
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn solver_for(zones: &FakeZones) -> SakuraCloudSolver {
    SakuraCloudSolver::new(Arc::new(zones.clone()))
        .with_secret_store(Arc::new(FakeSecretStore::with_credentials()))
}

fn challenge(key: &str) -> ChallengeRequest {
    ChallengeRequest {
        uid: "uid-1".to_string(),
        key: key.to_string(),
        resource_namespace: "cert-manager".to_string(),
        resolved_fqdn: "_acme-challenge.example.com.".to_string(),
        resolved_zone: "example.com.".to_string(),
        config: Some(json!({
            "zoneID": ZONE_ID,
            "accessTokenRef": { "name": "sakuracloud", "key": "token" },
            "accessTokenSecretRef": { "name": "sakuracloud", "key": "secret" }
        })),
        ..ChallengeRequest::default()
    }
}

fn record(name: &str, record_type: RecordType, rdata: &str) -> DnsRecord {
    DnsRecord {
        name: name.to_string(),
        record_type,
        rdata: rdata.to_string(),
        ttl: 300,
    }
}

fn txt_records_named<'a>(records: &'a [DnsRecord], name: &str) -> Vec<&'a DnsRecord> {
    records.iter().filter(|r| r.is_txt_named(name)).collect()
}

// ============================================================================
// record_entry
// ============================================================================

#[test]
fn test_record_entry_with_dotted_zone_name() {
    let entry =
        record_entry("example.com.", "_acme-challenge.example.com.", "example.com.").unwrap();
    assert_eq!(entry, "_acme-challenge");
}

#[test]
fn test_record_entry_normalizes_zone_name() {
    let entry =
        record_entry("example.com.", "_acme-challenge.example.com.", "example.com").unwrap();
    assert_eq!(entry, "_acme-challenge");
}

#[test]
fn test_record_entry_subdomain() {
    let entry = record_entry(
        "example.com.",
        "_acme-challenge.www.example.com.",
        "example.com",
    )
    .unwrap();
    assert_eq!(entry, "_acme-challenge.www");
}

#[test]
fn test_record_entry_invalid_zone() {
    let err =
        record_entry("example.org.", "_acme-challenge.example.org.", "example.com").unwrap_err();
    assert!(matches!(
        err,
        SolverError::InvalidZone { ref zone_name, .. } if zone_name == "example.com."
    ));
}

#[test]
fn test_record_entry_invalid_fqdn() {
    let err =
        record_entry("example.com.", "_acme-challenge.example.net.", "example.com").unwrap_err();
    assert!(matches!(err, SolverError::InvalidFqdn { .. }));
}

#[test]
fn test_record_entry_apex_fqdn_is_invalid() {
    let err = record_entry("example.com.", "example.com.", "example.com").unwrap_err();
    assert!(matches!(err, SolverError::InvalidFqdn { .. }));
}

// ============================================================================
// Record list mutations
// ============================================================================

#[test]
fn test_upsert_appends_with_challenge_ttl() {
    let mut records = vec![record("www", RecordType::A, "192.0.2.1")];

    let updated = upsert_txt_record(&mut records, "_acme-challenge", "key-1");

    assert!(!updated);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1], DnsRecord::txt("_acme-challenge", "key-1", 60));
}

#[test]
fn test_upsert_overwrites_existing_txt() {
    let mut records = vec![
        record("_acme-challenge", RecordType::Cname, "elsewhere.example.net."),
        DnsRecord::txt("_acme-challenge", "old", 60),
    ];

    let updated = upsert_txt_record(&mut records, "_acme-challenge", "new");

    assert!(updated);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].rdata, "elsewhere.example.net.");
    assert_eq!(records[1].rdata, "new");
}

#[test]
fn test_remove_only_matching_txt() {
    let mut records = vec![
        DnsRecord::txt("_acme-challenge", "a", 60),
        record("_acme-challenge", RecordType::Cname, "elsewhere.example.net."),
        DnsRecord::txt("other", "b", 60),
        DnsRecord::txt("_acme-challenge", "c", 60),
    ];

    let removed = remove_txt_records(&mut records, "_acme-challenge");

    assert_eq!(removed, 2);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].record_type, RecordType::Cname);
    assert_eq!(records[1].name, "other");
}

// ============================================================================
// Present
// ============================================================================

#[tokio::test]
async fn test_present_creates_record() {
    let zones = FakeZones::new("example.com", vec![record("www", RecordType::A, "192.0.2.1")]);
    let solver = solver_for(&zones);

    solver.present(&challenge("key-1")).await.unwrap();

    let records = zones.records();
    assert_eq!(records.len(), 2);
    assert_eq!(
        txt_records_named(&records, "_acme-challenge"),
        vec![&DnsRecord::txt("_acme-challenge", "key-1", 60)]
    );
    assert_eq!(zones.update_calls(), 1);

    let credentials = zones.state.lock().unwrap().credentials.clone();
    assert_eq!(credentials, vec![Credentials::new("my-token", "my-secret")]);
}

#[tokio::test]
async fn test_present_twice_is_idempotent() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = solver_for(&zones);

    solver.present(&challenge("key-1")).await.unwrap();
    solver.present(&challenge("key-1")).await.unwrap();

    let records = zones.records();
    assert_eq!(txt_records_named(&records, "_acme-challenge").len(), 1);
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_present_with_new_key_overwrites() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = solver_for(&zones);

    solver.present(&challenge("key-1")).await.unwrap();
    solver.present(&challenge("key-2")).await.unwrap();

    let records = zones.records();
    let txt = txt_records_named(&records, "_acme-challenge");
    assert_eq!(txt.len(), 1);
    assert_eq!(txt[0].rdata, "key-2");
}

#[tokio::test]
async fn test_present_invalid_zone_skips_update() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = solver_for(&zones);

    let mut request = challenge("key-1");
    request.resolved_zone = "example.org.".to_string();
    request.resolved_fqdn = "_acme-challenge.example.org.".to_string();

    let err = solver.present(&request).await.unwrap_err();

    assert!(matches!(err, SolverError::InvalidZone { .. }));
    assert_eq!(zones.update_calls(), 0);
}

#[tokio::test]
async fn test_present_unknown_zone_id() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = solver_for(&zones);

    let mut request = challenge("key-1");
    request.config.as_mut().unwrap()["zoneID"] = json!(42);

    let err = solver.present(&request).await.unwrap_err();

    assert!(matches!(err, SolverError::ZoneNotFound { zone_id: 42 }));
    assert_eq!(err.kind(), "zone_not_found");
    assert_eq!(zones.update_calls(), 0);
}

#[tokio::test]
async fn test_present_zone_read_failure() {
    let zones = FakeZones::new("example.com", Vec::new());
    zones.fail_reads_with(503);
    let solver = solver_for(&zones);

    let err = solver.present(&challenge("key-1")).await.unwrap_err();

    match err {
        SolverError::ZoneRead { zone_id, ref source } => {
            assert_eq!(zone_id, ZONE_ID);
            assert!(!source.is_not_found());
        }
        other => panic!("expected ZoneRead, got {other:?}"),
    }
    assert_eq!(zones.update_calls(), 0);
}

#[tokio::test]
async fn test_present_missing_secret() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = solver_for(&zones);

    let mut request = challenge("key-1");
    request.resource_namespace = "other".to_string();

    let err = solver.present(&request).await.unwrap_err();

    assert!(matches!(err, SolverError::SecretNotFound { .. }));
    assert!(zones.state.lock().unwrap().credentials.is_empty());
}

#[tokio::test]
async fn test_present_without_config_fails_at_secret_lookup() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = solver_for(&zones);

    let mut request = challenge("key-1");
    request.config = None;

    let err = solver.present(&request).await.unwrap_err();
    assert!(matches!(err, SolverError::SecretNotFound { .. }));
}

#[tokio::test]
async fn test_present_bad_config() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = solver_for(&zones);

    let mut request = challenge("key-1");
    request.config = Some(json!({ "zoneId": 1 }));

    let err = solver.present(&request).await.unwrap_err();
    assert!(matches!(err, SolverError::ConfigDecode(_)));
}

#[tokio::test]
async fn test_present_before_initialize() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = SakuraCloudSolver::new(Arc::new(zones.clone()));

    let err = solver.present(&challenge("key-1")).await.unwrap_err();
    assert!(matches!(err, SolverError::NotInitialized(_)));
}

#[tokio::test]
async fn test_present_propagates_update_error() {
    struct RejectingZones(FakeZones);

    #[async_trait]
    impl ZoneClient for RejectingZones {
        async fn read_zone(&self, zone_id: i64) -> Result<DnsZone, ProviderError> {
            self.0.read_zone(zone_id).await
        }

        async fn update_records(
            &self,
            _zone_id: i64,
            _records: &[DnsRecord],
            _settings_hash: &str,
        ) -> Result<(), ProviderError> {
            Err(ProviderError::Api {
                status: 409,
                code: "conflict".to_string(),
                message: "settings hash mismatch".to_string(),
            })
        }
    }

    impl ZoneClientFactory for RejectingZones {
        fn zone_client(&self, _: Credentials) -> Result<Box<dyn ZoneClient>, SolverError> {
            Ok(Box::new(RejectingZones(self.0.clone())))
        }
    }

    let zones = FakeZones::new("example.com", Vec::new());
    let solver = SakuraCloudSolver::new(Arc::new(RejectingZones(zones)))
        .with_secret_store(Arc::new(FakeSecretStore::with_credentials()));

    let err = solver.present(&challenge("key-1")).await.unwrap_err();
    assert!(matches!(err, SolverError::ProviderUpdate { .. }));
}

// ============================================================================
// CleanUp
// ============================================================================

#[tokio::test]
async fn test_cleanup_missing_record_skips_update() {
    let zones = FakeZones::new("example.com", vec![record("www", RecordType::A, "192.0.2.1")]);
    let solver = solver_for(&zones);

    solver.cleanup(&challenge("key-1")).await.unwrap();

    assert_eq!(zones.update_calls(), 0);
    assert_eq!(zones.records().len(), 1);
}

#[tokio::test]
async fn test_cleanup_removes_only_matching_txt() {
    let zones = FakeZones::new(
        "example.com",
        vec![
            record("www", RecordType::A, "192.0.2.1"),
            record("_acme-challenge", RecordType::Cname, "elsewhere.example.net."),
            DnsRecord::txt("_acme-challenge.www", "other-key", 60),
            DnsRecord::txt("_acme-challenge", "key-1", 60),
        ],
    );
    let solver = solver_for(&zones);

    solver.cleanup(&challenge("key-1")).await.unwrap();

    let records = zones.records();
    assert_eq!(zones.update_calls(), 1);
    assert_eq!(records.len(), 3);
    assert!(txt_records_named(&records, "_acme-challenge").is_empty());
    assert_eq!(txt_records_named(&records, "_acme-challenge.www").len(), 1);
    assert!(records
        .iter()
        .any(|r| r.name == "_acme-challenge" && r.record_type == RecordType::Cname));
}

#[tokio::test]
async fn test_present_then_cleanup_restores_zone() {
    let original = vec![record("www", RecordType::A, "192.0.2.1")];
    let zones = FakeZones::new("example.com.", original.clone());
    let solver = solver_for(&zones);

    solver.present(&challenge("key-1")).await.unwrap();
    solver.cleanup(&challenge("key-1")).await.unwrap();
    solver.cleanup(&challenge("key-1")).await.unwrap();

    assert_eq!(zones.records(), original);
    assert_eq!(zones.update_calls(), 2);
}

#[tokio::test]
async fn test_cleanup_invalid_fqdn() {
    let zones = FakeZones::new("example.com", Vec::new());
    let solver = solver_for(&zones);

    let mut request = challenge("key-1");
    request.resolved_fqdn = "_acme-challenge.example.net.".to_string();

    let err = solver.cleanup(&request).await.unwrap_err();
    assert!(matches!(err, SolverError::InvalidFqdn { .. }));
    assert_eq!(zones.update_calls(), 0);
}

// ============================================================================
// Name / initialize
// ============================================================================

#[tokio::test]
async fn test_name_and_initialize_with_injected_store() {
    let zones = FakeZones::new("example.com", Vec::new());
    let mut solver = solver_for(&zones);

    assert_eq!(solver.name(), "sakuracloud-dns-solver");

    let config = kube::Config::new("http://127.0.0.1:6443".parse().unwrap());
    solver.initialize(config).await.unwrap();

    // The injected store is kept, so present still resolves fake credentials.
    solver.present(&challenge("key-1")).await.unwrap();
}

#[tokio::test]
async fn test_initialize_builds_secret_store() {
    let zones = FakeZones::new("example.com", Vec::new());
    let mut solver = SakuraCloudSolver::new(Arc::new(zones));

    let config = kube::Config::new("http://127.0.0.1:6443".parse().unwrap());
    solver.initialize(config).await.unwrap();

    assert!(solver.secrets.is_some());
}
