// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SakuraCloud DNS data model and API payloads.
//!
//! DNS zones are SakuraCloud "common service items". The record list lives
//! under `Settings.DNS.ResourceRecordSets` and every update must carry the
//! zone's current `SettingsHash`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// DNS record type as spelled by the SakuraCloud API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Alias,
    Caa,
    Cname,
    Https,
    Mx,
    Ns,
    Ptr,
    Srv,
    Svcb,
    Txt,
    /// A type this crate does not model; preserved verbatim on update
    Other(String),
}

impl RecordType {
    /// Wire spelling of the record type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Alias => "ALIAS",
            Self::Caa => "CAA",
            Self::Cname => "CNAME",
            Self::Https => "HTTPS",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Ptr => "PTR",
            Self::Srv => "SRV",
            Self::Svcb => "SVCB",
            Self::Txt => "TXT",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "A" => Self::A,
            "AAAA" => Self::Aaaa,
            "ALIAS" => Self::Alias,
            "CAA" => Self::Caa,
            "CNAME" => Self::Cname,
            "HTTPS" => Self::Https,
            "MX" => Self::Mx,
            "NS" => Self::Ns,
            "PTR" => Self::Ptr,
            "SRV" => Self::Srv,
            "SVCB" => Self::Svcb,
            "TXT" => Self::Txt,
            _ => Self::Other(value),
        }
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resource record inside a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Name relative to the zone (`@` for the apex)
    #[serde(rename = "Name")]
    pub name: String,

    /// Record type
    #[serde(rename = "Type")]
    pub record_type: RecordType,

    /// Record data
    #[serde(rename = "RData")]
    pub rdata: String,

    /// TTL in seconds; zero means the zone default
    #[serde(rename = "TTL", default, skip_serializing_if = "is_zero")]
    pub ttl: u32,
}

impl DnsRecord {
    /// Build a TXT record.
    #[must_use]
    pub fn txt(name: &str, value: &str, ttl: u32) -> Self {
        Self {
            name: name.to_string(),
            record_type: RecordType::Txt,
            rdata: value.to_string(),
            ttl,
        }
    }

    /// Returns `true` if this is a TXT record named `name`.
    #[must_use]
    pub fn is_txt_named(&self, name: &str) -> bool {
        self.record_type == RecordType::Txt && self.name == name
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// A SakuraCloud DNS zone as read from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsZone {
    /// Resource ID
    pub id: i64,
    /// Zone name, e.g. `example.com`
    pub name: String,
    /// All records in the zone
    pub records: Vec<DnsRecord>,
    /// Optimistic-concurrency token required for updates
    pub settings_hash: String,
}

// ============================================================================
// API payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ReadZoneResponse {
    #[serde(rename = "CommonServiceItem")]
    pub item: CommonServiceItem,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommonServiceItem {
    #[serde(rename = "ID", deserialize_with = "deserialize_id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Settings", default)]
    pub settings: Option<ZoneSettings>,
    #[serde(rename = "SettingsHash", default)]
    pub settings_hash: Option<String>,
}

impl From<CommonServiceItem> for DnsZone {
    fn from(item: CommonServiceItem) -> Self {
        let records = item
            .settings
            .and_then(|settings| settings.dns)
            .and_then(|dns| dns.resource_record_sets)
            .unwrap_or_default();

        Self {
            id: item.id,
            name: item.name,
            records,
            settings_hash: item.settings_hash.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ZoneSettings {
    #[serde(rename = "DNS", default)]
    pub dns: Option<DnsSettings>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DnsSettings {
    #[serde(rename = "ResourceRecordSets", default)]
    pub resource_record_sets: Option<Vec<DnsRecord>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateZoneRequest<'a> {
    #[serde(rename = "CommonServiceItem")]
    pub item: UpdateZoneItem<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateZoneItem<'a> {
    #[serde(rename = "Settings")]
    pub settings: UpdateZoneSettings<'a>,
    #[serde(rename = "SettingsHash")]
    pub settings_hash: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateZoneSettings<'a> {
    #[serde(rename = "DNS")]
    pub dns: UpdateDnsSettings<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateDnsSettings<'a> {
    #[serde(rename = "ResourceRecordSets")]
    pub resource_record_sets: &'a [DnsRecord],
}

impl<'a> UpdateZoneRequest<'a> {
    pub(crate) fn new(records: &'a [DnsRecord], settings_hash: &'a str) -> Self {
        Self {
            item: UpdateZoneItem {
                settings: UpdateZoneSettings {
                    dns: UpdateDnsSettings {
                        resource_record_sets: records,
                    },
                },
                settings_hash,
            },
        }
    }
}

/// Error body returned by the API on failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

/// SakuraCloud serializes IDs as strings in most responses and as numbers in a few.
fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
