//! Deserialization types for the remote inspection API.
//!
//! Every field the remote may omit is an `Option`; boolean-ish values arrive
//! as 0/1 integers and are kept that way until mapped into the mirror.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of the paginated file listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FileListPage {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default = "default_last_page")]
    pub last_page: u32,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub data: Vec<FileSummary>,
}

fn default_last_page() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileSummary {
    pub id: i64,
    #[serde(default)]
    pub scan_code: Option<String>,
    #[serde(default)]
    pub scan_code_format: Option<String>,
    #[serde(default)]
    pub closed: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub recent_snap_id: Option<i64>,
    #[serde(default)]
    pub snap_count: Option<i64>,
    #[serde(default)]
    pub snap_count_with_damage: Option<i64>,
}

/// Full detail payload for one file: the summary fields plus every nested
/// collection the mirror tracks.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDetail {
    #[serde(flatten)]
    pub summary: FileSummary,
    #[serde(default)]
    pub uploads: Vec<UploadPayload>,
    #[serde(default)]
    pub locations: Vec<LocationPayload>,
    #[serde(default)]
    pub fields: Vec<FieldPayload>,
    #[serde(default)]
    pub form_submits: Vec<FormSubmitPayload>,
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRunPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadPayload {
    pub id: i64,
    #[serde(default)]
    pub tenant_id: Option<i64>,
    #[serde(default)]
    pub device_id: Option<i64>,
    #[serde(default)]
    pub device_nick: Option<String>,
    #[serde(default)]
    pub upload_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub scan_date_time: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub geocoding: Option<Value>,
    #[serde(default)]
    pub has_damage: Option<i64>,
    #[serde(default)]
    pub damage_type_id: Option<i64>,
    #[serde(default)]
    pub damage_type_desc: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub document_type_id: Option<i64>,
    #[serde(default)]
    pub document_type_desc: Option<String>,
    #[serde(default)]
    pub workflow_id: Option<i64>,
    #[serde(default)]
    pub workflow_step_id: Option<i64>,
    #[serde(default)]
    pub workflow_description: Option<String>,
    #[serde(default)]
    pub workflow_step_description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_thumb: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Custom fields carry no stable remote key; the full object is kept so the
/// mirror can store it opaquely alongside the extracted name/value pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmitPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunPayload {
    pub id: i64,
    #[serde(default)]
    pub client_key: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<i64>,
    #[serde(default)]
    pub submit_date_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub started_on_device_at: Option<String>,
    #[serde(default)]
    pub finished_on_device_at: Option<String>,
    #[serde(default)]
    pub workflow: Option<WorkflowPayload>,
    #[serde(default)]
    pub workflow_run_steps: Vec<WorkflowRunStepPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowPayload {
    pub id: i64,
    #[serde(default)]
    pub tenant_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub workflow_type: Option<String>,
    #[serde(default)]
    pub force: Option<i64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub location_filter: Option<String>,
    #[serde(default)]
    pub close_file_after_completion: Option<i64>,
    #[serde(default)]
    pub clear_app_after_completion: Option<i64>,
    #[serde(rename = "order", default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub info_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub steps: Vec<WorkflowStepPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowStepPayload {
    pub id: i64,
    #[serde(default)]
    pub tenant_id: Option<i64>,
    #[serde(rename = "order", default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub step_type: Option<String>,
    #[serde(default)]
    pub allow_skip: Option<i64>,
    #[serde(default)]
    pub platform_description: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub info_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunStepPayload {
    pub id: i64,
    #[serde(default)]
    pub workflow_step_id: Option<i64>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub entity_ids: Option<Value>,
    #[serde(default)]
    pub device_id: Option<i64>,
    #[serde(default)]
    pub tenant_id: Option<i64>,
    #[serde(default)]
    pub submit_date_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
