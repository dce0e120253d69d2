//! Converts raw remote payloads into mirror rows.
//!
//! All upserts are keyed by remote id and idempotent. The nested detail graph
//! of one file is applied inside a single transaction: either every nested
//! entity lands together with `sync_status = completed`, or the transaction
//! rolls back and the failure is recorded on the file in a follow-up write
//! that survives the rollback.

use tracing::warn;

use crate::api::types::{
    FileDetail, FileSummary, WorkflowPayload, WorkflowRunPayload, WorkflowRunStepPayload,
};
use crate::error::Error;
use crate::storage::{Database, FileSyncStatus};

/// Create-or-update the top-level mirror file from a listing summary.
/// Returns the local id and whether the row was created.
pub fn upsert_file(db: &Database, summary: &FileSummary) -> Result<(i64, bool), Error> {
    Ok(db.upsert_file_summary(summary)?)
}

/// Apply a file's full nested detail payload.
///
/// Collections are applied in dependency order: uploads, locations, fields,
/// form submits, workflow runs (each run upserts its workflow and the
/// workflow's steps before any run step references them).
pub fn sync_file_details(db: &Database, file_id: i64, detail: &FileDetail) -> Result<(), Error> {
    let result = apply_details(db, file_id, detail);
    if let Err(ref err) = result {
        db.mark_file_sync_error(file_id, &err.to_string())?;
    }
    result
}

fn apply_details(db: &Database, file_id: i64, detail: &FileDetail) -> Result<(), Error> {
    let tx = db.connection().unchecked_transaction()?;
    db.set_file_sync_status(file_id, FileSyncStatus::Syncing)?;

    for upload in &detail.uploads {
        db.upsert_upload(file_id, upload)?;
    }

    for location in &detail.locations {
        db.upsert_location(file_id, location)?;
    }

    for field in &detail.fields {
        let payload_json = serde_json::to_string(field).unwrap_or_default();
        db.insert_custom_field(
            file_id,
            field.name.as_deref().unwrap_or(""),
            field.value.as_deref().unwrap_or(""),
            &payload_json,
        )?;
    }

    for form in &detail.form_submits {
        match form.id {
            Some(remote_id) => {
                let payload_json = serde_json::to_string(form).unwrap_or_default();
                db.upsert_form_submit(file_id, remote_id, &payload_json)?;
            }
            None => {
                warn!("Form submit without remote id on file {} - skipping", file_id);
            }
        }
    }

    for run in &detail.workflow_runs {
        sync_workflow_run(db, file_id, run)?;
    }

    db.mark_file_sync_completed(file_id)?;
    tx.commit()?;
    Ok(())
}

fn sync_workflow_run(
    db: &Database,
    file_id: i64,
    payload: &WorkflowRunPayload,
) -> Result<(), Error> {
    // The workflow and its steps must be mirrored before any run step
    // resolves against them.
    let workflow_id = match &payload.workflow {
        Some(workflow) => Some(sync_workflow(db, workflow)?),
        None => None,
    };

    let run_id = db.upsert_workflow_run(file_id, workflow_id, payload)?;

    for step in &payload.workflow_run_steps {
        sync_workflow_run_step(db, run_id, step)?;
    }
    Ok(())
}

fn sync_workflow(db: &Database, payload: &WorkflowPayload) -> Result<i64, Error> {
    let workflow_id = db.upsert_workflow(payload)?;

    let mut steps: Vec<_> = payload.steps.iter().collect();
    steps.sort_by_key(|step| step.sort_order.unwrap_or(0));
    for step in steps {
        db.upsert_workflow_step(workflow_id, step)?;
    }
    Ok(workflow_id)
}

/// Upsert one run step, resolving its workflow step by remote id first.
/// Returns `None` when the referenced step is not mirrored: the run step is
/// skipped entirely, with a warning but no error.
fn sync_workflow_run_step(
    db: &Database,
    run_id: i64,
    payload: &WorkflowRunStepPayload,
) -> Result<Option<i64>, Error> {
    let step_remote_id = match payload.workflow_step_id {
        Some(id) => id,
        None => {
            warn!(
                "Run step {} carries no workflow step reference - skipping",
                payload.id
            );
            return Ok(None);
        }
    };

    match db.find_workflow_step_id(step_remote_id)? {
        Some(step_id) => Ok(Some(db.upsert_workflow_run_step(run_id, step_id, payload)?)),
        None => {
            warn!(
                "Workflow step {} not mirrored - skipping run step {}",
                step_remote_id, payload.id
            );
            Ok(None)
        }
    }
}
