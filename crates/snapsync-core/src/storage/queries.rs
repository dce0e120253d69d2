use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::{params, OptionalExtension, Result};
use tracing::{debug, warn};

use super::models::*;
use super::sqlite::Database;
use crate::api::types::{
    FileSummary, LocationPayload, UploadPayload, WorkflowPayload, WorkflowRunPayload,
    WorkflowRunStepPayload, WorkflowStepPayload,
};

/// Normalize a remote timestamp to RFC 3339 UTC. The remote emits either
/// RFC 3339 (with `Z` or an offset) or a bare `YYYY-MM-DD HH:MM:SS`;
/// anything else becomes NULL with a warning.
pub(crate) fn normalize_datetime(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt).to_rfc3339());
    }
    warn!("Unparsable remote timestamp: {:?}", raw);
    None
}

fn flag(value: Option<i64>) -> bool {
    value.unwrap_or(0) != 0
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

impl Database {
    // ── Mirror Files ─────────────────────────────────────────────

    /// Create-or-update a mirror file from a listing summary, keyed by the
    /// remote id. Never touches nested collections. Returns the local id and
    /// whether the row was created.
    pub fn upsert_file_summary(&self, summary: &FileSummary) -> Result<(i64, bool)> {
        let existing: Option<i64> = self
            .connection()
            .query_row(
                "SELECT id FROM mirror_file WHERE remote_id = ?1",
                params![summary.id],
                |row| row.get(0),
            )
            .optional()?;

        let scan_code = summary.scan_code.clone().unwrap_or_default();
        let created_at = normalize_datetime(summary.created_at.as_deref());
        let updated_at = normalize_datetime(summary.updated_at.as_deref());

        match existing {
            Some(id) => {
                self.connection().execute(
                    "UPDATE mirror_file SET scan_code = ?1, scan_code_format = ?2, \
                     closed = ?3, remote_created_at = ?4, remote_updated_at = ?5, \
                     recent_snap_id = ?6, snap_count = ?7, snap_count_with_damage = ?8, \
                     sync_status = 'pending' WHERE id = ?9",
                    params![
                        scan_code,
                        summary.scan_code_format,
                        flag(summary.closed),
                        created_at,
                        updated_at,
                        summary.recent_snap_id,
                        summary.snap_count.unwrap_or(0),
                        summary.snap_count_with_damage.unwrap_or(0),
                        id,
                    ],
                )?;
                Ok((id, false))
            }
            None => {
                self.connection().execute(
                    "INSERT INTO mirror_file \
                     (remote_id, scan_code, scan_code_format, closed, remote_created_at, \
                      remote_updated_at, recent_snap_id, snap_count, snap_count_with_damage, \
                      sync_status) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending')",
                    params![
                        summary.id,
                        scan_code,
                        summary.scan_code_format,
                        flag(summary.closed),
                        created_at,
                        updated_at,
                        summary.recent_snap_id,
                        summary.snap_count.unwrap_or(0),
                        summary.snap_count_with_damage.unwrap_or(0),
                    ],
                )?;
                Ok((self.connection().last_insert_rowid(), true))
            }
        }
    }

    pub fn get_file(&self, id: i64) -> Result<MirrorFile> {
        self.connection().query_row(
            "SELECT id, remote_id, scan_code, scan_code_format, closed, remote_created_at, \
                    remote_updated_at, recent_snap_id, snap_count, snap_count_with_damage, \
                    sync_status, sync_error, last_synced_at \
             FROM mirror_file WHERE id = ?1",
            params![id],
            map_file_row,
        )
    }

    pub fn get_file_by_remote_id(&self, remote_id: i64) -> Result<Option<MirrorFile>> {
        self.connection()
            .query_row(
                "SELECT id, remote_id, scan_code, scan_code_format, closed, remote_created_at, \
                        remote_updated_at, recent_snap_id, snap_count, snap_count_with_damage, \
                        sync_status, sync_error, last_synced_at \
                 FROM mirror_file WHERE remote_id = ?1",
                params![remote_id],
                map_file_row,
            )
            .optional()
    }

    pub fn set_file_sync_status(&self, file_id: i64, status: FileSyncStatus) -> Result<()> {
        self.connection().execute(
            "UPDATE mirror_file SET sync_status = ?1 WHERE id = ?2",
            params![status.as_str(), file_id],
        )?;
        Ok(())
    }

    pub fn mark_file_sync_completed(&self, file_id: i64) -> Result<()> {
        self.connection().execute(
            "UPDATE mirror_file SET sync_status = 'completed', sync_error = NULL, \
             last_synced_at = ?1 WHERE id = ?2",
            params![now_rfc3339(), file_id],
        )?;
        Ok(())
    }

    pub fn mark_file_sync_error(&self, file_id: i64, message: &str) -> Result<()> {
        self.connection().execute(
            "UPDATE mirror_file SET sync_status = 'error', sync_error = ?1, \
             last_synced_at = ?2 WHERE id = ?3",
            params![message, now_rfc3339(), file_id],
        )?;
        Ok(())
    }

    /// Files whose last detail sync ended in error, oldest first.
    pub fn list_failed_files(&self) -> Result<Vec<MirrorFile>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, remote_id, scan_code, scan_code_format, closed, remote_created_at, \
                    remote_updated_at, recent_snap_id, snap_count, snap_count_with_damage, \
                    sync_status, sync_error, last_synced_at \
             FROM mirror_file WHERE sync_status = 'error' ORDER BY id",
        )?;
        let files = stmt
            .query_map([], map_file_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(files)
    }

    // ── Uploads ──────────────────────────────────────────────────

    /// Full-field upsert keyed by remote id. Local download state
    /// (`local_image_path`, `local_thumb_path`, `image_downloaded`) is never
    /// overwritten here, so re-syncing a file keeps already-downloaded assets.
    pub fn upsert_upload(&self, file_id: i64, payload: &UploadPayload) -> Result<()> {
        self.connection().execute(
            "INSERT INTO upload \
             (remote_id, file_id, tenant_id, device_id, device_nick, upload_type, \
              remote_created_at, captured_at, longitude, latitude, geocoding, has_damage, \
              damage_type_id, damage_type_desc, comment, document_type_id, document_type_desc, \
              workflow_ref, workflow_step_ref, workflow_desc, workflow_step_desc, \
              image_url, thumb_url) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
                     ?17, ?18, ?19, ?20, ?21, ?22, ?23) \
             ON CONFLICT(remote_id) DO UPDATE SET \
                 file_id = excluded.file_id, \
                 tenant_id = excluded.tenant_id, \
                 device_id = excluded.device_id, \
                 device_nick = excluded.device_nick, \
                 upload_type = excluded.upload_type, \
                 remote_created_at = excluded.remote_created_at, \
                 captured_at = excluded.captured_at, \
                 longitude = excluded.longitude, \
                 latitude = excluded.latitude, \
                 geocoding = excluded.geocoding, \
                 has_damage = excluded.has_damage, \
                 damage_type_id = excluded.damage_type_id, \
                 damage_type_desc = excluded.damage_type_desc, \
                 comment = excluded.comment, \
                 document_type_id = excluded.document_type_id, \
                 document_type_desc = excluded.document_type_desc, \
                 workflow_ref = excluded.workflow_ref, \
                 workflow_step_ref = excluded.workflow_step_ref, \
                 workflow_desc = excluded.workflow_desc, \
                 workflow_step_desc = excluded.workflow_step_desc, \
                 image_url = excluded.image_url, \
                 thumb_url = excluded.thumb_url",
            params![
                payload.id,
                file_id,
                payload.tenant_id,
                payload.device_id,
                payload.device_nick,
                payload.upload_type,
                normalize_datetime(payload.created_at.as_deref()),
                normalize_datetime(payload.scan_date_time.as_deref()),
                payload.longitude,
                payload.latitude,
                payload.geocoding.as_ref().map(|v| v.to_string()),
                flag(payload.has_damage),
                payload.damage_type_id,
                payload.damage_type_desc,
                payload.comment,
                payload.document_type_id,
                payload.document_type_desc,
                payload.workflow_id,
                payload.workflow_step_id,
                payload.workflow_description,
                payload.workflow_step_description,
                payload.image_url,
                payload.image_thumb,
            ],
        )?;
        Ok(())
    }

    pub fn uploads_for_file(&self, file_id: i64) -> Result<Vec<Upload>> {
        self.query_uploads(
            "SELECT id, remote_id, file_id, device_nick, upload_type, captured_at, has_damage, \
                    image_url, thumb_url, local_image_path, local_thumb_path, image_downloaded \
             FROM upload WHERE file_id = ?1 ORDER BY id",
            file_id,
        )
    }

    pub fn uploads_pending_download(&self, file_id: i64) -> Result<Vec<Upload>> {
        self.query_uploads(
            "SELECT id, remote_id, file_id, device_nick, upload_type, captured_at, has_damage, \
                    image_url, thumb_url, local_image_path, local_thumb_path, image_downloaded \
             FROM upload WHERE file_id = ?1 AND image_downloaded = 0 ORDER BY id",
            file_id,
        )
    }

    fn query_uploads(&self, sql: &str, file_id: i64) -> Result<Vec<Upload>> {
        let mut stmt = self.connection().prepare(sql)?;
        let uploads = stmt
            .query_map(params![file_id], |row| {
                Ok(Upload {
                    id: row.get(0)?,
                    remote_id: row.get(1)?,
                    file_id: row.get(2)?,
                    device_nick: row.get(3)?,
                    upload_type: row.get(4)?,
                    captured_at: row.get(5)?,
                    has_damage: row.get(6)?,
                    image_url: row.get(7)?,
                    thumb_url: row.get(8)?,
                    local_image_path: row.get(9)?,
                    local_thumb_path: row.get(10)?,
                    image_downloaded: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(uploads)
    }

    /// Record successful asset downloads. Paths are relative to the media
    /// root; a `None` keeps whatever was stored before (asset had no URL).
    pub fn mark_upload_downloaded(
        &self,
        upload_id: i64,
        image_path: Option<&str>,
        thumb_path: Option<&str>,
    ) -> Result<()> {
        self.connection().execute(
            "UPDATE upload SET \
                 local_image_path = COALESCE(?1, local_image_path), \
                 local_thumb_path = COALESCE(?2, local_thumb_path), \
                 image_downloaded = 1 \
             WHERE id = ?3",
            params![image_path, thumb_path, upload_id],
        )?;
        Ok(())
    }

    // ── Locations / Custom Fields / Form Submits ─────────────────

    pub fn upsert_location(&self, file_id: i64, payload: &LocationPayload) -> Result<()> {
        self.connection().execute(
            "INSERT INTO file_location (file_id, remote_id, location) VALUES (?1, ?2, ?3) \
             ON CONFLICT(file_id, remote_id) DO UPDATE SET location = excluded.location",
            params![
                file_id,
                payload.id,
                payload.location.clone().unwrap_or_default()
            ],
        )?;
        Ok(())
    }

    /// Custom fields have no stable remote key and are append-only by design
    /// of the source system; repeated syncs add rows rather than update.
    pub fn insert_custom_field(
        &self,
        file_id: i64,
        name: &str,
        value: &str,
        payload_json: &str,
    ) -> Result<()> {
        self.connection().execute(
            "INSERT INTO custom_field (file_id, name, value, payload) VALUES (?1, ?2, ?3, ?4)",
            params![file_id, name, value, payload_json],
        )?;
        Ok(())
    }

    pub fn upsert_form_submit(
        &self,
        file_id: i64,
        remote_id: i64,
        payload_json: &str,
    ) -> Result<()> {
        self.connection().execute(
            "INSERT INTO form_submit (remote_id, file_id, payload) VALUES (?1, ?2, ?3) \
             ON CONFLICT(remote_id) DO UPDATE SET \
                 file_id = excluded.file_id, payload = excluded.payload",
            params![remote_id, file_id, payload_json],
        )?;
        Ok(())
    }

    // ── Workflows ────────────────────────────────────────────────

    /// Upsert a workflow definition by remote id and return the local id.
    pub fn upsert_workflow(&self, payload: &WorkflowPayload) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO workflow \
             (remote_id, tenant_id, name, workflow_type, force_start, language, \
              location_filter, close_file_after_completion, clear_app_after_completion, \
              sort_order, info_url, remote_created_at, remote_updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT(remote_id) DO UPDATE SET \
                 tenant_id = excluded.tenant_id, \
                 name = excluded.name, \
                 workflow_type = excluded.workflow_type, \
                 force_start = excluded.force_start, \
                 language = excluded.language, \
                 location_filter = excluded.location_filter, \
                 close_file_after_completion = excluded.close_file_after_completion, \
                 clear_app_after_completion = excluded.clear_app_after_completion, \
                 sort_order = excluded.sort_order, \
                 info_url = excluded.info_url, \
                 remote_created_at = excluded.remote_created_at, \
                 remote_updated_at = excluded.remote_updated_at",
            params![
                payload.id,
                payload.tenant_id,
                payload.name.clone().unwrap_or_default(),
                payload.workflow_type,
                flag(payload.force),
                payload.language,
                payload.location_filter,
                flag(payload.close_file_after_completion),
                flag(payload.clear_app_after_completion),
                payload.sort_order.unwrap_or(0),
                payload.info_url,
                normalize_datetime(payload.created_at.as_deref()),
                normalize_datetime(payload.updated_at.as_deref()),
            ],
        )?;
        self.connection().query_row(
            "SELECT id FROM workflow WHERE remote_id = ?1",
            params![payload.id],
            |row| row.get(0),
        )
    }

    pub fn upsert_workflow_step(
        &self,
        workflow_id: i64,
        payload: &WorkflowStepPayload,
    ) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO workflow_step \
             (remote_id, workflow_id, tenant_id, sort_order, description, step_type, \
              allow_skip, platform_description, payload, info_url) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             ON CONFLICT(remote_id) DO UPDATE SET \
                 workflow_id = excluded.workflow_id, \
                 tenant_id = excluded.tenant_id, \
                 sort_order = excluded.sort_order, \
                 description = excluded.description, \
                 step_type = excluded.step_type, \
                 allow_skip = excluded.allow_skip, \
                 platform_description = excluded.platform_description, \
                 payload = excluded.payload, \
                 info_url = excluded.info_url",
            params![
                payload.id,
                workflow_id,
                payload.tenant_id,
                payload.sort_order.unwrap_or(0),
                payload.description,
                payload.step_type,
                flag(payload.allow_skip),
                payload.platform_description,
                payload.data.as_ref().map(|v| v.to_string()),
                payload.info_url,
            ],
        )?;
        self.connection().query_row(
            "SELECT id FROM workflow_step WHERE remote_id = ?1",
            params![payload.id],
            |row| row.get(0),
        )
    }

    /// Local id of a mirrored workflow step, by its remote id. `None` means
    /// the step has not been mirrored yet.
    pub fn find_workflow_step_id(&self, remote_id: i64) -> Result<Option<i64>> {
        self.connection()
            .query_row(
                "SELECT id FROM workflow_step WHERE remote_id = ?1",
                params![remote_id],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn upsert_workflow_run(
        &self,
        file_id: i64,
        workflow_id: Option<i64>,
        payload: &WorkflowRunPayload,
    ) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO workflow_run \
             (remote_id, file_id, workflow_id, client_key, tenant_id, submitted_at, \
              remote_created_at, remote_updated_at, completed_at, started_on_device_at, \
              finished_on_device_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             ON CONFLICT(remote_id) DO UPDATE SET \
                 file_id = excluded.file_id, \
                 workflow_id = excluded.workflow_id, \
                 client_key = excluded.client_key, \
                 tenant_id = excluded.tenant_id, \
                 submitted_at = excluded.submitted_at, \
                 remote_created_at = excluded.remote_created_at, \
                 remote_updated_at = excluded.remote_updated_at, \
                 completed_at = excluded.completed_at, \
                 started_on_device_at = excluded.started_on_device_at, \
                 finished_on_device_at = excluded.finished_on_device_at",
            params![
                payload.id,
                file_id,
                workflow_id,
                payload.client_key,
                payload.tenant_id,
                normalize_datetime(payload.submit_date_time.as_deref()),
                normalize_datetime(payload.created_at.as_deref()),
                normalize_datetime(payload.updated_at.as_deref()),
                normalize_datetime(payload.completed_at.as_deref()),
                normalize_datetime(payload.started_on_device_at.as_deref()),
                normalize_datetime(payload.finished_on_device_at.as_deref()),
            ],
        )?;
        self.connection().query_row(
            "SELECT id FROM workflow_run WHERE remote_id = ?1",
            params![payload.id],
            |row| row.get(0),
        )
    }

    pub fn upsert_workflow_run_step(
        &self,
        run_id: i64,
        step_id: i64,
        payload: &WorkflowRunStepPayload,
    ) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO workflow_run_step \
             (remote_id, run_id, step_id, entity_type, status, entity_ids, device_id, \
              tenant_id, submitted_at, remote_created_at, remote_updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             ON CONFLICT(remote_id) DO UPDATE SET \
                 run_id = excluded.run_id, \
                 step_id = excluded.step_id, \
                 entity_type = excluded.entity_type, \
                 status = excluded.status, \
                 entity_ids = excluded.entity_ids, \
                 device_id = excluded.device_id, \
                 tenant_id = excluded.tenant_id, \
                 submitted_at = excluded.submitted_at, \
                 remote_created_at = excluded.remote_created_at, \
                 remote_updated_at = excluded.remote_updated_at",
            params![
                payload.id,
                run_id,
                step_id,
                payload.entity_type,
                payload.status,
                payload.entity_ids.as_ref().map(|v| v.to_string()),
                payload.device_id,
                payload.tenant_id,
                normalize_datetime(payload.submit_date_time.as_deref()),
                normalize_datetime(payload.created_at.as_deref()),
                normalize_datetime(payload.updated_at.as_deref()),
            ],
        )?;
        self.connection().query_row(
            "SELECT id FROM workflow_run_step WHERE remote_id = ?1",
            params![payload.id],
            |row| row.get(0),
        )
    }

    // ── Sync Runs ────────────────────────────────────────────────

    pub fn create_sync_run(&self) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO sync_run (started_at, status) VALUES (?1, 'running')",
            params![now_rfc3339()],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn set_sync_run_pages(&self, run_id: i64, total_pages: u32) -> Result<()> {
        self.connection().execute(
            "UPDATE sync_run SET total_pages = ?1 WHERE id = ?2",
            params![total_pages, run_id],
        )?;
        Ok(())
    }

    pub fn set_sync_run_current_page(&self, run_id: i64, page: u32) -> Result<()> {
        self.connection().execute(
            "UPDATE sync_run SET current_page = ?1 WHERE id = ?2",
            params![page, run_id],
        )?;
        Ok(())
    }

    pub fn update_sync_run_counters(&self, run_id: i64, counters: &RunCounters) -> Result<()> {
        self.connection().execute(
            "UPDATE sync_run SET files_processed = ?1, files_created = ?2, \
             files_updated = ?3, files_failed = ?4, images_downloaded = ?5, \
             images_failed = ?6 WHERE id = ?7",
            params![
                counters.files_processed,
                counters.files_created,
                counters.files_updated,
                counters.files_failed,
                counters.images_downloaded,
                counters.images_failed,
                run_id,
            ],
        )?;
        Ok(())
    }

    pub fn finish_sync_run(
        &self,
        run_id: i64,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        self.connection().execute(
            "UPDATE sync_run SET status = ?1, error_message = ?2, finished_at = ?3 \
             WHERE id = ?4",
            params![status.as_str(), error_message, now_rfc3339(), run_id],
        )?;
        Ok(())
    }

    /// Finalize runs left in `running` by a dead process. Returns how many
    /// rows were swept.
    pub fn mark_stale_runs(&self) -> Result<usize> {
        let swept = self.connection().execute(
            "UPDATE sync_run SET status = 'error', \
             error_message = 'interrupted before completion', finished_at = ?1 \
             WHERE status = 'running'",
            params![now_rfc3339()],
        )?;
        if swept > 0 {
            debug!("Swept {} stale running sync run(s)", swept);
        }
        Ok(swept)
    }

    pub fn get_sync_run(&self, run_id: i64) -> Result<SyncRun> {
        self.connection().query_row(
            "SELECT id, started_at, finished_at, status, files_processed, files_created, \
                    files_updated, files_failed, images_downloaded, images_failed, \
                    total_pages, current_page, error_message, detail \
             FROM sync_run WHERE id = ?1",
            params![run_id],
            map_run_row,
        )
    }

    pub fn list_sync_runs(&self, limit: u32) -> Result<Vec<SyncRun>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, started_at, finished_at, status, files_processed, files_created, \
                    files_updated, files_failed, images_downloaded, images_failed, \
                    total_pages, current_page, error_message, detail \
             FROM sync_run ORDER BY id DESC LIMIT ?1",
        )?;
        let runs = stmt
            .query_map(params![limit], map_run_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(runs)
    }

    // ── Statistics ───────────────────────────────────────────────

    pub fn mirror_stats(&self) -> Result<MirrorStats> {
        let count = |sql: &str| -> Result<i64> {
            self.connection().query_row(sql, [], |row| row.get(0))
        };
        Ok(MirrorStats {
            files: count("SELECT COUNT(*) FROM mirror_file")?,
            files_failed: count("SELECT COUNT(*) FROM mirror_file WHERE sync_status = 'error'")?,
            uploads: count("SELECT COUNT(*) FROM upload")?,
            uploads_with_damage: count("SELECT COUNT(*) FROM upload WHERE has_damage = 1")?,
            uploads_downloaded: count("SELECT COUNT(*) FROM upload WHERE image_downloaded = 1")?,
            locations: count("SELECT COUNT(*) FROM file_location")?,
            custom_fields: count("SELECT COUNT(*) FROM custom_field")?,
            form_submits: count("SELECT COUNT(*) FROM form_submit")?,
            workflows: count("SELECT COUNT(*) FROM workflow")?,
            workflow_steps: count("SELECT COUNT(*) FROM workflow_step")?,
            workflow_runs: count("SELECT COUNT(*) FROM workflow_run")?,
            workflow_run_steps: count("SELECT COUNT(*) FROM workflow_run_step")?,
        })
    }
}

fn map_file_row(row: &rusqlite::Row<'_>) -> Result<MirrorFile> {
    Ok(MirrorFile {
        id: row.get(0)?,
        remote_id: row.get(1)?,
        scan_code: row.get(2)?,
        scan_code_format: row.get(3)?,
        closed: row.get(4)?,
        remote_created_at: row.get(5)?,
        remote_updated_at: row.get(6)?,
        recent_snap_id: row.get(7)?,
        snap_count: row.get(8)?,
        snap_count_with_damage: row.get(9)?,
        sync_status: row.get(10)?,
        sync_error: row.get(11)?,
        last_synced_at: row.get(12)?,
    })
}

fn map_run_row(row: &rusqlite::Row<'_>) -> Result<SyncRun> {
    Ok(SyncRun {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        status: row.get(3)?,
        files_processed: row.get(4)?,
        files_created: row.get(5)?,
        files_updated: row.get(6)?,
        files_failed: row.get(7)?,
        images_downloaded: row.get(8)?,
        images_failed: row.get(9)?,
        total_pages: row.get(10)?,
        current_page: row.get(11)?,
        error_message: row.get(12)?,
        detail: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_datetime;

    #[test]
    fn test_normalize_rfc3339_with_zulu() {
        let out = normalize_datetime(Some("2024-05-01T10:00:00Z")).unwrap();
        assert!(out.starts_with("2024-05-01T10:00:00"));
    }

    #[test]
    fn test_normalize_bare_datetime() {
        let out = normalize_datetime(Some("2024-05-01 10:00:00")).unwrap();
        assert!(out.starts_with("2024-05-01T10:00:00"));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_datetime(Some("not-a-date")), None);
        assert_eq!(normalize_datetime(Some("")), None);
        assert_eq!(normalize_datetime(None), None);
    }
}
