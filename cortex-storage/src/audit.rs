//! `memory_audit_logs` table operations (append-only, invariant 7).

use cortex_core::error::Result;
use cortex_core::model::AuditRecord;
use uuid::Uuid;

use crate::error::storage_error;
use crate::rows::{dt_to_text, enum_to_text, json_to_text, row_to_audit};
use crate::CortexStore;

const AUDIT_COLUMNS: &str = "id, memory_id, action, actor_type, diff, created_at";

impl CortexStore {
    pub(crate) async fn do_insert_audit(&self, record: AuditRecord) -> Result<()> {
        let conn = self.connect()?;
        let sql = format!("INSERT INTO memory_audit_logs ({AUDIT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)");
        conn.execute(
            &sql,
            libsql::params![
                record.id.to_string(),
                record.memory_id.to_string(),
                enum_to_text(&record.action)?,
                enum_to_text(&record.actor_type)?,
                json_to_text(&record.diff)?,
                dt_to_text(record.created_at),
            ],
        )
        .await
        .map_err(|e| storage_error("failed to insert audit record", e))?;
        Ok(())
    }

    pub(crate) async fn do_list_audit_for_memory(&self, memory_id: Uuid) -> Result<Vec<AuditRecord>> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM memory_audit_logs WHERE memory_id = ? ORDER BY created_at"
        );
        let mut rows = conn
            .query(&sql, libsql::params![memory_id.to_string()])
            .await
            .map_err(|e| storage_error("failed to query audit trail", e))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| storage_error("failed to fetch audit row", e))?
        {
            out.push(row_to_audit(&row)?);
        }
        Ok(out)
    }
}
