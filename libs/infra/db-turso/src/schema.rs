// [libs/infra/db-turso/src/schema.rs]
/*!
 * Esquema relacional para las tablas de §6: Lead, Sentiment, Profile,
 * Interaction, Carrier, Shipment, Escrow, CarrierChange,
 * DisputeResolution, AuditLog, PersuasionStrategy, LevelState,
 * SagaJournal. Las tablas append-only (`audit_log`, `carrier_change`,
 * `saga_journal`) no exponen ninguna vía de UPDATE/DELETE en los
 * repositorios que las consumen.
 */

use libsql::Connection;

use crate::errors::DbError;

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS leads (
        id TEXT PRIMARY KEY,
        contact_name TEXT NOT NULL,
        contact_email TEXT,
        contact_phone TEXT,
        status TEXT NOT NULL,
        owning_agent TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS sentiment_records (
        id TEXT PRIMARY KEY,
        lead_id TEXT NOT NULL REFERENCES leads(id),
        call_id TEXT NOT NULL UNIQUE,
        score REAL NOT NULL,
        emotions_json TEXT NOT NULL,
        dominant_emotion TEXT NOT NULL,
        confidence REAL NOT NULL,
        method TEXT NOT NULL,
        requires_escalation INTEGER NOT NULL,
        analyzed_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS psych_profiles (
        lead_id TEXT PRIMARY KEY REFERENCES leads(id),
        profile_type TEXT NOT NULL,
        decision_speed INTEGER NOT NULL,
        risk_tolerance INTEGER NOT NULL,
        price_sensitivity INTEGER NOT NULL,
        communication_pref TEXT NOT NULL,
        similarity_vector_json TEXT,
        converted INTEGER NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS interactions (
        id TEXT PRIMARY KEY,
        lead_id TEXT NOT NULL REFERENCES leads(id),
        agent TEXT NOT NULL,
        sentiment_id TEXT,
        channel TEXT NOT NULL,
        summary TEXT NOT NULL,
        occurred_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS carriers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        mode TEXT NOT NULL,
        on_time_rate REAL NOT NULL,
        reliability_score REAL NOT NULL,
        wallet_identity TEXT NOT NULL,
        enabled INTEGER NOT NULL,
        blacklisted_until TEXT,
        covered_routes_json TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS shipments (
        id TEXT PRIMARY KEY,
        tracking_code TEXT NOT NULL UNIQUE,
        carrier_id TEXT NOT NULL REFERENCES carriers(id),
        origin TEXT NOT NULL,
        destination TEXT NOT NULL,
        weight_kg REAL NOT NULL,
        declared_value REAL NOT NULL,
        status TEXT NOT NULL,
        planned_delivery_at TEXT NOT NULL,
        actual_delivery_at TEXT,
        current_position_json TEXT,
        cost REAL NOT NULL,
        sale_price REAL NOT NULL,
        saga_in_progress INTEGER NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS escrow_records (
        id TEXT PRIMARY KEY,
        shipment_id TEXT NOT NULL REFERENCES shipments(id),
        status TEXT NOT NULL,
        amount REAL NOT NULL,
        deadline TEXT NOT NULL,
        failover_count INTEGER NOT NULL DEFAULT 0,
        original_carrier TEXT NOT NULL,
        current_carrier TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS carrier_changes (
        id TEXT PRIMARY KEY,
        shipment_id TEXT NOT NULL REFERENCES shipments(id),
        from_carrier TEXT NOT NULL,
        to_carrier TEXT NOT NULL,
        reason_code TEXT NOT NULL,
        executed_by TEXT NOT NULL,
        ledger_tx_id TEXT,
        success INTEGER NOT NULL,
        compensating_tx_id TEXT,
        occurred_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS dispute_resolutions (
        id TEXT PRIMARY KEY,
        shipment_id TEXT NOT NULL REFERENCES shipments(id),
        carrier_wins INTEGER NOT NULL,
        refund_amount REAL NOT NULL,
        evidence_digest TEXT NOT NULL,
        ai_analysis_digest TEXT NOT NULL,
        confidence INTEGER NOT NULL,
        resolved_at TEXT NOT NULL,
        resolver TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS audit_log (
        id TEXT PRIMARY KEY,
        decision_kind TEXT NOT NULL,
        input_digest TEXT NOT NULL,
        output_digest TEXT NOT NULL,
        feature_importance_summary TEXT NOT NULL,
        rationale TEXT NOT NULL,
        human_override INTEGER NOT NULL,
        recorded_at TEXT NOT NULL,
        retention_until TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS persuasion_strategies (
        id TEXT PRIMARY KEY,
        profile_type TEXT NOT NULL,
        stage TEXT NOT NULL,
        template TEXT NOT NULL,
        pattern_tags_json TEXT NOT NULL,
        objection_handlers_json TEXT NOT NULL,
        success_rate REAL NOT NULL,
        active INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS level_state (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        current_level TEXT NOT NULL,
        consecutive_months_over_next_threshold INTEGER NOT NULL,
        last_transition_at TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS saga_journal (
        saga_id TEXT NOT NULL,
        step_index INTEGER NOT NULL,
        step_name TEXT NOT NULL,
        status TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        PRIMARY KEY (saga_id, step_index)
    )"#,
];

pub async fn apply_schema(connection: &Connection) -> Result<(), DbError> {
    for statement in SCHEMA_STATEMENTS {
        connection.execute(statement, ()).await?;
    }
    Ok(())
}
