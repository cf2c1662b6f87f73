use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                role            TEXT NOT NULL CHECK (role IN ('donor', 'hospital')),
                name            TEXT NOT NULL,
                blood_group     TEXT,
                location_lat    REAL,
                location_lng    REAL,
                donation_count  INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                CHECK ((location_lat IS NULL) = (location_lng IS NULL))
            );

            CREATE TABLE blood_requests (
                id          TEXT PRIMARY KEY,
                hospital_id TEXT NOT NULL REFERENCES users(id),
                blood_type  TEXT NOT NULL,
                persons     INTEGER NOT NULL CHECK (persons >= 1),
                status      TEXT NOT NULL DEFAULT 'Open'
                            CHECK (status IN ('Open', 'Partially Filled', 'Closed')),
                notes       TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_blood_requests_status
                ON blood_requests(status, created_at);

            CREATE INDEX idx_blood_requests_hospital
                ON blood_requests(hospital_id, created_at);

            CREATE TABLE donor_responses (
                id              TEXT PRIMARY KEY,
                request_id      TEXT NOT NULL REFERENCES blood_requests(id),
                donor_id        TEXT NOT NULL REFERENCES users(id),
                status          TEXT NOT NULL DEFAULT 'Pending'
                                CHECK (status IN ('Pending', 'Donated')),
                created_at      TEXT NOT NULL,
                last_updated_at TEXT NOT NULL,
                UNIQUE(request_id, donor_id)
            );

            CREATE INDEX idx_donor_responses_donor
                ON donor_responses(donor_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
