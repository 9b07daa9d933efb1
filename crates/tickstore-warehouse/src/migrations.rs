//! Versioned schema migrations.

use ::duckdb::Connection;
use tracing::debug;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_tickers_and_tiers",
        sql: r#"
CREATE TABLE IF NOT EXISTS tickers (
    id BIGINT PRIMARY KEY,
    symbol TEXT NOT NULL UNIQUE,
    name TEXT,
    created_at_ns BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS live_data (
    id BIGINT PRIMARY KEY,
    ticker_id BIGINT NOT NULL REFERENCES tickers(id),
    price DOUBLE NOT NULL,
    change DOUBLE,
    percent_change DOUBLE,
    observed_at_ns BIGINT NOT NULL,
    inserted_at_ns BIGINT NOT NULL,
    UNIQUE(ticker_id, observed_at_ns)
);

CREATE TABLE IF NOT EXISTS frequent_data (
    id BIGINT PRIMARY KEY,
    ticker_id BIGINT NOT NULL REFERENCES tickers(id),
    open DOUBLE NOT NULL,
    high DOUBLE NOT NULL,
    low DOUBLE NOT NULL,
    previous_close DOUBLE,
    volume BIGINT,
    observed_at_ns BIGINT NOT NULL,
    inserted_at_ns BIGINT NOT NULL,
    UNIQUE(ticker_id, observed_at_ns)
);

CREATE TABLE IF NOT EXISTS infrequent_data (
    id BIGINT PRIMARY KEY,
    ticker_id BIGINT NOT NULL REFERENCES tickers(id),
    market_cap DOUBLE,
    trailing_pe DOUBLE,
    forward_pe DOUBLE,
    dividend_yield DOUBLE,
    has_analyst BOOLEAN NOT NULL DEFAULT FALSE,
    recommendation TEXT,
    pe_ratio DOUBLE,
    peg_ratio DOUBLE,
    next_quarter_growth DOUBLE,
    observed_at_ns BIGINT NOT NULL,
    inserted_at_ns BIGINT NOT NULL,
    UNIQUE(ticker_id, observed_at_ns)
);

CREATE TABLE IF NOT EXISTS recommendation_trend (
    infrequent_id BIGINT NOT NULL REFERENCES infrequent_data(id),
    position INTEGER NOT NULL,
    period TEXT NOT NULL,
    strong_buy INTEGER NOT NULL,
    buy INTEGER NOT NULL,
    hold INTEGER NOT NULL,
    sell INTEGER NOT NULL,
    strong_sell INTEGER NOT NULL,
    PRIMARY KEY(infrequent_id, position)
);

CREATE TABLE IF NOT EXISTS earnings_trend (
    infrequent_id BIGINT NOT NULL REFERENCES infrequent_data(id),
    position INTEGER NOT NULL,
    period TEXT NOT NULL,
    growth DOUBLE,
    PRIMARY KEY(infrequent_id, position)
);

CREATE TABLE IF NOT EXISTS index_trend (
    infrequent_id BIGINT PRIMARY KEY REFERENCES infrequent_data(id),
    pe_ratio DOUBLE,
    peg_ratio DOUBLE
);

CREATE TABLE IF NOT EXISTS general_data (
    id BIGINT PRIMARY KEY,
    ticker_id BIGINT NOT NULL REFERENCES tickers(id),
    long_name TEXT,
    sector TEXT,
    industry TEXT,
    full_time_employees BIGINT,
    country TEXT,
    website TEXT,
    description TEXT,
    observed_at_ns BIGINT NOT NULL,
    inserted_at_ns BIGINT NOT NULL,
    UNIQUE(ticker_id, observed_at_ns)
);

CREATE TABLE IF NOT EXISTS current_values (
    ticker_id BIGINT NOT NULL,
    tier TEXT NOT NULL,
    record_id BIGINT NOT NULL,
    observed_at_ns BIGINT NOT NULL,
    PRIMARY KEY(ticker_id, tier)
);

CREATE TABLE IF NOT EXISTS ingest_log (
    request_id TEXT NOT NULL,
    symbol TEXT,
    source TEXT NOT NULL,
    tier TEXT NOT NULL,
    status TEXT NOT NULL,
    latency_us BIGINT,
    logged_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_live_data_ticker_ts ON live_data(ticker_id, observed_at_ns);
CREATE INDEX IF NOT EXISTS idx_frequent_data_ticker_ts ON frequent_data(ticker_id, observed_at_ns);
CREATE INDEX IF NOT EXISTS idx_infrequent_data_ticker_ts ON infrequent_data(ticker_id, observed_at_ns);
CREATE INDEX IF NOT EXISTS idx_general_data_ticker_ts ON general_data(ticker_id, observed_at_ns);
CREATE INDEX IF NOT EXISTS idx_ingest_log_request ON ingest_log(request_id);
"#,
    },
];

/// Apply every migration that has not been recorded in `schema_migrations`.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            [migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            debug!(version = migration.version, "applying migration");
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [migration.version],
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let connection = Connection::open_in_memory().expect("open");
        apply_migrations(&connection).expect("first run");
        apply_migrations(&connection).expect("second run");

        let applied: i64 = connection
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .expect("count");
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[test]
    fn tier_rows_require_an_existing_ticker() {
        let connection = Connection::open_in_memory().expect("open");
        apply_migrations(&connection).expect("migrate");

        let orphan = connection.execute(
            "INSERT INTO live_data (id, ticker_id, price, observed_at_ns, inserted_at_ns) \
             VALUES (1, 99, 10.0, 1, 1)",
            [],
        );
        assert!(orphan.is_err(), "foreign key must reject unknown ticker");
    }

    #[test]
    fn analysis_children_require_an_infrequent_row() {
        let connection = Connection::open_in_memory().expect("open");
        apply_migrations(&connection).expect("migrate");

        for sql in [
            "INSERT INTO earnings_trend (infrequent_id, position, period, growth) VALUES (3, 0, '0q', 0.1)",
            "INSERT INTO index_trend (infrequent_id, pe_ratio, peg_ratio) VALUES (3, 20.0, 1.5)",
        ] {
            assert!(connection.execute(sql, []).is_err(), "{sql}");
        }
    }
}
