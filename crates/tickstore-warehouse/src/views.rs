//! Database views over the tier tables.

use ::duckdb::Connection;

/// Create the read-side views.
///
/// - `v_live_snapshot`: per ticker, the latest live quote plus the price of
///   the record before it
/// - `v_current_values`: the materialized current-value pointers joined back
///   to their ticker symbol
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE VIEW v_live_snapshot AS
WITH ranked AS (
    SELECT
        ticker_id,
        price,
        change,
        percent_change,
        observed_at_ns,
        ROW_NUMBER() OVER (PARTITION BY ticker_id ORDER BY observed_at_ns DESC) AS rn
    FROM live_data
)
SELECT
    t.symbol,
    cur.price,
    cur.change,
    cur.percent_change,
    make_timestamp(cur.observed_at_ns // 1000) AS observed_at,
    prev.price AS previous_price
FROM ranked cur
JOIN tickers t ON t.id = cur.ticker_id
LEFT JOIN ranked prev ON prev.ticker_id = cur.ticker_id AND prev.rn = 2
WHERE cur.rn = 1;

CREATE OR REPLACE VIEW v_current_values AS
SELECT
    t.symbol,
    cv.tier,
    cv.record_id,
    make_timestamp(cv.observed_at_ns // 1000) AS observed_at
FROM current_values cv
JOIN tickers t ON t.id = cv.ticker_id;
",
    )?;

    Ok(())
}
