use bigdecimal::BigDecimal;
use sqlx::{FromRow, PgConnection, PgPool};

/// Values of a row about to be inserted into the `crunch` table.
#[derive(Debug, Clone, Copy)]
pub struct NewCrunchRow<'a> {
    pub caller_address: &'a str,
    pub salt: &'a str,
    pub address: &'a str,
    pub reward: &'a BigDecimal,
    pub total_zeroes: i32,
    pub leading_zeroes: i32,
    pub line_number: i64,
}

/// A row read back from the `crunch` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CrunchRow {
    pub caller_address: String,
    pub salt: String,
    pub address: String,
    pub reward: BigDecimal,
    pub total_zeroes: i32,
    pub leading_zeroes: i32,
    pub line_number: i64,
}

/// Returns the highest line number stored for `caller_address`, or `None` if the caller has no
/// rows yet.
pub async fn get_max_line_number(
    conn: &mut PgConnection,
    caller_address: &str,
) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar::<_, Option<i64>>(
        r#"
        select max(line_number)
        from crunch
        where caller_address = $1
        "#,
    )
    .bind(caller_address)
    .fetch_one(conn)
    .await
}

/// Inserts a single row.
///
/// Fails with a unique violation when the address is already stored for the same caller, see
/// [`is_unique_violation`].
pub async fn insert_crunch_row(conn: &mut PgConnection, row: &NewCrunchRow<'_>) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        insert into crunch (caller_address, salt, address, reward, totalZeroes, leadingZeroes, line_number)
        values ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(row.caller_address)
    .bind(row.salt)
    .bind(row.address)
    .bind(row.reward)
    .bind(row.total_zeroes)
    .bind(row.leading_zeroes)
    .bind(row.line_number)
    .execute(conn)
    .await?;

    Ok(())
}

/// Returns all rows of `caller_address` ordered by line number.
pub async fn get_crunch_rows(pool: &PgPool, caller_address: &str) -> sqlx::Result<Vec<CrunchRow>> {
    sqlx::query_as::<_, CrunchRow>(
        r#"
        select caller_address, salt, address, reward,
               totalZeroes as total_zeroes, leadingZeroes as leading_zeroes, line_number
        from crunch
        where caller_address = $1
        order by line_number
        "#,
    )
    .bind(caller_address)
    .fetch_all(pool)
    .await
}

/// Returns `true` when `err` was raised by a uniqueness constraint (SQLSTATE `23505`).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
