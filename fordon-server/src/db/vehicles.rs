//! Vehicle record persistence
//!
//! Lookup, insert, update, list and count over the `vehicles` table. The
//! reconciliation engine drives the write side; the listing API drives the
//! read side.

use fordon_common::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::parser::ParsedVehicle;

/// The slice of a stored record the reconciliation engine needs
#[derive(Debug, Clone)]
pub struct StoredVehicle {
    pub id: i64,
    pub raw_line: String,
}

/// Listing row exposed by GET /api/vehicles.
///
/// Internal fields such as typgodkannande_nr stay out of the listing
/// contract on purpose.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleSummary {
    pub id: i64,
    pub identitet: String,
    pub chassinummer: String,
    pub modellar: i64,
    pub farg: String,
    pub forsta_registrering: String,
    pub nasta_besiktning: String,
    pub created_at: String,
}

/// Columns the listing API may sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    CreatedAt,
    NastaBesiktning,
    Identitet,
    Modellar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortColumn {
    fn as_sql(self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::NastaBesiktning => "nasta_besiktning",
            SortColumn::Identitet => "identitet",
            SortColumn::Modellar => "modellar",
        }
    }

    fn from_param(param: &str) -> Option<Self> {
        match param {
            "created_at" => Some(SortColumn::CreatedAt),
            "nasta_besiktning" => Some(SortColumn::NastaBesiktning),
            "identitet" => Some(SortColumn::Identitet),
            "modellar" => Some(SortColumn::Modellar),
            _ => None,
        }
    }
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Resolve listing sort parameters.
///
/// No sort column, or one outside the allow-list, falls back to creation
/// time newest-first. A recognized column sorts ascending unless the
/// caller asks for "desc".
pub fn resolve_sort(sort_by: Option<&str>, sort_order: Option<&str>) -> (SortColumn, SortOrder) {
    let column = sort_by.and_then(SortColumn::from_param);
    match column {
        None => (SortColumn::CreatedAt, SortOrder::Desc),
        Some(column) => {
            let order = match sort_order {
                Some(o) if o.eq_ignore_ascii_case("desc") => SortOrder::Desc,
                _ => SortOrder::Asc,
            };
            (column, order)
        }
    }
}

/// Look up a record by its natural key (identitet, chassinummer)
pub async fn find_by_key(
    pool: &SqlitePool,
    identitet: &str,
    chassinummer: &str,
) -> Result<Option<StoredVehicle>> {
    let row = sqlx::query(
        r#"
        SELECT id, raw_line FROM vehicles
        WHERE identitet = ? AND chassinummer = ?
        "#,
    )
    .bind(identitet)
    .bind(chassinummer)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| StoredVehicle {
        id: row.get("id"),
        raw_line: row.get("raw_line"),
    }))
}

/// Insert a new vehicle record.
///
/// A concurrent insert of the same natural key surfaces as
/// [`Error::ConstraintViolation`]; the caller counts it as a per-line
/// rejection rather than aborting the batch.
pub async fn insert_vehicle(pool: &SqlitePool, vehicle: &ParsedVehicle) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vehicles (
            raw_line, identitet, chassinummer, modellar, typgodkannande_nr,
            forsta_registrering, privatimporterad, avregistrerad_datum, farg,
            senast_besiktning, nasta_besiktning, senast_registrering, manadsregistrering
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&vehicle.raw_line)
    .bind(&vehicle.identitet)
    .bind(&vehicle.chassinummer)
    .bind(vehicle.modellar)
    .bind(&vehicle.typgodkannande_nr)
    .bind(&vehicle.forsta_registrering)
    .bind(vehicle.privatimporterad)
    .bind(&vehicle.avregistrerad_datum)
    .bind(&vehicle.farg)
    .bind(&vehicle.senast_besiktning)
    .bind(&vehicle.nasta_besiktning)
    .bind(&vehicle.senast_registrering)
    .bind(&vehicle.manadsregistrering)
    .execute(pool)
    .await
    .map_err(Error::from_sqlx)?;

    Ok(())
}

/// Overwrite all derived fields of an existing record and refresh
/// updated_at. Overwrite, not merge: every field comes from the new line.
pub async fn update_vehicle(pool: &SqlitePool, vehicle: &ParsedVehicle) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE vehicles SET
            raw_line = ?,
            modellar = ?,
            typgodkannande_nr = ?,
            forsta_registrering = ?,
            privatimporterad = ?,
            avregistrerad_datum = ?,
            farg = ?,
            senast_besiktning = ?,
            nasta_besiktning = ?,
            senast_registrering = ?,
            manadsregistrering = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE identitet = ? AND chassinummer = ?
        "#,
    )
    .bind(&vehicle.raw_line)
    .bind(vehicle.modellar)
    .bind(&vehicle.typgodkannande_nr)
    .bind(&vehicle.forsta_registrering)
    .bind(vehicle.privatimporterad)
    .bind(&vehicle.avregistrerad_datum)
    .bind(&vehicle.farg)
    .bind(&vehicle.senast_besiktning)
    .bind(&vehicle.nasta_besiktning)
    .bind(&vehicle.senast_registrering)
    .bind(&vehicle.manadsregistrering)
    .bind(&vehicle.identitet)
    .bind(&vehicle.chassinummer)
    .execute(pool)
    .await?;

    Ok(())
}

/// List all vehicles as summaries, ordered per the resolved sort
pub async fn list_vehicles(
    pool: &SqlitePool,
    sort_by: Option<&str>,
    sort_order: Option<&str>,
) -> Result<Vec<VehicleSummary>> {
    let (column, order) = resolve_sort(sort_by, sort_order);

    // Sort column/order come from closed enums, never from raw input
    let sql = format!(
        r#"
        SELECT id, identitet, chassinummer, modellar, farg,
               forsta_registrering, nasta_besiktning, created_at
        FROM vehicles
        ORDER BY {} {}
        "#,
        column.as_sql(),
        order.as_sql()
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| VehicleSummary {
            id: row.get("id"),
            identitet: row.get("identitet"),
            chassinummer: row.get("chassinummer"),
            modellar: row.get("modellar"),
            farg: row.get("farg"),
            forsta_registrering: row.get("forsta_registrering"),
            nasta_besiktning: row.get("nasta_besiktning"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Count total vehicles in the registry
pub async fn count_vehicles(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        fordon_common::db::create_schema(&pool)
            .await
            .expect("Schema creation failed");
        pool
    }

    fn test_vehicle(identitet: &str, chassinummer: &str) -> ParsedVehicle {
        ParsedVehicle {
            identitet: identitet.to_string(),
            chassinummer: chassinummer.to_string(),
            modellar: 2006,
            typgodkannande_nr: "TG12345678".to_string(),
            forsta_registrering: "20060315".to_string(),
            privatimporterad: 0,
            avregistrerad_datum: "00000000".to_string(),
            farg: "Röd".to_string(),
            senast_besiktning: "20230401".to_string(),
            nasta_besiktning: "20240401".to_string(),
            senast_registrering: "20060320".to_string(),
            manadsregistrering: "0603".to_string(),
            raw_line: format!("{identitet} {chassinummer} ..."),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_key() {
        let pool = test_pool().await;
        let vehicle = test_vehicle("ABC123", "YV1MS672462191323");

        insert_vehicle(&pool, &vehicle).await.unwrap();

        let stored = find_by_key(&pool, "ABC123", "YV1MS672462191323")
            .await
            .unwrap()
            .expect("Record not found");
        assert_eq!(stored.raw_line, vehicle.raw_line);

        assert!(find_by_key(&pool, "ABC123", "WVWZZZ1JZXW000001")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_constraint_violation() {
        let pool = test_pool().await;
        let vehicle = test_vehicle("ABC123", "YV1MS672462191323");

        insert_vehicle(&pool, &vehicle).await.unwrap();
        let err = insert_vehicle(&pool, &vehicle).await.unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_update_overwrites_fields() {
        let pool = test_pool().await;
        let mut vehicle = test_vehicle("ABC123", "YV1MS672462191323");
        insert_vehicle(&pool, &vehicle).await.unwrap();

        vehicle.farg = "Blå".to_string();
        vehicle.raw_line = "changed".to_string();
        update_vehicle(&pool, &vehicle).await.unwrap();

        let stored = find_by_key(&pool, "ABC123", "YV1MS672462191323")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.raw_line, "changed");

        let farg: String = sqlx::query_scalar("SELECT farg FROM vehicles WHERE identitet = ?")
            .bind("ABC123")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(farg, "Blå");
    }

    #[tokio::test]
    async fn test_count_vehicles() {
        let pool = test_pool().await;
        assert_eq!(count_vehicles(&pool).await.unwrap(), 0);

        insert_vehicle(&pool, &test_vehicle("ABC123", "YV1MS672462191323"))
            .await
            .unwrap();
        insert_vehicle(&pool, &test_vehicle("DEF456", "WVWZZZ1JZXW000001"))
            .await
            .unwrap();
        assert_eq!(count_vehicles(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_sorted_by_nasta_besiktning_asc() {
        let pool = test_pool().await;

        let mut first = test_vehicle("AAA111", "YV1MS672462191323");
        first.nasta_besiktning = "20250101".to_string();
        let mut second = test_vehicle("BBB222", "WVWZZZ1JZXW000001");
        second.nasta_besiktning = "20240101".to_string();
        insert_vehicle(&pool, &first).await.unwrap();
        insert_vehicle(&pool, &second).await.unwrap();

        let listed = list_vehicles(&pool, Some("nasta_besiktning"), Some("asc"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].identitet, "BBB222");
        assert_eq!(listed[1].identitet, "AAA111");
    }

    #[tokio::test]
    async fn test_list_default_is_newest_first() {
        let pool = test_pool().await;

        insert_vehicle(&pool, &test_vehicle("AAA111", "YV1MS672462191323"))
            .await
            .unwrap();
        insert_vehicle(&pool, &test_vehicle("BBB222", "WVWZZZ1JZXW000001"))
            .await
            .unwrap();

        // Same-second timestamps: fall back to checking the sort resolution
        let (column, order) = resolve_sort(None, None);
        assert_eq!(column, SortColumn::CreatedAt);
        assert_eq!(order, SortOrder::Desc);

        let listed = list_vehicles(&pool, None, None).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn test_resolve_sort_fallback() {
        // Unrecognized column falls back to creation time, newest first
        let (column, order) = resolve_sort(Some("raw_line; DROP TABLE"), Some("asc"));
        assert_eq!(column, SortColumn::CreatedAt);
        assert_eq!(order, SortOrder::Desc);

        let (column, order) = resolve_sort(Some("modellar"), Some("DESC"));
        assert_eq!(column, SortColumn::Modellar);
        assert_eq!(order, SortOrder::Desc);

        // Recognized column without explicit order sorts ascending
        let (column, order) = resolve_sort(Some("identitet"), None);
        assert_eq!(column, SortColumn::Identitet);
        assert_eq!(order, SortOrder::Asc);
    }
}
