use crate::adapters::database::records::{ReportMediaRecord, ReportRecord};
use crate::domain::report::{NewMedia, Report, ReportMedia};
use crate::error::Result;
use sqlx::PgConnection;
use std::collections::HashMap;

/// Latitude/longitude rectangle used to pre-filter candidates before exact distance checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

const REPORT_COLUMNS: &str = r#"
    SELECT r.id, r.reporter_id, r.incident_type, r.description, r.status,
           l.latitude, l.longitude, l.address, r.created_at
    FROM reports r
    JOIN locations l ON l.id = r.location_id
"#;

#[derive(Clone, Debug, Default)]
pub struct ReportRepository {}

impl ReportRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, address))]
    pub(crate) async fn create_location(
        &self,
        conn: &mut PgConnection,
        latitude: f64,
        longitude: f64,
        address: Option<&str>,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO locations (latitude, longitude, address) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(latitude)
        .bind(longitude)
        .bind(address)
        .fetch_one(conn)
        .await?;
        Ok(id)
    }

    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, description))]
    pub(crate) async fn create_report(
        &self,
        conn: &mut PgConnection,
        reporter_id: i64,
        location_id: i64,
        incident_type: &str,
        description: &str,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO reports (reporter_id, location_id, incident_type, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(reporter_id)
        .bind(location_id)
        .bind(incident_type)
        .bind(description)
        .fetch_one(conn)
        .await?;
        Ok(id)
    }

    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, media))]
    pub(crate) async fn add_media(&self, conn: &mut PgConnection, report_id: i64, media: &NewMedia) -> Result<()> {
        sqlx::query("INSERT INTO report_media (report_id, media_url, media_type) VALUES ($1, $2, $3)")
            .bind(report_id)
            .bind(&media.url)
            .bind(media.media_type.to_string())
            .execute(conn)
            .await?;
        Ok(())
    }

    /// # Errors
    /// Returns `AppError::Database` if a query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn find_by_id(&self, conn: &mut PgConnection, report_id: i64) -> Result<Option<Report>> {
        let record = sqlx::query_as::<_, ReportRecord>(&format!("{REPORT_COLUMNS} WHERE r.id = $1"))
            .bind(report_id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let mut media = self.media_for(conn, &[record.id]).await?;
        let report_media = media.remove(&record.id).unwrap_or_default();
        Ok(Some(record.into_report(report_media)))
    }

    /// Reports whose location falls inside the box, with their media.
    ///
    /// # Errors
    /// Returns `AppError::Database` if a query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn find_in_box(&self, conn: &mut PgConnection, bounds: BoundingBox) -> Result<Vec<Report>> {
        let records = sqlx::query_as::<_, ReportRecord>(&format!(
            "{REPORT_COLUMNS} WHERE l.latitude BETWEEN $1 AND $2 AND l.longitude BETWEEN $3 AND $4"
        ))
        .bind(bounds.min_latitude)
        .bind(bounds.max_latitude)
        .bind(bounds.min_longitude)
        .bind(bounds.max_longitude)
        .fetch_all(&mut *conn)
        .await?;

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let mut media = self.media_for(conn, &ids).await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let report_media = media.remove(&record.id).unwrap_or_default();
                record.into_report(report_media)
            })
            .collect())
    }

    async fn media_for(&self, conn: &mut PgConnection, report_ids: &[i64]) -> Result<HashMap<i64, Vec<ReportMedia>>> {
        if report_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let records = sqlx::query_as::<_, ReportMediaRecord>(
            "SELECT id, report_id, media_url, media_type FROM report_media WHERE report_id = ANY($1) ORDER BY id",
        )
        .bind(report_ids)
        .fetch_all(conn)
        .await?;

        let mut grouped: HashMap<i64, Vec<ReportMedia>> = HashMap::new();
        for record in records {
            grouped.entry(record.report_id).or_default().push(record.into());
        }
        Ok(grouped)
    }
}
