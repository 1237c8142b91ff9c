use crate::adapters::database::DbPool;
use crate::adapters::database::report_repo::{BoundingBox, ReportRepository};
use crate::adapters::database::user_repo::UserRepository;
use crate::config::ReportConfig;
use crate::domain::report::{
    AreaOverview, EARTH_RADIUS_KM, GeoPoint, MediaType, NearbyReport, NewMedia, NewReport, Report, RiskLevel,
};
use crate::error::{AppError, FieldErrors, Result};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::str::FromStr;

const INCIDENT_TYPE_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 5000;

/// Unvalidated report submission as received from a client.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub incident_type: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub media: Vec<MediaDraft>,
}

#[derive(Debug, Clone)]
pub struct MediaDraft {
    pub url: String,
    pub media_type: String,
}

#[derive(Clone, Debug)]
struct Metrics {
    submitted_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("alertdavao-server");
        Self {
            submitted_total: meter
                .u64_counter("alertdavao_reports_submitted_total")
                .with_description("Crime report submissions by status")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReportService {
    pool: DbPool,
    repo: ReportRepository,
    user_repo: UserRepository,
    config: ReportConfig,
    metrics: Metrics,
}

impl ReportService {
    #[must_use]
    pub fn new(pool: DbPool, repo: ReportRepository, user_repo: UserRepository, config: ReportConfig) -> Self {
        Self { pool, repo, user_repo, config, metrics: Metrics::new() }
    }

    /// Stores location, report and media atomically: either all rows land or none do.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for malformed input.
    /// Returns `AppError::Database` if any insert fails; the transaction is rolled back.
    #[tracing::instrument(err(level = "warn"), skip(self, draft), fields(report_id = tracing::field::Empty))]
    pub async fn submit_report(&self, reporter_id: i64, draft: ReportDraft) -> Result<Report> {
        let report = validate_draft(draft, self.config.max_media_per_report)?;

        // Dropping `tx` without commit rolls everything back
        let mut tx = self.pool.begin().await?;

        let location_id = self
            .repo
            .create_location(&mut tx, report.location.latitude, report.location.longitude, report.address.as_deref())
            .await?;
        let report_id =
            self.repo.create_report(&mut tx, reporter_id, location_id, &report.incident_type, &report.description).await?;
        for media in &report.media {
            self.repo.add_media(&mut tx, report_id, media).await?;
        }

        let stored = self.repo.find_by_id(&mut tx, report_id).await?.ok_or(AppError::Internal)?;
        tx.commit().await?;

        tracing::Span::current().record("report_id", report_id);
        tracing::info!(media_count = stored.media.len(), "Report submitted");
        self.metrics.submitted_total.add(1, &[KeyValue::new("status", "success")]);

        Ok(stored)
    }

    /// A report is visible to its reporter and to privileged identities.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the report does not exist.
    /// Returns `AppError::Forbidden` if the viewer may not see it.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn get_report(&self, viewer_id: i64, report_id: i64) -> Result<Report> {
        let mut conn = self.pool.acquire().await?;
        let report = self.repo.find_by_id(&mut conn, report_id).await?.ok_or(AppError::NotFound)?;

        if report.reporter_id != viewer_id {
            let viewer = self.user_repo.find_by_id(&mut conn, viewer_id).await?.ok_or(AppError::AuthError)?;
            if !viewer.role.is_privileged() {
                return Err(AppError::Forbidden);
            }
        }

        Ok(report)
    }

    /// Reports within `radius_km` of `center`, nearest first, with the area's risk level.
    /// The risk level counts every report in the circle; only the list is capped.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for an invalid center or radius.
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn nearby(&self, center: GeoPoint, radius_km: Option<f64>) -> Result<AreaOverview> {
        let radius_km = radius_km.unwrap_or(self.config.default_radius_km);

        let mut fields = FieldErrors::new();
        if !center.latitude.is_finite() || !(-90.0..=90.0).contains(&center.latitude) {
            fields.insert("latitude".into(), "Latitude must be between -90 and 90".into());
        }
        if !center.longitude.is_finite() || !(-180.0..=180.0).contains(&center.longitude) {
            fields.insert("longitude".into(), "Longitude must be between -180 and 180".into());
        }
        if !(radius_km > 0.0 && radius_km <= self.config.max_radius_km) {
            fields.insert(
                "radiusKm".into(),
                format!("Radius must be greater than 0 and at most {} km", self.config.max_radius_km),
            );
        }
        AppError::check_fields(fields)?;

        let mut conn = self.pool.acquire().await?;
        let candidates = self.repo.find_in_box(&mut conn, bounding_box(center, radius_km)).await?;

        let (reports, report_count) = rank_within(center, radius_km, candidates, self.config.max_nearby_results);
        let risk_level =
            RiskLevel::classify(report_count, self.config.medium_risk_threshold, self.config.high_risk_threshold);

        Ok(AreaOverview { center, radius_km, risk_level, report_count, reports })
    }
}

fn validate_draft(draft: ReportDraft, max_media: usize) -> Result<NewReport> {
    let mut fields = FieldErrors::new();

    let incident_type = draft.incident_type.trim().to_string();
    if incident_type.is_empty() {
        fields.insert("incidentType".into(), "Incident type is required".into());
    } else if incident_type.chars().count() > INCIDENT_TYPE_MAX_CHARS {
        fields.insert(
            "incidentType".into(),
            format!("Incident type must not exceed {INCIDENT_TYPE_MAX_CHARS} characters"),
        );
    }

    let description = draft.description.trim().to_string();
    if description.is_empty() {
        fields.insert("description".into(), "Description is required".into());
    } else if description.chars().count() > DESCRIPTION_MAX_CHARS {
        fields.insert("description".into(), format!("Description must not exceed {DESCRIPTION_MAX_CHARS} characters"));
    }

    let location = GeoPoint::new(draft.latitude, draft.longitude);
    if !location.is_valid() {
        fields.insert("location".into(), "Latitude must be in [-90, 90] and longitude in [-180, 180]".into());
    }

    if draft.media.len() > max_media {
        fields.insert("media".into(), format!("At most {max_media} media files may be attached"));
    }

    let mut media = Vec::with_capacity(draft.media.len());
    for (index, item) in draft.media.into_iter().enumerate() {
        let url = item.url.trim().to_string();
        if url.is_empty() {
            fields.insert(format!("media.{index}.url"), "Media URL is required".into());
        }
        match MediaType::from_str(&item.media_type) {
            Ok(media_type) => media.push(NewMedia { url, media_type }),
            Err(_) => {
                fields.insert(format!("media.{index}.mediaType"), "Media type must be image or video".into());
            }
        }
    }

    AppError::check_fields(fields)?;

    let address = draft.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
    Ok(NewReport { incident_type, description, location, address, media })
}

/// Keeps the candidates inside the circle, nearest first, and caps the list at `limit`.
/// Also returns how many were inside before the cap.
fn rank_within(center: GeoPoint, radius_km: f64, candidates: Vec<Report>, limit: usize) -> (Vec<NearbyReport>, usize) {
    let mut reports: Vec<NearbyReport> = candidates
        .into_iter()
        .filter_map(|report| {
            let distance_km = center.distance_km(&report.location);
            (distance_km <= radius_km).then_some(NearbyReport { report, distance_km })
        })
        .collect();
    reports.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km).then_with(|| a.report.id.cmp(&b.report.id)));

    let in_radius = reports.len();
    reports.truncate(limit);
    (reports, in_radius)
}

/// Smallest lat/lng rectangle containing the circle. Falls back to the full longitude range
/// when the circle reaches a pole or wraps the antimeridian.
fn bounding_box(center: GeoPoint, radius_km: f64) -> BoundingBox {
    let angular_radius = radius_km / EARTH_RADIUS_KM;
    let lat_delta = angular_radius.to_degrees();

    let min_latitude = (center.latitude - lat_delta).max(-90.0);
    let max_latitude = (center.latitude + lat_delta).min(90.0);

    // Widest longitude offset on the circle is asin(sin(d) / cos(lat)), at the tangent points
    let cos_lat = center.latitude.to_radians().cos();
    let ratio = if cos_lat > 1e-12 { angular_radius.sin() / cos_lat } else { f64::INFINITY };
    let lon_delta = if ratio < 1.0 { ratio.asin().to_degrees() } else { 360.0 };

    let (min_longitude, max_longitude) =
        if center.longitude - lon_delta < -180.0 || center.longitude + lon_delta > 180.0 {
            (-180.0, 180.0)
        } else {
            (center.longitude - lon_delta, center.longitude + lon_delta)
        };

    BoundingBox { min_latitude, max_latitude, min_longitude, max_longitude }
}
