use crate::domain::report::{AreaOverview, NearbyReport, Report, ReportMedia};
use crate::services::report_service::{MediaDraft, ReportDraft};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReport {
    pub incident_type: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    #[serde(default)]
    pub media: Vec<SubmitMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMedia {
    pub url: String,
    pub media_type: String,
}

impl From<SubmitReport> for ReportDraft {
    fn from(r: SubmitReport) -> Self {
        Self {
            incident_type: r.incident_type,
            description: r.description,
            latitude: r.latitude,
            longitude: r.longitude,
            address: r.address,
            media: r.media.into_iter().map(|m| MediaDraft { url: m.url, media_type: m.media_type }).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MediaView {
    pub id: i64,
    pub url: String,
    pub media_type: String,
}

impl From<ReportMedia> for MediaView {
    fn from(m: ReportMedia) -> Self {
        Self { id: m.id, url: m.url, media_type: m.media_type.to_string() }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportView {
    pub id: i64,
    pub reporter_id: i64,
    pub incident_type: String,
    pub description: String,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub media: Vec<MediaView>,
}

impl From<Report> for ReportView {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            reporter_id: r.reporter_id,
            incident_type: r.incident_type,
            description: r.description,
            status: r.status.to_string(),
            latitude: r.location.latitude,
            longitude: r.location.longitude,
            address: r.address,
            created_at: r.created_at,
            media: r.media.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NearbyReportView {
    #[serde(flatten)]
    pub report: ReportView,
    pub distance_km: f64,
}

impl From<NearbyReport> for NearbyReportView {
    fn from(n: NearbyReport) -> Self {
        Self { report: n.report.into(), distance_km: n.distance_km }
    }
}

#[derive(Debug, Serialize)]
pub struct AreaView {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub risk_level: &'static str,
    pub report_count: usize,
    pub reports: Vec<NearbyReportView>,
}

impl From<AreaOverview> for AreaView {
    fn from(area: AreaOverview) -> Self {
        Self {
            latitude: area.center.latitude,
            longitude: area.center.longitude,
            radius_km: area.radius_km,
            risk_level: area.risk_level.as_str(),
            report_count: area.report_count,
            reports: area.reports.into_iter().map(Into::into).collect(),
        }
    }
}
