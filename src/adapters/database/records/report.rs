use crate::domain::report::{GeoPoint, MediaType, Report, ReportMedia, ReportStatus};
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct ReportRecord {
    pub(crate) id: i64,
    pub(crate) reporter_id: i64,
    pub(crate) incident_type: String,
    pub(crate) description: String,
    pub(crate) status: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) address: Option<String>,
    pub(crate) created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ReportMediaRecord {
    pub(crate) id: i64,
    pub(crate) report_id: i64,
    pub(crate) media_url: String,
    pub(crate) media_type: String,
}

impl ReportRecord {
    pub(crate) fn into_report(self, media: Vec<ReportMedia>) -> Report {
        Report {
            id: self.id,
            reporter_id: self.reporter_id,
            incident_type: self.incident_type,
            description: self.description,
            status: ReportStatus::from_str(&self.status).unwrap_or(ReportStatus::Pending),
            location: GeoPoint::new(self.latitude, self.longitude),
            address: self.address,
            created_at: self.created_at,
            media,
        }
    }
}

impl From<ReportMediaRecord> for ReportMedia {
    fn from(record: ReportMediaRecord) -> Self {
        Self {
            id: record.id,
            url: record.media_url,
            media_type: MediaType::from_str(&record.media_type).unwrap_or(MediaType::Image),
        }
    }
}
