use time::OffsetDateTime;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Haversine distance in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos() * other.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classifies an area by how many reports fall inside it.
    #[must_use]
    pub const fn classify(report_count: usize, medium_threshold: usize, high_threshold: usize) -> Self {
        if report_count >= high_threshold {
            Self::High
        } else if report_count >= medium_threshold {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(format!("Invalid media type: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    Pending,
    Investigating,
    Resolved,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Investigating => write!(f, "investigating"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "investigating" => Ok(Self::Investigating),
            "resolved" => Ok(Self::Resolved),
            _ => Err(format!("Invalid report status: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportMedia {
    pub id: i64,
    pub url: String,
    pub media_type: MediaType,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub id: i64,
    pub reporter_id: i64,
    pub incident_type: String,
    pub description: String,
    pub status: ReportStatus,
    pub location: GeoPoint,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub media: Vec<ReportMedia>,
}

/// Input for a new report, already validated.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub incident_type: String,
    pub description: String,
    pub location: GeoPoint,
    pub address: Option<String>,
    pub media: Vec<NewMedia>,
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub url: String,
    pub media_type: MediaType,
}

#[derive(Debug, Clone)]
pub struct NearbyReport {
    pub report: Report,
    pub distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct AreaOverview {
    pub center: GeoPoint,
    pub radius_km: f64,
    pub risk_level: RiskLevel,
    /// Reports inside the radius, which may exceed `reports.len()` when the list is capped.
    pub report_count: usize,
    pub reports: Vec<NearbyReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let davao = GeoPoint::new(7.0731, 125.6128);
        assert!(davao.distance_km(&davao).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance() {
        // Davao City to Manila is roughly 975 km
        let davao = GeoPoint::new(7.0731, 125.6128);
        let manila = GeoPoint::new(14.5995, 120.9842);
        let d = davao.distance_km(&manila);
        assert!((950.0..1000.0).contains(&d), "unexpected distance {d}");
        assert!((d - manila.distance_km(&davao)).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        assert!((a.distance_km(&b) - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_point_validation() {
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 180.01).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_risk_thresholds() {
        assert_eq!(RiskLevel::classify(0, 3, 6), RiskLevel::Low);
        assert_eq!(RiskLevel::classify(2, 3, 6), RiskLevel::Low);
        assert_eq!(RiskLevel::classify(3, 3, 6), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(5, 3, 6), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(6, 3, 6), RiskLevel::High);
    }
}
