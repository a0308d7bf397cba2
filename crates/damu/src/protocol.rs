use crate::error::{InvalidTask, ValidationError};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Typed enums for wire format safety
// ---------------------------------------------------------------------------

/// One of the eight ABO/Rh blood types.
///
/// Variant order is the canonical display order used by inventory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BloodType::ALL
            .into_iter()
            .find(|bt| bt.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownBloodType(s.to_string()))
    }
}

/// How a donor wants to give blood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DonationType {
    #[serde(rename = "Center", alias = "At a Donation Center")]
    Center,
    #[serde(rename = "Pickup", alias = "Agent Pickup")]
    Pickup,
}

impl fmt::Display for DonationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DonationType::Center => write!(f, "At a Donation Center"),
            DonationType::Pickup => write!(f, "Agent Pickup"),
        }
    }
}

impl FromStr for DonationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" | "at a donation center" => Ok(DonationType::Center),
            "pickup" | "agent pickup" => Ok(DonationType::Pickup),
            _ => Err(ValidationError::UnknownDonationType(s.to_string())),
        }
    }
}

/// Lifecycle of a donation record, independent of any agent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationStatus {
    Pending,
    Scheduled,
    Completed,
    Cancelled,
}

/// Lifecycle of a hospital blood request, independent of any agent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    #[serde(rename = "In Transit")]
    InTransit,
    Fulfilled,
}

/// Whether an agent collects from a donor or delivers to a hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Pickup,
    Delivery,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Pickup => write!(f, "Pickup"),
            TaskKind::Delivery => write!(f, "Delivery"),
        }
    }
}

/// Agent task status. Transitions are governed by [`crate::task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    New,
    Accepted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::New => write!(f, "New"),
            TaskStatus::Accepted => write!(f, "Accepted"),
            TaskStatus::InProgress => write!(f, "In Progress"),
            TaskStatus::Completed => write!(f, "Completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within the WGS84 latitude/longitude ranges.
    pub fn is_plottable(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A scheduled donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub id: String,
    pub donor_name: String,
    pub blood_type: BloodType,
    pub donation_type: DonationType,
    pub location: String,
    pub status: DonationStatus,
    pub donation_date_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

/// A hospital's request for blood units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequestRecord {
    pub id: String,
    pub hospital_name: String,
    pub blood_type: BloodType,
    pub units: u32,
    pub reason: String,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

/// Task payload, discriminated by the task's `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskDetails {
    Pickup(DonationRecord),
    Delivery(BloodRequestRecord),
}

impl TaskDetails {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskDetails::Pickup(_) => TaskKind::Pickup,
            TaskDetails::Delivery(_) => TaskKind::Delivery,
        }
    }

    pub fn blood_type(&self) -> BloodType {
        match self {
            TaskDetails::Pickup(d) => d.blood_type,
            TaskDetails::Delivery(r) => r.blood_type,
        }
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        match self {
            TaskDetails::Pickup(d) => d.coordinates,
            TaskDetails::Delivery(r) => r.coordinates,
        }
    }

    /// Donor name for pickups, hospital name for deliveries.
    pub fn counterparty(&self) -> &str {
        match self {
            TaskDetails::Pickup(d) => &d.donor_name,
            TaskDetails::Delivery(r) => &r.hospital_name,
        }
    }

    /// Where the agent has to go.
    pub fn destination(&self) -> &str {
        match self {
            TaskDetails::Pickup(d) => &d.location,
            TaskDetails::Delivery(r) => &r.hospital_name,
        }
    }
}

/// Where a task sits in its lifecycle. The completion timestamp only exists
/// on the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    New,
    Accepted,
    InProgress,
    Completed { at_ms: u64 },
}

impl TaskState {
    pub fn status(self) -> TaskStatus {
        match self {
            TaskState::New => TaskStatus::New,
            TaskState::Accepted => TaskStatus::Accepted,
            TaskState::InProgress => TaskStatus::InProgress,
            TaskState::Completed { .. } => TaskStatus::Completed,
        }
    }
}

/// A unit of agent work.
///
/// Serialized as `{ id, type, details, status, completedAtMs? }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "TaskWire")]
pub struct Task {
    pub id: String,
    pub details: TaskDetails,
    pub state: TaskState,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskWire {
    id: String,
    #[serde(rename = "type")]
    kind: TaskKind,
    details: serde_json::Value,
    status: TaskStatus,
    #[serde(default)]
    completed_at_ms: Option<u64>,
}

impl TryFrom<TaskWire> for Task {
    type Error = InvalidTask;

    fn try_from(wire: TaskWire) -> Result<Self, Self::Error> {
        let details = match wire.kind {
            TaskKind::Pickup => serde_json::from_value(wire.details).map(TaskDetails::Pickup),
            TaskKind::Delivery => serde_json::from_value(wire.details).map(TaskDetails::Delivery),
        }
        .map_err(|e| InvalidTask::Details {
            id: wire.id.clone(),
            kind: wire.kind,
            reason: e.to_string(),
        })?;

        let state = match (wire.status, wire.completed_at_ms) {
            (TaskStatus::Completed, Some(at_ms)) => TaskState::Completed { at_ms },
            (TaskStatus::Completed, None) => return Err(InvalidTask::MissingCompletion(wire.id)),
            (status, Some(_)) => {
                return Err(InvalidTask::UnexpectedCompletion {
                    id: wire.id,
                    status,
                });
            }
            (TaskStatus::New, None) => TaskState::New,
            (TaskStatus::Accepted, None) => TaskState::Accepted,
            (TaskStatus::InProgress, None) => TaskState::InProgress,
        };

        Ok(Task {
            id: wire.id,
            details,
            state,
        })
    }
}

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let completed_at_ms = self.completed_at_ms();
        let len = if completed_at_ms.is_some() { 5 } else { 4 };
        let mut s = serializer.serialize_struct("Task", len)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("type", &self.kind())?;
        match &self.details {
            TaskDetails::Pickup(d) => s.serialize_field("details", d)?,
            TaskDetails::Delivery(r) => s.serialize_field("details", r)?,
        }
        s.serialize_field("status", &self.status())?;
        if let Some(at_ms) = completed_at_ms {
            s.serialize_field("completedAtMs", &at_ms)?;
        }
        s.end()
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Available units of one blood type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub blood_type: BloodType,
    pub units: u32,
}

/// Blood bank stock: at most one entry per blood type, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<InventoryEntry>", into = "Vec<InventoryEntry>")]
pub struct Inventory {
    entries: Vec<InventoryEntry>,
}

impl Inventory {
    pub fn new(mut entries: Vec<InventoryEntry>) -> Result<Self, ValidationError> {
        entries.sort_by_key(|e| e.blood_type);
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].blood_type == pair[1].blood_type)
        {
            return Err(ValidationError::DuplicateBloodType(pair[0].blood_type));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn units_for(&self, blood_type: BloodType) -> u32 {
        self.entries
            .iter()
            .find(|e| e.blood_type == blood_type)
            .map(|e| e.units)
            .unwrap_or(0)
    }

    pub fn total_units(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.units)).sum()
    }
}

impl TryFrom<Vec<InventoryEntry>> for Inventory {
    type Error = ValidationError;

    fn try_from(entries: Vec<InventoryEntry>) -> Result<Self, Self::Error> {
        Inventory::new(entries)
    }
}

impl From<Inventory> for Vec<InventoryEntry> {
    fn from(inventory: Inventory) -> Self {
        inventory.entries
    }
}

// ---------------------------------------------------------------------------
// Submissions and responses
// ---------------------------------------------------------------------------

/// Body of `POST /api/donation-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationSubmission {
    pub donor_name: String,
    pub blood_type: BloodType,
    pub donation_type: DonationType,
    pub location: String,
}

/// Body of `POST /api/blood-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequestSubmission {
    pub hospital_name: String,
    pub blood_type: BloodType,
    pub units: u32,
    pub reason: String,
}

/// `201 Created` body for submissions: the echoed payload plus the agent
/// task created for it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAck<T> {
    pub message: String,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThankYouRequest {
    pub donor_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThankYouResponse {
    pub message: String,
}

/// Error body returned by every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Server health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub healthy: bool,
    pub active_tasks: usize,
    pub completed_tasks: usize,
    pub generation_configured: bool,
}

// ---------------------------------------------------------------------------
// Report analysis
// ---------------------------------------------------------------------------

/// Which kind of uploaded report to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    BloodWork,
    Platelet,
    WhiteCell,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::BloodWork,
        AnalysisKind::Platelet,
        AnalysisKind::WhiteCell,
    ];

    /// Path segment used by `POST /api/analyze/{kind}`.
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::BloodWork => "blood-work",
            AnalysisKind::Platelet => "platelet",
            AnalysisKind::WhiteCell => "white-cell",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown analysis kind: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodWorkSummary {
    pub total_units: u32,
    pub blood_types_found: u32,
    pub most_common_type: String,
    pub rarest_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodTypeShare {
    pub blood_type: String,
    pub units: u32,
    pub percentage: f64,
}

/// Inventory-style blood work report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodWorkAnalysis {
    pub summary: BloodWorkSummary,
    pub breakdown: Vec<BloodTypeShare>,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateletSummary {
    pub samples_analyzed: u32,
    pub average_count: f64,
    pub low_count_samples: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateletBand {
    pub category: String,
    pub count: u32,
    pub percentage: f64,
}

/// Platelet count report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateletAnalysis {
    pub summary: PlateletSummary,
    pub breakdown: Vec<PlateletBand>,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteCellSummary {
    pub total_wbc: String,
    pub dominant_cell_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteCellShare {
    pub cell_type: String,
    pub percentage: f64,
    pub absolute_count: String,
    pub normal_range: String,
}

/// White blood cell differential report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteCellAnalysis {
    pub summary: WhiteCellSummary,
    pub breakdown: Vec<WhiteCellShare>,
    pub insights: Vec<String>,
}

/// A structured analysis returned by `POST /api/analyze/{kind}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnalysisReport {
    BloodWork(BloodWorkAnalysis),
    Platelet(PlateletAnalysis),
    WhiteCell(WhiteCellAnalysis),
}

impl AnalysisReport {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisReport::BloodWork(_) => AnalysisKind::BloodWork,
            AnalysisReport::Platelet(_) => AnalysisKind::Platelet,
            AnalysisReport::WhiteCell(_) => AnalysisKind::WhiteCell,
        }
    }

    pub fn insights(&self) -> &[String] {
        match self {
            AnalysisReport::BloodWork(a) => &a.insights,
            AnalysisReport::Platelet(a) => &a.insights,
            AnalysisReport::WhiteCell(a) => &a.insights,
        }
    }

    /// Decode a model's JSON answer for the given kind.
    pub fn from_model_json(kind: AnalysisKind, json: &str) -> serde_json::Result<Self> {
        Ok(match kind {
            AnalysisKind::BloodWork => AnalysisReport::BloodWork(serde_json::from_str(json)?),
            AnalysisKind::Platelet => AnalysisReport::Platelet(serde_json::from_str(json)?),
            AnalysisKind::WhiteCell => AnalysisReport::WhiteCell(serde_json::from_str(json)?),
        })
    }
}
