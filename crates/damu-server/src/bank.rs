//! In-memory blood bank backing the API.

use damu::protocol::{
    BloodRequestRecord, BloodRequestSubmission, DonationRecord, DonationStatus,
    DonationSubmission, DonationType, Inventory, RequestStatus, Task, TaskDetails,
};
use damu::store::TaskStore;

/// Inventory plus the agent task lists. Nothing is persisted.
#[derive(Debug, Clone)]
pub struct MockBank {
    inventory: Inventory,
    tasks: TaskStore,
}

impl MockBank {
    /// The Nairobi demo data set.
    pub fn seeded() -> Self {
        let mut tasks = TaskStore::new();
        tasks.replace_all(damu::sample::active_tasks(), damu::sample::completed_tasks());
        Self {
            inventory: damu::sample::inventory(),
            tasks,
        }
    }

    pub fn empty() -> Self {
        Self {
            inventory: Inventory::default(),
            tasks: TaskStore::new(),
        }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn active_tasks(&self) -> &[Task] {
        self.tasks.active()
    }

    pub fn completed_tasks(&self) -> &[Task] {
        self.tasks.completed()
    }

    /// Record a donation. Agent pickups get a `New` task; returns its id.
    pub fn record_donation(&mut self, submission: &DonationSubmission, now_ms: u64) -> Option<String> {
        if submission.donation_type != DonationType::Pickup {
            return None;
        }
        let record = DonationRecord {
            id: new_id("DONATE"),
            donor_name: submission.donor_name.clone(),
            blood_type: submission.blood_type,
            donation_type: submission.donation_type,
            location: submission.location.clone(),
            status: DonationStatus::Pending,
            donation_date_ms: now_ms,
            agent_id: None,
            coordinates: None,
        };
        Some(self.push_task(TaskDetails::Pickup(record)))
    }

    /// Record a hospital request and queue a `New` delivery task for it.
    pub fn record_blood_request(&mut self, submission: &BloodRequestSubmission) -> String {
        let record = BloodRequestRecord {
            id: new_id("REQ"),
            hospital_name: submission.hospital_name.clone(),
            blood_type: submission.blood_type,
            units: submission.units,
            reason: submission.reason.clone(),
            status: RequestStatus::Pending,
            agent_id: None,
            coordinates: None,
        };
        self.push_task(TaskDetails::Delivery(record))
    }

    fn push_task(&mut self, details: TaskDetails) -> String {
        // Only a (vanishingly unlikely) id collision can be refused; a
        // freshly created task is always New.
        loop {
            let task = Task::new(new_id("TASK"), details.clone());
            let id = task.id.clone();
            let kind = task.kind();
            match self.tasks.push_active(task) {
                Ok(()) => {
                    tracing::info!(task_id = %id, %kind, "task queued");
                    return id;
                }
                Err(e) => tracing::warn!(error = %e, "task id refused, drawing another"),
            }
        }
    }
}

fn new_id(prefix: &str) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &uuid[..8]).to_uppercase()
}
