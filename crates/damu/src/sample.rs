//! Fixed demo data served by the mock blood bank and the offline task source.

use crate::protocol::{
    BloodRequestRecord, BloodType, DonationRecord, DonationStatus, DonationType, GeoPoint,
    Inventory, InventoryEntry, RequestStatus, Task, TaskDetails, TaskState,
};

/// 2024-05-21T08:00:00Z
const SCHEDULED_AT_MS: u64 = 1_716_278_400_000;

pub fn inventory() -> Inventory {
    let entries = [
        (BloodType::APositive, 35),
        (BloodType::ANegative, 15),
        (BloodType::BPositive, 25),
        (BloodType::BNegative, 8),
        (BloodType::AbPositive, 5),
        (BloodType::AbNegative, 2),
        (BloodType::OPositive, 45),
        (BloodType::ONegative, 12),
    ]
    .into_iter()
    .map(|(blood_type, units)| InventoryEntry { blood_type, units })
    .collect();
    // One entry per type, so construction cannot fail.
    Inventory::new(entries).unwrap_or_default()
}

pub fn active_tasks() -> Vec<Task> {
    vec![
        Task::new(
            "TASK001",
            TaskDetails::Pickup(DonationRecord {
                id: "DONATE123".into(),
                donor_name: "Jane Doe".into(),
                blood_type: BloodType::APositive,
                donation_type: DonationType::Pickup,
                location: "123 Biashara St, Nairobi".into(),
                status: DonationStatus::Scheduled,
                donation_date_ms: SCHEDULED_AT_MS,
                agent_id: None,
                coordinates: Some(GeoPoint::new(-1.2841, 36.8155)),
            }),
        ),
        Task::new(
            "TASK002",
            TaskDetails::Delivery(BloodRequestRecord {
                id: "REQ456".into(),
                hospital_name: "Nairobi Hospital".into(),
                blood_type: BloodType::ONegative,
                units: 2,
                reason: "Emergency surgery".into(),
                status: RequestStatus::Approved,
                agent_id: None,
                coordinates: Some(GeoPoint::new(-1.2966, 36.8065)),
            }),
        ),
        Task::new(
            "TASK003",
            TaskDetails::Pickup(DonationRecord {
                id: "DONATE789".into(),
                donor_name: "John Smith".into(),
                blood_type: BloodType::BPositive,
                donation_type: DonationType::Pickup,
                location: "Westlands Office Park".into(),
                status: DonationStatus::Scheduled,
                donation_date_ms: SCHEDULED_AT_MS,
                agent_id: Some("agent-07".into()),
                coordinates: None,
            }),
        )
        .with_state(TaskState::Accepted),
    ]
}

pub fn completed_tasks() -> Vec<Task> {
    vec![
        Task::new(
            "TASKC01",
            TaskDetails::Delivery(BloodRequestRecord {
                id: "REQC01".into(),
                hospital_name: "Aga Khan Hospital".into(),
                blood_type: BloodType::APositive,
                units: 3,
                reason: "Maternity ward stock".into(),
                status: RequestStatus::Fulfilled,
                agent_id: Some("agent-07".into()),
                coordinates: Some(GeoPoint::new(-1.2612, 36.8240)),
            }),
        )
        // 2024-05-20T10:00:00Z
        .with_state(TaskState::Completed {
            at_ms: 1_716_199_200_000,
        }),
        Task::new(
            "TASKC02",
            TaskDetails::Pickup(DonationRecord {
                id: "DONATEC02".into(),
                donor_name: "Peter Kamau".into(),
                blood_type: BloodType::OPositive,
                donation_type: DonationType::Pickup,
                location: "Gigiri".into(),
                status: DonationStatus::Completed,
                donation_date_ms: 1_716_129_000_000,
                agent_id: Some("agent-07".into()),
                coordinates: Some(GeoPoint::new(-1.2330, 36.8050)),
            }),
        )
        // 2024-05-19T14:30:00Z
        .with_state(TaskState::Completed {
            at_ms: 1_716_129_000_000,
        }),
        Task::new(
            "TASKC03",
            TaskDetails::Delivery(BloodRequestRecord {
                id: "REQC03".into(),
                hospital_name: "Kenyatta National Hospital".into(),
                blood_type: BloodType::AbNegative,
                units: 1,
                reason: "Scheduled transfusion".into(),
                status: RequestStatus::Fulfilled,
                agent_id: Some("agent-07".into()),
                coordinates: Some(GeoPoint::new(-1.3010, 36.8070)),
            }),
        )
        // 2024-05-18T09:15:00Z
        .with_state(TaskState::Completed {
            at_ms: 1_716_023_700_000,
        }),
    ]
}
