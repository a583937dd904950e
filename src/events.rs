use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BuildingId, DemandId, DemandStatus, PaymentMethod, UnitId};

/// all events emitted by the billing engine; callers drain these into their
/// audit or notification pipelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    DemandIssued {
        demand_id: DemandId,
        unit_id: UnitId,
        building_id: BuildingId,
        quarter: String,
        total_due: Money,
        due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    IssuanceSkipped {
        unit_id: UnitId,
        quarter: String,
        reason: String,
    },
    PaymentRecorded {
        demand_id: DemandId,
        amount: Money,
        method: PaymentMethod,
        outstanding_after: Money,
        status_after: DemandStatus,
        timestamp: DateTime<Utc>,
    },
    ReminderSent {
        demand_id: DemandId,
        unit_id: UnitId,
        quarter: String,
        outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    PenaltyApplied {
        demand_id: DemandId,
        amount: Money,
        new_total_due: Money,
        timestamp: DateTime<Utc>,
    },
    DemandCancelled {
        demand_id: DemandId,
        quarter: String,
        timestamp: DateTime<Utc>,
    },
    NotificationDispatched {
        demand_id: DemandId,
        unit_id: UnitId,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains_store() {
        let mut store = EventStore::new();
        store.emit(Event::IssuanceSkipped {
            unit_id: Uuid::new_v4(),
            quarter: "2024-Q1".to_string(),
            reason: "already issued".to_string(),
        });

        assert_eq!(store.events().len(), 1);
        let drained = store.take_events();
        assert_eq!(drained.len(), 1);
        assert!(store.events().is_empty());
    }
}
