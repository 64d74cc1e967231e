use serde::{Deserialize, Serialize};

/// One traveller occupying one seat, embedded inside a reservation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
    /// 8-digit national document number
    pub document_id: String,
    /// Seat code, e.g. "3B"
    pub seat: String,
}

impl Passenger {
    pub fn new(first_name: &str, last_name: &str, document_id: &str, seat: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            document_id: document_id.to_string(),
            seat: seat.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
