use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type RoomId = String;
pub type RollNumber = String;
pub type Branch = String;

/// Marker stored in a grid cell that has no student.
pub const EMPTY_SEAT: &str = "";

/// A student as supplied by the roster service. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Student {
    pub roll_number: RollNumber,
    pub branch: Branch,
}

/// A physical exam room with a fixed seat grid and a home branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Room {
    pub room_id: RoomId,
    pub rows: u32,
    pub columns: u32,
    pub branch: Branch,
}

impl Room {
    pub fn capacity(&self) -> usize {
        self.rows as usize * self.columns as usize
    }
}

/// The complete input for one seating request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeatingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<String>,
    pub students: Vec<Student>,
    pub rooms: Vec<Room>,
}

/// The seat grid of a single room. Empty seats hold [`EMPTY_SEAT`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoomArrangement {
    pub room_id: RoomId,
    pub rows: u32,
    pub columns: u32,
    pub student_arrangement: Vec<Vec<String>>,
}

impl RoomArrangement {
    /// Occupied cells in row-major order as `(row, column, roll_number)`.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &str)> {
        self.student_arrangement
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, cell)| cell.as_str() != EMPTY_SEAT)
                    .map(move |(c, cell)| (r, c, cell.as_str()))
            })
    }
}

/// Why a student could not be seated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnplacedReason {
    /// No room admits the student's branch.
    NoEligibleRoom,
    /// Every room that admits the branch is full.
    CapacityExhausted,
}

impl fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnplacedReason::NoEligibleRoom => write!(f, "NoEligibleRoom"),
            UnplacedReason::CapacityExhausted => write!(f, "CapacityExhausted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedStudent {
    pub roll_number: RollNumber,
    pub branch: Branch,
    pub reason: UnplacedReason,
}

/// Category of a broken plan invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    UnknownRoom,
    DuplicateRoom,
    DimensionMismatch,
    DuplicateSeat,
    UnknownStudent,
    HomeBranch,
    BranchCeiling,
    CapacityExceeded,
    AssignmentMismatch,
}

/// A single broken invariant found while validating a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<RollNumber>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

/// Pass/fail outcome of one named constraint check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintCheck {
    pub name: String,
    pub passed: bool,
}

/// Result of re-checking a finished plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub checks: Vec<ConstraintCheck>,
    pub violations: Vec<Violation>,
}

/// Input for re-validating an existing plan.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidationRequest {
    pub students: Vec<Student>,
    pub rooms: Vec<Room>,
    pub seating_list: Vec<RoomArrangement>,
}

/// Where one placed student sits, for attendance marking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub roll_number: RollNumber,
    pub branch: Branch,
    pub room_id: RoomId,
    /// 1-based row-major seat index within the room.
    pub seat_no: u32,
    pub row: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unplaced: Vec<UnplacedStudent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<ConstraintCheck>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_students: usize,
    pub placed: usize,
    pub unplaced: usize,
    pub total_capacity: usize,
    pub rooms_used: usize,
}

/// The final output of the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<String>,
    pub seating_list: Vec<RoomArrangement>,
    pub seat_roster: Vec<SeatAssignment>,
    pub summary: PlanSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}
