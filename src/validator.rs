//! Re-checks a finished seating plan against the catalog and roster.
//!
//! Room-local checks (dimensions, capacity, home branch, branch ceiling,
//! roster membership) run per room in parallel. Checks that span rooms
//! (duplicate rooms, duplicate seats, agreement with the planner's
//! assignment) run afterwards in a single pass. The report depends only on
//! its inputs, so validating the same plan twice yields the same report.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use itertools::Itertools;
use rayon::prelude::*;

use crate::catalog::{RoomCatalog, StudentRoster};
use crate::data::{
    ConstraintCheck, RoomArrangement, RoomId, Student, ValidationReport, Violation, ViolationKind,
};
use crate::planner::MAX_BRANCHES_PER_ROOM;

const GRID_DIMENSIONS: &str = "grid_dimensions";
const KNOWN_ROOMS: &str = "known_rooms";
const UNIQUE_SEATING: &str = "unique_seating";
const ROSTER_MEMBERSHIP: &str = "roster_membership";
const HOME_BRANCH_EXCLUSION: &str = "home_branch_exclusion";
const BRANCH_CEILING: &str = "branch_ceiling";
const CAPACITY: &str = "capacity";
const ASSIGNMENT_CONSISTENCY: &str = "assignment_consistency";

fn check_name(kind: ViolationKind) -> &'static str {
    match kind {
        ViolationKind::UnknownRoom | ViolationKind::DuplicateRoom => KNOWN_ROOMS,
        ViolationKind::DimensionMismatch => GRID_DIMENSIONS,
        ViolationKind::DuplicateSeat => UNIQUE_SEATING,
        ViolationKind::UnknownStudent => ROSTER_MEMBERSHIP,
        ViolationKind::HomeBranch => HOME_BRANCH_EXCLUSION,
        ViolationKind::BranchCeiling => BRANCH_CEILING,
        ViolationKind::CapacityExceeded => CAPACITY,
        ViolationKind::AssignmentMismatch => ASSIGNMENT_CONSISTENCY,
    }
}

fn violation(
    kind: ViolationKind,
    room_id: Option<&str>,
    roll_number: Option<&str>,
    message: String,
) -> Violation {
    Violation {
        kind,
        room_id: room_id.map(str::to_string),
        roll_number: roll_number.map(str::to_string),
        message,
    }
}

fn check_room(
    arrangement: &RoomArrangement,
    catalog: &RoomCatalog,
    roster: &StudentRoster,
) -> Vec<Violation> {
    let id = arrangement.room_id.as_str();
    let mut out = Vec::new();

    let Some(room) = catalog.get(id) else {
        out.push(violation(
            ViolationKind::UnknownRoom,
            Some(id),
            None,
            format!("room {id} is not in the room catalog"),
        ));
        return out;
    };

    let grid = &arrangement.student_arrangement;
    let rows_ok = grid.len() == room.rows as usize;
    let columns_ok = grid.iter().all(|row| row.len() == room.columns as usize);
    let header_ok = arrangement.rows == room.rows && arrangement.columns == room.columns;
    if !(rows_ok && columns_ok && header_ok) {
        let shape = grid.iter().map(Vec::len).join(",");
        out.push(violation(
            ViolationKind::DimensionMismatch,
            Some(id),
            None,
            format!(
                "room {id} is {}x{} but the plan declares {}x{} with row lengths [{shape}]",
                room.rows, room.columns, arrangement.rows, arrangement.columns
            ),
        ));
    }

    let occupied = arrangement.occupied().count();
    if occupied > room.capacity() {
        out.push(violation(
            ViolationKind::CapacityExceeded,
            Some(id),
            None,
            format!("room {id} seats {occupied} students but holds {}", room.capacity()),
        ));
    }

    let mut branches = BTreeSet::new();
    for (r, c, roll) in arrangement.occupied() {
        let Some(student) = roster.get(roll) else {
            out.push(violation(
                ViolationKind::UnknownStudent,
                Some(id),
                Some(roll),
                format!("seat ({r}, {c}) in room {id} holds {roll}, who is not on the roster"),
            ));
            continue;
        };
        if student.branch == room.branch {
            out.push(violation(
                ViolationKind::HomeBranch,
                Some(id),
                Some(roll),
                format!("{roll} ({}) is seated in a room of its own branch", student.branch),
            ));
        }
        branches.insert(student.branch.as_str());
    }
    if branches.len() > MAX_BRANCHES_PER_ROOM {
        out.push(violation(
            ViolationKind::BranchCeiling,
            Some(id),
            None,
            format!("room {id} mixes {} branches: {}", branches.len(), branches.iter().join(", ")),
        ));
    }

    out
}

fn check_duplicates(plan: &[RoomArrangement]) -> Vec<Violation> {
    let mut out = Vec::new();

    let mut seen_rooms = HashSet::new();
    for arrangement in plan {
        if !seen_rooms.insert(arrangement.room_id.as_str()) {
            out.push(violation(
                ViolationKind::DuplicateRoom,
                Some(arrangement.room_id.as_str()),
                None,
                format!("room {} appears more than once in the plan", arrangement.room_id),
            ));
        }
    }

    let mut seats: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for arrangement in plan {
        for (_, _, roll) in arrangement.occupied() {
            seats.entry(roll).or_default().push(arrangement.room_id.as_str());
        }
    }
    for (roll, rooms) in seats.into_iter().filter(|(_, rooms)| rooms.len() > 1) {
        out.push(violation(
            ViolationKind::DuplicateSeat,
            None,
            Some(roll),
            format!("{roll} is seated {} times, in rooms {}", rooms.len(), rooms.iter().join(", ")),
        ));
    }
    out
}

fn check_assignment(
    plan: &[RoomArrangement],
    assignment: &BTreeMap<RoomId, Vec<Student>>,
) -> Vec<Violation> {
    let seated: BTreeMap<&str, BTreeSet<&str>> = plan
        .iter()
        .map(|a| (a.room_id.as_str(), a.occupied().map(|(_, _, roll)| roll).collect()))
        .collect();
    let room_ids: BTreeSet<&str> = seated
        .keys()
        .copied()
        .chain(assignment.keys().map(String::as_str))
        .collect();

    let mut out = Vec::new();
    for id in room_ids {
        let expected: BTreeSet<&str> = assignment
            .get(id)
            .map(|list| list.iter().map(|s| s.roll_number.as_str()).collect())
            .unwrap_or_default();
        let actual = seated.get(id).cloned().unwrap_or_default();

        for &roll in expected.difference(&actual) {
            out.push(violation(
                ViolationKind::AssignmentMismatch,
                Some(id),
                Some(roll),
                format!("{roll} was assigned to room {id} but has no seat there"),
            ));
        }
        for &roll in actual.difference(&expected) {
            out.push(violation(
                ViolationKind::AssignmentMismatch,
                Some(id),
                Some(roll),
                format!("{roll} is seated in room {id} without being assigned to it"),
            ));
        }
    }
    out
}

fn report(violations: Vec<Violation>, with_assignment: bool) -> ValidationReport {
    let failed: HashSet<&str> = violations.iter().map(|v| check_name(v.kind)).collect();
    let mut names = vec![
        GRID_DIMENSIONS,
        KNOWN_ROOMS,
        UNIQUE_SEATING,
        ROSTER_MEMBERSHIP,
        HOME_BRANCH_EXCLUSION,
        BRANCH_CEILING,
        CAPACITY,
    ];
    if with_assignment {
        names.push(ASSIGNMENT_CONSISTENCY);
    }
    let checks = names
        .into_iter()
        .map(|name| ConstraintCheck {
            name: name.to_string(),
            passed: !failed.contains(name),
        })
        .collect();

    ValidationReport {
        ok: violations.is_empty(),
        checks,
        violations,
    }
}

fn collect_violations(
    catalog: &RoomCatalog,
    roster: &StudentRoster,
    plan: &[RoomArrangement],
) -> Vec<Violation> {
    let per_room: Vec<Vec<Violation>> = plan
        .par_iter()
        .map(|arrangement| check_room(arrangement, catalog, roster))
        .collect();
    let mut violations: Vec<Violation> = per_room.into_iter().flatten().collect();
    violations.extend(check_duplicates(plan));
    violations
}

/// Checks a plan on its own, e.g. one submitted back for re-validation.
pub fn validate(
    catalog: &RoomCatalog,
    roster: &StudentRoster,
    plan: &[RoomArrangement],
) -> ValidationReport {
    report(collect_violations(catalog, roster, plan), false)
}

/// Checks a plan and also that it seats exactly the students the planner
/// assigned to each room.
pub fn validate_against(
    catalog: &RoomCatalog,
    roster: &StudentRoster,
    plan: &[RoomArrangement],
    assignment: &BTreeMap<RoomId, Vec<Student>>,
) -> ValidationReport {
    let mut violations = collect_violations(catalog, roster, plan);
    violations.extend(check_assignment(plan, assignment));
    report(violations, true)
}
