use crate::arranger::ArrangePool;
use crate::catalog::{Limits, RoomCatalog, StudentRoster};
use crate::data::{
    Diagnostics, PlanSummary, RoomArrangement, SeatAssignment, SeatingRequest, SeatingResponse,
    ValidationReport, ValidationRequest,
};
use crate::error::PlanError;
use crate::{planner, validator};
use log::{error, info, trace, warn};
use std::time::Instant;

/// Builds a seating plan: validate input, allocate branches to rooms, lay out
/// each room's grid, then re-check the result before handing it out.
///
/// Students that cannot be seated are reported in the diagnostics. An error is
/// returned only for invalid input or when the finished plan breaks an
/// invariant.
pub fn solve(
    input: &SeatingRequest,
    limits: &Limits,
    pool: &ArrangePool,
) -> Result<SeatingResponse, PlanError> {
    let start_time = Instant::now();

    let catalog = RoomCatalog::new(&input.rooms, limits)?;
    let roster = StudentRoster::new(&input.students, limits)?;
    info!(
        "Planning exam {} for {} students across {} rooms ({} seats)...",
        input.exam_id.as_deref().unwrap_or("-"),
        roster.len(),
        catalog.len(),
        catalog.total_capacity()
    );

    let allocation = planner::plan(&catalog, &roster);
    info!(
        "Allocation done: {} placed, {} unplaced",
        allocation.placed_count(),
        allocation.unplaced.len()
    );

    let seating_list = pool.arrange_all(&catalog, &allocation.assignment);
    trace!("Arranged {} room grids in {:.2?}", seating_list.len(), start_time.elapsed());

    let report =
        validator::validate_against(&catalog, &roster, &seating_list, &allocation.assignment);
    if !report.ok {
        for violation in &report.violations {
            error!("Seating plan defect: {}", violation);
        }
        return Err(PlanError::ConstraintViolation(report.violations));
    }

    if !allocation.unplaced.is_empty() {
        warn!(
            "{} of {} students could not be seated",
            allocation.unplaced.len(),
            roster.len()
        );
    }

    let seat_roster = seat_roster(&seating_list, &roster);
    let summary = PlanSummary {
        total_students: roster.len(),
        placed: seat_roster.len(),
        unplaced: allocation.unplaced.len(),
        total_capacity: catalog.total_capacity(),
        rooms_used: seating_list
            .iter()
            .filter(|a| a.occupied().next().is_some())
            .count(),
    };
    let diagnostics = (!allocation.unplaced.is_empty()).then(|| Diagnostics {
        unplaced: allocation.unplaced,
        violations: Vec::new(),
        checks: report.checks,
    });

    let duration = start_time.elapsed();
    info!("Seating plan built in {:.2?}", duration);

    Ok(SeatingResponse {
        exam_id: input.exam_id.clone(),
        seating_list,
        seat_roster,
        summary,
        diagnostics,
    })
}

/// Re-checks a plan the caller already holds.
pub fn revalidate(input: &ValidationRequest, limits: &Limits) -> Result<ValidationReport, PlanError> {
    let catalog = RoomCatalog::new(&input.rooms, limits)?;
    let roster = StudentRoster::new(&input.students, limits)?;
    let report = validator::validate(&catalog, &roster, &input.seating_list);
    info!(
        "Re-validated {} room grids: {} violation(s)",
        input.seating_list.len(),
        report.violations.len()
    );
    Ok(report)
}

/// One entry per seated student, ordered by room then seat number.
fn seat_roster(seating_list: &[RoomArrangement], roster: &StudentRoster) -> Vec<SeatAssignment> {
    let mut entries: Vec<SeatAssignment> = seating_list
        .iter()
        .flat_map(|arrangement| {
            arrangement.occupied().filter_map(move |(r, c, roll)| {
                let student = roster.get(roll)?;
                Some(SeatAssignment {
                    roll_number: student.roll_number.clone(),
                    branch: student.branch.clone(),
                    room_id: arrangement.room_id.clone(),
                    seat_no: (r * arrangement.columns as usize + c + 1) as u32,
                    row: r as u32,
                    column: c as u32,
                })
            })
        })
        .collect();
    entries.sort_by(|a, b| a.room_id.cmp(&b.room_id).then(a.seat_no.cmp(&b.seat_no)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Room, Student, UnplacedReason, ViolationKind};
    use crate::error::InputError;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    fn room(id: &str, rows: u32, columns: u32, branch: &str) -> Room {
        Room {
            room_id: id.to_string(),
            rows,
            columns,
            branch: branch.to_string(),
        }
    }

    fn student(roll: &str, branch: &str) -> Student {
        Student {
            roll_number: roll.to_string(),
            branch: branch.to_string(),
        }
    }

    fn request(students: Vec<Student>, rooms: Vec<Room>) -> SeatingRequest {
        SeatingRequest {
            exam_id: Some("EX-1".to_string()),
            students,
            rooms,
        }
    }

    fn run(input: &SeatingRequest) -> Result<SeatingResponse, PlanError> {
        solve(input, &Limits::default(), &ArrangePool::default())
    }

    fn grid<'a>(response: &'a SeatingResponse, room_id: &str) -> &'a Vec<Vec<String>> {
        &response
            .seating_list
            .iter()
            .find(|a| a.room_id == room_id)
            .unwrap()
            .student_arrangement
    }

    #[test]
    fn test_rooms_swap_home_branches() {
        let input = request(
            vec![
                student("S1", "CSE"),
                student("S2", "CSE"),
                student("S3", "IT"),
                student("S4", "IT"),
            ],
            vec![room("R1", 2, 2, "CSE"), room("R2", 2, 2, "IT")],
        );
        let response = run(&input).unwrap();

        assert_eq!(grid(&response, "R1"), &vec![vec!["S3", "S4"], vec!["", ""]]);
        assert_eq!(grid(&response, "R2"), &vec![vec!["S1", "S2"], vec!["", ""]]);
        assert_eq!(response.summary.placed, 4);
        assert_eq!(response.summary.rooms_used, 2);
        assert!(response.diagnostics.is_none());
        assert_eq!(response.exam_id.as_deref(), Some("EX-1"));
    }

    #[test]
    fn test_single_row_alternates_two_branches() {
        let input = request(
            vec![
                student("E1", "ECE"),
                student("E2", "ECE"),
                student("M1", "MECH"),
                student("M2", "MECH"),
            ],
            vec![room("R1", 1, 4, "CSE")],
        );
        let response = run(&input).unwrap();
        assert_eq!(grid(&response, "R1"), &vec![vec!["E1", "M1", "E2", "M2"]]);
    }

    #[test]
    fn test_capacity_shortfall_is_reported() {
        let students = (1..=5).map(|i| student(&format!("S{i}"), "ECE")).collect();
        let response = run(&request(students, vec![room("R1", 1, 2, "CSE")])).unwrap();

        assert_eq!(response.summary.placed, 2);
        let diagnostics = response.diagnostics.unwrap();
        assert_eq!(diagnostics.unplaced.len(), 3);
        assert!(diagnostics
            .unplaced
            .iter()
            .all(|u| u.reason == UnplacedReason::CapacityExhausted));
        assert!(diagnostics.checks.iter().all(|c| c.passed));
    }

    #[test]
    fn test_no_eligible_room_is_reported() {
        let response = run(&request(
            vec![student("S1", "CSE"), student("S2", "CSE")],
            vec![room("R1", 3, 3, "CSE")],
        ))
        .unwrap();

        assert_eq!(response.summary.placed, 0);
        assert_eq!(response.summary.rooms_used, 0);
        assert_eq!(grid(&response, "R1"), &vec![vec![""; 3]; 3]);
        let diagnostics = response.diagnostics.unwrap();
        assert!(diagnostics
            .unplaced
            .iter()
            .all(|u| u.reason == UnplacedReason::NoEligibleRoom));
    }

    #[test]
    fn test_invalid_input_rejected_before_planning() {
        let err = run(&request(vec![], vec![room("R1", 1, 1, "X")])).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(InputError::EmptyRoster)));

        let err = run(&request(
            vec![student("S1", "A"), student("S1", "B")],
            vec![room("R1", 1, 1, "X")],
        ))
        .unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(InputError::DuplicateRollNumber(_))));

        let limits = Limits {
            max_students: 1,
            ..Limits::default()
        };
        let err = solve(
            &request(vec![student("S1", "A"), student("S2", "A")], vec![room("R1", 1, 1, "X")]),
            &limits,
            &ArrangePool::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(InputError::TooManyStudents { .. })));
    }

    #[test]
    fn test_seat_roster_numbers_seats_row_major() {
        let input = request(
            vec![
                student("A1", "A"),
                student("A2", "A"),
                student("B1", "B"),
                student("B2", "B"),
                student("B3", "B"),
            ],
            vec![room("R1", 2, 3, "X")],
        );
        let response = run(&input).unwrap();
        let seats: Vec<(&str, u32, u32, u32)> = response
            .seat_roster
            .iter()
            .map(|s| (s.roll_number.as_str(), s.seat_no, s.row, s.column))
            .collect();
        assert_eq!(
            seats,
            vec![
                ("A1", 1, 0, 0),
                ("B1", 2, 0, 1),
                ("A2", 3, 0, 2),
                ("B2", 4, 1, 0),
                ("B3", 5, 1, 1),
            ]
        );
    }

    #[test]
    fn test_revalidate_reports_tampered_plan() {
        let input = request(
            vec![student("S1", "CSE"), student("S3", "IT")],
            vec![room("R1", 1, 2, "CSE"), room("R2", 1, 2, "IT")],
        );
        let mut seating_list = run(&input).unwrap().seating_list;
        // move S3 (IT) into its own home room
        seating_list[1].student_arrangement[0][1] = "S3".to_string();

        let report = revalidate(
            &ValidationRequest {
                students: input.students.clone(),
                rooms: input.rooms.clone(),
                seating_list,
            },
            &Limits::default(),
        )
        .unwrap();
        assert!(!report.ok);
        let kinds: HashSet<ViolationKind> = report.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            HashSet::from([ViolationKind::HomeBranch, ViolationKind::DuplicateSeat])
        );
    }

    fn arb_request() -> impl Strategy<Value = SeatingRequest> {
        let branch = prop::sample::select(vec!["CSE", "IT", "ECE", "MECH"]);
        let students = prop::collection::vec(branch.clone(), 1..80);
        let rooms = prop::collection::vec((1u32..6, 1u32..6, branch), 1..7);
        (students, rooms).prop_map(|(students, rooms)| SeatingRequest {
            exam_id: None,
            students: students
                .into_iter()
                .enumerate()
                .map(|(i, b)| student(&format!("S{i:03}"), b))
                .collect(),
            rooms: rooms
                .into_iter()
                .enumerate()
                .map(|(i, (rows, columns, b))| room(&format!("R{i}"), rows, columns, b))
                .collect(),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_plan_respects_seating_invariants(input in arb_request()) {
            let response = run(&input);
            prop_assert!(response.is_ok());
            let response = response.unwrap();

            let branch_of: HashMap<&str, &str> = input
                .students
                .iter()
                .map(|s| (s.roll_number.as_str(), s.branch.as_str()))
                .collect();
            let mut seen = HashSet::new();
            for arrangement in &response.seating_list {
                let room = input.rooms.iter().find(|r| r.room_id == arrangement.room_id).unwrap();
                prop_assert_eq!(arrangement.student_arrangement.len(), room.rows as usize);
                prop_assert!(arrangement
                    .student_arrangement
                    .iter()
                    .all(|row| row.len() == room.columns as usize));

                let mut branches = HashSet::new();
                let mut occupied = 0;
                for (_, _, roll) in arrangement.occupied() {
                    prop_assert!(seen.insert(roll.to_string()), "{} seated twice", roll);
                    let branch = branch_of[roll];
                    prop_assert_ne!(branch, room.branch.as_str());
                    branches.insert(branch);
                    occupied += 1;
                }
                prop_assert!(branches.len() <= 2);
                prop_assert!(occupied <= room.capacity());
            }

            let unplaced = response.diagnostics.as_ref().map_or(0, |d| d.unplaced.len());
            prop_assert_eq!(seen.len() + unplaced, input.students.len());
            prop_assert_eq!(response.seat_roster.len(), seen.len());
        }

        #[test]
        fn prop_solve_is_deterministic(input in arb_request()) {
            let first = run(&input).unwrap();
            let mut shuffled = input.clone();
            shuffled.students.reverse();
            shuffled.rooms.reverse();
            let second = run(&shuffled).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_revalidation_is_idempotent(input in arb_request()) {
            let seating_list = run(&input).unwrap().seating_list;
            let request = ValidationRequest {
                students: input.students.clone(),
                rooms: input.rooms.clone(),
                seating_list,
            };
            let first = revalidate(&request, &Limits::default()).unwrap();
            let second = revalidate(&request, &Limits::default()).unwrap();
            prop_assert!(first.ok);
            prop_assert_eq!(first, second);
        }
    }
}
