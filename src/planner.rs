//! Branch-to-room allocation.
//!
//! One sequential pass over the rooms in `room_id` order. Each room takes at
//! most two branches, never its own, picking the two eligible branches with
//! the most students still waiting (ties by branch name). The draw from the
//! pair is split as evenly as supply allows so the arranger can alternate
//! them. Later rooms see the queues left by earlier ones, so this pass must
//! stay sequential.

use std::collections::{BTreeMap, VecDeque};

use itertools::Itertools;
use log::{debug, trace};

use crate::catalog::{RoomCatalog, StudentRoster};
use crate::data::{Branch, Room, RoomId, Student, UnplacedReason, UnplacedStudent};

/// Most branches a single room may hold.
pub const MAX_BRANCHES_PER_ROOM: usize = 2;

/// Planner output: who goes to which room, and who goes nowhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    /// Every catalog room, with its students in draw order.
    pub assignment: BTreeMap<RoomId, Vec<Student>>,
    pub unplaced: Vec<UnplacedStudent>,
}

impl Allocation {
    pub fn placed_count(&self) -> usize {
        self.assignment.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Default)]
struct RoomState {
    free: usize,
    branches: Vec<Branch>,
}

/// Mutable bookkeeping for one planning pass.
struct AllocationState {
    queues: BTreeMap<Branch, VecDeque<Student>>,
    rooms: BTreeMap<RoomId, RoomState>,
}

impl AllocationState {
    fn new(roster: &StudentRoster) -> Self {
        let queues = roster
            .students()
            .iter()
            .map(|s| (s.branch.clone(), s.clone()))
            .into_group_map()
            .into_iter()
            .map(|(branch, students)| {
                let queue: VecDeque<Student> = students
                    .into_iter()
                    .sorted_by(|a, b| a.roll_number.cmp(&b.roll_number))
                    .collect();
                (branch, queue)
            })
            .collect();
        Self {
            queues,
            rooms: BTreeMap::new(),
        }
    }

    /// Up to two non-empty branches other than `home`, largest queue first.
    fn pick_branches(&self, home: &str) -> Vec<Branch> {
        self.queues
            .iter()
            .filter(|(branch, queue)| branch.as_str() != home && !queue.is_empty())
            .sorted_by(|(a_name, a), (b_name, b)| {
                b.len().cmp(&a.len()).then_with(|| a_name.cmp(b_name))
            })
            .take(MAX_BRANCHES_PER_ROOM)
            .map(|(branch, _)| branch.clone())
            .collect()
    }

    fn remaining(&self, branch: &str) -> usize {
        self.queues.get(branch).map_or(0, VecDeque::len)
    }

    fn pop(&mut self, branch: &str) -> Option<Student> {
        self.queues.get_mut(branch).and_then(VecDeque::pop_front)
    }

    fn fill_room(&mut self, room: &Room) -> Vec<Student> {
        let capacity = room.capacity();
        let chosen = self.pick_branches(&room.branch);

        let quotas = match (chosen.first(), chosen.get(1)) {
            (Some(first), Some(second)) => {
                split_evenly(capacity, self.remaining(first), self.remaining(second)).to_vec()
            }
            (Some(only), None) => vec![self.remaining(only).min(capacity)],
            _ => Vec::new(),
        };

        let mut drawn = Vec::with_capacity(quotas.iter().sum());
        let mut left = quotas.clone();
        while left.iter().any(|&n| n > 0) {
            for (branch, n) in chosen.iter().zip(left.iter_mut()) {
                if *n == 0 {
                    continue;
                }
                if let Some(student) = self.pop(branch) {
                    drawn.push(student);
                }
                *n -= 1;
            }
        }

        debug!(
            "Room {} (home {}, capacity {}): branches [{}] quotas {:?}",
            room.room_id,
            room.branch,
            capacity,
            chosen.iter().join(", "),
            quotas
        );

        self.rooms.insert(
            room.room_id.clone(),
            RoomState {
                free: capacity - drawn.len(),
                branches: chosen,
            },
        );
        drawn
    }

    fn unplaced_reason(&self, branch: &str, catalog: &RoomCatalog) -> UnplacedReason {
        let mut eligible = catalog.rooms().filter(|r| r.branch != branch).peekable();
        if eligible.peek().is_none() {
            return UnplacedReason::NoEligibleRoom;
        }
        // free seats left only in rooms already holding two other branches
        let closed_by_ceiling = eligible.any(|r| {
            self.rooms.get(&r.room_id).is_some_and(|s| {
                s.free > 0
                    && s.branches.len() >= MAX_BRANCHES_PER_ROOM
                    && !s.branches.iter().any(|b| b == branch)
            })
        });
        if closed_by_ceiling {
            UnplacedReason::NoEligibleRoom
        } else {
            UnplacedReason::CapacityExhausted
        }
    }

    fn into_unplaced(self, catalog: &RoomCatalog) -> Vec<UnplacedStudent> {
        let mut unplaced = Vec::new();
        for (branch, queue) in &self.queues {
            if queue.is_empty() {
                continue;
            }
            let reason = self.unplaced_reason(branch, catalog);
            trace!("{} student(s) of {} unplaced: {}", queue.len(), branch, reason);
            unplaced.extend(queue.iter().map(|s| UnplacedStudent {
                roll_number: s.roll_number.clone(),
                branch: s.branch.clone(),
                reason,
            }));
        }
        unplaced
    }
}

/// Seats `n = min(capacity, a + b)` between two branches with `a` and `b`
/// students waiting, as close to half each as supply allows. The first branch
/// takes the odd seat.
fn split_evenly(capacity: usize, a: usize, b: usize) -> [usize; 2] {
    let n = capacity.min(a + b);
    let take_b = b.min(n / 2);
    let take_a = a.min(n - take_b);
    let take_b = b.min(n - take_a);
    [take_a, take_b]
}

/// Assigns students to rooms. Inputs are already validated by their views.
pub fn plan(catalog: &RoomCatalog, roster: &StudentRoster) -> Allocation {
    let mut state = AllocationState::new(roster);
    let mut assignment = BTreeMap::new();

    for room in catalog.rooms() {
        let drawn = state.fill_room(room);
        assignment.insert(room.room_id.clone(), drawn);
    }

    let unplaced = state.into_unplaced(catalog);
    Allocation {
        assignment,
        unplaced,
    }
}
