//! Lays each room's assigned students onto its seat grid.
//!
//! Cells are visited row-major. The smaller branch group sits on cells where
//! `(row + column)` is even and the larger one where it is odd, which gives a
//! checkerboard across both axes. When one group runs out the other fills the
//! remaining seats in order, and empty seats always trail the last student.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use itertools::Itertools;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::catalog::RoomCatalog;
use crate::data::{EMPTY_SEAT, Room, RoomArrangement, RoomId, Student};

/// Splits `assigned` into (minority, majority) queues, keeping draw order
/// inside each branch. Ties go to branch name: the lower name is the minority.
fn split_groups(assigned: &[Student]) -> (VecDeque<&Student>, VecDeque<&Student>) {
    let mut groups = assigned
        .iter()
        .map(|s| (s.branch.as_str(), s))
        .into_group_map()
        .into_iter()
        .sorted_by(|(a_name, a), (b_name, b)| {
            a.len().cmp(&b.len()).then_with(|| a_name.cmp(b_name))
        });

    let minority = groups.next().map(|(_, g)| g.into()).unwrap_or_default();
    // a third branch never comes from the planner; it rides with the majority
    let majority = groups.flat_map(|(_, g)| g).collect();
    (minority, majority)
}

/// Builds the `rows x columns` grid for one room.
pub fn arrange(room: &Room, assigned: &[Student]) -> RoomArrangement {
    let (mut minority, mut majority) = split_groups(assigned);

    let rows = room.rows as usize;
    let columns = room.columns as usize;
    let mut grid = Vec::with_capacity(rows);
    for r in 0..rows {
        let mut row = Vec::with_capacity(columns);
        for c in 0..columns {
            let (preferred, fallback) = if (r + c) % 2 == 0 {
                (&mut minority, &mut majority)
            } else {
                (&mut majority, &mut minority)
            };
            let seat = preferred.pop_front().or_else(|| fallback.pop_front());
            row.push(seat.map_or_else(|| EMPTY_SEAT.to_string(), |s| s.roll_number.clone()));
        }
        grid.push(row);
    }

    RoomArrangement {
        room_id: room.room_id.clone(),
        rows: room.rows,
        columns: room.columns,
        student_arrangement: grid,
    }
}

/// Arranges every catalog room, in parallel across rooms.
///
/// Uses a dedicated pool when one was configured, otherwise rayon's global
/// pool. Output follows catalog order.
#[derive(Clone, Default)]
pub struct ArrangePool {
    pool: Option<Arc<ThreadPool>>,
}

impl ArrangePool {
    pub fn with_threads(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        if threads == 0 {
            return Ok(Self::default());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("arrange-{i}"))
            .build()?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    pub fn arrange_all(
        &self,
        catalog: &RoomCatalog,
        assignment: &BTreeMap<RoomId, Vec<Student>>,
    ) -> Vec<RoomArrangement> {
        let rooms: Vec<&Room> = catalog.rooms().collect();
        let run = || {
            rooms
                .par_iter()
                .map(|room| {
                    let assigned = assignment.get(&room.room_id).map_or(&[][..], Vec::as_slice);
                    arrange(room, assigned)
                })
                .collect::<Vec<_>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
