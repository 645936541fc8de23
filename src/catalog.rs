//! Validated, read-only views over the caller's rooms and students.
//!
//! Both views are built once per request and reject the whole input on the
//! first broken precondition, so nothing downstream has to re-check keys,
//! blanks or dimensions.

use std::collections::{BTreeMap, HashMap};

use crate::data::{Room, Student};
use crate::error::InputError;

/// Upper bounds on request size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_students: usize,
    pub max_rooms: usize,
    pub max_room_seats: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_students: usize::MAX,
            max_rooms: usize::MAX,
            max_room_seats: usize::MAX,
        }
    }
}

/// Rooms keyed and ordered by `room_id`.
#[derive(Debug, Clone)]
pub struct RoomCatalog {
    rooms: BTreeMap<String, Room>,
}

impl RoomCatalog {
    pub fn new(rooms: &[Room], limits: &Limits) -> Result<Self, InputError> {
        if rooms.is_empty() {
            return Err(InputError::EmptyRooms);
        }
        if rooms.len() > limits.max_rooms {
            return Err(InputError::TooManyRooms {
                count: rooms.len(),
                limit: limits.max_rooms,
            });
        }

        let mut by_id = BTreeMap::new();
        for room in rooms {
            if room.room_id.trim().is_empty() {
                return Err(InputError::BlankRoomId);
            }
            if room.branch.trim().is_empty() {
                return Err(InputError::BlankRoomBranch {
                    room_id: room.room_id.clone(),
                });
            }
            if room.rows == 0 || room.columns == 0 {
                return Err(InputError::ZeroDimension {
                    room_id: room.room_id.clone(),
                });
            }
            if room.capacity() > limits.max_room_seats {
                return Err(InputError::RoomTooLarge {
                    room_id: room.room_id.clone(),
                    seats: room.capacity(),
                    limit: limits.max_room_seats,
                });
            }
            if by_id.insert(room.room_id.clone(), room.clone()).is_some() {
                return Err(InputError::DuplicateRoomId(room.room_id.clone()));
            }
        }
        Ok(Self { rooms: by_id })
    }

    /// Rooms in ascending `room_id` order, the order the planner fills them.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_capacity(&self) -> usize {
        self.rooms.values().map(Room::capacity).sum()
    }
}

/// Students keyed by `roll_number`.
#[derive(Debug, Clone)]
pub struct StudentRoster {
    students: Vec<Student>,
    index: HashMap<String, usize>,
}

impl StudentRoster {
    pub fn new(students: &[Student], limits: &Limits) -> Result<Self, InputError> {
        if students.is_empty() {
            return Err(InputError::EmptyRoster);
        }
        if students.len() > limits.max_students {
            return Err(InputError::TooManyStudents {
                count: students.len(),
                limit: limits.max_students,
            });
        }

        let mut index = HashMap::with_capacity(students.len());
        for (i, student) in students.iter().enumerate() {
            if student.roll_number.trim().is_empty() {
                return Err(InputError::BlankRollNumber);
            }
            if student.branch.trim().is_empty() {
                return Err(InputError::BlankBranch {
                    roll_number: student.roll_number.clone(),
                });
            }
            if index.insert(student.roll_number.clone(), i).is_some() {
                return Err(InputError::DuplicateRollNumber(student.roll_number.clone()));
            }
        }
        Ok(Self {
            students: students.to_vec(),
            index,
        })
    }

    /// Students in the order they were supplied.
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, roll_number: &str) -> Option<&Student> {
        self.index.get(roll_number).map(|&i| &self.students[i])
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }
}
