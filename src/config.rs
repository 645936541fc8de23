use crate::catalog::Limits;

/// Service configuration, read from `SEATING_*` environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Default log filter; `RUST_LOG` takes precedence
    pub log_level: String,
    pub max_students: usize,
    pub max_rooms: usize,
    pub max_room_seats: usize,
    /// Worker threads for arranging rooms; 0 uses the global rayon pool
    pub arrange_threads: usize,
    /// Solve requests handled at once
    pub max_concurrent_solves: usize,
    /// Variables that were set but could not be parsed, as `KEY="value"`
    pub rejected_vars: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            log_level: "info".to_string(),
            max_students: 50_000,
            max_rooms: 2_000,
            max_room_seats: 5_000,
            arrange_threads: 0,
            max_concurrent_solves: 8,
            rejected_vars: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        let mut rejected = Vec::new();
        let mut number = |key: &str, fallback: usize| match lookup(key) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                rejected.push(format!("{key}={raw:?}"));
                fallback
            }),
            None => fallback,
        };

        let max_students = number("SEATING_MAX_STUDENTS", default.max_students);
        let max_rooms = number("SEATING_MAX_ROOMS", default.max_rooms);
        let max_room_seats = number("SEATING_MAX_ROOM_SEATS", default.max_room_seats);
        let arrange_threads = number("SEATING_ARRANGE_THREADS", default.arrange_threads);
        let max_concurrent_solves =
            number("SEATING_MAX_CONCURRENT", default.max_concurrent_solves).max(1);

        Self {
            bind_addr: lookup("SEATING_BIND_ADDR").unwrap_or(default.bind_addr),
            log_level: lookup("SEATING_LOG_LEVEL").unwrap_or(default.log_level),
            max_students,
            max_rooms,
            max_room_seats,
            arrange_threads,
            max_concurrent_solves,
            rejected_vars: rejected,
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_students: self.max_students,
            max_rooms: self.max_rooms,
            max_room_seats: self.max_room_seats,
        }
    }
}
