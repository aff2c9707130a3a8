use std::fmt;

/// Delivery scope for a broadcast.
///
/// Event rooms carry the chat of one event; user rooms carry private
/// messages and notifications for one user. The two id spaces overlap,
/// so rooms are a tagged enum rather than bare strings; `Event(5)` and
/// `User(5)` can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// Chat room of a single event.
    Event(i64),
    /// Personal room of a single user.
    User(i64),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Event(id) => write!(f, "event:{}", id),
            Room::User(id) => write!(f, "user:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_id_spaces_apart() {
        assert_eq!(Room::Event(5).to_string(), "event:5");
        assert_eq!(Room::User(5).to_string(), "user:5");
        assert_ne!(Room::Event(5), Room::User(5));
    }

    #[test]
    fn rooms_are_usable_as_map_keys() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Room::Event(1));
        set.insert(Room::Event(1));
        set.insert(Room::User(1));

        assert_eq!(set.len(), 2);
    }
}
