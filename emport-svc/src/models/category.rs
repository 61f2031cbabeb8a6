//! Configuration category registry
//!
//! The rank table encodes which categories reference which: an entity may only
//! reference entities of a category with a lower rank, so applying in rank
//! order never meets a dangling reference that the same document would have
//! satisfied later.

use serde_json::Value;
use std::fmt;

/// A field of an entity that names entities of another category
///
/// The field holds either one key string or an array of key strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub target: &'static str,
}

/// Immutable descriptor of one configuration category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Document key (unique)
    pub name: &'static str,
    /// Lower ranks are exported first and applied first
    pub rank: u8,
    /// Field holding the entity's identity within its category
    pub key_field: &'static str,
    /// Cross-category references that must resolve when the entity is applied
    pub references: &'static [Reference],
}

impl Category {
    /// Key string of `entity`, if present and non-empty
    pub fn key_of<'a>(&self, entity: &'a Value) -> Option<&'a str> {
        entity
            .get(self.key_field)
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub const USERS: &str = "users";
pub const DATA_SOURCES: &str = "dataSources";
pub const DATA_POINTS: &str = "dataPoints";
pub const POINT_HIERARCHY: &str = "pointHierarchy";
pub const SCHEDULED_EVENTS: &str = "scheduledEvents";
pub const COMPOUND_EVENT_DETECTORS: &str = "compoundEventDetectors";
pub const MAILING_LISTS: &str = "mailingLists";
pub const PUBLISHERS: &str = "publishers";
pub const EVENT_HANDLERS: &str = "eventHandlers";
pub const POINT_LINKS: &str = "pointLinks";
pub const WATCH_LISTS: &str = "watchLists";
pub const GRAPHICAL_VIEWS: &str = "graphicalViews";
pub const MAINTENANCE_EVENTS: &str = "maintenanceEvents";

/// All known categories, sorted by rank
pub static CATEGORIES: [Category; 13] = [
    Category {
        name: USERS,
        rank: 1,
        key_field: "username",
        references: &[],
    },
    Category {
        name: DATA_SOURCES,
        rank: 2,
        key_field: "xid",
        references: &[],
    },
    Category {
        name: DATA_POINTS,
        rank: 3,
        key_field: "xid",
        references: &[Reference {
            field: "dataSourceXid",
            target: DATA_SOURCES,
        }],
    },
    Category {
        name: POINT_HIERARCHY,
        rank: 4,
        key_field: "name",
        references: &[Reference {
            field: "points",
            target: DATA_POINTS,
        }],
    },
    Category {
        name: SCHEDULED_EVENTS,
        rank: 5,
        key_field: "xid",
        references: &[],
    },
    Category {
        name: COMPOUND_EVENT_DETECTORS,
        rank: 6,
        key_field: "xid",
        references: &[],
    },
    Category {
        name: MAILING_LISTS,
        rank: 7,
        key_field: "xid",
        references: &[Reference {
            field: "users",
            target: USERS,
        }],
    },
    Category {
        name: PUBLISHERS,
        rank: 8,
        key_field: "xid",
        references: &[Reference {
            field: "points",
            target: DATA_POINTS,
        }],
    },
    Category {
        name: EVENT_HANDLERS,
        rank: 9,
        key_field: "xid",
        references: &[Reference {
            field: "mailingLists",
            target: MAILING_LISTS,
        }],
    },
    Category {
        name: POINT_LINKS,
        rank: 10,
        key_field: "xid",
        references: &[
            Reference {
                field: "sourcePointId",
                target: DATA_POINTS,
            },
            Reference {
                field: "targetPointId",
                target: DATA_POINTS,
            },
        ],
    },
    Category {
        name: WATCH_LISTS,
        rank: 11,
        key_field: "xid",
        references: &[
            Reference {
                field: "user",
                target: USERS,
            },
            Reference {
                field: "dataPoints",
                target: DATA_POINTS,
            },
        ],
    },
    Category {
        name: GRAPHICAL_VIEWS,
        rank: 12,
        key_field: "xid",
        references: &[Reference {
            field: "user",
            target: USERS,
        }],
    },
    Category {
        name: MAINTENANCE_EVENTS,
        rank: 13,
        key_field: "xid",
        references: &[Reference {
            field: "dataSourceXid",
            target: DATA_SOURCES,
        }],
    },
];

/// All categories in rank order
pub fn all() -> &'static [Category] {
    &CATEGORIES
}

/// Look up a category by document key
pub fn lookup(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_ranks_are_strictly_increasing() {
        for pair in CATEGORIES.windows(2) {
            assert!(
                pair[0].rank < pair[1].rank,
                "{} must rank before {}",
                pair[0].name,
                pair[1].name
            );
        }
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = CATEGORIES.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), CATEGORIES.len());
    }

    #[test]
    fn test_references_point_to_lower_ranks() {
        for category in all() {
            for reference in category.references {
                let target = lookup(reference.target)
                    .unwrap_or_else(|| panic!("unknown target {}", reference.target));
                assert!(
                    target.rank < category.rank,
                    "{}.{} references {} which does not rank lower",
                    category.name,
                    reference.field,
                    target.name
                );
            }
        }
    }

    #[test]
    fn test_key_of() {
        let users = lookup("users").unwrap();
        assert_eq!(users.key_of(&json!({"username": "admin"})), Some("admin"));
        assert_eq!(users.key_of(&json!({"username": ""})), None);
        assert_eq!(users.key_of(&json!({"username": 7})), None);
        assert_eq!(users.key_of(&json!({"xid": "U_1"})), None);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("dataPoints").map(|c| c.rank), Some(3));
        assert!(lookup("DataPoints").is_none());
        assert!(lookup("systemSettings").is_none());
    }
}
