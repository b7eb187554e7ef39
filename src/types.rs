//! Core record types for the task board.

use crate::error::{GraphError, GraphResult};
use crate::geometry::Point;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Date format used for `due_date` and `created_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fill color for tasks that never picked one (amber).
pub const DEFAULT_COLOR: &str = "#ffc107";

/// Position given to a task that was stored without one.
pub const FALLBACK_POSITION: Point = Point::new(10.0, 10.0);

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a task. Opaque and immutable once assigned.
    TaskId
);

string_id!(
    /// Identifier of a connection.
    ConnectionId
);

/// Fixed set of task categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Work,
    Personal,
    Urgent,
    Study,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Personal,
        Category::Urgent,
        Category::Study,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Urgent => "Urgent",
            Category::Study => "Study",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                GraphError::invalid_value("category", format!("Unknown category: {}", s))
            })
    }
}

/// A `#rrggbb` color, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn parse(value: &str) -> GraphResult<Self> {
        let hex = value
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| GraphError::invalid_value("color", "Color must start with '#'"))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GraphError::invalid_value(
                "color",
                format!("Color must be #RRGGBB, got {}", value),
            ));
        }
        Ok(Self(format!("#{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Red, green and blue channels.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        (channel(1), channel(3), channel(5))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self(DEFAULT_COLOR.to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.0
    }
}

impl FromStr for Color {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> GraphResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        GraphError::invalid_value(field, format!("Expected YYYY-MM-DD, got {}", value))
    })
}

/// A task card on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub created_date: NaiveDate,
    pub category: Category,
    pub color: Color,
    pub pos: Point,
}

impl TaskRecord {
    /// Current editable fields, as handed to the editor dialog.
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            due_date: Some(self.due_date),
            category: Some(self.category),
            color: Some(self.color.clone()),
        }
    }

    /// Merge a partial field set into this record. `id`, `created_date` and
    /// `pos` are never touched here.
    pub(crate) fn apply(&mut self, fields: TaskFields) {
        let TaskFields {
            title,
            description,
            due_date,
            category,
            color,
        } = fields;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(due_date) = due_date {
            self.due_date = due_date;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(color) = color {
            self.color = color;
        }
    }
}

/// A directed link between two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub from: TaskId,
    pub to: TaskId,
}

impl ConnectionRecord {
    /// True when either endpoint is `task_id`.
    pub fn touches(&self, task_id: &str) -> bool {
        self.from.as_str() == task_id || self.to.as_str() == task_id
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Editable task fields. `None` leaves a field unchanged on update, or takes
/// its default on creation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub category: Option<Category>,
    pub color: Option<Color>,
}

impl TaskFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Structural check: a title, when present, must contain something other
    /// than whitespace.
    pub fn validate(&self) -> GraphResult<()> {
        match &self.title {
            Some(title) if title.trim().is_empty() => Err(GraphError::missing_field("title")),
            _ => Ok(()),
        }
    }
}
