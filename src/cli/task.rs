//! Task field flags shared by `add` and `edit`.

use crate::error::{GraphError, GraphResult};
use crate::geometry::Point;
use crate::types::{Category, Color, TaskFields, parse_date};
use clap::Args;

/// Optional field flags
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,

    /// Work, Personal, Urgent, Study or Other
    #[arg(long)]
    pub category: Option<String>,

    /// Card color as #rrggbb
    #[arg(long)]
    pub color: Option<String>,
}

impl FieldArgs {
    /// Parse the flags into a partial field set.
    pub fn to_fields(&self, title: Option<&str>) -> GraphResult<TaskFields> {
        let mut fields = TaskFields {
            title: title.map(str::to_string),
            description: self.description.clone(),
            ..TaskFields::default()
        };
        if let Some(due) = &self.due {
            fields.due_date = Some(parse_date("due_date", due)?);
        }
        if let Some(category) = &self.category {
            fields.category = Some(category.parse::<Category>()?);
        }
        if let Some(color) = &self.color {
            fields.color = Some(Color::parse(color)?);
        }
        fields.validate()?;
        Ok(fields)
    }
}

/// Arguments for the add subcommand
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task title
    #[arg(long)]
    pub title: String,

    #[command(flatten)]
    pub fields: FieldArgs,

    /// Card position as X,Y (default from config)
    #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
    pub at: Option<String>,
}

/// Arguments for the edit subcommand
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Task id
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub fields: FieldArgs,
}

/// Parse `X,Y`.
pub fn parse_point(s: &str) -> GraphResult<Point> {
    let invalid = || GraphError::invalid_value("pos", format!("Expected X,Y, got '{}'", s));
    let (x, y) = s.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok(Point::new(x, y))
}
