//! Command-line argument definitions for the Kinro CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global options select the backend, configuration file and
//! logging verbosity; the [`Command`] names the operation to run.

use clap::{Parser, Subcommand};

use kinro::schema::{DataType, PropertyKind, RelationKind};

/// Command-line arguments for the Kinro schema diagram client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Base URL of the REST server, overriding configuration and `KINRO_API_URL`
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Work offline against a JSON snapshot file instead of the server
    #[arg(long, global = true)]
    pub snapshot: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the laid-out diagram
    Show {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render the diagram to an SVG file
    Render {
        /// Path to the output SVG file
        #[arg(short, long, default_value = "out.svg")]
        output: String,
    },

    /// Create a class
    CreateClass { name: String },

    /// Rename a class
    RenameClass { id: String, name: String },

    /// Delete a class with its attributes, data and connections
    DeleteClass { id: String },

    /// Create an empty copy of a class named "<name> (Copia)"
    DuplicateClass { id: String },

    /// Add an attribute to a class
    AddAttribute {
        class: String,
        name: String,
        /// integer, text, boolean, date, float, json or uuid
        data_type: DataType,
    },

    /// Rename an attribute or change its data type
    UpdateAttribute {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        data_type: Option<DataType>,
    },

    /// Remove an attribute
    RemoveAttribute { id: String },

    /// Attach a property to an attribute
    AddProperty {
        attribute: String,
        /// max_length, min_length, no_special_chars or required
        kind: PropertyKind,
        value: String,
    },

    /// Change the kind and value of a property
    UpdateProperty {
        id: String,
        kind: PropertyKind,
        value: String,
    },

    /// Remove a property
    RemoveProperty { id: String },

    /// Connect two classes
    Connect {
        source: String,
        target: String,
        /// 1-1, 1-N or N-N
        #[arg(long, default_value = "1-1")]
        kind: RelationKind,
    },

    /// Remove a connection
    Disconnect { id: String },

    /// Move a class and persist its position
    #[command(allow_negative_numbers = true)]
    Move { id: String, x: f32, y: f32 },

    /// Import rows from a JSON array of objects into a class
    ImportData { class: String, rows: String },

    /// Print the data rows of a class
    ListData { class: String },

    /// Delete data rows
    DeleteData {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

impl Command {
    /// Whether the command can change backend state.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::Show { .. } | Command::Render { .. } | Command::ListData { .. }
        )
    }
}
