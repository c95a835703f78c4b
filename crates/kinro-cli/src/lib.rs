//! CLI logic for the Kinro schema diagram client.
//!
//! Every command reloads the diagram, applies one operation through
//! [`DiagramStore`] and prints the result. With `--snapshot` the store runs
//! against an in-memory backend seeded from a JSON file, and mutating
//! commands write the file back.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{env, fmt::Write as _, fs, path::Path};

use log::{debug, info};
use serde_json::json;

use kinro::{
    KinroError,
    config::AppConfig,
    export::{Exporter, svg::SvgExporter},
    geometry::Point,
    identifier::Id,
    remote::{Backend, InMemoryBackend, Snapshot},
    schema::RowContent,
    store::{DiagramStore, StructuralChange},
    view::DiagramView,
};

/// Run the Kinro CLI application
///
/// # Errors
///
/// Returns `KinroError` for:
/// - Configuration loading errors
/// - Snapshot file I/O and JSON errors
/// - Validation failures and rejected connections
/// - Remote and reload failures
/// - Export errors
pub async fn run(args: &Args) -> Result<(), KinroError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let app_config = config::apply_overrides(
        app_config,
        env::var(config::API_URL_ENV).ok(),
        args.api_url.as_deref(),
    )?;

    let output = match &args.snapshot {
        Some(path) => run_offline(&args.command, &app_config, Path::new(path)).await?,
        None => run_online(&args.command, &app_config).await?,
    };

    print!("{output}");
    Ok(())
}

async fn run_offline(
    command: &Command,
    app_config: &AppConfig,
    path: &Path,
) -> Result<String, KinroError> {
    let snapshot = read_snapshot(path)?;
    let mut store = DiagramStore::with_layout(
        InMemoryBackend::from_snapshot(snapshot),
        *app_config.layout(),
    );

    let output = execute(&mut store, command, app_config).await?;

    if command.is_mutating() {
        write_snapshot(path, &store.backend().snapshot())?;
    }
    Ok(output)
}

#[cfg(feature = "http")]
async fn run_online(command: &Command, app_config: &AppConfig) -> Result<String, KinroError> {
    let base_url = app_config.backend().base_url();
    info!(base_url; "Connecting to server");

    let backend = kinro::remote::HttpBackend::new(base_url)?;
    let mut store = DiagramStore::with_layout(backend, *app_config.layout());
    execute(&mut store, command, app_config).await
}

#[cfg(not(feature = "http"))]
async fn run_online(_command: &Command, _app_config: &AppConfig) -> Result<String, KinroError> {
    Err(KinroError::Config(
        "built without the `http` feature; pass --snapshot FILE to work offline".to_string(),
    ))
}

/// Reads a snapshot file. A missing file is an empty diagram.
fn read_snapshot(path: &Path) -> Result<Snapshot, KinroError> {
    if !path.exists() {
        info!(path:? = path; "Snapshot file not found, starting from an empty diagram");
        return Ok(Snapshot::default());
    }
    let content = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    debug!(
        path:? = path,
        classes = snapshot.classes.len(),
        connections = snapshot.connections.len();
        "Snapshot loaded"
    );
    Ok(snapshot)
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), KinroError> {
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, content)?;
    info!(path:? = path; "Snapshot written");
    Ok(())
}

/// Reloads the store, runs `command` against it and returns the text to
/// print.
async fn execute<B: Backend>(
    store: &mut DiagramStore<B>,
    command: &Command,
    app_config: &AppConfig,
) -> Result<String, KinroError> {
    store.reload().await?;
    debug!(command:?; "Executing command");

    let change = match command {
        Command::Show { json } => {
            return if *json {
                Ok(view_to_json(store.view())?)
            } else {
                Ok(view_to_text(store.view()))
            };
        }
        Command::Render { output } => {
            let exporter = SvgExporter::new(*app_config.layout(), app_config.style())?;
            exporter.export_to_file(store.view(), Path::new(output))?;
            return Ok(format!("Wrote {output}\n"));
        }
        Command::Move { id, x, y } => {
            store
                .apply_position_change(&Id::new(id.as_str()), Point::new(*x, *y), true)
                .await?;
            return Ok(String::new());
        }
        Command::ImportData { class, rows } => {
            let content = fs::read_to_string(rows)?;
            let rows: Vec<RowContent> = serde_json::from_str(&content)?;
            let imported = store.import_rows(&Id::new(class.as_str()), rows).await?;
            return Ok(format!("Imported {imported} rows\n"));
        }
        Command::ListData { class } => {
            let table = store.class_data(&Id::new(class.as_str())).await?;
            let mut out = String::new();
            let _ = writeln!(out, "id\t{}", table.columns().join("\t"));
            for (index, row) in table.rows().iter().enumerate() {
                let cells: Vec<String> = table
                    .columns()
                    .iter()
                    .map(|column| table.cell_text(index, column))
                    .collect();
                let _ = writeln!(out, "{}\t{}", row.id, cells.join("\t"));
            }
            return Ok(out);
        }
        Command::DeleteData { ids } => {
            let ids: Vec<Id> = ids.iter().map(|id| Id::new(id.as_str())).collect();
            let deleted = match ids.as_slice() {
                [id] => store.delete_row(id).await.map(|()| 1)?,
                ids => store.delete_rows(ids).await?,
            };
            return Ok(format!("Deleted {deleted} rows\n"));
        }
        other => structural_change(other),
    };

    let Some(change) = change else {
        return Ok(String::new());
    };
    match store.apply_structural_change(change).await? {
        Some(id) => Ok(format!("{id}\n")),
        None => Ok(String::new()),
    }
}

/// Maps a command to the structural change it performs.
fn structural_change(command: &Command) -> Option<StructuralChange> {
    let id = |value: &String| Id::new(value.as_str());
    let change = match command {
        Command::CreateClass { name } => StructuralChange::CreateClass { name: name.clone() },
        Command::RenameClass { id: class, name } => StructuralChange::RenameClass {
            id: id(class),
            name: name.clone(),
        },
        Command::DeleteClass { id: class } => StructuralChange::DeleteClass { id: id(class) },
        Command::DuplicateClass { id: class } => {
            StructuralChange::DuplicateClass { id: id(class) }
        }
        Command::AddAttribute {
            class,
            name,
            data_type,
        } => StructuralChange::CreateAttribute {
            class_id: id(class),
            name: name.clone(),
            data_type: *data_type,
        },
        Command::UpdateAttribute {
            id: attribute,
            name,
            data_type,
        } => StructuralChange::UpdateAttribute {
            id: id(attribute),
            name: name.clone(),
            data_type: *data_type,
        },
        Command::RemoveAttribute { id: attribute } => {
            StructuralChange::DeleteAttribute { id: id(attribute) }
        }
        Command::AddProperty {
            attribute,
            kind,
            value,
        } => StructuralChange::CreateProperty {
            attribute_id: id(attribute),
            kind: *kind,
            value: value.clone(),
        },
        Command::UpdateProperty {
            id: property,
            kind,
            value,
        } => StructuralChange::UpdateProperty {
            id: id(property),
            kind: *kind,
            value: value.clone(),
        },
        Command::RemoveProperty { id: property } => {
            StructuralChange::DeleteProperty { id: id(property) }
        }
        Command::Connect {
            source,
            target,
            kind,
        } => StructuralChange::Connect {
            source: id(source),
            target: id(target),
            kind: *kind,
        },
        Command::Disconnect { id: connection } => {
            StructuralChange::Disconnect { id: id(connection) }
        }
        Command::Show { .. }
        | Command::Render { .. }
        | Command::Move { .. }
        | Command::ImportData { .. }
        | Command::ListData { .. }
        | Command::DeleteData { .. } => return None,
    };
    Some(change)
}

/// Renders the view as one block per node followed by the edge list.
fn view_to_text(view: &DiagramView) -> String {
    let mut out = String::new();
    for node in view.nodes() {
        let position = node.position();
        let _ = writeln!(
            out,
            "{} [{}] at ({}, {})",
            node.label(),
            node.id(),
            position.x(),
            position.y()
        );
        for attribute in &node.data().attributes {
            let _ = writeln!(
                out,
                "  {}: {}",
                attribute.name,
                attribute.data_type.label()
            );
        }
        for incoming in node.incoming_relationships() {
            let _ = writeln!(
                out,
                "  {} {} ({})",
                incoming.kind.glyph(),
                incoming.source_label,
                incoming.kind
            );
        }
    }
    for edge in view.edges() {
        let _ = writeln!(
            out,
            "{} -> {} [{}] ({})",
            edge.source,
            edge.target,
            edge.label(),
            edge.id
        );
    }
    out
}

fn view_to_json(view: &DiagramView) -> Result<String, KinroError> {
    let nodes: Vec<_> = view
        .nodes()
        .iter()
        .map(|node| {
            json!({
                "id": node.id(),
                "label": node.label(),
                "x": node.position().x(),
                "y": node.position().y(),
                "placement": format!("{:?}", node.placement()).to_lowercase(),
                "attributes": node.data().attributes,
            })
        })
        .collect();
    let edges: Vec<_> = view
        .edges()
        .iter()
        .map(|edge| {
            json!({
                "id": edge.id,
                "source": edge.source,
                "target": edge.target,
                "label": edge.label(),
            })
        })
        .collect();

    let mut out = serde_json::to_string_pretty(&json!({"nodes": nodes, "edges": edges}))?;
    out.push('\n');
    Ok(out)
}
