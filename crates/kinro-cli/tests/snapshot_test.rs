use std::{fs, path::Path};

use tempfile::tempdir;

use kinro::{KinroError, remote::Snapshot, schema::RelationKind};
use kinro_cli::{Args, Command, run};

fn args(snapshot: &Path, command: Command) -> Args {
    Args {
        config: None,
        api_url: None,
        snapshot: Some(snapshot.to_string_lossy().to_string()),
        log_level: "off".to_string(),
        command,
    }
}

fn read(snapshot: &Path) -> Snapshot {
    serde_json::from_str(&fs::read_to_string(snapshot).unwrap()).unwrap()
}

#[tokio::test]
async fn test_snapshot_round_trip() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("diagram.json");

    for name in ["Persona", "Pedido"] {
        run(&args(
            &snapshot,
            Command::CreateClass {
                name: name.to_string(),
            },
        ))
        .await
        .unwrap();
    }
    run(&args(
        &snapshot,
        Command::Connect {
            source: "1".to_string(),
            target: "2".to_string(),
            kind: RelationKind::OneToMany,
        },
    ))
    .await
    .unwrap();

    let state = read(&snapshot);
    assert_eq!(state.classes.len(), 2);
    assert_eq!(state.connections.len(), 1);
    assert_eq!(state.connections[0].relationship_type, RelationKind::OneToMany);

    let output = dir.path().join("diagram.svg");
    run(&args(
        &snapshot,
        Command::Render {
            output: output.to_string_lossy().to_string(),
        },
    ))
    .await
    .unwrap();

    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.contains("Persona"));
    assert!(svg.contains("1-N"));
    assert_eq!(read(&snapshot), state);
}

#[tokio::test]
async fn test_duplicate_connection_is_rejected() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("diagram.json");
    for name in ["A", "B"] {
        run(&args(
            &snapshot,
            Command::CreateClass {
                name: name.to_string(),
            },
        ))
        .await
        .unwrap();
    }
    let connect = Command::Connect {
        source: "1".to_string(),
        target: "2".to_string(),
        kind: RelationKind::OneToOne,
    };
    run(&args(&snapshot, connect.clone())).await.unwrap();

    let result = run(&args(&snapshot, connect)).await;

    assert!(matches!(
        result,
        Err(KinroError::DuplicateConnection { .. })
    ));
    assert_eq!(read(&snapshot).connections.len(), 1);
}

#[tokio::test]
async fn test_import_and_move() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("diagram.json");
    run(&args(
        &snapshot,
        Command::CreateClass {
            name: "Persona".to_string(),
        },
    ))
    .await
    .unwrap();
    run(&args(
        &snapshot,
        Command::AddAttribute {
            class: "1".to_string(),
            name: "nombre".to_string(),
            data_type: "text".parse().unwrap(),
        },
    ))
    .await
    .unwrap();

    let rows = dir.path().join("rows.json");
    fs::write(
        &rows,
        r#"[{"nombre": "Ana", "extra": 1}, {"nombre": ""}, {"nombre": "Luis"}]"#,
    )
    .unwrap();
    run(&args(
        &snapshot,
        Command::ImportData {
            class: "1".to_string(),
            rows: rows.to_string_lossy().to_string(),
        },
    ))
    .await
    .unwrap();

    run(&args(
        &snapshot,
        Command::Move {
            id: "1".to_string(),
            x: 40.0,
            y: -12.5,
        },
    ))
    .await
    .unwrap();

    let state = read(&snapshot);
    assert_eq!(state.data.len(), 2);
    assert!(state.data.iter().all(|row| !row.content.contains_key("extra")));
    assert_eq!(state.classes[0].position_x, 40.0);
    assert_eq!(state.classes[0].position_y, -12.5);

    run(&args(
        &snapshot,
        Command::DeleteData {
            ids: vec![state.data[0].id.to_string()],
        },
    ))
    .await
    .unwrap();

    let remaining = read(&snapshot).data;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, state.data[1].id);
}

#[tokio::test]
async fn test_invalid_attribute_name_leaves_snapshot_unchanged() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("diagram.json");
    run(&args(
        &snapshot,
        Command::CreateClass {
            name: "Persona".to_string(),
        },
    ))
    .await
    .unwrap();
    let before = fs::read_to_string(&snapshot).unwrap();

    let result = run(&args(
        &snapshot,
        Command::AddAttribute {
            class: "1".to_string(),
            name: "nombre completo".to_string(),
            data_type: "text".parse().unwrap(),
        },
    ))
    .await;

    assert!(matches!(result, Err(KinroError::Validation(_))));
    assert_eq!(fs::read_to_string(&snapshot).unwrap(), before);
}

#[tokio::test]
async fn test_read_only_commands_do_not_create_snapshot() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("absent.json");

    run(&args(&snapshot, Command::Show { json: true }))
        .await
        .unwrap();

    assert!(!snapshot.exists());
}
