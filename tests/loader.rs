// Integration tests for loading G-code programs from disk.

use std::io::Write;

use armprint_rs::gcode::loader::load_program_with;
use armprint_rs::gcode::parser::GCodeParserConfig;
use armprint_rs::{load_program, Axis, CommandKind, LoadError};
use tempfile::NamedTempFile;

fn gcode_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_filtering_keeps_motion_commands_in_order() {
    let file = gcode_file(
        "; generated by slicer\n\
         M104 S210 ; heat up\n\
         G92 E0\n\
         G0 X10 Y10 (travel)\n\
         G1 X20 E1.5 F1200\n\
         M106 S255\n\
         G0 Z5\n",
    );
    let program = load_program(file.path()).await.unwrap();
    let kinds: Vec<CommandKind> = program.commands().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![CommandKind::G0, CommandKind::G1, CommandKind::G0]);
    assert_eq!(program.skipped(), 3);
    assert_eq!(program.source(), Some(file.path()));

    let g1 = program.commands().nth(1).unwrap();
    assert_eq!(g1.line, 5);
    assert_eq!(g1.params.get(Axis::E), Some(1.5));
    assert_eq!(g1.params.get(Axis::F), Some(1200.0));
    assert_eq!(g1.params.get(Axis::Y), None);
}

#[tokio::test]
async fn test_missing_file() {
    let err = load_program("/definitely/not/here.gcode").await.unwrap_err();
    match err {
        LoadError::Io { path, .. } => assert_eq!(path.to_str(), Some("/definitely/not/here.gcode")),
        other => panic!("Expected IO error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_line_fails_whole_load() {
    let file = gcode_file("G0 X1\nG1 X2\nG1 X#3\nG0 X4\n");
    let err = load_program(file.path()).await.unwrap_err();
    assert!(matches!(err, LoadError::Parse { line: 3, .. }));
    assert!(err.to_string().starts_with("line 3"));
}

#[tokio::test]
async fn test_empty_file_loads_empty_program() {
    let file = gcode_file("; nothing to do\n\n");
    let program = load_program(file.path()).await.unwrap();
    assert!(program.is_empty());
}

#[tokio::test]
async fn test_checksums_can_be_disabled() {
    let file = gcode_file("N1 G1 X5*0\n");
    assert!(matches!(load_program(file.path()).await, Err(LoadError::Checksum { .. })));

    let config = GCodeParserConfig { enable_checksums: false, ..Default::default() };
    let err = load_program_with(file.path(), config).await.unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }));
}

#[tokio::test]
async fn test_slicer_preamble_loads() {
    let file = gcode_file(
        "\u{FEFF}; PrusaSlicer output\n\
         M862.3 P \"MK3S\" ; printer model check\n\
         M117 Printing...\n\
         G28 W ; home all without mesh bed level\n\
         G28 X Y\n\
         \x20\x20%\n\
         G0 X10 Y10 Z0.2\n\
         G1 X20 E1\n",
    );
    let program = load_program(file.path()).await.unwrap();
    let kinds: Vec<CommandKind> = program.commands().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![CommandKind::G0, CommandKind::G1]);
    assert_eq!(program.skipped(), 4);
    assert_eq!(program.commands().next().unwrap().line, 7);
}
