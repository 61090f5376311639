use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use vmlog_studio::commands::{build_view, execute_view, validate_args, View, ViewArgs};
use vmlog_studio::output::read_json;

fn write_document(value: serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", value).unwrap();
    file
}

fn forest_document() -> serde_json::Value {
    json!({
        "word_size": 8,
        "machine": "x86_64",
        "traces": [
            {
                "unique_id": 160,
                "type": "loop",
                "stages": {
                    "asm": { "ops": [
                        { "kind": "op", "opnum": 8, "opname": "guard_true", "index": 0, "descr_number": 5 }
                    ] }
                }
            },
            {
                "unique_id": 176,
                "type": "bridge",
                "parent": 160,
                "stages": {
                    "asm": { "ops": [
                        { "kind": "op", "opnum": 9, "opname": "finish", "index": 0, "descr_number": 7 }
                    ] }
                }
            }
        ],
        "stitches": { "5": 176 }
    })
}

#[test]
fn test_stitch_view_from_file() {
    let input = write_document(forest_document());
    let args = ViewArgs {
        input: input.path().to_path_buf(),
        view: View::Stitches { root: 0xa0 },
        ..Default::default()
    };

    let value = build_view(&args).unwrap();
    assert_eq!(
        value,
        json!({
            "root": "0xa0",
            "stitches": { "0xa0": ["g,0,0x5,0xb0"], "0xb0": ["f,0,0x7"] }
        })
    );
}

#[test]
fn test_trace_view_from_file() {
    let input = write_document(forest_document());
    let args = ViewArgs {
        input: input.path().to_path_buf(),
        view: View::Trace { id: 0xb0 },
        ..Default::default()
    };

    let value = build_view(&args).unwrap();
    assert_eq!(
        value["failing_guard"],
        json!({ "num": 8, "i": 0, "descr_number": "0x5" })
    );
}

#[test]
fn test_malformed_forest_is_rejected() {
    let input = write_document(json!({
        "traces": [
            { "unique_id": 1, "type": "loop" },
            { "unique_id": 1, "type": "loop" }
        ]
    }));
    let args = ViewArgs {
        input: input.path().to_path_buf(),
        ..Default::default()
    };

    assert!(build_view(&args).is_err());
}

#[test]
fn test_memory_view_written_to_file() {
    let input = write_document(json!({
        "interp": "pypy",
        "samples": [
            { "stack": [1], "mem": 1 },
            { "stack": [1], "mem": 2 },
            { "stack": [1], "mem": 3 }
        ]
    }));
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("memory.json");

    let args = ViewArgs {
        input: input.path().to_path_buf(),
        view: View::Memory {
            start: 0,
            end: 3,
            window_size: 100,
        },
        output: Some(output.clone()),
        pretty: false,
    };
    validate_args(&args).unwrap();
    execute_view(args).unwrap();

    let written: serde_json::Value = read_json(&output).unwrap();
    assert_eq!(written["mem_profile"]["x"], json!([0, 1]));
    assert_eq!(written["mem_profile"]["max"], json!([2, 3]));
}
