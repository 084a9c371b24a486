use super::*;

fn sample() -> ObjectFile {
    ObjectFile {
        memory: vec![
            MemoryEntry { idx: 0, size: 1 },
            MemoryEntry { idx: 1, size: 1 },
            MemoryEntry { idx: 5, size: 3 },
        ],
        instructions: vec![
            InstructionEntry {
                idx: 0,
                opcode: "push".to_string(),
                operand: Some(42),
            },
            InstructionEntry {
                idx: 1,
                opcode: "hlt".to_string(),
                operand: None,
            },
        ],
    }
}

#[test]
fn write_read_round_trip() {
    let path = std::env::temp_dir().join("vexfile_write_read_round_trip.o");
    let object = sample();

    write_file(&path, &object).unwrap();
    let read_back = read_file(&path).unwrap();

    assert_eq!(object, read_back);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn operand_omitted_when_absent() {
    let mut buf = Vec::new();
    write(&mut buf, &sample()).unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert!(text.contains("\"opcode\": \"hlt\""));
    assert!(!text[text.find("\"hlt\"").unwrap()..].contains("operand"));
}

#[test]
fn malformed_json_is_rejected() {
    let err = read(b"not json".as_slice()).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}
