use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use vssort::{from_xml_bytes, normalize, Options};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn test_sample_matches_expected_output() -> Result<(), Box<dyn std::error::Error>> {
    let input = fs::read(fixtures_dir().join("sample.vssettings"))?;
    let expected = fs::read_to_string(fixtures_dir().join("sample.sorted.xml"))?;

    let output = normalize(&input, &Options::default())?;
    assert_eq!(output, expected);
    Ok(())
}

#[test]
fn test_sorted_output_is_a_fixed_point() -> Result<(), Box<dyn std::error::Error>> {
    let expected = fs::read(fixtures_dir().join("sample.sorted.xml"))?;
    let output = normalize(&expected, &Options::default())?;
    assert_eq!(output.as_bytes(), expected.as_slice());
    Ok(())
}

#[test]
fn test_crlf_and_bom_input() -> Result<(), Box<dyn std::error::Error>> {
    let input = fs::read_to_string(fixtures_dir().join("sample.vssettings"))?;
    let expected = fs::read_to_string(fixtures_dir().join("sample.sorted.xml"))?;

    let mut windows = b"\xEF\xBB\xBF".to_vec();
    windows.extend_from_slice(input.replace('\n', "\r\n").as_bytes());

    let output = normalize(&windows, &Options::default())?;
    assert_eq!(output, format!("\u{feff}{expected}"));
    Ok(())
}

#[test]
fn test_utf16_input_is_written_as_utf8() -> Result<(), Box<dyn std::error::Error>> {
    let input = r#"<?xml version="1.0" encoding="utf-16"?><R><PropertyValue name="ü"/><PropertyValue name="a"/></R>"#;
    let mut bytes = vec![0xFF, 0xFE];
    for unit in input.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let output = normalize(&bytes, &Options::default())?;
    assert_eq!(
        output,
        "\u{feff}<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<R>\n\t<PropertyValue name=\"a\" />\n\t<PropertyValue name=\"ü\" />\n</R>\n"
    );
    Ok(())
}

#[test]
fn test_invalid_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    for entry in fs::read_dir(fixtures_dir().join("invalid"))? {
        let path = entry?.path();
        let content = fs::read(&path)?;
        if from_xml_bytes(&content).is_ok() {
            return Err(std::io::Error::other(format!(
                "Should fail to parse invalid file: {path:?}"
            ))
            .into());
        }
    }
    Ok(())
}
