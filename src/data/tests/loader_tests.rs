//! 文本矩阵读取单元测试

use std::fs;

use crate::data::{DataError, load_matrix_from_string_literal, load_matrix_from_text_file};

#[test]
fn test_load_matrix_from_text_file_basic() {
    let temp_file = "test_loader_basic.txt";
    fs::write(temp_file, "1 2 3 4\n5 6 7 8\n9 10 11 12\n").unwrap();

    let (data, rows, cols) = load_matrix_from_text_file(temp_file).unwrap();
    assert_eq!((rows, cols), (3, 4));
    assert_eq!(data.len(), 12);
    assert_eq!(&data[..4], &[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(&data[8..], &[9.0, 10.0, 11.0, 12.0]);

    fs::remove_file(temp_file).ok();
}

#[test]
fn test_load_matrix_skips_blank_lines() {
    let temp_file = "test_loader_blank_lines.txt";
    fs::write(temp_file, "\n1.5 -2.5\n\n3.0 4.0\n\n").unwrap();

    let (data, rows, cols) = load_matrix_from_text_file(temp_file).unwrap();
    assert_eq!((rows, cols), (2, 2));
    assert_eq!(data, vec![1.5, -2.5, 3.0, 4.0]);

    fs::remove_file(temp_file).ok();
}

#[test]
fn test_load_matrix_file_not_found() {
    let result = load_matrix_from_text_file("nonexistent_matrix.txt");
    assert!(matches!(result, Err(DataError::FileNotFound(_))));
}

#[test]
fn test_load_matrix_ragged_rows() {
    let temp_file = "test_loader_ragged.txt";
    fs::write(temp_file, "1 2 3\n4 5\n").unwrap();

    let result = load_matrix_from_text_file(temp_file);
    assert!(matches!(result, Err(DataError::FormatError(_))));

    fs::remove_file(temp_file).ok();
}

#[test]
fn test_load_matrix_bad_number() {
    let temp_file = "test_loader_bad_number.txt";
    fs::write(temp_file, "1 2\n3 abc\n").unwrap();

    let result = load_matrix_from_text_file(temp_file);
    assert!(matches!(result, Err(DataError::FormatError(msg)) if msg.contains("abc")));

    fs::remove_file(temp_file).ok();
}

#[test]
fn test_load_matrix_from_string_literal() {
    // 1. 分号分行
    let (data, rows, cols) = load_matrix_from_string_literal("1 2; 3 4; 5 6").unwrap();
    assert_eq!((rows, cols), (3, 2));
    assert_eq!(data, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    // 2. 换行分行，效果等价
    let (data2, rows2, cols2) = load_matrix_from_string_literal("1 2\n3 4\n5 6").unwrap();
    assert_eq!((rows2, cols2), (rows, cols));
    assert_eq!(data2, data);

    // 3. 单行向量
    let (_, rows3, cols3) = load_matrix_from_string_literal("7 8 9").unwrap();
    assert_eq!((rows3, cols3), (1, 3));
}

#[test]
fn test_load_matrix_empty_literal() {
    let result = load_matrix_from_string_literal("   \n  ");
    assert!(matches!(result, Err(DataError::FormatError(_))));
}
