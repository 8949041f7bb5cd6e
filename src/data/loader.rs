//! 文本矩阵读取：每行一条记录，列以空白分隔

use std::fs;
use std::path::Path;

use super::error::DataError;

/// 从文本文件读入一个二维矩阵。
/// 返回（按行主序展平的数据, 行数, 列数）；各行列数必须一致。
pub fn load_matrix_from_text_file(
    path: impl AsRef<Path>,
) -> Result<(Vec<f32>, usize, usize), DataError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_matrix_text(&content)
}

/// 从字符串字面量读入一个二维矩阵；行以换行符或分号分隔。
/// 返回值约定与[`load_matrix_from_text_file`]相同。
pub fn load_matrix_from_string_literal(
    literal: &str,
) -> Result<(Vec<f32>, usize, usize), DataError> {
    parse_matrix_text(&literal.replace(';', "\n"))
}

fn parse_matrix_text(text: &str) -> Result<(Vec<f32>, usize, usize), DataError> {
    let mut data = Vec::new();
    let mut num_rows = 0;
    let mut num_cols = 0;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue; // 空行跳过
        }

        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f32>().map_err(|_| {
                    DataError::FormatError(format!(
                        "第{}行存在无法解析的数值: {}",
                        line_no + 1,
                        token
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if num_rows == 0 {
            num_cols = row.len();
        } else if row.len() != num_cols {
            return Err(DataError::FormatError(format!(
                "第{}行有{}列，与首行的{}列不一致",
                line_no + 1,
                row.len(),
                num_cols
            )));
        }
        num_rows += 1;
        data.extend(row);
    }

    if num_rows == 0 {
        return Err(DataError::FormatError("矩阵文本为空".to_string()));
    }
    Ok((data, num_rows, num_cols))
}
