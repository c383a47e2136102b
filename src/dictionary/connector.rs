//! 接続コスト行列
//!
//! このモジュールは、隣接する単語間の接続コストを保持する行列を提供します。

use std::io::Read;

use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{KabosuError, Result};

/// 接続を禁止するコスト値。
pub const INHIBITED_CONNECTION: i16 = i16::MAX;

/// 単語間の接続コスト行列。
///
/// 左側単語の右文脈IDと右側単語の左文脈IDの組に対するコストを保持します。
#[derive(Archive, Serialize, Deserialize, Clone)]
pub struct MatrixConnector {
    data: Vec<i16>,
    num_right: usize,
    num_left: usize,
}

impl MatrixConnector {
    /// 新しいインスタンスを作成します。
    pub(crate) fn new(data: Vec<i16>, num_right: usize, num_left: usize) -> Self {
        debug_assert_eq!(data.len(), num_right * num_left);
        Self {
            data,
            num_right,
            num_left,
        }
    }

    /// `matrix.def`形式のリーダーから行列を構築します。
    ///
    /// 1行目は`num_left num_right`のヘッダで、以降の各行は
    /// `right_id left_id cost`の3つ組です。`right_id`は左側単語の右文脈ID、
    /// `left_id`は右側単語の左文脈IDです。
    ///
    /// # エラー
    ///
    /// ヘッダやエントリが不正な場合、またはIDが範囲外の場合にエラーを返します。
    pub fn from_reader<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut buf = String::new();
        rdr.read_to_string(&mut buf)?;
        let mut lines = buf.lines();

        let header = lines.next().ok_or_else(|| {
            KabosuError::invalid_format("matrix.def", "The input matrix is empty")
        })?;
        let mut dims = header.split_whitespace();
        let num_left: usize = dims
            .next()
            .ok_or_else(|| KabosuError::invalid_format("matrix.def", "invalid header"))?
            .parse()?;
        let num_right: usize = dims
            .next()
            .ok_or_else(|| KabosuError::invalid_format("matrix.def", "invalid header"))?
            .parse()?;

        let mut data = vec![0i16; num_left * num_right];
        for (i, line) in lines.enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut cols = line.split_whitespace();
            let err = || {
                KabosuError::invalid_format(
                    "matrix.def",
                    format!("invalid entry at line {}", i + 2),
                )
            };
            let right_id: usize = cols.next().ok_or_else(err)?.parse()?;
            let left_id: usize = cols.next().ok_or_else(err)?.parse()?;
            let cost: i16 = cols.next().ok_or_else(err)?.parse()?;
            if right_id >= num_right || left_id >= num_left {
                return Err(KabosuError::invalid_format(
                    "matrix.def",
                    format!(
                        "connection id is out of range at line {}: ({right_id}, {left_id})",
                        i + 2
                    ),
                ));
            }
            data[left_id * num_right + right_id] = cost;
        }
        Ok(Self::new(data, num_right, num_left))
    }

    /// 左側単語の右文脈IDと右側単語の左文脈IDの間の接続コストを返します。
    ///
    /// # 引数
    ///
    /// * `right_id` - 左側単語の右文脈ID
    /// * `left_id` - 右側単語の左文脈ID
    #[inline(always)]
    pub fn cost(&self, right_id: u16, left_id: u16) -> i16 {
        self.data[usize::from(left_id) * self.num_right + usize::from(right_id)]
    }

    /// 右文脈IDの総数を返します。
    #[inline(always)]
    pub const fn num_right(&self) -> usize {
        self.num_right
    }

    /// 左文脈IDの総数を返します。
    #[inline(always)]
    pub const fn num_left(&self) -> usize {
        self.num_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader() {
        let data = "2 3\n0 0 0\n0 1 1\n1 0 -2\n1 1 -3\n2 0 4\n2 1 5";
        let conn = MatrixConnector::from_reader(data.as_bytes()).unwrap();
        assert_eq!(conn.num_left(), 2);
        assert_eq!(conn.num_right(), 3);
        assert_eq!(conn.cost(0, 0), 0);
        assert_eq!(conn.cost(0, 1), 1);
        assert_eq!(conn.cost(1, 0), -2);
        assert_eq!(conn.cost(2, 1), 5);
    }

    #[test]
    fn test_out_of_range() {
        let data = "1 1\n0 1 0";
        assert!(MatrixConnector::from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_empty() {
        assert!(MatrixConnector::from_reader("".as_bytes()).is_err());
    }
}
