//! 数値表記の正規化
//!
//! このモジュールは、漢数字・アラビア数字の混在した数値表記を
//! 正規の10進数文字列に変換する状態機械を提供します。
//! 位取り単位（十・百・千）は直前の数に、大単位（万・億・兆）は
//! 小計全体に適用されます。
//!
//! 変換に失敗した場合、呼び出し側（数値連結プラグイン）は正規化を
//! 諦めて元の表記を残します。失敗は回復可能で、エラー値は伝播しません。

/// 数値を桁文字列として保持する補助構造体。
///
/// 仮数、10進スケール、小数点位置からなります。
#[derive(Default, Debug)]
struct StringNumber {
    significand: String,
    scale: i32,
    // -1 while no decimal point is set
    point: i32,
}

impl StringNumber {
    fn new() -> Self {
        Self {
            significand: String::new(),
            scale: 0,
            point: -1,
        }
    }

    fn clear(&mut self) {
        self.significand.clear();
        self.scale = 0;
        self.point = -1;
    }

    fn append(&mut self, digit: i32) {
        debug_assert!((0..=9).contains(&digit));
        if digit == 0 && self.is_zero() {
            return;
        }
        self.significand.push(char::from(b'0' + digit as u8));
    }

    fn add_scale(&mut self, scale: i32) {
        if self.is_zero() {
            self.significand.push('1');
        }
        self.scale += scale;
    }

    fn add(&mut self, number: &mut StringNumber) -> bool {
        if number.is_zero() {
            return true;
        }
        if self.is_zero() {
            self.significand.push_str(&number.significand);
            self.scale = number.scale;
            self.point = number.point;
            return true;
        }

        self.normalize_scale();
        let int_length = number.int_length();
        if self.scale >= int_length {
            // A smaller number fills the zeros of the current scale.
            self.fill_zero(self.scale - int_length);
            if number.point >= 0 {
                self.point = self.significand.len() as i32 + number.point;
            }
            self.significand.push_str(&number.significand);
            self.scale = number.scale;
            return true;
        }

        false
    }

    fn set_point(&mut self) -> bool {
        if self.scale == 0 && self.point < 0 {
            self.point = self.significand.len() as i32;
            return true;
        }
        false
    }

    fn int_length(&mut self) -> i32 {
        self.normalize_scale();
        if self.point >= 0 {
            return self.point;
        }
        self.significand.len() as i32 + self.scale
    }

    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.significand.is_empty()
    }

    /// 正規の10進数文字列に変換します。内部状態は破壊されます。
    fn to_digit_string(&mut self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }

        self.normalize_scale();
        if self.scale > 0 {
            self.fill_zero(self.scale);
        } else if self.point >= 0 {
            self.significand.insert(self.point as usize, '.');
            if self.point == 0 {
                self.significand.insert(0, '0');
            }
            let bytes = self.significand.as_bytes();
            let mut i = bytes.len();
            while i > 0 && bytes[i - 1] == b'0' {
                i -= 1;
            }
            if i > 0 && bytes[i - 1] == b'.' {
                i -= 1;
            }
            self.significand.truncate(i);
        }

        let limit = if self.point >= 0 {
            self.point - 1
        } else {
            self.significand.len() as i32
        };
        let bytes = self.significand.as_bytes();
        let mut i = 0;
        while (i as i32) < limit && bytes[i] == b'0' {
            i += 1;
        }
        self.significand.split_off(i)
    }

    fn normalize_scale(&mut self) {
        if self.point >= 0 {
            let fraction_scale = self.significand.len() as i32 - self.point;
            if fraction_scale > self.scale {
                self.point += self.scale;
                self.scale = 0;
            } else {
                self.scale -= fraction_scale;
                self.point = -1;
            }
        }
    }

    fn fill_zero(&mut self, length: i32) {
        for _ in 0..length {
            self.significand.push('0');
        }
    }
}

/// 数値表記のパーサー。
///
/// 1文字ずつ[`NumericParser::append`]で受け取り、[`NumericParser::done`]で
/// 全体の妥当性を確定します。いずれかが`false`を返した場合、
/// その表記は数値として扱えません。
#[derive(Default)]
pub struct NumericParser {
    parsed_length: i32,
    // -1 while no comma has been seen
    previous_comma: i32,
    total: StringNumber,
    subtotal: StringNumber,
    tmp: StringNumber,
}

impl NumericParser {
    /// 新しいパーサーを作成します。
    pub fn new() -> Self {
        Self {
            parsed_length: 0,
            previous_comma: -1,
            total: StringNumber::new(),
            subtotal: StringNumber::new(),
            tmp: StringNumber::new(),
        }
    }

    /// パーサーの状態をリセットします。
    pub fn clear(&mut self) {
        self.parsed_length = 0;
        self.previous_comma = -1;
        self.total.clear();
        self.subtotal.clear();
        self.tmp.clear();
    }

    /// 1文字を追加します。
    ///
    /// # 戻り値
    ///
    /// 文字が数値表記として受け付けられた場合は`true`
    pub fn append(&mut self, c: char) -> bool {
        self.parsed_length += 1;

        if c == '.' {
            if self.parsed_length == 1 {
                return false;
            }
            return self.tmp.set_point();
        } else if c == ',' {
            return self.check_comma();
        }

        let Some(n) = char_to_num(c) else {
            return false;
        };
        if is_small_unit(n) {
            self.tmp.add_scale(-n);
            if !self.subtotal.add(&mut self.tmp) {
                return false;
            }
            self.tmp.clear();
        } else if is_large_unit(n) {
            // A large unit must scale something ("億万" alone is invalid).
            if self.tmp.is_zero() && self.subtotal.is_zero() {
                return false;
            }
            if !self.subtotal.add(&mut self.tmp) {
                return false;
            }
            self.subtotal.add_scale(-n);
            if !self.total.add(&mut self.subtotal) {
                return false;
            }
            self.subtotal.clear();
            self.tmp.clear();
        } else {
            self.tmp.append(n);
        }

        true
    }

    /// 表記の終端で全体の妥当性を確定します。
    ///
    /// # 戻り値
    ///
    /// 妥当な数値表記として完結した場合は`true`。末尾の小数点や
    /// 不正なカンマ区切りはここで拒否されます。
    pub fn done(&mut self) -> bool {
        if !(self.subtotal.add(&mut self.tmp) && self.total.add(&mut self.subtotal)) {
            return false;
        }
        self.tmp.clear();
        self.subtotal.clear();
        if self.total.point >= 0 && self.total.point == self.total.significand.len() as i32 {
            // hanging decimal point
            return false;
        }
        if self.previous_comma >= 0 && self.parsed_length - self.previous_comma != 3 {
            // the final comma group must have exactly three digits
            return false;
        }
        true
    }

    /// 正規化された数値文字列を返します。
    ///
    /// [`NumericParser::done`]が`true`を返した後に呼び出してください。
    pub fn normalized(&mut self) -> String {
        self.total.to_digit_string()
    }

    fn check_comma(&mut self) -> bool {
        let ret = if self.parsed_length == 1 {
            false
        } else if self.previous_comma < 0 {
            self.parsed_length <= 4 && !self.tmp.is_zero()
        } else {
            self.parsed_length - self.previous_comma == 4
        };
        self.previous_comma = self.parsed_length;
        ret
    }
}

fn char_to_num(c: char) -> Option<i32> {
    match c {
        '0'..='9' => Some(c as i32 - '0' as i32),
        '〇' => Some(0),
        '一' => Some(1),
        '二' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        '十' => Some(-1),
        '百' => Some(-2),
        '千' => Some(-3),
        '万' => Some(-4),
        '億' => Some(-8),
        '兆' => Some(-12),
        _ => None,
    }
}

#[inline(always)]
fn is_small_unit(n: i32) -> bool {
    (-3..0).contains(&n)
}

#[inline(always)]
fn is_large_unit(n: i32) -> bool {
    n <= -4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: &mut NumericParser, s: &str) -> bool {
        for c in s.chars() {
            if !parser.append(c) {
                return false;
            }
        }
        true
    }

    fn normalize(s: &str) -> Option<String> {
        let mut parser = NumericParser::new();
        if !parse(&mut parser, s) || !parser.done() {
            return None;
        }
        Some(parser.normalized())
    }

    #[test]
    fn test_digits() {
        assert_eq!(normalize("1000").as_deref(), Some("1000"));
    }

    #[test]
    fn test_starts_with_zero() {
        assert_eq!(normalize("001000").as_deref(), Some("1000"));
        assert_eq!(normalize("〇一〇〇〇").as_deref(), Some("1000"));
        assert_eq!(normalize("00.1000").as_deref(), Some("0.1"));
        assert_eq!(normalize("000").as_deref(), Some("0"));
    }

    #[test]
    fn test_use_small_unit() {
        assert_eq!(normalize("二十七").as_deref(), Some("27"));
        assert_eq!(normalize("千三百二十七").as_deref(), Some("1327"));
        assert_eq!(normalize("千十七").as_deref(), Some("1017"));
        assert_eq!(normalize("千三百二十七.〇五").as_deref(), Some("1327.05"));
        assert_eq!(normalize("三百二十百"), None);
    }

    #[test]
    fn test_use_large_unit() {
        assert_eq!(normalize("1万").as_deref(), Some("10000"));
        assert_eq!(normalize("千三百二十七万").as_deref(), Some("13270000"));
        assert_eq!(normalize("千三百二十七万一四").as_deref(), Some("13270014"));
        assert_eq!(
            normalize("千三百二十七万一四.〇五").as_deref(),
            Some("13270014.05")
        );
        assert_eq!(
            normalize("三兆2千億千三百二十七万一四.〇五").as_deref(),
            Some("3200013270014.05")
        );
    }

    #[test]
    fn test_large_unit_scaling_nothing() {
        assert_eq!(normalize("億万"), None);
        assert_eq!(normalize("万"), None);
    }

    #[test]
    fn test_float_with_unit() {
        assert_eq!(normalize("1.5千").as_deref(), Some("1500"));
        assert_eq!(normalize("1.5百万").as_deref(), Some("1500000"));
        assert_eq!(normalize("1.5百万1.5千20").as_deref(), Some("1501520"));
        assert_eq!(normalize("1.5千5百"), None);
        assert_eq!(normalize("1.5千500"), None);
    }

    #[test]
    fn test_long_numeric() {
        assert_eq!(
            normalize("200000000000000000000万").as_deref(),
            Some("2000000000000000000000000")
        );
    }

    #[test]
    fn test_with_comma() {
        assert_eq!(normalize("2,000,000").as_deref(), Some("2000000"));
        assert_eq!(normalize("2,4"), None);
        assert_eq!(normalize("200,00,000"), None);
        assert_eq!(normalize("000,000"), None);
        assert_eq!(normalize(",000"), None);
    }

    #[test]
    fn test_not_digit() {
        assert_eq!(normalize("@@@"), None);
    }

    #[test]
    fn test_hanging_point() {
        assert_eq!(normalize("22."), None);
        assert_eq!(normalize("1.2.3"), None);
    }
}
