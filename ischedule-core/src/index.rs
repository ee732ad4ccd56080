//! 上课时间索引解码
//!
//! 课表中每门课的 `index` 由若干 `[日, 节]` 组成，每个分量可以是整数、
//! `odd`/`even`/`everyday` 缩写，或者两者混合的列表。解码后得到
//! (循环日, 节次) 的笛卡尔积。

use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::{Course, Error, Result, Term};

/// 缩写
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Odd,
    Even,
    Everyday,
}

impl Token {
    /// 展开为 `[1, maximum]` 内对应的整数序列
    pub fn expand(self, maximum: u32) -> Vec<u32> {
        match self {
            Self::Odd => (1..=maximum).step_by(2).collect(),
            Self::Even => (2..=maximum).step_by(2).collect(),
            Self::Everyday => (1..=maximum).collect(),
        }
    }
}

impl FromStr for Token {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "odd" => Ok(Self::Odd),
            "even" => Ok(Self::Even),
            "everyday" => Ok(Self::Everyday),
            _ => Err(format!("\"{s}\" can not be identified")),
        }
    }
}

/// 列表中的单个元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexItem {
    Single(i64),
    Token(Token),
}

/// 索引分量
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexComponent {
    Single(i64),
    Token(Token),
    Mixed(Vec<IndexItem>),
}

impl IndexComponent {
    /// 从 JSON 值构造分量；不支持的类型返回描述信息
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Number(_) => integer(value).map(Self::Single),
            Value::String(s) => s.parse().map(Self::Token),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Number(_) => integer(item).map(IndexItem::Single),
                    Value::String(s) => s.parse().map(IndexItem::Token),
                    other => Err(format!("{other} can not be identified")),
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Self::Mixed),
            other => Err(format!("{other} can not be identified")),
        }
    }
}

fn integer(value: &Value) -> std::result::Result<i64, String> {
    value
        .as_i64()
        .ok_or_else(|| format!("{value} is not an integer"))
}

/// 一组 `[日, 节]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPair {
    pub day: IndexComponent,
    pub slot: IndexComponent,
}

impl IndexPair {
    pub fn new(day: IndexComponent, slot: IndexComponent) -> Self {
        Self { day, slot }
    }
}

/// 分量所在的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// 循环日，从 1 开始
    Day,
    /// 节次，从 0 开始
    Slot,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Slot => write!(f, "slot"),
        }
    }
}

/// 解码出错时用于定位的上下文
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub term: &'a str,
    pub course: &'a str,
    pub field: Field,
}

impl DecodeContext<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::schedule(
            format!("{}.{}.index.{}", self.term, self.course, self.field),
            message,
        )
    }
}

/// 解码单个分量
///
/// 循环日的合法范围是 `[1, maximum]`；节次是从 0 开始的下标，合法范围是
/// `[0, maximum)`，缩写按序数展开（`odd` 表示第 1、3、5… 节）。
pub fn decode_component(
    component: &IndexComponent,
    maximum: u32,
    ctx: &DecodeContext<'_>,
) -> Result<Vec<u32>> {
    let resolve_integer = |value: i64| -> Result<u32> {
        let (low, high) = match ctx.field {
            Field::Day => (1, i64::from(maximum)),
            Field::Slot => (0, i64::from(maximum) - 1),
        };
        if value < low || value > high {
            return Err(ctx.error(format!(
                "{value} is out of range, expected {low}..={high}"
            )));
        }
        u32::try_from(value).map_err(|_| ctx.error(format!("{value} is out of range")))
    };

    let resolve_token = |token: Token| -> Vec<u32> {
        let expanded = token.expand(maximum);
        match ctx.field {
            Field::Day => expanded,
            Field::Slot => expanded.into_iter().map(|ordinal| ordinal - 1).collect(),
        }
    };

    match component {
        IndexComponent::Single(value) => Ok(vec![resolve_integer(*value)?]),
        IndexComponent::Token(token) => Ok(resolve_token(*token)),
        IndexComponent::Mixed(items) => {
            let mut decoded = Vec::new();
            for item in items {
                match item {
                    IndexItem::Single(value) => decoded.push(resolve_integer(*value)?),
                    IndexItem::Token(token) => decoded.extend(resolve_token(*token)),
                }
            }
            Ok(decoded)
        }
    }
}

/// 解码后的一次上课：循环日（从 1 开始）与节次（从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occurrence {
    pub day: u32,
    pub slot: usize,
}

/// 同一节次的所有循环日
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGroup {
    pub days: Vec<u32>,
    pub slot: usize,
}

/// 解码课程的完整索引，得到所有 `[日, 节]` 笛卡尔积
pub fn decode_index(course: &Course, term: &Term) -> Result<Vec<Occurrence>> {
    let max_day = term.course_cycle(course) * crate::types::WORKDAYS_PER_WEEK;
    let max_slot = u32::try_from(term.timetable.len())
        .map_err(|_| Error::Config(format!("timetable of \"{}\" is too long", term.name)))?;

    let day_ctx = DecodeContext {
        term: &term.name,
        course: &course.name,
        field: Field::Day,
    };
    let slot_ctx = DecodeContext {
        field: Field::Slot,
        ..day_ctx
    };

    let mut product = Vec::new();
    for pair in &course.index {
        let days = decode_component(&pair.day, max_day, &day_ctx)?;
        let slots = decode_component(&pair.slot, max_slot, &slot_ctx)?;
        for &day in &days {
            for &slot in &slots {
                product.push(Occurrence {
                    day,
                    slot: slot as usize,
                });
            }
        }
    }

    Ok(product)
}

/// 按节次合并，节次按首次出现排序，每组内循环日升序（保留重复）
pub fn merge_occurrences(occurrences: &[Occurrence]) -> Vec<SlotGroup> {
    let mut groups: Vec<SlotGroup> = Vec::new();

    for occurrence in occurrences {
        match groups.iter_mut().find(|g| g.slot == occurrence.slot) {
            Some(group) => group.days.push(occurrence.day),
            None => groups.push(SlotGroup {
                days: vec![occurrence.day],
                slot: occurrence.slot,
            }),
        }
    }

    for group in &mut groups {
        group.days.sort_unstable();
    }

    groups
}

/// 将合并结果重新展开为 (日, 节) 列表
pub fn flatten_groups(groups: &[SlotGroup]) -> Vec<Occurrence> {
    groups
        .iter()
        .flat_map(|group| {
            group.days.iter().map(move |&day| Occurrence {
                day,
                slot: group.slot,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;

    fn ctx(field: Field) -> DecodeContext<'static> {
        DecodeContext {
            term: "Term 1",
            course: "Calculus",
            field,
        }
    }

    fn component(value: Value) -> IndexComponent {
        IndexComponent::from_value(&value).unwrap()
    }

    fn term(cycle: u32, slots: usize) -> Term {
        let timetable = (0..slots)
            .map(|i| NaiveTime::from_hms_opt(8 + i as u32, 0, 0).unwrap())
            .collect();
        Term::new(
            "Term 1",
            NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
            40,
            timetable,
            cycle,
        )
        .unwrap()
    }

    fn attach(term: &mut Term, index: Value) -> Course {
        let pairs = index
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| IndexPair::new(component(pair[0].clone()), component(pair[1].clone())))
            .collect();
        term.add_course(Course::new("Calculus", "Zhang", None, pairs, None));
        term.courses().last().unwrap().clone()
    }

    #[test]
    fn test_component_from_value() {
        assert_eq!(component(json!(3)), IndexComponent::Single(3));
        assert_eq!(component(json!("ODD")), IndexComponent::Token(Token::Odd));
        assert_eq!(
            component(json!([1, "even"])),
            IndexComponent::Mixed(vec![IndexItem::Single(1), IndexItem::Token(Token::Even)])
        );
        assert!(IndexComponent::from_value(&json!("weekly")).is_err());
        assert!(IndexComponent::from_value(&json!(1.5)).is_err());
        assert!(IndexComponent::from_value(&json!(true)).is_err());
        assert!(IndexComponent::from_value(&json!([1, [2]])).is_err());
    }

    #[test]
    fn test_decode_tokens() {
        let day = ctx(Field::Day);
        assert_eq!(
            decode_component(&IndexComponent::Token(Token::Odd), 10, &day).unwrap(),
            vec![1, 3, 5, 7, 9]
        );
        assert_eq!(
            decode_component(&IndexComponent::Token(Token::Even), 5, &day).unwrap(),
            vec![2, 4]
        );
        assert_eq!(
            decode_component(&IndexComponent::Token(Token::Everyday), 5, &day).unwrap(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_decode_slot_tokens_are_ordinal() {
        let slot = ctx(Field::Slot);
        assert_eq!(
            decode_component(&IndexComponent::Token(Token::Odd), 4, &slot).unwrap(),
            vec![0, 2]
        );
        assert_eq!(
            decode_component(&IndexComponent::Token(Token::Everyday), 3, &slot).unwrap(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_decode_mixed_keeps_order_and_duplicates() {
        let decoded = decode_component(&component(json!([4, "odd", 1])), 5, &ctx(Field::Day))
            .unwrap();
        assert_eq!(decoded, vec![4, 1, 3, 5, 1]);
    }

    #[test]
    fn test_day_bounds() {
        let day = ctx(Field::Day);
        assert!(decode_component(&IndexComponent::Single(10), 10, &day).is_ok());
        assert!(decode_component(&IndexComponent::Single(11), 10, &day).is_err());
        assert!(decode_component(&IndexComponent::Single(0), 10, &day).is_err());
        assert!(decode_component(&component(json!([1, 11])), 10, &day).is_err());
    }

    #[test]
    fn test_slot_bounds() {
        let slot = ctx(Field::Slot);
        assert!(decode_component(&IndexComponent::Single(0), 2, &slot).is_ok());
        assert!(decode_component(&IndexComponent::Single(1), 2, &slot).is_ok());
        assert!(decode_component(&IndexComponent::Single(2), 2, &slot).is_err());
        assert!(decode_component(&IndexComponent::Single(-1), 2, &slot).is_err());
    }

    #[test]
    fn test_error_identifies_course_and_field() {
        let err = decode_component(&IndexComponent::Single(7), 5, &ctx(Field::Day)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Term 1.Calculus.index.day"), "{message}");
        assert!(message.contains('7'), "{message}");
    }

    #[test]
    fn test_single_day_single_slot() {
        let mut term = term(1, 2);
        let course = attach(&mut term, json!([[1, 0]]));

        let product = decode_index(&course, &term).unwrap();
        assert_eq!(product, vec![Occurrence { day: 1, slot: 0 }]);
        assert_eq!(
            merge_occurrences(&product),
            vec![SlotGroup {
                days: vec![1],
                slot: 0
            }]
        );
    }

    #[test]
    fn test_odd_days_two_week_cycle() {
        let mut term = term(2, 3);
        let course = attach(&mut term, json!([["odd", 1]]));

        let product = decode_index(&course, &term).unwrap();
        let days: Vec<_> = product.iter().map(|o| o.day).collect();
        assert_eq!(days, vec![1, 3, 5, 7, 9]);
        assert!(product.iter().all(|o| o.slot == 1));
    }

    #[test]
    fn test_cartesian_product_and_merge() {
        let mut term = term(1, 3);
        let course = attach(&mut term, json!([[[3, 4], [0, 2]], [1, 2]]));

        let product = decode_index(&course, &term).unwrap();
        assert_eq!(
            product,
            vec![
                Occurrence { day: 3, slot: 0 },
                Occurrence { day: 3, slot: 2 },
                Occurrence { day: 4, slot: 0 },
                Occurrence { day: 4, slot: 2 },
                Occurrence { day: 1, slot: 2 },
            ]
        );
        assert_eq!(
            merge_occurrences(&product),
            vec![
                SlotGroup {
                    days: vec![3, 4],
                    slot: 0
                },
                SlotGroup {
                    days: vec![1, 3, 4],
                    slot: 2
                },
            ]
        );
    }

    #[test]
    fn test_course_cycle_override_changes_bound() {
        let mut term = term(2, 2);
        let pairs = vec![IndexPair::new(
            IndexComponent::Single(7),
            IndexComponent::Single(0),
        )];
        term.add_course(Course::new("PE", "Li", None, pairs, Some(1)));

        let course = &term.courses()[0];
        assert_eq!(course.cycle(), Some(1));
        assert!(decode_index(course, &term).is_err());
    }
}
