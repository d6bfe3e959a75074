use serde::{Deserialize, Serialize};

use gradeportal_core::{DomainError, DomainResult, ValueObject};

/// A student's marks, always within `0..=100`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Marks(u8);

impl Marks {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 100;
    pub const PASS_MARK: u8 = 60;

    pub const ZERO: Marks = Marks(0);

    pub fn new(value: i64) -> DomainResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::validation(format!(
                "marks must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn grade(&self) -> Grade {
        Grade::for_marks(*self)
    }

    pub fn is_pass(&self) -> bool {
        self.0 >= Self::PASS_MARK
    }

    /// `"<marks>/100"`, as shown on the dashboard.
    pub fn out_of_max(&self) -> String {
        format!("{}/{}", self.0, Self::MAX)
    }
}

impl ValueObject for Marks {}

impl TryFrom<i64> for Marks {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Marks::new(value)
    }
}

impl From<Marks> for i64 {
    fn from(value: Marks) -> Self {
        i64::from(value.0)
    }
}

impl core::fmt::Display for Marks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Letter grade derived from marks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn for_marks(marks: Marks) -> Self {
        match marks.value() {
            90.. => Grade::APlus,
            80..=89 => Grade::A,
            70..=79 => Grade::B,
            60..=69 => Grade::C,
            50..=59 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl ValueObject for Grade {}

impl core::fmt::Display for Grade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn grade_boundaries() {
        let cases = [
            (100, "A+"),
            (95, "A+"),
            (90, "A+"),
            (89, "A"),
            (80, "A"),
            (79, "B"),
            (70, "B"),
            (69, "C"),
            (60, "C"),
            (59, "D"),
            (50, "D"),
            (49, "F"),
            (0, "F"),
        ];
        for (m, label) in cases {
            assert_eq!(Marks::new(m).unwrap().grade().label(), label, "marks {m}");
        }
    }

    #[test]
    fn pass_threshold_is_sixty() {
        assert!(!Marks::new(59).unwrap().is_pass());
        assert!(Marks::new(60).unwrap().is_pass());
    }

    #[test]
    fn dashboard_format() {
        assert_eq!(Marks::ZERO.out_of_max(), "0/100");
        assert_eq!(Marks::new(95).unwrap().out_of_max(), "95/100");
    }

    #[test]
    fn deserializing_out_of_range_row_fails() {
        assert!(serde_json::from_str::<Marks>("101").is_err());
        assert!(serde_json::from_str::<Marks>("-1").is_err());
        assert_eq!(serde_json::from_str::<Marks>("42").unwrap().value(), 42);
        assert_eq!(serde_json::to_string(&Marks::new(42).unwrap()).unwrap(), "42");
    }

    #[test]
    fn grade_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
    }

    proptest! {
        #[test]
        fn accepts_exactly_the_closed_range(value in -1_000i64..1_000i64) {
            let result = Marks::new(value);
            prop_assert_eq!(result.is_ok(), (0..=100).contains(&value));
            if let Ok(m) = result {
                prop_assert_eq!(i64::from(m), value);
            }
        }
    }
}
