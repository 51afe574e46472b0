use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ReviewStatus {
    Due => "due",
    Overdue => "overdue",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl ReviewStatus {
    /// Due and overdue reviews are the only ones the recall scan looks at.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Due | Self::Overdue)
    }
}

str_enum!(AchievementStatus {
    Achieved => "achieved",
    NotAchieved => "not_achieved",
    Exception => "exception",
    Pending => "pending",
});

str_enum!(DiseaseType {
    Diabetes => "diabetes",
    Copd => "copd",
    HeartFailure => "heart_failure",
    Ckd => "ckd",
    Cad => "cad",
    Hypertension => "hypertension",
});

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
    NotSpecified => "not_specified",
});

str_enum!(ReviewFrequency {
    Quarterly => "quarterly",
    Biannual => "biannual",
    Annual => "annual",
});
