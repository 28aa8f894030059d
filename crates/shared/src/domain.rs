use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);
    };
}

id_newtype!(SlotIndex, usize);
id_newtype!(WidgetInstanceId, Uuid);

impl WidgetInstanceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WidgetVariant {
    /// Multi-slot tap counter with theme and optional extra slots.
    #[default]
    Koyaku,
    /// Single-value counter driven by vertical drags.
    Swipe,
}

impl WidgetVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Koyaku => "koyaku",
            Self::Swipe => "swipe",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "koyaku" => Some(Self::Koyaku),
            "swipe" => Some(Self::Swipe),
            _ => None,
        }
    }

    pub fn default_storage_key(self) -> &'static str {
        match self {
            Self::Koyaku => "koyaku-counter:v1",
            Self::Swipe => "swipe-counter:v1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Only the two literal values are accepted; anything else is treated as unset.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Which actor caused a value change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOrigin {
    User,
    Adjust,
    Reset,
    Input,
    Storage,
    /// Value pushed in by the host application itself.
    Python,
    Init,
}

impl UpdateOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Adjust => "adjust",
            Self::Reset => "reset",
            Self::Input => "input",
            Self::Storage => "storage",
            Self::Python => "python",
            Self::Init => "init",
        }
    }

    /// Host-driven updates are reconciliation, so echoing them back would loop.
    pub fn is_host_driven(self) -> bool {
        matches!(self, Self::Python)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub key: String,
    pub label: String,
    pub color: String,
    pub text_color: String,
    /// Extra slots are only rendered while the extras section is visible.
    #[serde(default)]
    pub extra: bool,
}

impl SlotSpec {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        color: impl Into<String>,
        text_color: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            color: color.into(),
            text_color: text_color.into(),
            extra: false,
        }
    }

    pub fn extra(mut self) -> Self {
        self.extra = true;
        self
    }
}
