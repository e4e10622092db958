use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    String,
    /// Intermediate level of a nested path.
    Object,
}

/// Declaration options of a schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOptions {
    pub kind: FieldKind,
    /// Marks the field for automatic hashing.
    #[serde(default)]
    pub bcrypt: bool,
    /// Per-field cost factor override.
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub required: bool,
}

impl FieldOptions {
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self { kind, bcrypt: false, rounds: None, required: false }
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::new(FieldKind::String)
    }

    #[must_use]
    pub const fn object() -> Self {
        Self::new(FieldKind::Object)
    }

    #[must_use]
    pub const fn bcrypt(mut self) -> Self {
        self.bcrypt = true;
        self
    }

    #[must_use]
    pub const fn rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Update entry points that carry a raw update expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateKind {
    Update,
    UpdateOne,
    UpdateMany,
    FindOneAndUpdate,
    ReplaceOne,
}

impl UpdateKind {
    pub const ALL: [Self; 5] =
        [Self::Update, Self::UpdateOne, Self::UpdateMany, Self::FindOneAndUpdate, Self::ReplaceOne];
}

/// Persistence operations a pre-hook can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPoint {
    Save,
    InsertMany,
    Update(UpdateKind),
}

impl HookPoint {
    /// Every hook point, in registration order.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::Save, Self::InsertMany]
            .into_iter()
            .chain(UpdateKind::ALL.into_iter().map(Self::Update))
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Save => write!(f, "save"),
            Self::InsertMany => write!(f, "insertMany"),
            Self::Update(UpdateKind::Update) => write!(f, "update"),
            Self::Update(UpdateKind::UpdateOne) => write!(f, "updateOne"),
            Self::Update(UpdateKind::UpdateMany) => write!(f, "updateMany"),
            Self::Update(UpdateKind::FindOneAndUpdate) => write!(f, "findOneAndUpdate"),
            Self::Update(UpdateKind::ReplaceOne) => write!(f, "replaceOne"),
        }
    }
}
