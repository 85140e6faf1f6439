use std::fmt;

use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};
use uuid::Uuid;

/// Opaque task identifier.
///
/// Locally generated ids are UUID v4 text. Ids assigned by a remote
/// endpoint may arrive as JSON numbers and are kept as their decimal text.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
pub struct TaskId(String);

impl TaskId {
  pub fn new(raw: impl Into<String>) -> Self {
    Self(raw.into())
  }

  pub fn generate() -> Self {
    Self(Uuid::new_v4().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.trim().is_empty()
  }
}

impl fmt::Display for TaskId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TaskId {
  fn from(raw: &str) -> Self {
    Self::new(raw)
  }
}

impl Serialize for TaskId {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(&self.0)
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
  Text(String),
  Unsigned(u64),
  Signed(i64)
}

impl<'de> Deserialize<'de> for TaskId {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = RawId::deserialize(deserializer)?;
    Ok(match raw {
      | RawId::Text(text) => Self(text),
      | RawId::Unsigned(n) => Self(n.to_string()),
      | RawId::Signed(n) => Self(n.to_string())
    })
  }
}

/// Glyphs offered by the icon picker.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
pub enum Icon {
  Briefcase,
  Books,
  Cart,
  #[default]
  Memo,
  Target,
  Rocket,
  Laptop,
  Broom,
  Pencil,
  Trash
}

impl Icon {
  pub const PALETTE: [Icon; 10] = [
    Icon::Briefcase,
    Icon::Books,
    Icon::Cart,
    Icon::Memo,
    Icon::Target,
    Icon::Rocket,
    Icon::Laptop,
    Icon::Broom,
    Icon::Pencil,
    Icon::Trash
  ];

  pub fn glyph(self) -> &'static str {
    match self {
      | Icon::Briefcase => "💼",
      | Icon::Books => "📚",
      | Icon::Cart => "🛒",
      | Icon::Memo => "📝",
      | Icon::Target => "🎯",
      | Icon::Rocket => "🚀",
      | Icon::Laptop => "💻",
      | Icon::Broom => "🧹",
      | Icon::Pencil => "✏️",
      | Icon::Trash => "🗑️"
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      | Icon::Briefcase => "briefcase",
      | Icon::Books => "books",
      | Icon::Cart => "cart",
      | Icon::Memo => "memo",
      | Icon::Target => "target",
      | Icon::Rocket => "rocket",
      | Icon::Laptop => "laptop",
      | Icon::Broom => "broom",
      | Icon::Pencil => "pencil",
      | Icon::Trash => "trash"
    }
  }

  /// Matches a glyph, tolerating a missing
  /// emoji variation selector.
  pub fn from_glyph(
    glyph: &str
  ) -> Option<Self> {
    let bare = glyph
      .trim()
      .trim_end_matches('\u{fe0f}');
    Self::PALETTE.into_iter().find(|icon| {
      icon
        .glyph()
        .trim_end_matches('\u{fe0f}')
        == bare
    })
  }

  /// Accepts either a glyph or a palette
  /// name such as `cart`.
  pub fn parse(raw: &str) -> Option<Self> {
    let lowered =
      raw.trim().to_ascii_lowercase();
    Self::PALETTE
      .into_iter()
      .find(|icon| icon.name() == lowered)
      .or_else(|| Self::from_glyph(raw))
  }
}

impl fmt::Display for Icon {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.glyph())
  }
}

impl Serialize for Icon {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(self.glyph())
  }
}

impl<'de> Deserialize<'de> for Icon {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    Ok(
      raw
        .as_deref()
        .and_then(Icon::parse)
        .unwrap_or_default()
    )
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
  Bool(bool),
  Int(i64),
  Text(String)
}

fn lenient_flag<'de, D>(
  deserializer: D
) -> Result<bool, D::Error>
where
  D: Deserializer<'de>
{
  let raw = Option::<RawFlag>::deserialize(
    deserializer
  )?;
  Ok(match raw {
    | None => false,
    | Some(RawFlag::Bool(value)) => value,
    | Some(RawFlag::Int(value)) => {
      value != 0
    }
    | Some(RawFlag::Text(value)) => {
      matches!(
        value
          .trim()
          .to_ascii_lowercase()
          .as_str(),
        "1" | "true" | "yes"
      )
    }
  })
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Task {
  pub id:   TaskId,
  pub name: String,
  #[serde(
    default,
    deserialize_with = "lenient_flag"
  )]
  pub done: bool,
  #[serde(default)]
  pub icon: Icon
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct TaskDraft {
  pub name: String,
  #[serde(default)]
  pub icon: Option<Icon>
}

impl TaskDraft {
  pub fn new(
    name: impl Into<String>,
    icon: Option<Icon>
  ) -> Self {
    Self {
      name: name.into(),
      icon
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct TaskPatch {
  pub name: Option<String>,
  pub done: Option<bool>,
  pub icon: Option<Icon>
}

impl TaskPatch {
  pub fn rename(
    name: impl Into<String>
  ) -> Self {
    Self {
      name: Some(name.into()),
      ..Self::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.done.is_none()
      && self.icon.is_none()
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TaskIdArg {
  pub id: TaskId
}

/// Which tasks the list view shows.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
  #[default]
  All,
  Completed,
  Pending
}

impl Filter {
  pub const ALL: [Filter; 3] = [
    Filter::All,
    Filter::Completed,
    Filter::Pending
  ];

  /// Unknown names select `All`.
  pub fn from_name(raw: &str) -> Self {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "completed" | "done" => {
        Filter::Completed
      }
      | "pending" | "todo" => {
        Filter::Pending
      }
      | _ => Filter::All
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | Filter::All => "all",
      | Filter::Completed => "completed",
      | Filter::Pending => "pending"
    }
  }

  pub fn accepts(
    self,
    task: &Task
  ) -> bool {
    match self {
      | Filter::All => true,
      | Filter::Completed => task.done,
      | Filter::Pending => !task.done
    }
  }
}

impl fmt::Display for Filter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
  #[default]
  Light,
  Dark
}

impl ThemeMode {
  pub fn storage_value(self) -> &'static str {
    match self {
      | ThemeMode::Light => "light",
      | ThemeMode::Dark => "dark"
    }
  }

  pub fn from_storage(
    stored: Option<&str>
  ) -> Self {
    match stored {
      | Some("dark") => ThemeMode::Dark,
      | _ => ThemeMode::Light
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      | ThemeMode::Light => ThemeMode::Dark,
      | ThemeMode::Dark => ThemeMode::Light
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
  #[default]
  Blue,
  Red,
  Green,
  Yellow
}

impl ThemeColor {
  pub const ALL: [ThemeColor; 4] = [
    ThemeColor::Blue,
    ThemeColor::Red,
    ThemeColor::Green,
    ThemeColor::Yellow
  ];

  pub fn storage_value(self) -> &'static str {
    match self {
      | ThemeColor::Blue => "blue",
      | ThemeColor::Red => "red",
      | ThemeColor::Green => "green",
      | ThemeColor::Yellow => "yellow"
    }
  }

  pub fn parse(raw: &str) -> Option<Self> {
    let lowered =
      raw.trim().to_ascii_lowercase();
    Self::ALL.into_iter().find(|color| {
      color.storage_value() == lowered
    })
  }

  pub fn from_storage(
    stored: Option<&str>
  ) -> Self {
    stored
      .and_then(Self::parse)
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn task_accepts_numeric_id_and_flag() {
    let task: Task = serde_json::from_str(
      r#"{"id": 7, "name": "Buy milk", "done": 1, "icon": "🛒"}"#
    )
    .expect("decode task");
    assert_eq!(task.id.as_str(), "7");
    assert!(task.done);
    assert_eq!(task.icon, Icon::Cart);
  }

  #[test]
  fn task_defaults_missing_fields() {
    let task: Task = serde_json::from_str(
      r#"{"id": "a1", "name": "Walk"}"#
    )
    .expect("decode task");
    assert!(!task.done);
    assert_eq!(task.icon, Icon::Memo);
  }

  #[test]
  fn unknown_or_null_icon_falls_back() {
    let task: Task = serde_json::from_str(
      r#"{"id": "a1", "name": "x", "done": false, "icon": "🦀"}"#
    )
    .expect("decode task");
    assert_eq!(task.icon, Icon::default());

    let task: Task = serde_json::from_str(
      r#"{"id": "a1", "name": "x", "done": "0", "icon": null}"#
    )
    .expect("decode task");
    assert_eq!(task.icon, Icon::default());
    assert!(!task.done);
  }

  #[test]
  fn icon_serializes_as_glyph() {
    let task = Task {
      id:   TaskId::new("1"),
      name: "Ship".to_string(),
      done: false,
      icon: Icon::Rocket
    };
    let json = serde_json::to_string(&task)
      .expect("encode task");
    assert_eq!(
      json,
      r#"{"id":"1","name":"Ship","done":false,"icon":"🚀"}"#
    );
  }

  #[test]
  fn icon_parse_accepts_names_and_bare_glyphs()
   {
    assert_eq!(
      Icon::parse("Cart"),
      Some(Icon::Cart)
    );
    assert_eq!(
      Icon::parse("✏"),
      Some(Icon::Pencil)
    );
    assert_eq!(Icon::parse("nope"), None);
  }

  #[test]
  fn filter_names_fall_back_to_all() {
    assert_eq!(
      Filter::from_name("completed"),
      Filter::Completed
    );
    assert_eq!(
      Filter::from_name(" Pending "),
      Filter::Pending
    );
    assert_eq!(
      Filter::from_name("archived"),
      Filter::All
    );
  }

  #[test]
  fn theme_values_fall_back_to_defaults() {
    assert_eq!(
      ThemeMode::from_storage(Some("dark")),
      ThemeMode::Dark
    );
    assert_eq!(
      ThemeMode::from_storage(Some("sepia")),
      ThemeMode::Light
    );
    assert_eq!(
      ThemeColor::from_storage(Some("green")),
      ThemeColor::Green
    );
    assert_eq!(
      ThemeColor::from_storage(None),
      ThemeColor::Blue
    );
  }
}
