//! Checkpoint data structures

use crate::error::StoreError;
use fy_core::now_iso;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Schema version written into every new checkpoint
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Status label given to fork metadata at creation
pub const STATUS_ACTIVE: &str = "active";

/// A checkpoint is a point-in-time snapshot of one conversation branch
///
/// `conversation_history`, `context` and `metadata` belong to the caller and
/// are stored as-is. Top-level keys this type does not know about, and known
/// keys holding a value of the wrong type, are kept verbatim in `extra` so
/// they survive a load/save cycle.
///
/// On disk a checkpoint is a plain JSON object. Known fields are written
/// first, in declaration order, followed by `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Fork this checkpoint is stored under
    pub fork_id: String,
    /// Fork this one was branched from (`None` for a root conversation)
    pub parent_id: Option<String>,
    /// Creation time (ISO-8601); empty when the stored body has none
    pub timestamp: String,
    /// Chronological conversation records
    pub conversation_history: Vec<Value>,
    pub context: Map<String, Value>,
    /// Free-form caller annotations
    pub metadata: Map<String, Value>,
    pub version: String,
    /// Time of the last update (ISO-8601), absent until the first update
    pub last_modified: Option<String>,
    pub extra: Map<String, Value>,
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Caller-owned contents of a new checkpoint; every part defaults to empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointPayload {
    pub conversation_history: Vec<Value>,
    pub context: Map<String, Value>,
    pub metadata: Map<String, Value>,
}

impl CheckpointPayload {
    pub fn with_history(mut self, history: Vec<Value>) -> Self {
        self.conversation_history = history;
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Checkpoint {
    /// Create a new checkpoint stamped with the current time
    pub fn new(fork_id: &str, parent_id: Option<&str>, payload: CheckpointPayload) -> Self {
        Self {
            fork_id: fork_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            timestamp: now_iso(),
            conversation_history: payload.conversation_history,
            context: payload.context,
            metadata: payload.metadata,
            version: default_version(),
            last_modified: None,
            extra: Map::new(),
        }
    }

    /// Shallow-merge `updates` into a copy of this checkpoint
    ///
    /// Every key in `updates` replaces the top-level field of the same name
    /// wholesale; unknown keys are added. `last_modified` is then set to
    /// `now`. The fork id cannot be changed, and known fields must keep
    /// their types.
    pub fn merged(
        &self,
        updates: &Map<String, Value>,
        now: &str,
    ) -> Result<Checkpoint, StoreError> {
        let invalid = |reason: String| StoreError::InvalidUpdate {
            fork_id: self.fork_id.clone(),
            reason,
        };

        for (key, value) in updates {
            let fits = match key.as_str() {
                "fork_id" => {
                    if value.as_str() != Some(self.fork_id.as_str()) {
                        return Err(invalid(format!("fork_id cannot be changed (got {})", value)));
                    }
                    true
                }
                "parent_id" | "last_modified" => value.is_string() || value.is_null(),
                "timestamp" | "version" => value.is_string(),
                "conversation_history" => value.is_array(),
                "context" | "metadata" => value.is_object(),
                _ => true,
            };
            if !fits {
                return Err(invalid(format!("{} has the wrong type (got {})", key, value)));
            }
        }

        let mut body = self.to_map();
        for (key, value) in updates {
            body.insert(key.clone(), value.clone());
        }
        body.insert("last_modified".to_string(), Value::String(now.to_string()));

        Ok(Self::from_map(body))
    }

    /// Read a checkpoint out of a stored JSON object
    ///
    /// Never fails: missing fields take their defaults and mistyped known
    /// fields are kept in `extra` under their own key.
    pub fn from_map(body: Map<String, Value>) -> Self {
        let mut checkpoint = Self {
            fork_id: String::new(),
            parent_id: None,
            timestamp: String::new(),
            conversation_history: Vec::new(),
            context: Map::new(),
            metadata: Map::new(),
            version: default_version(),
            last_modified: None,
            extra: Map::new(),
        };

        for (key, value) in body {
            let value = match (key.as_str(), value) {
                ("fork_id", Value::String(id)) => {
                    checkpoint.fork_id = id;
                    continue;
                }
                ("parent_id", Value::String(parent)) => {
                    checkpoint.parent_id = Some(parent);
                    continue;
                }
                ("parent_id", Value::Null) => continue,
                ("timestamp", Value::String(timestamp)) => {
                    checkpoint.timestamp = timestamp;
                    continue;
                }
                ("conversation_history", Value::Array(history)) => {
                    checkpoint.conversation_history = history;
                    continue;
                }
                ("context", Value::Object(context)) => {
                    checkpoint.context = context;
                    continue;
                }
                ("metadata", Value::Object(metadata)) => {
                    checkpoint.metadata = metadata;
                    continue;
                }
                ("version", Value::String(version)) => {
                    checkpoint.version = version;
                    continue;
                }
                ("last_modified", Value::String(at)) => {
                    checkpoint.last_modified = Some(at);
                    continue;
                }
                (_, other) => other,
            };
            checkpoint.extra.insert(key, value);
        }

        checkpoint
    }

    /// The JSON object this checkpoint is stored as
    pub fn to_map(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("fork_id".to_string(), Value::String(self.fork_id.clone()));
        body.insert(
            "parent_id".to_string(),
            self.parent_id.clone().map_or(Value::Null, Value::String),
        );
        body.insert("timestamp".to_string(), Value::String(self.timestamp.clone()));
        body.insert(
            "conversation_history".to_string(),
            Value::Array(self.conversation_history.clone()),
        );
        body.insert("context".to_string(), Value::Object(self.context.clone()));
        body.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        body.insert("version".to_string(), Value::String(self.version.clone()));
        if let Some(at) = &self.last_modified {
            body.insert("last_modified".to_string(), Value::String(at.clone()));
        }
        // Mistyped known fields overwrite their default in place
        for (key, value) in &self.extra {
            body.insert(key.clone(), value.clone());
        }
        body
    }

    /// Whether this checkpoint has no parent fork
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Serialize for Checkpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Checkpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_map)
    }
}

/// Lightweight per-fork record used for listing and tree assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkMetadata {
    pub fork_id: String,
    pub parent_id: Option<String>,
    /// Copy of the checkpoint's creation timestamp
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_modified: String,
    /// Free-text lifecycle label; `"active"` at creation
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    STATUS_ACTIVE.to_string()
}

impl ForkMetadata {
    /// Metadata for a freshly created checkpoint
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Self {
        Self {
            fork_id: checkpoint.fork_id.clone(),
            parent_id: checkpoint.parent_id.clone(),
            created_at: checkpoint.timestamp.clone(),
            last_modified: checkpoint.timestamp.clone(),
            status: default_status(),
        }
    }
}
