//! Room records as served by the housekeeping backend.

use chrono::NaiveDate;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::{Error, Result};
use crate::sync::CachedEntity;

/// Backend-assigned room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Housekeeping status of a room.
///
/// Only `Clean` and `Dirty` can be changed from this client. `Unavailable` and
/// any status the client does not recognise are owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoomStatus {
    Clean,
    Dirty,
    Unavailable,
    Other(String),
}

impl RoomStatus {
    /// Next status in the clean/dirty cycle, `None` for frozen statuses.
    pub fn toggled(&self) -> Option<RoomStatus> {
        match self {
            Self::Clean => Some(Self::Dirty),
            Self::Dirty => Some(Self::Clean),
            Self::Unavailable | Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Clean => "clean",
            Self::Dirty => "dirty",
            Self::Unavailable => "unavailable",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for RoomStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "clean" => Self::Clean,
            "dirty" => Self::Dirty,
            "unavailable" => Self::Unavailable,
            _ => Self::Other(value),
        }
    }
}

impl From<RoomStatus> for String {
    fn from(value: RoomStatus) -> Self {
        match value {
            RoomStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoomStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

/// Guest occupancy reported by the property management import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OccupancyStatus {
    Occupied,
    Vacant,
    Other(String),
}

impl OccupancyStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Occupied => "Occupied",
            Self::Vacant => "Vacant",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for OccupancyStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "occupied" => Self::Occupied,
            "vacant" => Self::Vacant,
            _ => Self::Other(value),
        }
    }
}

impl From<OccupancyStatus> for String {
    fn from(value: OccupancyStatus) -> Self {
        match value {
            OccupancyStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OccupancyStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

/// Key a room's label travels under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LabelField {
    /// Housekeeping grid records.
    #[default]
    Number,
    /// Dashboard records.
    Room,
}

impl LabelField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Room => "room",
        }
    }
}

/// Key a room's status travels under, which also fixes its casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusField {
    /// Housekeeping grid: `status`, lower case.
    #[default]
    Status,
    /// Dashboard: `housekeepingStatus`, capitalised.
    HousekeepingStatus,
}

impl StatusField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::HousekeepingStatus => "housekeepingStatus",
        }
    }

    pub fn encode(&self, status: &RoomStatus) -> String {
        match (self, status) {
            (_, RoomStatus::Other(raw)) => raw.clone(),
            (Self::Status, known) => known.as_str().to_string(),
            (Self::HousekeepingStatus, RoomStatus::Clean) => "Clean".to_string(),
            (Self::HousekeepingStatus, RoomStatus::Dirty) => "Dirty".to_string(),
            (Self::HousekeepingStatus, RoomStatus::Unavailable) => "Unavailable".to_string(),
        }
    }
}

/// Field spellings a record arrived with. Writes for that record reuse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WireNames {
    pub label: LabelField,
    pub status: StatusField,
}

impl WireNames {
    pub const GRID: WireNames = WireNames {
        label: LabelField::Number,
        status: StatusField::Status,
    };

    pub const DASHBOARD: WireNames = WireNames {
        label: LabelField::Room,
        status: StatusField::HousekeepingStatus,
    };
}

/// A JSON object being split into modelled fields; what is left over passes through.
struct Fields(Map<String, Value>);

impl Fields {
    fn has(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|value| !value.is_null())
    }

    fn take<T: DeserializeOwned>(&mut self, key: &str) -> std::result::Result<Option<T>, String> {
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| format!("invalid `{}`: {}", key, e)),
        }
    }

    /// `_id`, falling back to `id`. When both are present `id` stays in the pass-through map.
    fn take_id(&mut self) -> std::result::Result<Option<RoomId>, String> {
        match self.take("_id")? {
            Some(id) => Ok(Some(id)),
            None => self.take("id"),
        }
    }

    /// `housekeepingStatus` wins over `status` when a record carries both.
    fn status_field(&self) -> StatusField {
        if self.has(StatusField::HousekeepingStatus.key()) {
            StatusField::HousekeepingStatus
        } else {
            StatusField::Status
        }
    }

    /// The label spelling that goes with `status`, unless only the other one is present.
    fn label_field(&self, status: StatusField) -> LabelField {
        let (preferred, other) = match status {
            StatusField::HousekeepingStatus => (LabelField::Room, LabelField::Number),
            StatusField::Status => (LabelField::Number, LabelField::Room),
        };
        if !self.has(preferred.key()) && self.has(other.key()) {
            other
        } else {
            preferred
        }
    }

    fn take_label(&mut self, field: LabelField) -> std::result::Result<Option<String>, String> {
        match self.0.remove(field.key()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(label)) => Ok(Some(label)),
            Some(Value::Number(label)) => Ok(Some(label.to_string())),
            Some(other) => Err(format!(
                "invalid `{}`: expected a string, got {}",
                field.key(),
                other
            )),
        }
    }

    fn into_extra(self) -> Map<String, Value> {
        self.0
    }
}

fn put(fields: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value);
    }
}

fn text(value: &Option<String>) -> Option<Value> {
    value.clone().map(Value::String)
}

/// A room record.
///
/// Fields the client does not model are kept in `extra` and written back
/// verbatim. The backend spells the label and status differently for the
/// grid and the dashboard; `wire` remembers which spelling this record used.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    pub status: RoomStatus,
    pub occupancy_status: Option<OccupancyStatus>,
    pub pet: Option<bool>,
    pub guest_status: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub notes: Option<String>,
    pub assigned_attendant: Option<String>,
    pub extra: Map<String, Value>,
    pub wire: WireNames,
}

impl Room {
    pub fn new(id: impl Into<RoomId>, number: impl Into<String>, status: RoomStatus) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            status,
            occupancy_status: None,
            pet: None,
            guest_status: None,
            check_in: None,
            check_out: None,
            notes: None,
            assigned_attendant: None,
            extra: Map::new(),
            wire: WireNames::default(),
        }
    }

    pub fn has_pet(&self) -> bool {
        self.pet.unwrap_or(false)
    }

    fn from_fields(fields: Map<String, Value>) -> std::result::Result<Self, String> {
        let mut fields = Fields(fields);
        let id = fields
            .take_id()?
            .ok_or_else(|| "missing field `_id`".to_string())?;
        let status_field = fields.status_field();
        let label_field = fields.label_field(status_field);
        let status = fields
            .take(status_field.key())?
            .ok_or_else(|| format!("missing field `{}`", status_field.key()))?;

        Ok(Self {
            id,
            number: fields.take_label(label_field)?.unwrap_or_default(),
            status,
            occupancy_status: fields.take("occupancyStatus")?,
            pet: fields.take("pet")?,
            guest_status: fields.take("guestStatus")?,
            check_in: fields.take("checkIn")?,
            check_out: fields.take("checkOut")?,
            notes: fields.take("notes")?,
            assigned_attendant: fields.take("assignedAttendant")?,
            extra: fields.into_extra(),
            wire: WireNames {
                label: label_field,
                status: status_field,
            },
        })
    }

    fn to_fields(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();
        fields.insert("_id".to_string(), Value::String(self.id.to_string()));
        fields.insert(
            self.wire.label.key().to_string(),
            Value::String(self.number.clone()),
        );
        fields.insert(
            self.wire.status.key().to_string(),
            Value::String(self.wire.status.encode(&self.status)),
        );
        put(
            &mut fields,
            "occupancyStatus",
            self.occupancy_status
                .as_ref()
                .map(|occupancy| Value::String(occupancy.to_string())),
        );
        put(&mut fields, "pet", self.pet.map(Value::Bool));
        put(&mut fields, "guestStatus", text(&self.guest_status));
        put(&mut fields, "checkIn", text(&self.check_in));
        put(&mut fields, "checkOut", text(&self.check_out));
        put(&mut fields, "notes", text(&self.notes));
        put(&mut fields, "assignedAttendant", text(&self.assigned_attendant));
        fields
    }
}

impl Serialize for Room {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_fields().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Room {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(de::Error::custom)
    }
}

/// Partial update of one room.
///
/// `None` (or `null` on the wire) means "leave as is".
#[derive(Debug, Clone, PartialEq)]
pub struct RoomPatch {
    pub id: RoomId,
    pub number: Option<String>,
    pub status: Option<RoomStatus>,
    pub occupancy_status: Option<OccupancyStatus>,
    pub pet: Option<bool>,
    pub guest_status: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub notes: Option<String>,
    pub assigned_attendant: Option<String>,
    pub extra: Map<String, Value>,
    pub wire: WireNames,
}

impl RoomPatch {
    pub fn new(id: impl Into<RoomId>) -> Self {
        Self {
            id: id.into(),
            number: None,
            status: None,
            occupancy_status: None,
            pet: None,
            guest_status: None,
            check_in: None,
            check_out: None,
            notes: None,
            assigned_attendant: None,
            extra: Map::new(),
            wire: WireNames::default(),
        }
    }

    /// Empty patch for `room`, written with the spellings the room arrived with.
    pub fn for_room(room: &Room) -> Self {
        Self {
            wire: room.wire,
            ..Self::new(room.id.clone())
        }
    }

    pub fn with_status(mut self, status: RoomStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// True when the patch would not change any field.
    pub fn is_empty(&self) -> bool {
        self.number.is_none()
            && self.status.is_none()
            && self.occupancy_status.is_none()
            && self.pet.is_none()
            && self.guest_status.is_none()
            && self.check_in.is_none()
            && self.check_out.is_none()
            && self.notes.is_none()
            && self.assigned_attendant.is_none()
            && self.extra.values().all(Value::is_null)
    }

    /// JSON body for `PUT /room/{id}`: the changed fields without the id.
    pub fn request_body(&self) -> Value {
        let mut fields = self.to_fields();
        fields.remove("_id");
        fields.retain(|_, value| !value.is_null());
        Value::Object(fields)
    }

    fn from_fields(fields: Map<String, Value>) -> std::result::Result<Self, String> {
        let mut fields = Fields(fields);
        let id = fields
            .take_id()?
            .ok_or_else(|| "missing field `_id`".to_string())?;
        let status_field = fields.status_field();
        let label_field = fields.label_field(status_field);

        Ok(Self {
            id,
            number: fields.take_label(label_field)?,
            status: fields.take(status_field.key())?,
            occupancy_status: fields.take("occupancyStatus")?,
            pet: fields.take("pet")?,
            guest_status: fields.take("guestStatus")?,
            check_in: fields.take("checkIn")?,
            check_out: fields.take("checkOut")?,
            notes: fields.take("notes")?,
            assigned_attendant: fields.take("assignedAttendant")?,
            extra: fields.into_extra(),
            wire: WireNames {
                label: label_field,
                status: status_field,
            },
        })
    }

    fn to_fields(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();
        fields.insert("_id".to_string(), Value::String(self.id.to_string()));
        put(&mut fields, self.wire.label.key(), text(&self.number));
        put(
            &mut fields,
            self.wire.status.key(),
            self.status
                .as_ref()
                .map(|status| Value::String(self.wire.status.encode(status))),
        );
        put(
            &mut fields,
            "occupancyStatus",
            self.occupancy_status
                .as_ref()
                .map(|occupancy| Value::String(occupancy.to_string())),
        );
        put(&mut fields, "pet", self.pet.map(Value::Bool));
        put(&mut fields, "guestStatus", text(&self.guest_status));
        put(&mut fields, "checkIn", text(&self.check_in));
        put(&mut fields, "checkOut", text(&self.check_out));
        put(&mut fields, "notes", text(&self.notes));
        put(&mut fields, "assignedAttendant", text(&self.assigned_attendant));
        fields
    }
}

impl Serialize for RoomPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_fields().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RoomPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(de::Error::custom)
    }
}

fn assign<T: PartialEq + Clone>(slot: &mut T, value: Option<&T>) -> bool {
    match value {
        Some(value) if slot != value => {
            *slot = value.clone();
            true
        }
        _ => false,
    }
}

fn assign_opt<T: PartialEq + Clone>(slot: &mut Option<T>, value: Option<&T>) -> bool {
    match value {
        Some(value) if slot.as_ref() != Some(value) => {
            *slot = Some(value.clone());
            true
        }
        _ => false,
    }
}

impl CachedEntity for Room {
    type Key = RoomId;
    type Patch = RoomPatch;

    fn key(&self) -> &RoomId {
        &self.id
    }

    fn patch_key(patch: &RoomPatch) -> &RoomId {
        &patch.id
    }

    fn merge(&mut self, patch: &RoomPatch) -> bool {
        let mut changed = false;
        changed |= assign(&mut self.number, patch.number.as_ref());
        changed |= assign(&mut self.status, patch.status.as_ref());
        changed |= assign_opt(&mut self.occupancy_status, patch.occupancy_status.as_ref());
        changed |= assign_opt(&mut self.pet, patch.pet.as_ref());
        changed |= assign_opt(&mut self.guest_status, patch.guest_status.as_ref());
        changed |= assign_opt(&mut self.check_in, patch.check_in.as_ref());
        changed |= assign_opt(&mut self.check_out, patch.check_out.as_ref());
        changed |= assign_opt(&mut self.notes, patch.notes.as_ref());
        changed |= assign_opt(&mut self.assigned_attendant, patch.assigned_attendant.as_ref());
        for (field, value) in &patch.extra {
            if value.is_null() || self.extra.get(field) == Some(value) {
                continue;
            }
            self.extra.insert(field.clone(), value.clone());
            changed = true;
        }
        changed
    }
}

/// Listing payload: a bare array or an object wrapping it in `data`.
pub struct RoomListing;

impl RoomListing {
    /// Parses a listing body, accepting both shapes.
    pub fn parse(body: &str) -> Result<Vec<Room>> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Vec<Room>> {
        let rooms = match value {
            rooms @ Value::Array(_) => rooms,
            Value::Object(mut wrapper) => match wrapper.remove("data") {
                Some(rooms @ Value::Array(_)) => rooms,
                _ => {
                    return Err(Error::malformed(
                        "room listing: expected an array or an object with a `data` array",
                    ))
                }
            },
            other => {
                return Err(Error::malformed(format!(
                    "room listing: expected an array, got {}",
                    json_kind(&other)
                )))
            }
        };
        serde_json::from_value::<Vec<Room>>(rooms)
            .map_err(|e| Error::malformed(format!("room listing: {}", e)))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Which rooms a view lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomScope {
    /// Housekeeping grid: every room.
    All,
    /// Dashboard: rooms with their status for one day.
    Date(NaiveDate),
}

impl RoomScope {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::All => None,
            Self::Date(date) => Some(*date),
        }
    }

    /// Scope shifted by whole days; `All` is unaffected.
    pub fn shifted(&self, days: i64) -> RoomScope {
        match self {
            Self::All => Self::All,
            Self::Date(date) => date
                .checked_add_signed(chrono::Duration::days(days))
                .map(Self::Date)
                .unwrap_or(*self),
        }
    }
}

impl std::fmt::Display for RoomScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all rooms"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}
