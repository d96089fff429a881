//! Dashboard filtering and sorting over cached rooms.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{OccupancyStatus, Room, RoomStatus};

/// Date field a range filter or sort applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateField {
    CheckIn,
    CheckOut,
}

impl DateField {
    fn value<'a>(&self, room: &'a Room) -> Option<&'a str> {
        match self {
            Self::CheckIn => room.check_in.as_deref(),
            Self::CheckOut => room.check_out.as_deref(),
        }
        .filter(|value| !value.is_empty())
    }
}

/// Inclusive range over ISO `YYYY-MM-DD` strings. An open end means "no upper bound".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub field: DateField,
    pub start: String,
    pub end: Option<String>,
}

impl DateRange {
    fn matches(&self, room: &Room) -> bool {
        if self.start.is_empty() {
            return true;
        }
        let Some(value) = self.field.value(room) else {
            return false;
        };
        value >= self.start.as_str()
            && self
                .end
                .as_deref()
                .filter(|end| !end.is_empty())
                .map_or(true, |end| value <= end)
    }
}

/// Dashboard filter; `None` fields mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFilter {
    pub status: Option<RoomStatus>,
    pub occupancy: Option<OccupancyStatus>,
    pub pet: Option<bool>,
    pub date_range: Option<DateRange>,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        if let Some(status) = &self.status {
            if !room.status.as_str().eq_ignore_ascii_case(status.as_str()) {
                return false;
            }
        }
        if let Some(occupancy) = &self.occupancy {
            let matches = room
                .occupancy_status
                .as_ref()
                .is_some_and(|value| value.as_str().eq_ignore_ascii_case(occupancy.as_str()));
            if !matches {
                return false;
            }
        }
        if let Some(pet) = self.pet {
            if room.has_pet() != pet {
                return false;
            }
        }
        self.date_range
            .as_ref()
            .map_or(true, |range| range.matches(room))
    }
}

/// Sort order for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Room,
    Status,
    CheckIn,
    CheckOut,
}

impl SortKey {
    pub fn compare(&self, a: &Room, b: &Room) -> Ordering {
        match self {
            Self::Room => natural_cmp(&a.number, &b.number),
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
            Self::CheckIn => optional_cmp(a.check_in.as_deref(), b.check_in.as_deref()),
            Self::CheckOut => optional_cmp(a.check_out.as_deref(), b.check_out.as_deref()),
        }
    }
}

fn optional_cmp(a: Option<&str>, b: Option<&str>) -> Ordering {
    a.unwrap_or_default().cmp(b.unwrap_or_default())
}

/// Numeric-aware string ordering: runs of digits compare by value, so
/// `"2" < "10" < "10A" < "10B"`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    // Case and leading zeros only decide between otherwise equal strings.
    let mut tiebreak = Ordering::Equal;

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return tiebreak,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_trimmed = l_run.trim_start_matches('0');
                let r_trimmed = r_run.trim_start_matches('0');
                let ordering = l_trimmed
                    .len()
                    .cmp(&r_trimmed.len())
                    .then_with(|| l_trimmed.cmp(r_trimmed));
                if ordering != Ordering::Equal {
                    return ordering;
                }
                if tiebreak == Ordering::Equal {
                    tiebreak = l_run.len().cmp(&r_run.len());
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                if tiebreak == Ordering::Equal {
                    tiebreak = l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

/// Filters then sorts a room listing. The sort is stable.
pub fn filter_and_sort<'a>(
    rooms: impl IntoIterator<Item = &'a Room>,
    filter: &RoomFilter,
    sort: SortKey,
) -> Vec<&'a Room> {
    let mut selected: Vec<&Room> = rooms.into_iter().filter(|room| filter.matches(room)).collect();
    selected.sort_by(|a, b| sort.compare(a, b));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, number: &str, status: RoomStatus) -> Room {
        Room::new(id, number, status)
    }

    #[test]
    fn natural_order_for_room_numbers() {
        let mut numbers = vec!["10", "2", "10B", "1", "10A", "B2", "b1", "002"];
        numbers.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(numbers, vec!["1", "2", "002", "10", "10A", "10B", "b1", "B2"]);
    }

    #[test]
    fn status_filter_is_case_insensitive() {
        let rooms = vec![
            room("A", "1", RoomStatus::Clean),
            room("B", "2", RoomStatus::Dirty),
            room("C", "3", RoomStatus::Other("Clean".to_string())),
        ];
        let filter = RoomFilter {
            status: Some(RoomStatus::Clean),
            ..Default::default()
        };
        let ids: Vec<&str> = filter_and_sort(&rooms, &filter, SortKey::Room)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn occupancy_and_pet_filters() {
        let mut a = room("A", "1", RoomStatus::Clean);
        a.occupancy_status = Some(OccupancyStatus::Occupied);
        a.pet = Some(true);
        let mut b = room("B", "2", RoomStatus::Clean);
        b.occupancy_status = Some(OccupancyStatus::Vacant);
        let c = room("C", "3", RoomStatus::Dirty);
        let rooms = vec![a, b, c];

        let occupied = RoomFilter {
            occupancy: Some(OccupancyStatus::Occupied),
            ..Default::default()
        };
        assert_eq!(filter_and_sort(&rooms, &occupied, SortKey::Room).len(), 1);

        let no_pets = RoomFilter {
            pet: Some(false),
            ..Default::default()
        };
        let ids: Vec<&str> = filter_and_sort(&rooms, &no_pets, SortKey::Room)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["B", "C"]);
    }

    #[test]
    fn date_range_requires_a_value_inside_bounds() {
        let mut a = room("A", "1", RoomStatus::Clean);
        a.check_out = Some("2025-05-02".to_string());
        let mut b = room("B", "2", RoomStatus::Clean);
        b.check_out = Some("2025-05-09".to_string());
        let c = room("C", "3", RoomStatus::Clean);
        let rooms = vec![a, b, c];

        let bounded = RoomFilter {
            date_range: Some(DateRange {
                field: DateField::CheckOut,
                start: "2025-05-01".to_string(),
                end: Some("2025-05-05".to_string()),
            }),
            ..Default::default()
        };
        let ids: Vec<&str> = filter_and_sort(&rooms, &bounded, SortKey::Room)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["A"]);

        let open_ended = RoomFilter {
            date_range: Some(DateRange {
                field: DateField::CheckOut,
                start: "2025-05-01".to_string(),
                end: None,
            }),
            ..Default::default()
        };
        assert_eq!(filter_and_sort(&rooms, &open_ended, SortKey::Room).len(), 2);
    }

    #[test]
    fn sorts_by_check_in_with_missing_first() {
        let mut a = room("A", "1", RoomStatus::Clean);
        a.check_in = Some("2025-05-03".to_string());
        let b = room("B", "2", RoomStatus::Clean);
        let mut c = room("C", "3", RoomStatus::Clean);
        c.check_in = Some("2025-05-01".to_string());
        let rooms = vec![a, b, c];

        let ids: Vec<&str> = filter_and_sort(&rooms, &RoomFilter::default(), SortKey::CheckIn)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
    }
}
