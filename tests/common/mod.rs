#![allow(dead_code)]

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use rsql_filter::{filterable, FilterEnum, PropertyCodec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Suspended,
    Closed,
}

impl FilterEnum for Status {
    const VARIANTS: &'static [&'static str] = &["ACTIVE", "SUSPENDED", "CLOSED"];

    fn variant_name(&self) -> &'static str {
        match self {
            Status::Active => "ACTIVE",
            Status::Suspended => "SUSPENDED",
            Status::Closed => "CLOSED",
        }
    }
}

/// Compared by its encoded `department,name` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub department: String,
    pub name: String,
}

impl Team {
    pub fn new(department: &str, name: &str) -> Self {
        Team {
            department: department.to_uppercase(),
            name: name.to_string(),
        }
    }
}

impl PropertyCodec for Team {
    fn encode(&self) -> String {
        format!("{},{}", self.department, self.name)
    }

    fn decode(text: &str) -> Option<Self> {
        let (department, name) = text.split_once(',')?;
        // Department names are case-insensitive.
        Some(Team::new(department.trim(), name.trim()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub house_number: i32,
    pub city: String,
    pub postal_code: i32,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub age: i16,
    pub score: f64,
    pub active: bool,
    pub joined: Option<DateTime<Utc>>,
    pub status: Status,
    pub address: Option<Address>,
    pub team: Option<Team>,
    pub tags: HashMap<String, String>,
}

filterable! {
    /// Typed entry point for filters over [`Person`].
    pub struct PersonQuery for Person {
        id("id"): NumberProperty<i64> => |p| Some(p.id),
        first_name("firstName"): StringProperty => |p| Some(p.first_name.clone()),
        last_name("lastName"): StringProperty => |p| Some(p.last_name.clone()),
        nickname("nickname"): StringProperty => |p| p.nickname.clone(),
        age("age"): NumberProperty<i16> => |p| Some(p.age),
        score("score"): NumberProperty<f64> => |p| Some(p.score),
        active("active"): BooleanProperty => |p| Some(p.active),
        joined("joined"): InstantProperty => |p| p.joined,
        status("status"): EnumProperty<Status> => |p| Some(p.status),
        street("address.street"): StringProperty => |p| p.address.as_ref().map(|a| a.street.clone()),
        city("address.city"): StringProperty => |p| p.address.as_ref().map(|a| a.city.clone()),
        postal_code("address.postalCode"): NumberProperty<i32> => |p| p.address.as_ref().map(|a| a.postal_code),
        country("address.country"): StringProperty => |p| p.address.as_ref().map(|a| a.country.clone()),
        team("team"): CustomProperty<Team> => |p| p.team.clone(),
        tags("tags"): StringMapProperty => |p, key| p.tags.get(key).cloned(),
    }
}

pub fn person(first_name: &str, last_name: &str, age: i16) -> Person {
    Person {
        id: 0,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        nickname: None,
        age,
        score: 0.0,
        active: true,
        joined: None,
        status: Status::Active,
        address: None,
        team: None,
        tags: HashMap::new(),
    }
}

pub fn parisian(first_name: &str, last_name: &str, age: i16) -> Person {
    Person {
        address: Some(Address {
            street: "Rue de Rivoli".to_string(),
            house_number: 1,
            city: "Paris".to_string(),
            postal_code: 75008,
            country: "France".to_string(),
        }),
        ..person(first_name, last_name, age)
    }
}

pub fn tagged(first_name: &str, tags: &[(&str, &str)]) -> Person {
    Person {
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..person(first_name, "Doe", 30)
    }
}

pub fn new_year() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}
