//! Random test data for Australian form fields

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::job::en::Title;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Postcode ranges per state, inclusive
const POSTCODE_RANGES: &[(&str, &[(u32, u32)])] = &[
    ("NSW", &[(1000, 2599), (2619, 2899)]),
    ("ACT", &[(200, 299), (2600, 2618), (2900, 2920)]),
    ("VIC", &[(3000, 3999), (8000, 8999)]),
    ("QLD", &[(4000, 4999), (9000, 9999)]),
    ("SA", &[(5000, 5799)]),
    ("WA", &[(6000, 6797)]),
    ("TAS", &[(7000, 7799)]),
    ("NT", &[(800, 899)]),
];

pub const COUNTRY: &str = "Australia";

/// State and territory codes
pub fn states() -> impl Iterator<Item = &'static str> {
    POSTCODE_RANGES.iter().map(|(state, _)| *state)
}

fn ranges_for(state: &str) -> Option<&'static [(u32, u32)]> {
    let upper = state.trim().to_ascii_uppercase();
    POSTCODE_RANGES
        .iter()
        .find(|(code, _)| *code == upper)
        .map(|(_, ranges)| *ranges)
}

/// Whether `postcode` falls inside one of `state`'s ranges
pub fn postcode_in_state(state: &str, postcode: &str) -> bool {
    let Ok(code) = postcode.parse::<u32>() else {
        return false;
    };
    ranges_for(state)
        .map(|ranges| ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&code)))
        .unwrap_or(false)
}

/// A postcode for `state`, zero-padded to four digits.
pub fn postcode_for_state<R: Rng + ?Sized>(rng: &mut R, state: &str) -> Result<String> {
    let ranges = ranges_for(state).ok_or_else(|| Error::UnsupportedState(state.to_string()))?;
    let (lo, hi) = ranges
        .choose(rng)
        .ok_or_else(|| Error::UnsupportedState(state.to_string()))?;
    Ok(format!("{:04}", rng.gen_range(*lo..=*hi)))
}

pub fn state_and_postcode<R: Rng + ?Sized>(rng: &mut R) -> (String, String) {
    let index = rng.gen_range(0..POSTCODE_RANGES.len());
    let (state, ranges) = POSTCODE_RANGES[index];
    let (lo, hi) = ranges[rng.gen_range(0..ranges.len())];
    (state.to_string(), format!("{:04}", rng.gen_range(lo..=hi)))
}

/// Australian address, as written on a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBundle {
    pub street: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
}

impl AddressBundle {
    /// `street, suburb, STATE postcode`
    pub fn one_line(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.suburb, self.state, self.postcode)
    }
}

/// Street and suburb from the fake data set; state and postcode always agree.
pub fn address_bundle<R: Rng + ?Sized>(rng: &mut R) -> AddressBundle {
    let (state, postcode) = state_and_postcode(rng);
    AddressBundle {
        street: street_address(rng),
        suburb: CityName().fake_with_rng(rng),
        state,
        postcode,
        country: COUNTRY.to_string(),
    }
}

fn street_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let number: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    format!("{} {}", number, street)
}

/// `04NN NNN NNN`
pub fn mobile_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "04{:02} {:03} {:03}",
        rng.gen_range(0..100),
        rng.gen_range(0..1000),
        rng.gen_range(0..1000)
    )
}

/// National landline format: `(0A) NNNN NNNN`
pub fn landline_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let area = ['2', '3', '7', '8'].choose(rng).copied().unwrap_or('2');
    format!(
        "(0{}) {:04} {:04}",
        area,
        rng.gen_range(0..10_000),
        rng.gen_range(0..10_000)
    )
}

const PASSWORD_LENGTH: usize = 12;

/// Alphanumeric password of twelve characters
pub fn password<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PASSWORD_LENGTH)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

pub fn username<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first: String = FirstName().fake_with_rng(rng);
    let last: String = LastName().fake_with_rng(rng);
    let separator = ['.', '_'].choose(rng).copied().unwrap_or('.');
    let name: String = format!("{}{}{}{}", first, separator, last, rng.gen_range(0..100))
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .collect();
    name.to_ascii_lowercase()
}

/// Birth date for someone aged 18 to 80 today, `YYYY-MM-DD`
pub fn date_of_birth<R: Rng + ?Sized>(rng: &mut R) -> String {
    let today = Utc::now().date_naive();
    date_of_birth_from(rng, today)
}

fn date_of_birth_from<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> String {
    let days = rng.gen_range(18 * 365 + 5..=80 * 365);
    (today - Duration::days(days)).format("%Y-%m-%d").to_string()
}

pub fn url<R: Rng + ?Sized>(rng: &mut R) -> String {
    let host: String = (0..rng.gen_range(5..12))
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect();
    let tld = ["com", "com.au", "net", "org", "io"].choose(rng).copied().unwrap_or("com");
    format!("https://{}.{}/", host, tld)
}

/// Dotted IPv4 address, no octet zero
pub fn ipv4<R: Rng + ?Sized>(rng: &mut R) -> String {
    let octets: Vec<String> = (0..4).map(|_| rng.gen_range(1..=254u8).to_string()).collect();
    octets.join(".")
}

/// Kinds of generated values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Name,
    FirstName,
    LastName,
    Gender,
    Email,
    Username,
    Password,
    Phone,
    Mobile,
    Address,
    Street,
    City,
    State,
    Postcode,
    Country,
    Company,
    JobTitle,
    DateOfBirth,
    Age,
    Uuid,
    Url,
    Ip,
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s {
            "Name" => DataType::Name,
            "FirstName" => DataType::FirstName,
            "LastName" => DataType::LastName,
            "Gender" => DataType::Gender,
            "Email" => DataType::Email,
            "Username" => DataType::Username,
            "Password" => DataType::Password,
            "Phone" => DataType::Phone,
            "Mobile" => DataType::Mobile,
            "Address" => DataType::Address,
            "Street" => DataType::Street,
            "City" => DataType::City,
            "State" => DataType::State,
            "Postcode" => DataType::Postcode,
            "Country" => DataType::Country,
            "Company" => DataType::Company,
            "JobTitle" => DataType::JobTitle,
            "DateOfBirth" => DataType::DateOfBirth,
            "Age" => DataType::Age,
            "UUID" | "Uuid" => DataType::Uuid,
            "URL" | "Url" => DataType::Url,
            "IP" | "Ip" => DataType::Ip,
            other => return Err(Error::InvalidConfig(format!("unsupported data type: {}", other))),
        };
        Ok(kind)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub fn generate<R: Rng + ?Sized>(rng: &mut R, kind: DataType) -> String {
    match kind {
        DataType::Name => {
            let first: String = FirstName().fake_with_rng(rng);
            let last: String = LastName().fake_with_rng(rng);
            format!("{} {}", first, last)
        }
        DataType::FirstName => FirstName().fake_with_rng(rng),
        DataType::LastName => LastName().fake_with_rng(rng),
        DataType::Gender => ["female", "male"].choose(rng).copied().unwrap_or("female").to_string(),
        DataType::Email => SafeEmail().fake_with_rng(rng),
        DataType::Username => username(rng),
        DataType::Password => password(rng),
        DataType::Phone => landline_number(rng),
        DataType::Mobile => mobile_number(rng),
        DataType::Address => address_bundle(rng).one_line(),
        DataType::Street => street_address(rng),
        DataType::City => CityName().fake_with_rng(rng),
        DataType::State => state_and_postcode(rng).0,
        DataType::Postcode => state_and_postcode(rng).1,
        DataType::Country => COUNTRY.to_string(),
        DataType::Company => CompanyName().fake_with_rng(rng),
        DataType::JobTitle => Title().fake_with_rng(rng),
        DataType::DateOfBirth => date_of_birth(rng),
        DataType::Age => rng.gen_range(18..=80).to_string(),
        DataType::Uuid => uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string(),
        DataType::Url => url(rng),
        DataType::Ip => ipv4(rng),
    }
}

/// Six-digit identifier, as used for fixture party ids
pub fn numeric_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(100_000..1_000_000).to_string()
}
